//! Format-agnostic value model
//!
//! [`Value`] is the interchange point between the text formats (JSON, TOML)
//! and the structural decoder. Format parsers produce it, the encoder produces
//! it back, and the format serializers consume it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ConfigError, ConfigResult};

mod ser;

pub use ser::to_value;

/// Mapping of string keys to values.
///
/// Ordered by key so that repeated encodes of the same tree are byte-identical.
pub type Map = BTreeMap<String, Value>;

/// Format-agnostic configuration value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/None value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Mapping of string keys to values
    Object(Map),
}

impl Value {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Self::String(s.into())
    }

    /// Create a new integer value
    pub fn integer(i: i64) -> Self {
        Self::Integer(i)
    }

    /// Create a new boolean value
    pub fn boolean(b: bool) -> Self {
        Self::Bool(b)
    }

    /// Create a new float value
    pub fn float(f: f64) -> Self {
        Self::Float(f)
    }

    /// Create a new array value
    pub fn array(values: Vec<Value>) -> Self {
        Self::Array(values)
    }

    /// Create a new object value
    pub fn object(map: Map) -> Self {
        Self::Object(map)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for everything except arrays and objects
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get value at object key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Convert to toml::Value
    ///
    /// TOML has no null, so any null in the tree is rejected.
    pub fn to_toml_value(&self) -> ConfigResult<toml::Value> {
        let value = match self {
            Value::Null => {
                return Err(ConfigError::serialize(
                    "TOML",
                    "TOML does not support null values",
                ))
            }
            Value::Bool(b) => toml::Value::Boolean(*b),
            Value::Integer(i) => toml::Value::Integer(*i),
            Value::Float(f) => toml::Value::Float(*f),
            Value::String(s) => toml::Value::String(s.clone()),
            Value::Array(arr) => {
                let toml_arr: Result<Vec<_>, _> = arr.iter().map(|v| v.to_toml_value()).collect();
                toml::Value::Array(toml_arr?)
            }
            Value::Object(obj) => {
                let mut toml_table = toml::value::Table::new();
                for (k, v) in obj {
                    toml_table.insert(k.clone(), v.to_toml_value()?);
                }
                toml::Value::Table(toml_table)
            }
        };
        Ok(value)
    }

    /// Convert from toml::Value
    ///
    /// Datetimes have no counterpart in the model and are kept as their
    /// RFC 3339 string form.
    pub fn from_toml_value(value: toml::Value) -> Self {
        match value {
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::String(s) => Value::String(s),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::from_toml_value).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_toml_value(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to serde_json::Value
    ///
    /// Fails on NaN and infinite floats, which JSON cannot represent.
    pub fn to_json_value(&self) -> ConfigResult<serde_json::Value> {
        let value = match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    ConfigError::serialize("JSON", format!("{} is not a valid JSON number", f))
                })?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => {
                let json_arr: Result<Vec<_>, _> = arr.iter().map(|v| v.to_json_value()).collect();
                serde_json::Value::Array(json_arr?)
            }
            Value::Object(obj) => {
                let mut json_obj = serde_json::Map::new();
                for (k, v) in obj {
                    json_obj.insert(k.clone(), v.to_json_value()?);
                }
                serde_json::Value::Object(json_obj)
            }
        };
        Ok(value)
    }

    /// Convert from serde_json::Value
    ///
    /// Integers that do not fit in an `i64` are rejected rather than rounded
    /// to a float, matching what the TOML parser does.
    pub fn from_json_value(value: serde_json::Value) -> ConfigResult<Self> {
        let value = match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_f64() {
                    let f = n.as_f64().ok_or_else(|| {
                        ConfigError::parse("JSON", format!("number {} is not representable", n))
                    })?;
                    Value::Float(f)
                } else {
                    return Err(ConfigError::parse(
                        "JSON",
                        format!("integer {} out of range", n),
                    ));
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(
                arr.into_iter()
                    .map(Self::from_json_value)
                    .collect::<ConfigResult<_>>()?,
            ),
            serde_json::Value::Object(obj) => Value::Object(
                obj.into_iter()
                    .map(|(k, v)| Self::from_json_value(v).map(|v| (k, v)))
                    .collect::<ConfigResult<_>>()?,
            ),
        };
        Ok(value)
    }
}

/// Float equality that treats NaN as equal to itself, so a tree holding NaN
/// still compares equal to its own round trip
pub(crate) fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(values: Vec<V>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => {
                write!(f, "{{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        let val = Value::string("test");
        assert_eq!(val.as_str(), Some("test"));
        assert_eq!(val.type_name(), "string");
        assert!(val.is_scalar());
        assert!(!Value::array(vec![]).is_scalar());
    }

    #[test]
    fn test_type_conversion() {
        let val = Value::integer(42);
        assert_eq!(val.as_integer(), Some(42));
        assert_eq!(val.as_float(), Some(42.0));
        assert!(val.as_str().is_none());
    }

    #[test]
    fn test_toml_conversion_keeps_nesting() {
        let toml_value: toml::Value = toml::from_str::<toml::Table>(
            r#"
            name = "test"
            [build]
            type = "Debug"
            flags = ["-O", "-g"]
            "#,
        )
        .map(toml::Value::Table)
        .unwrap();

        let val = Value::from_toml_value(toml_value.clone());
        assert_eq!(
            val.get("build").and_then(|b| b.get("type")),
            Some(&Value::string("Debug"))
        );
        assert_eq!(val.to_toml_value().unwrap(), toml_value);
    }

    #[test]
    fn test_toml_rejects_null() {
        let val: Value = [("a", Value::Null)].into_iter().collect();
        assert!(matches!(
            val.to_toml_value(),
            Err(ConfigError::Serialize { format: "TOML", .. })
        ));
    }

    #[test]
    fn test_toml_datetime_becomes_string() {
        let table: toml::Table = toml::from_str("when = 1979-05-27T07:32:00Z").unwrap();
        let val = Value::from_toml_value(toml::Value::Table(table));
        assert_eq!(
            val.get("when"),
            Some(&Value::string("1979-05-27T07:32:00Z"))
        );
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({
            "count": 3,
            "ratio": 0.5,
            "tags": ["a", null],
            "nested": {"on": true}
        });
        let val = Value::from_json_value(json.clone()).unwrap();
        assert_eq!(val.get("count"), Some(&Value::integer(3)));
        assert_eq!(val.get("ratio"), Some(&Value::float(0.5)));
        assert_eq!(val.to_json_value().unwrap(), json);
    }

    #[test]
    fn test_json_integer_out_of_range_is_rejected() {
        let json = serde_json::json!({"id": u64::MAX});
        assert!(matches!(
            Value::from_json_value(json),
            Err(ConfigError::Parse { format: "JSON", .. })
        ));
    }

    #[test]
    fn test_nan_equals_itself() {
        let val: Value = [("x", Value::float(f64::NAN))].into_iter().collect();
        assert_eq!(val, val.clone());
        assert_ne!(Value::float(f64::NAN), Value::float(1.0));
        assert_eq!(Value::float(0.0), Value::float(-0.0));
    }

    #[test]
    fn test_json_rejects_nan() {
        assert!(Value::float(f64::NAN).to_json_value().is_err());
    }

    #[test]
    fn test_display() {
        let val: Value = [("a", Value::from(vec![1, 2]))].into_iter().collect();
        assert_eq!(val.to_string(), "{\"a\": [1, 2]}");
    }

    #[test]
    fn test_display_escapes_quotes() {
        let val: Value = [("say \"hi\"", Value::string("a\"b"))].into_iter().collect();
        assert_eq!(val.to_string(), r#"{"say \"hi\"": "a\"b"}"#);
    }
}
