//! Serializer turning any `serde::Serialize` type into a [`Value`]

use serde::ser::{self, Impossible, Serialize};
use std::fmt;

use super::{Map, Value};
use crate::error::{ConfigError, ConfigResult};

impl ser::Error for ConfigError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ConfigError::serialize("value", msg)
    }
}

/// Convert a serializable value into the generic value model.
///
/// Map keys must serialize as strings (or chars / unit enum variants);
/// anything else fails with [`ConfigError::InvalidKeyKind`].
pub fn to_value<T>(value: &T) -> ConfigResult<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ConfigError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> ConfigResult<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> ConfigResult<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> ConfigResult<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> ConfigResult<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> ConfigResult<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> ConfigResult<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> ConfigResult<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> ConfigResult<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> ConfigResult<Value> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| ConfigError::serialize("value", format!("integer {} out of range", v)))
    }

    fn serialize_f32(self, v: f32) -> ConfigResult<Value> {
        Ok(Value::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> ConfigResult<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> ConfigResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> ConfigResult<Value> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> ConfigResult<Value> {
        Ok(Value::Array(
            v.iter().map(|b| Value::Integer((*b).into())).collect(),
        ))
    }

    fn serialize_none(self) -> ConfigResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> ConfigResult<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> ConfigResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> ConfigResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ConfigResult<Value> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> ConfigResult<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> ConfigResult<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut map = Map::new();
        map.insert(variant.to_owned(), to_value(value)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> ConfigResult<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> ConfigResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> ConfigResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> ConfigResult<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name: variant.to_owned(),
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> ConfigResult<SerializeMap> {
        Ok(SerializeMap {
            map: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> ConfigResult<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> ConfigResult<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            name: variant.to_owned(),
            map: Map::new(),
        })
    }
}

struct SerializeVec {
    vec: Vec<Value>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_element<T>(&mut self, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> ConfigResult<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_element<T>(&mut self, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> ConfigResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_field<T>(&mut self, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> ConfigResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

struct SerializeTupleVariant {
    name: String,
    vec: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_field<T>(&mut self, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> ConfigResult<Value> {
        let mut map = Map::new();
        map.insert(self.name, Value::Array(self.vec));
        Ok(Value::Object(map))
    }
}

struct SerializeMap {
    map: Map,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_key<T>(&mut self, key: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| ConfigError::serialize("value", "map value serialized before its key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> ConfigResult<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_owned(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> ConfigResult<Value> {
        Ok(Value::Object(self.map))
    }
}

struct SerializeStructVariant {
    name: String,
    map: Map,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = ConfigError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> ConfigResult<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_owned(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> ConfigResult<Value> {
        let mut outer = Map::new();
        outer.insert(self.name, Value::Object(self.map));
        Ok(Value::Object(outer))
    }
}

/// Accepts only string-like keys
struct MapKeySerializer;

fn key_must_be_string(kind: &str) -> ConfigError {
    ConfigError::invalid_key_kind(format!("expected a string key, found {}", kind))
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = ConfigError;

    type SerializeSeq = Impossible<String, ConfigError>;
    type SerializeTuple = Impossible<String, ConfigError>;
    type SerializeTupleStruct = Impossible<String, ConfigError>;
    type SerializeTupleVariant = Impossible<String, ConfigError>;
    type SerializeMap = Impossible<String, ConfigError>;
    type SerializeStruct = Impossible<String, ConfigError>;
    type SerializeStructVariant = Impossible<String, ConfigError>;

    fn serialize_str(self, v: &str) -> ConfigResult<String> {
        Ok(v.to_owned())
    }

    fn serialize_char(self, v: char) -> ConfigResult<String> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ConfigResult<String> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> ConfigResult<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> ConfigResult<String> {
        Err(key_must_be_string("boolean"))
    }

    fn serialize_i8(self, _v: i8) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_i16(self, _v: i16) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_i32(self, _v: i32) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_i64(self, _v: i64) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_u8(self, _v: u8) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_u16(self, _v: u16) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_u32(self, _v: u32) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_u64(self, _v: u64) -> ConfigResult<String> {
        Err(key_must_be_string("integer"))
    }

    fn serialize_f32(self, _v: f32) -> ConfigResult<String> {
        Err(key_must_be_string("float"))
    }

    fn serialize_f64(self, _v: f64) -> ConfigResult<String> {
        Err(key_must_be_string("float"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> ConfigResult<String> {
        Err(key_must_be_string("bytes"))
    }

    fn serialize_none(self) -> ConfigResult<String> {
        Err(key_must_be_string("null"))
    }

    fn serialize_some<T>(self, _value: &T) -> ConfigResult<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string("option"))
    }

    fn serialize_unit(self) -> ConfigResult<String> {
        Err(key_must_be_string("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> ConfigResult<String> {
        Err(key_must_be_string("unit struct"))
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> ConfigResult<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string("enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> ConfigResult<Self::SerializeSeq> {
        Err(key_must_be_string("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> ConfigResult<Self::SerializeTuple> {
        Err(key_must_be_string("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> ConfigResult<Self::SerializeTupleStruct> {
        Err(key_must_be_string("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> ConfigResult<Self::SerializeTupleVariant> {
        Err(key_must_be_string("tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> ConfigResult<Self::SerializeMap> {
        Err(key_must_be_string("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> ConfigResult<Self::SerializeStruct> {
        Err(key_must_be_string("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> ConfigResult<Self::SerializeStructVariant> {
        Err(key_must_be_string("struct variant"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct Build {
        kind: &'static str,
        jobs: u32,
        features: Vec<&'static str>,
        target: Option<String>,
    }

    #[test]
    fn test_struct_to_value() {
        let build = Build {
            kind: "Debug",
            jobs: 4,
            features: vec!["tls"],
            target: None,
        };
        let val = to_value(&build).unwrap();
        assert_eq!(val.get("kind"), Some(&Value::string("Debug")));
        assert_eq!(val.get("jobs"), Some(&Value::integer(4)));
        assert_eq!(val.get("features"), Some(&Value::from(vec!["tls"])));
        assert_eq!(val.get("target"), Some(&Value::Null));
    }

    #[test]
    fn test_string_keyed_map() {
        let mut map = HashMap::new();
        map.insert("level", 3u8);
        let val = to_value(&map).unwrap();
        assert_eq!(val.get("level"), Some(&Value::integer(3)));
    }

    #[test]
    fn test_non_string_key_is_rejected() {
        let mut map = BTreeMap::new();
        map.insert(1u32, "one");
        assert!(matches!(to_value(&map), Err(ConfigError::InvalidKeyKind(_))));
    }

    #[test]
    fn test_u64_out_of_range_is_rejected() {
        assert_eq!(to_value(&(i64::MAX as u64)).unwrap(), Value::integer(i64::MAX));
        assert!(matches!(
            to_value(&u64::MAX),
            Err(ConfigError::Serialize { .. })
        ));
    }
}
