//! Supported text formats and their detection

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::value::Value;

/// Text format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Also used for files without an extension
    #[default]
    Json,
    Toml,
}

impl Format {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> ConfigResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            other => Err(ConfigError::unsupported_format(format!(
                "file extension '.{}'",
                other
            ))),
        }
    }

    /// Detect the format from a path. Paths without an extension are JSON.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension() {
            None => Ok(Format::Json),
            Some(ext) => Self::from_extension(&ext.to_string_lossy()),
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::Toml => "TOML",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Toml => "toml",
        }
    }

    /// Tag byte stored in encrypted envelopes
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Format::Json => 1,
            Format::Toml => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Format::Json),
            2 => Some(Format::Toml),
            _ => None,
        }
    }

    /// Parse text into the value model
    pub fn parse(&self, text: &str) -> ConfigResult<Value> {
        match self {
            Format::Json => serde_json::from_str::<serde_json::Value>(text)
                .map_err(|e| ConfigError::parse(self.name(), e))
                .and_then(Value::from_json_value),
            Format::Toml => toml::from_str::<toml::Table>(text)
                .map(|table| Value::from_toml_value(toml::Value::Table(table)))
                .map_err(|e| ConfigError::parse(self.name(), e)),
        }
    }

    /// Parse raw bytes, which must be UTF-8
    pub fn parse_bytes(&self, bytes: &[u8]) -> ConfigResult<Value> {
        let text = std::str::from_utf8(bytes).map_err(|e| ConfigError::parse(self.name(), e))?;
        self.parse(text)
    }

    /// Serialize a value as pretty-printed text
    pub fn serialize(&self, value: &Value) -> ConfigResult<String> {
        match self {
            Format::Json => {
                let json = value.to_json_value()?;
                serde_json::to_string_pretty(&json).map_err(|e| ConfigError::serialize(self.name(), e))
            }
            Format::Toml => {
                if !matches!(value, Value::Object(_)) {
                    return Err(ConfigError::serialize(
                        self.name(),
                        format!("top level must be a table, found {}", value.type_name()),
                    ));
                }
                let toml_value = value.to_toml_value()?;
                toml::to_string_pretty(&toml_value).map_err(|e| ConfigError::serialize(self.name(), e))
            }
        }
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    /// Parse a declared format name such as `"toml"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim_start_matches('.'))
            .map_err(|_| ConfigError::unsupported_format(format!("format '{}'", s)))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection() {
        assert_eq!(Format::from_path(Path::new("cfg.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::from_path(Path::new("cfg.JSON")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("config")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("cfg.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert_eq!("toml".parse::<Format>().unwrap(), Format::Toml);
        assert!("ini".parse::<Format>().is_err());
    }

    #[test]
    fn test_tags() {
        for format in [Format::Json, Format::Toml] {
            assert_eq!(Format::from_tag(format.tag()), Some(format));
        }
        assert_eq!(Format::from_tag(0), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Format::Json.parse("{\"a\": "),
            Err(ConfigError::Parse { format: "JSON", .. })
        ));
        assert!(matches!(
            Format::Toml.parse("a = "),
            Err(ConfigError::Parse { format: "TOML", .. })
        ));
        assert!(matches!(
            Format::Json.parse_bytes(&[0xff, 0xfe]),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_toml_text_round_trip() {
        let text = r#"
name = "Configurator test"

[build]
type = "Debug"

[build.output]
type = "exec"
"#;
        let value = Format::Toml.parse(text).unwrap();
        let written = Format::Toml.serialize(&value).unwrap();
        assert_eq!(Format::Toml.parse(&written).unwrap(), value);
    }

    #[test]
    fn test_toml_rejects_non_table_root() {
        assert!(matches!(
            Format::Toml.serialize(&Value::integer(1)),
            Err(ConfigError::Serialize { format: "TOML", .. })
        ));
    }
}
