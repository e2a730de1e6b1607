//! Nested JSON/TOML configuration as a tree of dynamic attribute containers.
//!
//! Text is parsed into the format-agnostic [`Value`] model, decoded into a
//! [`Container`] tree that can be read and edited freely, then encoded back
//! and written out, optionally sealed with AES-256-GCM.
//!
//! ```no_run
//! use dynconf::{Config, Field, SecretKey};
//! use std::path::Path;
//!
//! # fn main() -> dynconf::ConfigResult<()> {
//! let mut config = Config::new().with_secret_key(SecretKey::generate());
//! config.load(Some(Path::new("project.toml")))?;
//! if let Some(project) = config.container_mut("project") {
//!     project.update([("version", "1.0.0")]);
//! }
//! config.save(None)?;
//!
//! config.restore(None)?;
//! assert_eq!(config.get_path("project.version"), Some(&Field::from("1.0.0")));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod format;
pub mod processor;
pub mod value;

pub use codec::{decode, decode_from, decode_map, decode_with, encode, encode_container};
pub use config::{Config, ConfigPaths, HomeConfigPaths, State};
pub use container::{Container, Field, Row};
pub use crypto::{Envelope, SecretKey};
pub use error::{ConfigError, ConfigResult};
pub use format::Format;
pub use value::{to_value, Map, Value};
