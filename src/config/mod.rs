//! Configuration root
//!
//! [`Config`] owns the top-level [`Container`] together with the file it is
//! saved to and, optionally, the secret key used to encrypt it. It brackets
//! the decode/encode pipeline with file I/O:
//!
//! * `load`: read → detect format → parse → decode
//! * `save`: encode → serialize → encrypt (if keyed) → write
//! * `restore`: read → decrypt (if keyed) → parse → decode
//!
//! Nothing here is synchronized; share a `Config` across threads only behind
//! an external lock.

pub mod paths;

use std::fmt;
use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

pub use paths::{ConfigPaths, HomeConfigPaths, DEFAULT_NAMESPACE};

use crate::codec;
use crate::container::{Container, Field};
use crate::crypto::{self, Envelope, SecretKey};
use crate::error::{ConfigError, ConfigResult};
use crate::format::Format;
use crate::processor;
use crate::value::Value;

/// Whether the in-memory tree came from (or went to) disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unloaded,
    Loaded,
}

/// Top-level configuration with its persistence settings
#[derive(Debug)]
pub struct Config {
    root: Container,
    state: State,
    save_path: PathBuf,
    key_path: Option<PathBuf>,
    secret_key: Option<SecretKey>,
}

impl Config {
    /// Empty, unencrypted configuration saved under the home directory
    pub fn new() -> Self {
        Self::with_paths(&HomeConfigPaths::new())
    }

    /// Empty configuration using `paths` for the default file location
    pub fn with_paths(paths: &dyn ConfigPaths) -> Self {
        Self {
            root: Container::new(),
            state: State::Unloaded,
            save_path: paths.config_file(),
            key_path: None,
            secret_key: None,
        }
    }

    /// Create and load from `path` in one step
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let mut config = Self::new();
        config.load(Some(path.as_ref()))?;
        Ok(config)
    }

    pub fn with_save_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.save_path = path.into();
        self
    }

    /// Encrypt with this key. Takes precedence over a key file.
    pub fn with_secret_key(mut self, key: SecretKey) -> Self {
        self.secret_key = Some(key);
        self
    }

    /// Encrypt with the hex key stored at `path`.
    ///
    /// The file is created with a fresh random key on the first save.
    pub fn with_key_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == State::Loaded
    }

    /// Where `save`, and `load`/`restore` without a path, operate
    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn set_save_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.save_path = path.into();
    }

    pub fn key_path(&self) -> Option<&Path> {
        self.key_path.as_deref()
    }

    /// True when saves will be encrypted
    pub fn is_encrypted(&self) -> bool {
        self.secret_key.is_some() || self.key_path.is_some()
    }

    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Container {
        &mut self.root
    }

    pub fn into_root(self) -> Container {
        self.root
    }

    /// Load a plain JSON or TOML file, replacing the current tree.
    ///
    /// The format is taken from the file extension; files without one are
    /// read as JSON.
    pub fn load(&mut self, path: Option<&Path>) -> ConfigResult<()> {
        self.load_with(path, None, processor::identity)
    }

    /// Load with an explicitly declared format
    pub fn load_as(&mut self, path: Option<&Path>, format: Format) -> ConfigResult<()> {
        self.load_with(path, Some(format), processor::identity)
    }

    /// Load, passing every scalar leaf through `processor`
    pub fn load_with<P>(
        &mut self,
        path: Option<&Path>,
        format: Option<Format>,
        processor: P,
    ) -> ConfigResult<()>
    where
        P: FnMut(&str, Field) -> Field,
    {
        let path = self.resolve(path);
        let bytes = fs::read(&path).map_err(|e| ConfigError::io(&path, e))?;
        let format = match format {
            Some(format) => format,
            None => Format::from_path(&path)?,
        };

        if crypto::is_envelope(&bytes) {
            return Err(ConfigError::parse(
                format.name(),
                format!("{} is encrypted, use restore", path.display()),
            ));
        }

        let value = format.parse_bytes(&bytes)?;
        self.install(value, format, &path, processor)?;
        log::info!("Loaded {} configuration from {}", format, path.display());
        Ok(())
    }

    /// Write the tree to `path` (or the save path), encrypting it when a key
    /// is configured. A given `path` becomes the new save path.
    ///
    /// Returns the path written.
    pub fn save(&mut self, path: Option<&Path>) -> ConfigResult<PathBuf> {
        if let Some(path) = path {
            self.save_path = path.to_path_buf();
        }
        let path = self.save_path.clone();
        let format = Format::from_path(&path)?;

        let text = format.serialize(&codec::encode_container(&self.root))?;
        let bytes = match self.key_for_save()? {
            Some(key) => Envelope::seal(&key, format, text.as_bytes())?.to_bytes(),
            None => text.into_bytes(),
        };

        write_atomic(&path, &bytes)?;
        self.state = State::Loaded;
        log::info!(
            "Saved {} configuration to {}{}",
            format,
            path.display(),
            if self.is_encrypted() { " (encrypted)" } else { "" }
        );
        Ok(path)
    }

    /// Read back what `save` wrote, replacing the current tree
    pub fn restore(&mut self, path: Option<&Path>) -> ConfigResult<()> {
        self.restore_with(path, processor::identity)
    }

    /// Restore, passing every scalar leaf through `processor`
    pub fn restore_with<P>(&mut self, path: Option<&Path>, processor: P) -> ConfigResult<()>
    where
        P: FnMut(&str, Field) -> Field,
    {
        let path = self.resolve(path);
        let bytes = fs::read(&path).map_err(|e| ConfigError::io(&path, e))?;

        let (format, plaintext) = match self.key_for_restore()? {
            Some(key) => {
                let envelope = Envelope::from_bytes(&bytes)?;
                let plaintext = envelope.open(&key)?;
                (envelope.format(), plaintext)
            }
            None => {
                if crypto::is_envelope(&bytes) {
                    return Err(ConfigError::decryption(format!(
                        "{} is encrypted but no secret key is configured",
                        path.display()
                    )));
                }
                (Format::from_path(&path)?, bytes)
            }
        };

        let value = format.parse_bytes(&plaintext)?;
        self.install(value, format, &path, processor)?;
        log::info!("Restored {} configuration from {}", format, path.display());
        Ok(())
    }

    /// Delete the saved configuration and key files and clear the tree.
    ///
    /// Files that do not exist are ignored.
    pub fn prune(&mut self) -> ConfigResult<()> {
        remove_if_exists(&self.save_path)?;
        if let Some(key_path) = &self.key_path {
            remove_if_exists(key_path)?;
        }
        self.root.clear();
        self.state = State::Unloaded;
        log::info!("Pruned configuration at {}", self.save_path.display());
        Ok(())
    }

    fn resolve(&self, path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(|| self.save_path.clone())
    }

    fn install<P>(&mut self, value: Value, format: Format, path: &Path, processor: P) -> ConfigResult<()>
    where
        P: FnMut(&str, Field) -> Field,
    {
        match value {
            Value::Object(map) => {
                self.root = codec::decode_map(map, processor);
                self.state = State::Loaded;
                Ok(())
            }
            other => Err(ConfigError::parse(
                format.name(),
                format!(
                    "expected a mapping at the top of {}, found {}",
                    path.display(),
                    other.type_name()
                ),
            )),
        }
    }

    fn key_for_save(&self) -> ConfigResult<Option<SecretKey>> {
        if let Some(key) = &self.secret_key {
            return Ok(Some(key.clone()));
        }
        let Some(key_path) = &self.key_path else {
            return Ok(None);
        };

        if key_path.exists() {
            return SecretKey::load(key_path).map(Some);
        }

        let key = SecretKey::generate();
        key.save(key_path)?;
        log::info!(
            "Generated secret key {} at {}",
            key.fingerprint(),
            key_path.display()
        );
        Ok(Some(key))
    }

    fn key_for_restore(&self) -> ConfigResult<Option<SecretKey>> {
        if let Some(key) = &self.secret_key {
            return Ok(Some(key.clone()));
        }
        let Some(key_path) = &self.key_path else {
            return Ok(None);
        };

        SecretKey::load(key_path).map(Some).map_err(|e| match e {
            ConfigError::NotFound { path } => ConfigError::encryption(format!(
                "key file {} does not exist",
                path.display()
            )),
            other => other,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Config {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.root
    }
}

impl DerefMut for Config {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.root
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Write through a sibling temp file and rename into place
fn write_atomic(path: &Path, bytes: &[u8]) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let file_name = path.file_name().ok_or_else(|| {
        ConfigError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, bytes).map_err(|e| ConfigError::io(&temp_path, e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ConfigError::io(path, e));
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> ConfigResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config::with_paths(&HomeConfigPaths::with_home(dir.path()))
    }

    #[test]
    fn test_new_is_unloaded_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        assert_eq!(config.state(), State::Unloaded);
        assert!(config.is_empty());
        assert!(!config.is_encrypted());
        assert_eq!(config.save_path(), dir.path().join(".dynconf/config"));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        let err = config.load(None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(config.state(), State::Unloaded);
    }

    #[test]
    fn test_load_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yaml");
        fs::write(&path, "a: 1").unwrap();
        let mut config = config_in(&dir);
        assert!(matches!(
            config.load(Some(path.as_path())),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_replaces_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{"a": {"b": 1}}"#).unwrap();

        let mut config = config_in(&dir);
        config.set("stale", true);
        config.load(Some(path.as_path())).unwrap();

        assert!(config.is_loaded());
        assert!(!config.contains("stale"));
        assert_eq!(config.get_path("a.b"), Some(&Field::Integer(1)));
    }

    #[test]
    fn test_load_as_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.conf");
        fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let mut config = config_in(&dir);
        config.load_as(Some(path.as_path()), Format::Toml).unwrap();
        assert_eq!(config.get_path("server.port"), Some(&Field::Integer(8080)));
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, "[1, 2]").unwrap();

        let mut config = config_in(&dir);
        assert!(matches!(
            config.load(Some(path.as_path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_save_creates_parent_and_updates_save_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deep/er/cfg.toml");

        let mut config = config_in(&dir);
        config.update([("name", "demo")]);
        let written = config.save(Some(target.as_path())).unwrap();

        assert_eq!(written, target);
        assert_eq!(config.save_path(), target);
        let text = fs::read_to_string(&target).unwrap();
        assert!(text.contains("name = \"demo\""));
        assert!(!target.with_file_name("cfg.toml.tmp").exists());
    }

    #[test]
    fn test_restore_without_key_on_encrypted_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = config_in(&dir).with_secret_key(SecretKey::generate());
        writer.update([("k", "v")]);
        writer.save(None).unwrap();

        let mut reader = config_in(&dir);
        assert!(matches!(
            reader.restore(None),
            Err(ConfigError::Decryption(_))
        ));
    }

    #[test]
    fn test_restore_with_missing_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = config_in(&dir);
        writer.update([("k", "v")]);
        writer.save(None).unwrap();

        let mut reader = config_in(&dir).with_key_file(dir.path().join("absent.key"));
        assert!(matches!(
            reader.restore(None),
            Err(ConfigError::Encryption(_))
        ));
    }

    #[test]
    fn test_invalid_key_file_is_encryption_error() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("secret.key");
        fs::write(&key_path, "abcd").unwrap();

        let mut config = config_in(&dir).with_key_file(&key_path);
        config.update([("k", "v")]);
        assert!(matches!(config.save(None), Err(ConfigError::Encryption(_))));
    }

    #[test]
    fn test_prune() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("secret.key");
        let mut config = config_in(&dir).with_key_file(&key_path);
        config.update([("k", "v")]);
        config.save(None).unwrap();
        assert!(key_path.exists());

        config.prune().unwrap();
        assert!(!config.save_path().exists());
        assert!(!key_path.exists());
        assert!(config.is_empty());
        assert_eq!(config.state(), State::Unloaded);

        // nothing left to delete
        config.prune().unwrap();
    }
}
