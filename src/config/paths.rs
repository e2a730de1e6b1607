//! Default locations for the configuration and key files

use std::path::PathBuf;

/// Default namespace directory under the home directory
pub const DEFAULT_NAMESPACE: &str = ".dynconf";

/// Resolves where configuration lives when no explicit path is given
pub trait ConfigPaths: Send + Sync {
    /// Directory holding the configuration and key files
    fn data_dir(&self) -> PathBuf;

    /// Default configuration file (no extension, written as JSON)
    fn config_file(&self) -> PathBuf {
        self.data_dir().join("config")
    }

    /// Default secret key file
    fn key_file(&self) -> PathBuf {
        self.data_dir().join("secret.key")
    }
}

/// `<home>/<namespace>/` layout
#[derive(Debug, Clone)]
pub struct HomeConfigPaths {
    home_dir: PathBuf,
    namespace: String,
}

impl HomeConfigPaths {
    /// Resolve the current user's home directory.
    ///
    /// Falls back to the temp directory when no home can be found.
    pub fn new() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| {
            let fallback = std::env::temp_dir();
            log::warn!(
                "No home directory found, using {} for configuration",
                fallback.display()
            );
            fallback
        });

        Self {
            home_dir,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Use an explicit home directory
    pub fn with_home<P: Into<PathBuf>>(home_dir: P) -> Self {
        Self {
            home_dir: home_dir.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Change the namespace directory, e.g. `".myapp"`
    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl Default for HomeConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPaths for HomeConfigPaths {
    fn data_dir(&self) -> PathBuf {
        self.home_dir.join(&self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = HomeConfigPaths::with_home("/home/alice");
        assert_eq!(paths.data_dir(), PathBuf::from("/home/alice/.dynconf"));
        assert_eq!(paths.config_file(), PathBuf::from("/home/alice/.dynconf/config"));
        assert_eq!(paths.key_file(), PathBuf::from("/home/alice/.dynconf/secret.key"));
    }

    #[test]
    fn test_namespace() {
        let paths = HomeConfigPaths::with_home("/home/alice").with_namespace(".everynet");
        assert_eq!(paths.config_file(), PathBuf::from("/home/alice/.everynet/config"));
    }
}
