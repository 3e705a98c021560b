use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;

const QUALIFIER: &str = "net.commonplace";
const ORGANIZATION: &str = "Commonplace";
const APPLICATION: &str = "commonplace";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Character that opens the insert menu at the start of an empty paragraph
    pub trigger: char,
    /// Quiet period before edits are saved
    pub save_debounce_ms: u64,
    /// Where the directory store keeps notes; the platform data dir when unset
    pub notes_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            trigger: '/',
            save_debounce_ms: 1200,
            notes_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load from `path`. A missing file is an error here; see [`EditorConfig::load_default`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the platform config location, falling back to defaults when
    /// the file is missing or broken
    pub fn load_default() -> Self {
        let Some(path) = config_file_path() else {
            return EditorConfig::default();
        };
        match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                EditorConfig::default()
            }
            Err(err) => {
                log::warn!("{}; using defaults", err);
                EditorConfig::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(write_err)
    }

    /// The configured notes directory, or the platform data directory
    pub fn notes_dir(&self) -> Option<PathBuf> {
        self.notes_dir.clone().or_else(|| {
            ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
                .map(|dirs| dirs.data_dir().join("zettels"))
        })
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "trigger = \"+\"\n").unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.trigger, '+');
        assert_eq!(config.save_debounce_ms, 1200);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = EditorConfig {
            notes_dir: Some(dir.path().join("notes")),
            save_debounce_ms: 300,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(EditorConfig::load(&missing), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "save_debounce_ms = \"soon\"").unwrap();
        let err = EditorConfig::load(&broken).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
