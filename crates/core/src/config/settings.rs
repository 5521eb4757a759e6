use crate::{
    cache::parse_cache::DEFAULT_CACHE_CAPACITY,
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 2] = [".modmove.json", "modmove.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct MoveConfig {
    /// Groups of more than this many identical usages in one module get a
    /// synthesized import instead of being retargeted one by one
    pub import_threshold: usize,

    /// Make a private module declaration `pub` when it is used from outside
    /// its new parent
    pub publicize_declarations: bool,

    /// Number of parsed files kept in the LRU cache
    pub cache_capacity: usize,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            import_threshold: 2,
            publicize_declarations: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl MoveConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        if config.cache_capacity == 0 {
            return Err(Error::ConfigError(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Config found by walking up from `start_path`, or the defaults
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: MoveConfig = serde_json::from_str(r#"{ "import_threshold": 5 }"#).unwrap();
        assert_eq!(parsed.import_threshold, 5);
        assert!(parsed.publicize_declarations);
        assert_eq!(parsed.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_save_and_find_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let nested = temp_dir.path().join("crates").join("inner");
        std::fs::create_dir_all(&nested)?;

        let config = MoveConfig {
            import_threshold: 0,
            publicize_declarations: false,
            cache_capacity: 8,
        };
        config.save_to_file(&temp_dir.path().join(".modmove.json"))?;

        let found = MoveConfig::find_config_file(&nested).unwrap();
        assert_eq!(found, temp_dir.path().join(".modmove.json"));
        assert_eq!(MoveConfig::discover(&nested)?, config);
        Ok(())
    }

    #[test]
    fn test_zero_cache_capacity_is_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("modmove.json");
        std::fs::write(&path, r#"{ "cache_capacity": 0 }"#)?;

        assert!(matches!(
            MoveConfig::load_from_file(&path),
            Err(Error::ConfigError(_))
        ));
        Ok(())
    }
}
