//! INI file configuration adapter.

use crate::domain::error::LeadscanError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "leadscan.ini";

/// Parent directories searched by [`FileConfigAdapter::discover`].
const MAX_DISCOVERY_DEPTH: usize = 100;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LeadscanError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| LeadscanError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, LeadscanError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| LeadscanError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// Find `name` in `start` or the nearest ancestor directory that has it.
    pub fn discover(name: &str, start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .take(MAX_DISCOVERY_DEPTH)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}
