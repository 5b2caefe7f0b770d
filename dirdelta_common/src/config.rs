use crate::{AppConfig, ComparisonError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "dirdelta.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, ComparisonError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    load_config_from(&path, portable)
}

/// Load a config file from an explicit location; a missing file yields defaults
pub fn load_config_from(path: &Path, portable: bool) -> Result<LoadedConfig, ComparisonError> {
    let exists = path.exists();

    let mut config = if exists {
        let data = fs::read_to_string(path).map_err(|e| ComparisonError::read(path, e))?;
        toml::from_str(&data).map_err(|e| ComparisonError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    config.portable_mode = portable;

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
        portable,
    })
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), ComparisonError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "dirdelta", "dirdelta").ok_or_else(|| {
        ComparisonError::Config("Unable to determine config directory".to_string())
    })?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
