//! YAML config file I/O
//!
//! Loading never fails: a missing or broken file yields defaults so the
//! player always starts. Saving goes through a sibling temp file and a rename,
//! so a crash mid-write never leaves a truncated config behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and parse `path`; `Ok(None)` when the file does not exist
fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {:?}", path)),
    };
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

/// Load a config, falling back to `T::default()` when the file is missing
/// or cannot be parsed
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match read_yaml(path) {
        Ok(Some(config)) => {
            log::info!("Config: loaded {:?}", path);
            config
        }
        Ok(None) => {
            log::info!("Config: {:?} not found, using defaults", path);
            T::default()
        }
        Err(e) => {
            log::warn!("Config: {:#}, using defaults", e);
            T::default()
        }
    }
}

/// Load a config, writing the defaults out when no file exists yet
///
/// A broken file is left in place (and defaults are used) so the user can
/// fix it by hand.
pub fn load_or_create<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    if path.exists() {
        return Ok(load_config(path));
    }
    let config = T::default();
    save_config(&config, path).context("writing default config")?;
    Ok(config)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `config` as YAML, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("serializing config")?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, yaml).with_context(|| format!("writing {:?}", tmp))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {:?}", path))?;

    log::info!("Config: saved {:?}", path);
    Ok(())
}
