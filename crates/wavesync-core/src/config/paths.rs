//! Standard locations for wavesync configuration files

use std::path::PathBuf;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "wavesync";

/// Config file name inside [`config_dir`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Get the wavesync config directory
///
/// Returns: `~/.config/wavesync` on Linux (platform equivalent elsewhere),
/// falling back to the home directory, then the working directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_DIR_NAME)
}

/// Get the default config file path
///
/// Returns: `{config_dir}/config.yaml`
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}
