//! Shared configuration utilities
//!
//! Generic YAML config loading/saving plus the standard config location.
//! The player defines its own config type and loads it through these.
//!
//! ```ignore
//! use wavesync_core::config::{default_config_path, load_config, save_config};
//!
//! let config: PlayerConfig = load_config(&default_config_path());
//! save_config(&config, &default_config_path())?;
//! ```

mod io;
mod paths;

pub use io::{load_config, load_or_create, save_config};
pub use paths::{config_dir, default_config_path, APP_DIR_NAME, CONFIG_FILE_NAME};
