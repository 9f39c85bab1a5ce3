mod config;

pub use config::{AudioConfig, Config, TimingConfig, UiConfig};

use std::path::PathBuf;

/// Returns `~/.config/chimeclock[-dev]/` based on CHIMECLOCK_ENV.
///
/// Set CHIMECLOCK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CHIMECLOCK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("chimeclock-dev")
    } else {
        base_dir.join("chimeclock")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
