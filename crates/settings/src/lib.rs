//! Linkdrop Settings
//!
//! Run configuration for the linkdrop tools.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults
//! 2. JSON settings file
//! 3. Environment (`GAS_BUDGET`, `GAS_TIPS`, `SECRET_KEY`, `OBJECT_TYPE`,
//!    `LIMIT`, `SUI_RPC_URL`, `CONCURRENCY`). Variables missing from the
//!    process environment are taken from a `.env` file when one exists.
//! 4. Command-line flags, applied by the caller
//!
//! The signer secret is only ever read from the environment, the `.env`
//! file or the command line and is never written to the settings file.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use linkdrop_settings::Settings;
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.apply_env_file(Path::new(".env"))?;
//! settings.validate()?;
//!
//! let signer = settings.signer()?;
//! let config = settings.distribution_config();
//! # Ok::<(), linkdrop_settings::SettingsError>(())
//! ```

mod config;

pub use config::{env_var, read_env_file, DistributionSettings, NetworkSettings, Settings};

use std::path::PathBuf;

use linkdrop_crypto::KeyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Failed to read env file: {0}")]
    EnvFileError(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Secret key is not set (SECRET_KEY)")]
    MissingSecretKey,

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(#[from] KeyError),

    #[error("Object type is not set (OBJECT_TYPE)")]
    MissingObjectType,

    #[error("Gas budget must be greater than zero")]
    ZeroGasBudget,

    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Limit {limit} exceeds the maximum of {max} assets per run")]
    LimitTooLarge { limit: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Platform config directory for linkdrop
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linkdrop")
}

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}
