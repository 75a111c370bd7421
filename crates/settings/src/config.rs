//! Configuration types

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use linkdrop_chain::{ChainConfig, ChainMode, Network};
use linkdrop_crypto::{KeyError, SignerKeypair};
use linkdrop_distributor::{
    DistributionConfig, DEFAULT_CONCURRENCY, DEFAULT_FUNDING_GAS_BUDGET, DEFAULT_GAS_BUDGET,
    DEFAULT_LIMIT, MAX_LIMIT,
};
use linkdrop_link::{LinkOptions, DEFAULT_LINK_HOST};

use crate::{default_settings_path, Result, SettingsError};

/// Environment variables read by [`Settings::apply_env_file`]
pub mod env_var {
    pub const GAS_BUDGET: &str = "GAS_BUDGET";
    pub const GAS_TIPS: &str = "GAS_TIPS";
    pub const SECRET_KEY: &str = "SECRET_KEY";
    pub const OBJECT_TYPE: &str = "OBJECT_TYPE";
    pub const LIMIT: &str = "LIMIT";
    pub const SUI_RPC_URL: &str = "SUI_RPC_URL";
    pub const CONCURRENCY: &str = "CONCURRENCY";
}

/// Main settings structure
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Ledger connection
    #[serde(default)]
    pub network: NetworkSettings,

    /// Pipeline parameters
    #[serde(default)]
    pub distribution: DistributionSettings,

    /// Signer secret, hex (never serialized)
    #[serde(skip)]
    secret_key: Option<String>,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("network", &self.network)
            .field("distribution", &self.distribution)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("config_path", &self.config_path)
            .finish()
    }
}

/// Variables defined in a dotenv file; empty when the file does not exist
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let vars = dotenvy::from_path_iter(path)
        .map_err(|e| SettingsError::EnvFileError(e.to_string()))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()
        .map_err(|e| SettingsError::EnvFileError(e.to_string()))?;
    debug!("Read {} variable(s) from {:?}", vars.len(), path);
    Ok(vars)
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.to_path_buf());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.to_path_buf());
            Ok(settings)
        }
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Overlay values from the process environment, falling back to the
    /// dotenv file at `path` for variables the process does not set.
    /// A missing file is not an error.
    pub fn apply_env_file(&mut self, path: &Path) -> Result<()> {
        let file = read_env_file(path)?;
        self.apply_env_from(|name| std::env::var(name).ok().or_else(|| file.get(name).cloned()))
    }

    /// Overlay values from `lookup`. Unset and blank variables are ignored,
    /// except `SECRET_KEY`, which is taken as given.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(env_var::GAS_BUDGET) {
            self.distribution.gas_budget = parse_env(env_var::GAS_BUDGET, &v)?;
        }
        if let Some(v) = get(env_var::GAS_TIPS) {
            self.distribution.tip_amount = parse_env(env_var::GAS_TIPS, &v)?;
        }
        if let Some(v) = get(env_var::OBJECT_TYPE) {
            self.distribution.object_type = v.trim().to_string();
        }
        if let Some(v) = get(env_var::LIMIT) {
            self.distribution.limit = parse_env(env_var::LIMIT, &v)?;
        }
        if let Some(v) = get(env_var::CONCURRENCY) {
            self.distribution.concurrency = parse_env(env_var::CONCURRENCY, &v)?;
        }
        if let Some(v) = get(env_var::SUI_RPC_URL) {
            self.network.rpc_url = Some(v.trim().to_string());
        }
        if let Some(v) = lookup(env_var::SECRET_KEY) {
            self.secret_key = Some(v);
        }

        debug!("Settings after environment: {:?}", self);
        Ok(())
    }

    pub fn set_secret_key(&mut self, secret_hex: impl Into<String>) {
        self.secret_key = Some(secret_hex.into());
    }

    pub fn has_secret_key(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Decode the signer from the configured secret
    pub fn signer(&self) -> Result<SignerKeypair> {
        let secret = self
            .secret_key
            .as_deref()
            .ok_or(SettingsError::MissingSecretKey)?;
        SignerKeypair::from_hex(secret).map_err(|e| match e {
            KeyError::EmptySecretKey => SettingsError::MissingSecretKey,
            other => SettingsError::InvalidSecretKey(other),
        })
    }

    /// Check everything a run needs before any remote call is made
    pub fn validate(&self) -> Result<()> {
        self.signer()?;
        if self.distribution.object_type.trim().is_empty() {
            return Err(SettingsError::MissingObjectType);
        }
        if self.distribution.gas_budget == 0 {
            return Err(SettingsError::ZeroGasBudget);
        }
        if self.distribution.concurrency == 0 {
            return Err(SettingsError::ZeroConcurrency);
        }
        if self.distribution.limit > MAX_LIMIT {
            return Err(SettingsError::LimitTooLarge {
                limit: self.distribution.limit,
                max: MAX_LIMIT,
            });
        }
        Ok(())
    }

    pub fn chain_config(&self) -> ChainConfig {
        let mut config = match (self.network.mode, &self.network.rpc_url) {
            (ChainMode::Mock, _) => ChainConfig::mock(),
            (ChainMode::Live, Some(url)) => ChainConfig::custom(url.clone()),
            (ChainMode::Live, None) => ChainConfig::for_network(self.network.network),
        };
        config.request_timeout = Duration::from_secs(self.network.request_timeout_secs);
        config
    }

    pub fn distribution_config(&self) -> DistributionConfig {
        let d = &self.distribution;
        DistributionConfig {
            object_type: d.object_type.clone(),
            limit: d.limit,
            gas_budget: d.gas_budget,
            tip_amount: d.tip_amount,
            funding_gas_budget: d.funding_gas_budget,
            concurrency: d.concurrency,
            link_options: LinkOptions::with_host(d.link_host.clone()),
        }
    }
}

/// Ledger connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Mock or live ledger
    #[serde(default)]
    pub mode: ChainMode,

    /// Network whose public full node is used when no RPC URL is set
    #[serde(default)]
    pub network: Network,

    /// Custom full-node endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    60
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            mode: ChainMode::default(),
            network: Network::default(),
            rpc_url: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

/// Distribution run settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSettings {
    /// Type of the assets to hand out
    #[serde(default)]
    pub object_type: String,

    /// Maximum number of assets per run
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Gas budget per claim transaction (MIST)
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,

    /// Native currency bundled into each link (MIST)
    #[serde(default)]
    pub tip_amount: u64,

    /// Gas budget of the funding transaction (MIST)
    #[serde(default = "default_funding_gas_budget")]
    pub funding_gas_budget: u64,

    /// Claim transactions in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Host the generated links point to
    #[serde(default = "default_link_host")]
    pub link_host: String,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_gas_budget() -> u64 {
    DEFAULT_GAS_BUDGET
}

fn default_funding_gas_budget() -> u64 {
    DEFAULT_FUNDING_GAS_BUDGET
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_link_host() -> String {
    DEFAULT_LINK_HOST.to_string()
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            object_type: String::new(),
            limit: default_limit(),
            gas_budget: default_gas_budget(),
            tip_amount: 0,
            funding_gas_budget: default_funding_gas_budget(),
            concurrency: default_concurrency(),
            link_host: default_link_host(),
        }
    }
}
