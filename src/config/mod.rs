use crate::stub::StateDatabase;
use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

/// Complete chaincode host configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChaincodeConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chaincodes: ChaincodesConfig,
}

/// Ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// State database flavour: "couchdb" answers rich queries, "goleveldb" does not
    #[serde(default)]
    pub state_database: StateDatabase,
    /// Run InitLedger on every deployed chaincode at startup
    #[serde(default = "default_seed_on_start")]
    pub seed_on_start: bool,
}

fn default_seed_on_start() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            state_database: StateDatabase::default(),
            seed_on_start: default_seed_on_start(),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Largest accepted invocation body
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7052".to_string()
}

fn default_body_limit_bytes() -> usize {
    1_048_576 // 1 MB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

/// Which record contracts to deploy
#[derive(Debug, Clone, Deserialize)]
pub struct ChaincodesConfig {
    #[serde(default = "default_deployed")]
    pub deployed: Vec<String>,
}

fn default_deployed() -> Vec<String> {
    crate::chaincode::RECORD_CONTRACTS
        .iter()
        .map(|name| name.to_string())
        .collect()
}

impl Default for ChaincodesConfig {
    fn default() -> Self {
        Self {
            deployed: default_deployed(),
        }
    }
}

impl ChaincodeConfig {
    /// Apply CHAINCODE_* overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply CHAINCODE_* overrides from `lookup`; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CHAINCODE_STATE_DATABASE") {
            match v.parse::<StateDatabase>() {
                Ok(db) => self.ledger.state_database = db,
                Err(e) => warn!(value = %v, error = %e, "Ignoring CHAINCODE_STATE_DATABASE"),
            }
        }
        if let Some(v) = lookup("CHAINCODE_BIND_ADDR") {
            self.api.bind_addr = v;
        }
        if let Some(v) = lookup("CHAINCODE_SEED") {
            match v.parse::<bool>() {
                Ok(b) => self.ledger.seed_on_start = b,
                Err(_) => warn!(value = %v, "Ignoring CHAINCODE_SEED"),
            }
        }
        if let Some(v) = lookup("CHAINCODE_BODY_LIMIT_BYTES") {
            match v.parse::<usize>() {
                Ok(n) => self.api.body_limit_bytes = n,
                Err(_) => warn!(value = %v, "Ignoring CHAINCODE_BODY_LIMIT_BYTES"),
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<ChaincodeConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
    let config: ChaincodeConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config {}", path))?;
    Ok(config)
}
