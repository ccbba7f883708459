use super::Chaincode;
use crate::assets::{Car, Model, Product, Stock};
use crate::contract::{ContractError, RecordContract};
use crate::ledger::{Ledger, Receipt};
use crate::stub::StateDatabase;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Names accepted by [`ChaincodeRegistry::with_record_contracts`]
pub const RECORD_CONTRACTS: [&str; 4] = ["product", "car", "stock", "model"];

/// A chaincode bound to its own ledger namespace
struct Deployment {
    chaincode: Box<dyn Chaincode>,
    ledger: Ledger,
}

/// Deployed chaincode summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaincodeInfo {
    pub name: String,
    pub functions: Vec<String>,
}

/// Deployed chaincodes, keyed by name
pub struct ChaincodeRegistry {
    deployments: DashMap<String, Arc<Deployment>>,
}

impl ChaincodeRegistry {
    pub fn new() -> Self {
        Self {
            deployments: DashMap::new(),
        }
    }

    /// Deploys each named record contract on its own ledger
    pub fn with_record_contracts<S: AsRef<str>>(
        names: &[S],
        database: StateDatabase,
    ) -> anyhow::Result<Self> {
        let registry = Self::new();
        for name in names {
            let chaincode: Box<dyn Chaincode> = match name.as_ref() {
                "product" => Box::new(RecordContract::<Product>::new()),
                "car" => Box::new(RecordContract::<Car>::new()),
                "stock" => Box::new(RecordContract::<Stock>::new()),
                "model" => Box::new(RecordContract::<Model>::new()),
                other => anyhow::bail!(
                    "Unknown chaincode '{}' (expected one of: {})",
                    other,
                    RECORD_CONTRACTS.join(", ")
                ),
            };
            registry.deploy(chaincode, database)?;
        }
        Ok(registry)
    }

    /// Deploys a chaincode under its own name on a fresh ledger
    pub fn deploy(
        &self,
        chaincode: Box<dyn Chaincode>,
        database: StateDatabase,
    ) -> Result<(), DeployError> {
        let name = chaincode.name().to_string();
        if self.deployments.contains_key(&name) {
            return Err(DeployError::AlreadyDeployed(name));
        }

        let deployment = Deployment {
            ledger: Ledger::new(name.clone(), database),
            chaincode,
        };
        self.deployments.insert(name.clone(), Arc::new(deployment));

        info!(chaincode = %name, state_database = %database, "Chaincode deployed");
        Ok(())
    }

    /// Invokes `function` and commits its writes on success
    pub fn submit(
        &self,
        name: &str,
        function: &str,
        args: &[String],
    ) -> Result<Receipt<Value>, InvokeError> {
        let deployment = self.lookup(name)?;
        let receipt = deployment
            .ledger
            .submit(|ctx| deployment.chaincode.invoke(ctx, function, args))?;
        Ok(receipt)
    }

    /// Invokes `function` without committing anything
    pub fn evaluate(
        &self,
        name: &str,
        function: &str,
        args: &[String],
    ) -> Result<Receipt<Value>, InvokeError> {
        let deployment = self.lookup(name)?;
        let receipt = deployment
            .ledger
            .evaluate(|ctx| deployment.chaincode.invoke(ctx, function, args))?;
        Ok(receipt)
    }

    /// Deployed chaincodes sorted by name
    pub fn list(&self) -> Vec<ChaincodeInfo> {
        let mut infos: Vec<ChaincodeInfo> = self
            .deployments
            .iter()
            .map(|entry| ChaincodeInfo {
                name: entry.key().clone(),
                functions: entry.value().chaincode.functions(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn names(&self) -> Vec<String> {
        self.list().into_iter().map(|info| info.name).collect()
    }

    /// Number of committed keys in a chaincode's world state
    pub fn state_len(&self, name: &str) -> Option<usize> {
        self.deployments
            .get(name)
            .map(|d| d.ledger.world_state().len())
    }

    // Clones the Arc so the map shard lock is not held during invocation
    fn lookup(&self, name: &str) -> Result<Arc<Deployment>, InvokeError> {
        self.deployments
            .get(name)
            .map(|d| Arc::clone(d.value()))
            .ok_or_else(|| InvokeError::UnknownChaincode(name.to_string()))
    }
}

impl Default for ChaincodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deployment errors
#[derive(Debug, Clone, PartialEq)]
pub enum DeployError {
    AlreadyDeployed(String),
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::AlreadyDeployed(name) => {
                write!(f, "Chaincode {} is already deployed", name)
            }
        }
    }
}

impl std::error::Error for DeployError {}

/// Invocation errors
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeError {
    UnknownChaincode(String),
    Contract(ContractError),
}

impl From<ContractError> for InvokeError {
    fn from(e: ContractError) -> Self {
        InvokeError::Contract(e)
    }
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::UnknownChaincode(name) => write!(f, "Chaincode {} not found", name),
            InvokeError::Contract(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for InvokeError {}
