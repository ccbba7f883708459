use crate::stub::StubError;
use std::fmt;

/// Errors surfaced to the caller of a contract function
#[derive(Debug, Clone, PartialEq)]
pub enum ContractError {
    StorageRead(StubError),
    StorageWrite(StubError),
    StorageDelete(StubError),
    NotFound { kind: &'static str, id: String },
    AlreadyExists { kind: &'static str, id: String },
    /// Count delta was zero or negative
    InvalidCount { delta: i64 },
    /// Pop would take the count below zero
    InsufficientCount { current: i64, requested: i64 },
    InvalidArgument(String),
    UnknownFunction { contract: String, function: String },
    Serialization { kind: &'static str, id: String, reason: String },
    Deserialization { kind: &'static str, reason: String },
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::StorageRead(e) => write!(f, "Failed to read from world state: {}", e),
            ContractError::StorageWrite(e) => write!(f, "Failed to put to world state. {}", e),
            ContractError::StorageDelete(e) => {
                write!(f, "Failed to delete from world state. {}", e)
            }
            ContractError::NotFound { kind, id } => write!(f, "The {} {} does not exist", kind, id),
            ContractError::AlreadyExists { kind, id } => {
                write!(f, "The {} {} already exists", kind, id)
            }
            ContractError::InvalidCount { delta } => {
                write!(f, "Invalid count. {} must be greater than 0", delta)
            }
            ContractError::InsufficientCount { current, requested } => {
                write!(f, "Not enough count. {} < {}", current, requested)
            }
            ContractError::InvalidArgument(msg) => write!(f, "{}", msg),
            ContractError::UnknownFunction { contract, function } => {
                write!(f, "Function {} not found in contract {}", function, contract)
            }
            ContractError::Serialization { kind, id, reason } => {
                write!(f, "Failed to serialize {} {}: {}", kind, id, reason)
            }
            ContractError::Deserialization { kind, reason } => {
                write!(f, "Failed to deserialize {}: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for ContractError {}

impl ContractError {
    /// Short machine-readable category, used in logs and API responses
    pub fn category(&self) -> &'static str {
        match self {
            ContractError::StorageRead(_) => "storage_read",
            ContractError::StorageWrite(_) => "storage_write",
            ContractError::StorageDelete(_) => "storage_delete",
            ContractError::NotFound { .. } => "not_found",
            ContractError::AlreadyExists { .. } => "already_exists",
            ContractError::InvalidCount { .. } | ContractError::InsufficientCount { .. } => {
                "invalid_count"
            }
            ContractError::InvalidArgument(_) => "invalid_argument",
            ContractError::UnknownFunction { .. } => "unknown_function",
            ContractError::Serialization { .. } => "serialization",
            ContractError::Deserialization { .. } => "deserialization",
        }
    }
}
