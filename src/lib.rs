// Host boundary and in-memory world state
pub mod stub;

// CouchDB-style selector evaluation
pub mod query;

// Record abstraction and the concrete entities
pub mod assets;
pub mod record;

// Record store facade
pub mod contract;

// Transaction execution
pub mod ledger;

// Contract-API dispatch and deployment
pub mod chaincode;

// HTTP invocation API
pub mod api;

// Configuration
pub mod config;
