use crate::chaincode::{ChaincodeInfo, ChaincodeRegistry, InvokeError};
use crate::contract::ContractError;
use crate::ledger::Receipt;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the invocation API
pub struct InvokeAppState {
    pub registry: Arc<ChaincodeRegistry>,
    pub body_limit_bytes: usize,
}

/// Invocation request body
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Invocation response body
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    #[serde(rename = "txId")]
    pub tx_id: String,
    pub result: Value,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create invocation API router
pub fn create_invoke_router(state: Arc<InvokeAppState>) -> Router {
    let body_limit = state.body_limit_bytes;
    Router::new()
        .route("/api/chaincodes", get(list_chaincodes))
        .route("/api/chaincodes/:name/submit", post(submit))
        .route("/api/chaincodes/:name/evaluate", post(evaluate))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// GET /api/chaincodes - Deployed chaincodes and their functions
async fn list_chaincodes(State(state): State<Arc<InvokeAppState>>) -> Json<Vec<ChaincodeInfo>> {
    Json(state.registry.list())
}

/// POST /api/chaincodes/:name/submit - Invoke and commit
async fn submit(
    State(state): State<Arc<InvokeAppState>>,
    Path(name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let request = parse_request(body)?;
    info!(chaincode = %name, function = %request.function, "Submitting transaction");

    let receipt = state
        .registry
        .submit(&name, &request.function, &request.args)?;
    Ok(Json(receipt.into()))
}

/// POST /api/chaincodes/:name/evaluate - Invoke without committing
async fn evaluate(
    State(state): State<Arc<InvokeAppState>>,
    Path(name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let request = parse_request(body)?;

    let receipt = state
        .registry
        .evaluate(&name, &request.function, &request.args)?;
    Ok(Json(receipt.into()))
}

fn parse_request(body: Result<Bytes, BytesRejection>) -> Result<InvokeRequest, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

impl From<Receipt<Value>> for InvokeResponse {
    fn from(receipt: Receipt<Value>) -> Self {
        Self {
            tx_id: receipt.tx_id,
            result: receipt.value,
        }
    }
}

/// Invocation API error types
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    PayloadTooLarge,
    Invoke(InvokeError),
}

impl From<InvokeError> for ApiError {
    fn from(e: InvokeError) -> Self {
        ApiError::Invoke(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
            }
            ApiError::Invoke(e) => {
                let status = invoke_status(&e);
                if status.is_server_error() {
                    error!(error = %e, "Chaincode invocation failed");
                }
                (status, e.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

fn invoke_status(e: &InvokeError) -> StatusCode {
    match e {
        InvokeError::UnknownChaincode(_) => StatusCode::NOT_FOUND,
        InvokeError::Contract(e) => match e {
            ContractError::NotFound { .. } => StatusCode::NOT_FOUND,
            ContractError::AlreadyExists { .. } => StatusCode::CONFLICT,
            ContractError::InvalidCount { .. }
            | ContractError::InsufficientCount { .. }
            | ContractError::InvalidArgument(_)
            | ContractError::UnknownFunction { .. } => StatusCode::BAD_REQUEST,
            ContractError::StorageRead(_)
            | ContractError::StorageWrite(_)
            | ContractError::StorageDelete(_)
            | ContractError::Serialization { .. }
            | ContractError::Deserialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}
