// File: keyledger-server/src/api.rs

use std::sync::Arc;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

use keyledger_common::error::Error;
use keyledger_core::services::{CredentialService, PurchaseService, RedemptionService};

#[derive(Clone)]
pub struct ApiState {
    pub credentials: Arc<CredentialService>,
    pub purchases: Arc<PurchaseService>,
    pub redemptions: Arc<RedemptionService>,
}

/// One variant per operation. Adding an action means adding a variant and
/// the compiler walks you through every match that needs to learn it.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApiCommand {
    ValidateAdmin { key: String },
    MintCode { admin_key: String },
    RedeemCode { user_id: String, code: String },
    ApprovePurchase { admin_key: String, purchase_id: String },
    RejectPurchase { admin_key: String, purchase_id: String, reason: String },
    ListPending { admin_key: String },
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api", post(handle_command))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handle_command(
    State(state): State<ApiState>,
    Json(cmd): Json<ApiCommand>,
) -> (StatusCode, Json<Value>) {
    match dispatch(&state, cmd).await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => error_response(e),
    }
}

async fn dispatch(state: &ApiState, cmd: ApiCommand) -> Result<Value, Error> {
    match cmd {
        ApiCommand::ValidateAdmin { key } => {
            let valid = state.credentials.validate(&key).await?;
            Ok(json!({ "valid": valid }))
        }
        ApiCommand::MintCode { admin_key } => {
            let code = state.redemptions.mint(&admin_key).await?;
            Ok(json!({ "code": code.code }))
        }
        ApiCommand::RedeemCode { user_id, code } => {
            let replacement = state.redemptions.redeem(&code, &user_id).await?;
            Ok(json!({ "success": true, "replacement_code": replacement }))
        }
        ApiCommand::ApprovePurchase { admin_key, purchase_id } => {
            let approval = state.purchases.approve(&purchase_id, &admin_key).await?;
            Ok(json!({ "code": approval.code, "notify_text": approval.notify_text }))
        }
        ApiCommand::RejectPurchase { admin_key, purchase_id, reason } => {
            let notify_text = state
                .purchases
                .reject(&purchase_id, &admin_key, &reason)
                .await?;
            Ok(json!({ "notify_text": notify_text }))
        }
        ApiCommand::ListPending { admin_key } => {
            let purchases = state.purchases.list_pending(&admin_key).await?;
            Ok(json!({ "purchases": purchases }))
        }
    }
}

/// Domain failures map to distinct statuses; anything infrastructural is
/// collapsed into a generic retryable message so store internals never
/// reach the caller.
fn error_response(err: Error) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        Error::Unauthorized => (StatusCode::FORBIDDEN, err.to_string()),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        Error::AlreadyRedeemed(_) | Error::AlreadyValidated(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        _ => {
            warn!("internal error serving api request: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "transient storage failure; retry later".to_string(),
            )
        }
    };
    (status, Json(json!({ "error": message })))
}
