//! Trigger endpoint and health probe.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::Settings;
use crate::rpc::Ledger;
use crate::sweep::SweepRunner;

/// Shared-secret header checked by exact match before any orchestrator call.
pub const AUTH_HEADER: &str = "x-sweep-auth";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub runner: Arc<SweepRunner>,
    pub ledger: Arc<dyn Ledger>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sweep", post(trigger_sweep))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn trigger_sweep(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers, &state.settings.auth_secret) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized"})),
        );
    }

    info!("[API] sweep triggered");
    match state.runner.run().await {
        Ok(result) => {
            let body = serde_json::to_value(&result)
                .unwrap_or_else(|e| json!({"error": format!("result serialization: {e}")}));
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            error!("[API] sweep run failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("{e:#}")})),
            )
        }
    }
}

/// Read-only report of the current balance and configuration; no side
/// effects and no auth.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.ledger.get_balance(&state.settings.wallet_address).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(json!({
                "wallet": state.settings.wallet_address.to_string(),
                "sol_balance_lamports": balance,
                "target_mint": state.settings.target_mint.to_string(),
                "sol_threshold_lamports": state.settings.sol_threshold_lamports,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("{e:#}")})),
        ),
    }
}

fn authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == secret)
        .unwrap_or(false)
}
