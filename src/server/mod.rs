//! HTTP side: the registration handler and a completion proxy that keeps the
//! model API key on the server.

pub mod config;
pub mod error;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};

use crate::api::client::ApiClient;
use crate::register::{self, SignUpForm};
use crate::storage::UserStore;

use self::error::ServerError;

pub struct ServerState {
    pub store: UserStore,
    pub upstream: ApiClient,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register_user))
        .route("/v1/chat/completions", post(proxy_completion))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn register_user(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<SignUpForm>,
) -> Result<&'static str, ServerError> {
    log::info!("registration request for {}", form.email.trim());
    tokio::task::spawn_blocking(move || register::register(&state.store, &form))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok(register::MSG_OK)
}

/// Forwards the JSON body upstream untouched, with the server's key, and
/// relays the JSON answer.
async fn proxy_completion(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<Value>,
) -> Result<Json<Value>, ServerError> {
    log::debug!("proxying completion for model {}", request["model"]);
    Ok(Json(state.upstream.send(&request).await?))
}
