use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use crate::{
    auth::CallerIdentity,
    error::AppError,
    services::relay::{CODE, CONVERSATION, MUSIC, RelayVariant},
    state::SharedState,
};

async fn relay_endpoint(
    variant: &'static RelayVariant,
    state: &SharedState,
    caller: &CallerIdentity,
    body: &[u8],
) -> Result<Json<Value>, AppError> {
    tracing::debug!(variant = variant.name, caller = %caller.0, "relay request");
    variant.relay_json(state, body).await.map(Json)
}

pub async fn code_handler(
    State(state): State<SharedState>,
    caller: CallerIdentity,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    relay_endpoint(&CODE, &state, &caller, &body).await
}

pub async fn conversation_handler(
    State(state): State<SharedState>,
    caller: CallerIdentity,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    relay_endpoint(&CONVERSATION, &state, &caller, &body).await
}

pub async fn music_handler(
    State(state): State<SharedState>,
    caller: CallerIdentity,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    relay_endpoint(&MUSIC, &state, &caller, &body).await
}
