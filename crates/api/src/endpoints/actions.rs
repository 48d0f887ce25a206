//! Reply, boost and favourite on behalf of the session.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use validator::Validate;
use webui_common::AppResult;
use webui_core::Ack;

use crate::{
    extractors::{AuthSession, ValidatedJson},
    middleware::AppState,
};

/// Reply request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    #[validate(length(min = 1))]
    pub id: String,

    #[validate(length(min = 1))]
    pub reply_text: String,
}

/// Boost or favourite request.
#[derive(Debug, Deserialize, Validate)]
pub struct ActionRequest {
    #[validate(length(min = 1))]
    pub id: String,
}

/// Reply publicly to a status.
async fn reply(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<ReplyRequest>,
) -> AppResult<Json<Ack>> {
    let ack = state
        .gateway
        .reply(&session, &req.id, &req.reply_text)
        .await?;
    Ok(Json(ack))
}

/// Boost a status.
async fn boost(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<ActionRequest>,
) -> AppResult<Json<Ack>> {
    Ok(Json(state.gateway.boost(&session, &req.id).await?))
}

/// Favourite a status.
async fn favourite(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<ActionRequest>,
) -> AppResult<Json<Ack>> {
    Ok(Json(state.gateway.favourite(&session, &req.id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reply", post(reply))
        .route("/boost", post(boost))
        .route("/favourite", post(favourite))
}
