//! Route handlers.

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::text::{preview, PREVIEW_CHARS};
use crate::video::VideoRequest;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatRequest {
    message: Option<String>,
    session_id: Option<String>,
}

pub(super) async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body?;
    let message = request
        .message
        .ok_or_else(|| ApiError::BadRequest("No message provided".to_string()))?;

    let reply = state
        .chat
        .post_message(request.session_id.as_deref(), &message)
        .await?;

    Ok(Json(json!({
        "response": reply.message.content,
        "sessionId": reply.session_id,
        "messageId": reply.message.id,
        "timestamp": reply.message.timestamp,
        "status": "success",
    })))
}

pub(super) async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let history = state.chat.get_history(&session_id).await?;
    Ok(Json(json!({ "history": history, "status": "success" })))
}

pub(super) async fn create_session(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let session_id = state.chat.create_session().await?;
    Ok(Json(json!({ "sessionId": session_id, "status": "success" })))
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Content Creation Agency API is running",
    }))
}

#[derive(Deserialize)]
pub(super) struct VideoBody {
    script: Option<String>,
    style: Option<String>,
    duration: Option<String>,
    no_faces: Option<bool>,
    aspect_ratio: Option<String>,
}

pub(super) async fn generate_video(
    State(state): State<AppState>,
    body: Result<Json<VideoBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let script = body
        .script
        .ok_or_else(|| ApiError::BadRequest("No script provided".to_string()))?;

    let mut request = VideoRequest::new(script);
    if let Some(style) = body.style {
        request.style = style;
    }
    if let Some(duration) = body.duration {
        request.duration = duration;
    }
    if let Some(no_faces) = body.no_faces {
        request.no_faces = no_faces;
    }
    if let Some(aspect_ratio) = body.aspect_ratio {
        request.aspect_ratio = aspect_ratio;
    }

    info!(
        "Processing video generation request: {}",
        preview(&request.script, PREVIEW_CHARS)
    );
    let result = state.video.generate(&request).await?;

    Ok(Json(json!({
        "status": "success",
        "video_path": result.video_path,
        "file_size_mb": result.file_size_mb,
        "duration_seconds": result.duration_seconds,
        "aspect_ratio": result.aspect_ratio,
        "message": "Video generated successfully",
        "timestamp": Utc::now(),
    })))
}

pub(super) async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    let tools: Vec<Value> = state
        .tools
        .specs(None)
        .into_iter()
        .map(|spec| json!({ "name": spec.name, "description": spec.description }))
        .collect();
    Json(json!({ "tools": tools, "status": "success" }))
}

/// Tool failures come back as error records with a 200 status.
pub(super) async fn run_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let arguments = String::from_utf8_lossy(&body);
    Json(state.tools.run_raw(&name, &arguments).await.to_value())
}
