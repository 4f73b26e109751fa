use crate::server::{
    Passthrough, Result, ServerError, ServerRouter, auth::Forwarded, json::Json,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use classroom_upstream::client::{Upstream, UpstreamClient, UpstreamRequest};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(create_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comment", rejection(ServerError))]
struct CommentPath();

async fn create_comment(
    CommentPath(): CommentPath,
    State(upstream): State<Arc<UpstreamClient>>,
    forwarded: Forwarded,
    Json(payload): Json<Value>,
) -> Result<Passthrough> {
    let response = upstream
        .send(UpstreamRequest::post("/comment", payload), forwarded.credentials())
        .await
        .map_err(ServerError::unreachable("comment"))?;

    Ok(Passthrough::of(&response, "Unable to create comment"))
}
