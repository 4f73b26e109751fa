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
    ServerRouter::new()
        .typed_get(list_statuses)
        .typed_post(create_status)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/status", rejection(ServerError))]
struct StatusPath();

async fn list_statuses(
    StatusPath(): StatusPath,
    State(upstream): State<Arc<UpstreamClient>>,
    forwarded: Forwarded,
) -> Result<Passthrough> {
    let response = upstream
        .send(UpstreamRequest::get("/status"), forwarded.credentials())
        .await
        .map_err(ServerError::unreachable("status"))?;

    Ok(Passthrough::of(&response, "Unable to load statuses"))
}

async fn create_status(
    StatusPath(): StatusPath,
    State(upstream): State<Arc<UpstreamClient>>,
    forwarded: Forwarded,
    Json(payload): Json<Value>,
) -> Result<Passthrough> {
    let response = upstream
        .send(UpstreamRequest::post("/status", payload), forwarded.credentials())
        .await
        .map_err(ServerError::unreachable("status"))?;

    Ok(Passthrough::of(&response, "Unable to create status"))
}
