use crate::server::{Passthrough, Result, ServerError, ServerRouter, auth::Forwarded};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use classroom_upstream::client::{Upstream, UpstreamClient, UpstreamRequest};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_profile)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile", rejection(ServerError))]
struct ProfilePath();

async fn get_profile(
    ProfilePath(): ProfilePath,
    State(upstream): State<Arc<UpstreamClient>>,
    forwarded: Forwarded,
) -> Result<Passthrough> {
    let response = upstream
        .send(UpstreamRequest::get("/profile"), forwarded.credentials())
        .await
        .map_err(ServerError::unreachable("profile"))?;

    Ok(Passthrough::of(&response, "Unable to load profile"))
}
