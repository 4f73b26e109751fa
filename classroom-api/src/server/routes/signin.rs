use crate::server::{
    Passthrough, Result, ServerError, ServerRouter, auth::ServerKey, json::Json,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use classroom_common::model::auth::SignInCredentials;
use classroom_upstream::client::{Upstream, UpstreamClient, UpstreamRequest};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(sign_in)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/signin", rejection(ServerError))]
struct SignInPath();

/// Exchanges email and password for a token. No bearer token is sent.
async fn sign_in(
    SignInPath(): SignInPath,
    State(upstream): State<Arc<UpstreamClient>>,
    key: ServerKey,
    Json(credentials): Json<SignInCredentials>,
) -> Result<Passthrough> {
    let payload = serde_json::to_value(&credentials)?;
    let response = upstream
        .send(UpstreamRequest::post("/signin", payload), key.credentials())
        .await
        .map_err(ServerError::unreachable("sign-in"))?;

    Ok(Passthrough::of(&response, "Sign in failed"))
}
