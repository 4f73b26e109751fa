use crate::server::{
    Passthrough, Result, ServerError, ServerRouter,
    auth::{Forwarded, ServerKey},
};
use axum::extract::{Query, State, rejection::QueryRejection};
use axum_extra::routing::{RouterExt, TypedPath};
use classroom_upstream::client::{Upstream, UpstreamClient, UpstreamRequest, path_segment};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_classmates)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/classmates", rejection(ServerError))]
struct ClassmatesPath();

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct ClassmatesQuery {
    year: Option<String>,
}

// The year is checked before the bearer token, so `ServerKey` goes first.
async fn get_classmates(
    ClassmatesPath(): ClassmatesPath,
    State(upstream): State<Arc<UpstreamClient>>,
    _key: ServerKey,
    query: Result<Query<ClassmatesQuery>, QueryRejection>,
    forwarded: Forwarded,
) -> Result<Passthrough> {
    let Query(query) = query?;
    let year = query
        .year
        .filter(|year| !year.is_empty())
        .ok_or(ServerError::MissingYear)?;

    let path = format!("/class/{}", path_segment(&year));
    let response = upstream
        .send(UpstreamRequest::get(path), forwarded.credentials())
        .await
        .map_err(ServerError::unreachable("classmates"))?;

    Ok(Passthrough::of(&response, "Unable to load classmates"))
}
