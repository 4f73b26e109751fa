use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use classroom_upstream::{
    client::{UpstreamClient, UpstreamError, UpstreamResponse},
    config::UpstreamConfig,
    dispatch::LikeError,
};
use json::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod auth;
mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

/// Attributes for the session cookie.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub upstream: Arc<UpstreamClient>,
    pub config: Arc<UpstreamConfig>,
    pub cookies: CookieSettings,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Invalid JSON body")]
    JsonRejection(#[from] JsonRejection),
    #[error("Invalid query string")]
    QueryRejection(#[from] QueryRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Server missing CLASSROOM_API_KEY environment variable")]
    MissingApiKey,
    #[error("Missing Authorization header")]
    MissingAuthorization,
    #[error("Invalid Authorization header")]
    InvalidAuthorization,
    #[error("Missing enrollment year")]
    MissingYear,
    #[error("Token is required")]
    MissingToken,
    #[error("Unable to reach {service} service")]
    Unreachable {
        service: &'static str,
        #[source]
        source: UpstreamError,
    },
    #[error(transparent)]
    Like(#[from] LikeError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => StatusCode::NOT_FOUND,
            ServerError::JsonRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::MissingYear
            | ServerError::MissingToken => StatusCode::BAD_REQUEST,
            ServerError::MissingAuthorization | ServerError::InvalidAuthorization => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::JsonResponse(_) | ServerError::MissingApiKey => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            ServerError::Like(like) => like.status(),
        }
    }

    /// Wraps a transport failure for the named upstream service.
    pub fn unreachable(service: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| ServerError::Unreachable { service, source }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, details = ?self, %status, "Replying with error");

        let error_response = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}

/// An upstream reply handed back to the browser with its own status.
#[derive(Clone, PartialEq, Debug)]
pub struct Passthrough {
    pub status: StatusCode,
    pub body: Value,
}

impl Passthrough {
    /// Error replies with an empty body get `{"error": fallback}` instead.
    pub fn of(response: &UpstreamResponse, fallback: &str) -> Self {
        let body = response.parsed();
        let body = if response.status.is_success() {
            body.into_json()
        } else {
            body.into_json_or_error(fallback)
        };

        Self {
            status: response.status,
            body,
        }
    }
}

impl IntoResponse for Passthrough {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{
        Passthrough,
        routes::testing::{app, dead_upstream, request, send},
    };
    use axum::http::StatusCode;
    use classroom_upstream::client::UpstreamResponse;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_routes() {
        let base = dead_upstream().await;

        let (status, body) = send(
            app(&base, Some("key-1")),
            request("GET", "/nope", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Unknown route requested: /nope"}));
    }

    #[test]
    fn passthrough_fallbacks_apply_to_empty_errors_only() {
        let reply = |status, body: &str| UpstreamResponse {
            status,
            body: body.to_owned(),
        };

        let ok = Passthrough::of(&reply(StatusCode::OK, ""), "Unable to load statuses");
        assert_eq!(ok.body, json!(null));

        let failed = Passthrough::of(
            &reply(StatusCode::BAD_REQUEST, ""),
            "Unable to load statuses",
        );
        assert_eq!(failed.status, StatusCode::BAD_REQUEST);
        assert_eq!(failed.body, json!({"error": "Unable to load statuses"}));

        let text = Passthrough::of(&reply(StatusCode::BAD_GATEWAY, "upstream down"), "x");
        assert_eq!(text.body, json!({"message": "upstream down"}));
    }
}
