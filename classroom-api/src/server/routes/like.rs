use crate::server::{
    Passthrough, Result, ServerError, ServerRouter, auth::Forwarded, json::Json,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use classroom_common::model::like::LikeAction;
use classroom_upstream::{client::UpstreamClient, dispatch::dispatch};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(toggle_like)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/like", rejection(ServerError))]
struct LikePath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikePayload {
    status_id: Option<String>,
    action: Option<String>,
}

/// Likes or unlikes a status through whichever upstream route accepts it.
///
/// Whatever the accepting (or rejecting) route answered is passed back.
async fn toggle_like(
    LikePath(): LikePath,
    State(upstream): State<Arc<UpstreamClient>>,
    forwarded: Forwarded,
    Json(payload): Json<LikePayload>,
) -> Result<Passthrough> {
    let action = LikeAction::from_requested(payload.action.as_deref());
    let status_id = payload.status_id.unwrap_or_default();

    let outcome = dispatch(
        upstream.as_ref(),
        action,
        &status_id,
        Some(forwarded.authorization()),
        Some(forwarded.key()),
    )
    .await?;

    Ok(Passthrough {
        status: outcome.status(),
        body: outcome.into_body().into_json(),
    })
}

#[cfg(test)]
mod tests {
    use crate::server::routes::testing::{app, dead_upstream, request, send, spawn_upstream};
    use axum::{
        Json, Router,
        http::{Method, StatusCode, Uri},
        response::{IntoResponse, Response},
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Accepts only `accepted` and records every call it receives.
    fn upstream(seen: Seen, accepted: &'static str, reply: fn() -> Response) -> Router {
        Router::new().fallback(move |method: Method, uri: Uri| {
            let seen = Arc::clone(&seen);
            async move {
                let call = format!("{method} {}", uri.path());
                seen.lock().unwrap().push(call.clone());

                if call == accepted {
                    reply()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            }
        })
    }

    fn liked() -> Response {
        Json(json!({"data": {"liked": true}})).into_response()
    }

    #[tokio::test]
    async fn falls_back_until_a_route_accepts() {
        let seen = Seen::default();
        let base = spawn_upstream(upstream(
            Arc::clone(&seen),
            "POST /status/abc123/like",
            liked,
        ))
        .await;

        let (status, body) = send(
            app(&base, Some("key-1")),
            request("POST", "/like", Some("tok"), Some(r#"{"statusId": " abc123 "}"#)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"data": {"liked": true}}));
        assert_eq!(
            *seen.lock().unwrap(),
            ["POST /status/like", "POST /like", "POST /status/abc123/like"]
        );
    }

    #[tokio::test]
    async fn unlike_reaches_the_toggle_route() {
        let seen = Seen::default();
        let base = spawn_upstream(upstream(Arc::clone(&seen), "POST /status/like", || {
            StatusCode::NO_CONTENT.into_response()
        }))
        .await;

        let (status, body) = send(
            app(&base, Some("key-1")),
            request(
                "POST",
                "/like",
                Some("tok"),
                Some(r#"{"statusId": "abc123", "action": "unlike"}"#),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, json!(null));
        assert_eq!(seen.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn hard_failures_pass_through() {
        let seen = Seen::default();
        let base = spawn_upstream(upstream(Arc::clone(&seen), "POST /status/like", || {
            (StatusCode::CONFLICT, "Already liked").into_response()
        }))
        .await;

        let (status, body) = send(
            app(&base, Some("key-1")),
            request("POST", "/like", Some("tok"), Some(r#"{"statusId": "abc123"}"#)),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"message": "Already liked"}));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_candidates() {
        let seen = Seen::default();
        let base = spawn_upstream(upstream(Arc::clone(&seen), "", liked)).await;

        let (status, body) = send(
            app(&base, Some("key-1")),
            request(
                "POST",
                "/like",
                Some("tok"),
                Some(r#"{"statusId": "abc123", "action": "unlike"}"#),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "All unlike endpoints failed"}));
    }

    #[tokio::test]
    async fn status_id_is_required() {
        let base = dead_upstream().await;

        for payload in [r#"{"action": "like"}"#, r#"{"statusId": "   "}"#] {
            let (status, body) = send(
                app(&base, Some("key-1")),
                request("POST", "/like", Some("tok"), Some(payload)),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "statusId is required"}));
        }
    }

    #[tokio::test]
    async fn unreachable_upstream() {
        let base = dead_upstream().await;

        let (status, body) = send(
            app(&base, Some("key-1")),
            request("POST", "/like", Some("tok"), Some(r#"{"statusId": "abc123"}"#)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "Unable to reach like service"}));
    }

    #[tokio::test]
    async fn missing_key() {
        let base = dead_upstream().await;

        let (status, body) = send(
            app(&base, None),
            request("POST", "/like", Some("tok"), Some(r#"{"statusId": "abc123"}"#)),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Server missing CLASSROOM_API_KEY environment variable"})
        );
    }
}
