use crate::{
    body::ParsedBody,
    config::{API_KEY_HEADER, ApiKey, BaseUrl, UpstreamConfig},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{
    Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL},
};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = UpstreamError> = std::result::Result<T, E>;

/// Characters left alone when embedding a value in a path, matching what
/// browsers leave alone in `encodeURIComponent`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[must_use]
pub fn path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Could not build the upstream HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("Upstream could not be reached: {0}")]
    Unreachable(#[source] reqwest::Error),
}

/// Headers that authenticate a request against the upstream.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Credentials<'a> {
    /// Forwarded verbatim, e.g. `Bearer abc`. Sign-in requests have none.
    pub authorization: Option<&'a str>,
    pub api_key: &'a ApiKey,
}

#[derive(Clone, PartialEq, Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path below the base URL, already percent-encoded.
    pub path: String,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    #[must_use]
    pub fn parsed(&self) -> ParsedBody {
        ParsedBody::decode(&self.body)
    }
}

/// Something that can carry a request to the upstream classroom service.
///
/// An `Err` means the upstream was not reached at all. Every HTTP status,
/// including errors, comes back as `Ok`.
pub trait Upstream {
    fn send(
        &self,
        request: UpstreamRequest,
        credentials: Credentials<'_>,
    ) -> impl Future<Output = Result<UpstreamResponse>> + Send;
}

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: BaseUrl,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().map_err(UpstreamError::Build)?,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }
}

impl Upstream for UpstreamClient {
    async fn send(
        &self,
        request: UpstreamRequest,
        credentials: Credentials<'_>,
    ) -> Result<UpstreamResponse> {
        let url = self.base_url.join(&request.path);
        debug!(method = %request.method, %url, "Calling upstream");

        let mut builder = self
            .http
            .request(request.method, url)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .header(API_KEY_HEADER, credentials.api_key.get());

        if let Some(authorization) = credentials.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(UpstreamError::Unreachable)?;
        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::Unreachable)?;

        debug!(%status, "Upstream replied");

        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{
            Credentials, Upstream, UpstreamClient, UpstreamError, UpstreamRequest, path_segment,
        },
        config::{ApiKey, BaseUrl, UpstreamConfig},
    };
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::any,
    };
    use serde_json::{Value, json};

    /// Echoes the interesting request headers and body back as JSON.
    async fn echo(headers: HeaderMap, body: String) -> Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .map(|value| value.to_str().unwrap().to_owned())
        };

        Json(json!({
            "accept": header("accept"),
            "authorization": header("authorization"),
            "apiKey": header("x-api-key"),
            "contentType": header("content-type"),
            "body": body,
        }))
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{address}")
    }

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig {
            base_url: BaseUrl::parse(base).unwrap(),
            api_key: None,
            timeout: None,
        })
        .unwrap()
    }

    #[test]
    fn path_segments_are_encoded_like_uri_components() {
        assert_eq!(path_segment("abc123"), "abc123");
        assert_eq!(path_segment("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(path_segment("it's-(ok)_~.*!"), "it's-(ok)_~.*!");
        assert_eq!(path_segment("ก"), "%E0%B8%81");
    }

    #[tokio::test]
    async fn sends_credentials_and_json_body() {
        let base = spawn(Router::new().route("/status", any(echo))).await;
        let key = ApiKey::new("key-1").unwrap();
        let credentials = Credentials {
            authorization: Some("Bearer tok"),
            api_key: &key,
        };

        let response = client(&base)
            .send(UpstreamRequest::post("/status", json!({"content": "hi"})), credentials)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let echoed: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(echoed["accept"], "application/json");
        assert_eq!(echoed["authorization"], "Bearer tok");
        assert_eq!(echoed["apiKey"], "key-1");
        assert_eq!(echoed["contentType"], "application/json");
        assert_eq!(echoed["body"], r#"{"content":"hi"}"#);
    }

    #[tokio::test]
    async fn bodiless_requests_have_no_content_type() {
        let base = spawn(Router::new().route("/profile", any(echo))).await;
        let key = ApiKey::new("key-1").unwrap();
        let credentials = Credentials {
            authorization: None,
            api_key: &key,
        };

        let response = client(&base)
            .send(UpstreamRequest::get("/profile"), credentials)
            .await
            .unwrap();

        let echoed: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(echoed["authorization"], Value::Null);
        assert_eq!(echoed["contentType"], Value::Null);
        assert_eq!(echoed["body"], "");
    }

    #[tokio::test]
    async fn error_statuses_are_responses() {
        let base = spawn(Router::new().route(
            "/missing",
            any(|| async { (StatusCode::CONFLICT, "already liked") }),
        ))
        .await;
        let key = ApiKey::new("key-1").unwrap();
        let credentials = Credentials {
            authorization: None,
            api_key: &key,
        };

        let response = client(&base)
            .send(UpstreamRequest::get("/missing"), credentials)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body, "already liked");
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let key = ApiKey::new("key-1").unwrap();
        let credentials = Credentials {
            authorization: None,
            api_key: &key,
        };

        let result = client(&format!("http://{address}"))
            .send(UpstreamRequest::get("/profile"), credentials)
            .await;

        assert!(matches!(result, Err(UpstreamError::Unreachable(_))));
    }
}
