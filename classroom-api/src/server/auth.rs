use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use classroom_upstream::{client::Credentials, config::ApiKey, config::UpstreamConfig};
use headers::{Authorization, authorization::Bearer};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The configured upstream API key. Rejects with a 500 when none is set.
#[derive(Clone, Debug)]
pub struct ServerKey(pub ApiKey);

impl ServerKey {
    #[must_use]
    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            authorization: None,
            api_key: &self.0,
        }
    }
}

impl<S> FromRequestParts<S> for ServerKey
where
    Arc<UpstreamConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Arc::<UpstreamConfig>::from_ref(state)
            .api_key
            .clone()
            .map(Self)
            .ok_or(ServerError::MissingApiKey)
    }
}

/// A browser request allowed through to the upstream: the server key plus
/// the caller's bearer token.
///
/// The key is checked before the header, so a misconfigured server answers
/// 500 even to anonymous callers.
#[derive(Clone)]
pub struct Forwarded {
    key: ServerKey,
    authorization: String,
}

impl Forwarded {
    #[must_use]
    pub fn key(&self) -> &ApiKey {
        &self.key.0
    }

    #[must_use]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            authorization: Some(&self.authorization),
            api_key: &self.key.0,
        }
    }
}

impl Debug for Forwarded {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarded")
            .field("key", &self.key)
            .field("authorization", &"[redacted]")
            .finish()
    }
}

impl<S> FromRequestParts<S> for Forwarded
where
    Arc<UpstreamConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = ServerKey::from_request_parts(parts, state).await?;

        let TypedHeader(Authorization(bearer)) =
            AuthorizationHeader::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        ServerError::MissingAuthorization
                    } else {
                        ServerError::InvalidAuthorization
                    }
                })?;

        Ok(Self {
            key,
            authorization: format!("Bearer {}", bearer.token()),
        })
    }
}
