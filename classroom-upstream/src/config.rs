use reqwest::Url;
use std::{
    fmt::{Debug, Display, Formatter},
    time::Duration,
};
use thiserror::Error;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_BASE_URL: &str = "https://cis.kku.ac.th/api/classroom";

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The upstream base URL is not a valid http(s) URL: {0}")]
pub struct InvalidBaseUrlError(String);

/// The server-held key sent to the upstream with every request.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for a blank key, which counts as not configured.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        (!key.trim().is_empty()).then_some(Self(key))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&"[redacted]").finish()
    }
}

/// Upstream base path without a trailing slash.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn parse(base: &str) -> Result<Self, InvalidBaseUrlError> {
        let trimmed = base.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|_| InvalidBaseUrlError(base.to_owned()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidBaseUrlError(base.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    /// Joins an already encoded path such as `/status/abc/like`.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}{path}", self.0)
    }
}

impl Display for BaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Process-wide upstream settings, built once at startup.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UpstreamConfig {
    pub base_url: BaseUrl,
    pub api_key: Option<ApiKey>,
    pub timeout: Option<Duration>,
}
