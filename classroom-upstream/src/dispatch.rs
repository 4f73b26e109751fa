//! Walks the like/unlike candidates until the upstream accepts one.

use crate::{
    body::ParsedBody,
    client::{Credentials, Upstream, UpstreamError},
    config::ApiKey,
    like::{EndpointCandidate, plan},
};
use classroom_common::model::{Id, like::LikeAction, status::StatusMarker};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Statuses meaning the route shape does not exist on this upstream.
pub const SOFT_FAILURE_STATUSES: [StatusCode; 3] = [
    StatusCode::NOT_FOUND,
    StatusCode::METHOD_NOT_ALLOWED,
    StatusCode::NOT_IMPLEMENTED,
];
pub const EXHAUSTED_STATUS: StatusCode = StatusCode::BAD_GATEWAY;

/// What a single candidate's response means for the walk.
#[derive(Clone, PartialEq, Debug)]
enum Classified {
    Success(StatusCode, ParsedBody),
    SoftFailure(StatusCode),
    HardFailure(StatusCode, ParsedBody),
}

impl Classified {
    fn of(status: StatusCode, body: &str) -> Self {
        if status.is_success() {
            Classified::Success(status, ParsedBody::decode(body))
        } else if SOFT_FAILURE_STATUSES.contains(&status) {
            Classified::SoftFailure(status)
        } else {
            Classified::HardFailure(status, ParsedBody::decode(body))
        }
    }
}

/// The response that ended the walk. Both variants are passed through to
/// the caller as-is.
#[derive(Clone, PartialEq, Debug)]
pub enum DispatchOutcome {
    Success { status: StatusCode, body: ParsedBody },
    HardFailure { status: StatusCode, body: ParsedBody },
}

impl DispatchOutcome {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchOutcome::Success { status, .. }
            | DispatchOutcome::HardFailure { status, .. } => *status,
        }
    }

    #[must_use]
    pub fn into_body(self) -> ParsedBody {
        match self {
            DispatchOutcome::Success { body, .. }
            | DispatchOutcome::HardFailure { body, .. } => body,
        }
    }
}

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("Server missing CLASSROOM_API_KEY environment variable")]
    MissingApiKey,
    #[error("Missing Authorization header")]
    MissingAuthorization,
    #[error("statusId is required")]
    MissingStatusId,
    #[error("Unable to reach {action} service")]
    Unreachable {
        action: LikeAction,
        path: String,
        #[source]
        source: UpstreamError,
    },
    #[error("All {0} endpoints failed")]
    Exhausted(LikeAction),
}

impl LikeError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            LikeError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            LikeError::MissingAuthorization => StatusCode::UNAUTHORIZED,
            LikeError::MissingStatusId => StatusCode::BAD_REQUEST,
            LikeError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            LikeError::Exhausted(_) => EXHAUSTED_STATUS,
        }
    }
}

/// Tries each planned candidate for `action` in order.
///
/// Soft failures move on to the next candidate. The first success or hard
/// failure is returned as is. A network error stops the walk, since later
/// candidates would hit the same unreachable host.
pub async fn dispatch<U: Upstream>(
    upstream: &U,
    action: LikeAction,
    subject_id: &str,
    authorization: Option<&str>,
    api_key: Option<&ApiKey>,
) -> Result<DispatchOutcome, LikeError> {
    let api_key = api_key.ok_or(LikeError::MissingApiKey)?;
    let authorization = authorization
        .filter(|value| !value.trim().is_empty())
        .ok_or(LikeError::MissingAuthorization)?;
    let subject: Id<StatusMarker> =
        Id::new(subject_id).map_err(|_| LikeError::MissingStatusId)?;

    let credentials = Credentials {
        authorization: Some(authorization),
        api_key,
    };

    for candidate in plan(action, &subject) {
        match try_candidate(upstream, &candidate, action, &subject, credentials).await? {
            Classified::Success(status, body) => {
                debug!(%action, path = %candidate.path, %status, "Upstream accepted candidate");
                return Ok(DispatchOutcome::Success { status, body });
            }
            Classified::SoftFailure(status) => {
                debug!(%action, path = %candidate.path, %status, "Candidate not supported");
            }
            Classified::HardFailure(status, body) => {
                warn!(%action, path = %candidate.path, %status, "Upstream rejected candidate");
                return Ok(DispatchOutcome::HardFailure { status, body });
            }
        }
    }

    warn!(%action, subject = %subject, "Every candidate endpoint failed");
    Err(LikeError::Exhausted(action))
}

async fn try_candidate<U: Upstream>(
    upstream: &U,
    candidate: &EndpointCandidate,
    action: LikeAction,
    subject: &Id<StatusMarker>,
    credentials: Credentials<'_>,
) -> Result<Classified, LikeError> {
    debug!(%action, method = %candidate.method, path = %candidate.path, "Probing candidate");

    let response = upstream
        .send(candidate.request(action, subject), credentials)
        .await
        .map_err(|source| {
            error!(%action, path = %candidate.path, error = %source, "Upstream unreachable");
            LikeError::Unreachable {
                action,
                path: candidate.path.clone(),
                source,
            }
        })?;

    Ok(Classified::of(response.status, &response.body))
}
