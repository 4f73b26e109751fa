//! Candidate upstream routes for liking and unliking a status.
//!
//! The upstream does not document how likes are exposed, so [`plan`] lists
//! the plausible request shapes, most likely first. The fallback dispatcher
//! walks the list in order.

use crate::client::{UpstreamRequest, path_segment};
use classroom_common::model::{Id, like::LikeAction, status::StatusMarker};
use reqwest::Method;
use serde_json::{Value, json};

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct EndpointCandidate {
    /// Encoded path below the upstream base.
    pub path: String,
    pub method: Method,
    /// Whether the status id is already part of `path`.
    pub embeds_subject: bool,
    /// Toggle-style routes take the action in the body.
    pub toggle: bool,
}

impl EndpointCandidate {
    fn collection(method: Method, path: &str) -> Self {
        Self {
            path: path.to_owned(),
            method,
            embeds_subject: false,
            toggle: false,
        }
    }

    fn embedded(method: Method, path: String) -> Self {
        Self {
            path,
            method,
            embeds_subject: true,
            toggle: false,
        }
    }

    fn toggle(method: Method, path: &str) -> Self {
        Self {
            path: path.to_owned(),
            method,
            embeds_subject: false,
            toggle: true,
        }
    }

    #[must_use]
    pub fn includes_body(&self) -> bool {
        self.toggle || !self.embeds_subject
    }

    #[must_use]
    pub fn body(&self, action: LikeAction, subject: &Id<StatusMarker>) -> Option<Value> {
        if self.toggle {
            Some(json!({ "statusId": subject, "action": action }))
        } else if self.includes_body() {
            Some(json!({ "statusId": subject }))
        } else {
            None
        }
    }

    #[must_use]
    pub fn request(&self, action: LikeAction, subject: &Id<StatusMarker>) -> UpstreamRequest {
        UpstreamRequest {
            method: self.method.clone(),
            path: self.path.clone(),
            body: self.body(action, subject),
        }
    }
}

/// Lists the request shapes to try for `action` on `subject`, in priority
/// order.
#[must_use]
pub fn plan(action: LikeAction, subject: &Id<StatusMarker>) -> Vec<EndpointCandidate> {
    let id = path_segment(subject.as_str());

    match action {
        LikeAction::Like => vec![
            EndpointCandidate::collection(Method::POST, "/status/like"),
            EndpointCandidate::collection(Method::POST, "/like"),
            EndpointCandidate::embedded(Method::POST, format!("/status/{id}/like")),
            EndpointCandidate::embedded(Method::POST, format!("/status/like/{id}")),
            EndpointCandidate::embedded(Method::POST, format!("/status/{id}/likes")),
        ],
        LikeAction::Unlike => vec![
            EndpointCandidate::collection(Method::DELETE, "/status/unlike"),
            EndpointCandidate::collection(Method::DELETE, "/unlike"),
            EndpointCandidate::embedded(Method::DELETE, format!("/status/{id}/like")),
            EndpointCandidate::embedded(Method::DELETE, format!("/status/like/{id}")),
            EndpointCandidate::embedded(Method::DELETE, format!("/status/{id}/likes")),
            EndpointCandidate::embedded(Method::DELETE, format!("/status/{id}/unlike")),
            EndpointCandidate::toggle(Method::POST, "/status/like"),
        ],
    }
}
