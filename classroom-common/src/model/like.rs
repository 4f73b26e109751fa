use crate::model::{Id, status::StatusMarker};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Like,
    Unlike,
}

impl LikeAction {
    /// The action that flips the viewer's current like state.
    #[must_use]
    pub fn toggled_from(currently_liked: bool) -> Self {
        if currently_liked {
            LikeAction::Unlike
        } else {
            LikeAction::Like
        }
    }

    /// Reads a browser-supplied action. Anything but `unlike` means `like`.
    #[must_use]
    pub fn from_requested(action: Option<&str>) -> Self {
        match action {
            Some("unlike") => LikeAction::Unlike,
            _ => LikeAction::Like,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LikeAction::Like => "like",
            LikeAction::Unlike => "unlike",
        }
    }
}

impl Display for LikeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub status_id: Id<StatusMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<LikeAction>,
}

impl LikeRequest {
    #[must_use]
    pub fn new(status_id: Id<StatusMarker>, action: LikeAction) -> Self {
        let action = match action {
            LikeAction::Like => None,
            LikeAction::Unlike => Some(LikeAction::Unlike),
        };

        Self { status_id, action }
    }
}
