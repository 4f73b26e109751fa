use crate::model::{
    Id,
    user::{Author, AuthorRef, UNKNOWN_AUTHOR, UserMarker},
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct StatusMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id<CommentMarker>,
    #[serde(default, alias = "body")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuthorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub like: Vec<AuthorRef>,
    #[serde(default, alias = "created_at")]
    pub created_at: String,
}

impl Comment {
    #[must_use]
    pub fn author_name(&self) -> String {
        author_name(self.created_by.as_ref(), self.owner.as_deref())
    }

    #[must_use]
    pub fn author_initials(&self) -> String {
        author_initials(self.created_by.as_ref(), self.owner.as_deref())
    }
}

/// A post on the status board.
///
/// `like_count` and `has_liked` are optional on the wire; use
/// [`Status::resolved_like_count`] and [`Status::resolved_has_liked`] to read
/// them, or [`Status::normalized`] to fill them in once.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id<StatusMarker>,
    #[serde(default, alias = "body")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuthorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub like: Vec<AuthorRef>,
    #[serde(
        default,
        alias = "like_count",
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub like_count: Option<usize>,
    #[serde(default, alias = "is_liked", skip_serializing_if = "Option::is_none")]
    pub has_liked: Option<bool>,
    #[serde(default, alias = "comments", deserialize_with = "lenient_list")]
    pub comment: Vec<Comment>,
    #[serde(default, alias = "created_at")]
    pub created_at: String,
    #[serde(default, alias = "updated_at")]
    pub updated_at: String,
}

impl Status {
    #[must_use]
    pub fn resolved_like_count(&self) -> usize {
        self.like_count.unwrap_or(self.like.len())
    }

    /// Whether `viewer` likes this post. An upstream-supplied flag wins,
    /// otherwise membership decides. Anonymous viewers never like anything.
    #[must_use]
    pub fn resolved_has_liked(&self, viewer: Option<&Id<UserMarker>>) -> bool {
        if let Some(has_liked) = self.has_liked {
            return has_liked;
        }

        viewer.is_some_and(|viewer| self.is_liked_by(viewer))
    }

    #[must_use]
    pub fn is_liked_by(&self, user: &Id<UserMarker>) -> bool {
        self.like.iter().any(|entry| entry.refers_to(user))
    }

    #[must_use]
    pub fn normalized(mut self, viewer: Option<&Id<UserMarker>>) -> Self {
        self.like_count = Some(self.resolved_like_count());
        self.has_liked = Some(self.resolved_has_liked(viewer));
        self
    }

    #[must_use]
    pub fn author_name(&self) -> String {
        author_name(self.created_by.as_ref(), self.owner.as_deref())
    }

    #[must_use]
    pub fn author_initials(&self) -> String {
        author_initials(self.created_by.as_ref(), self.owner.as_deref())
    }
}

/// Statuses as listed by the upstream. Posts that cannot be decoded are
/// skipped instead of failing the whole list.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(transparent)]
pub struct StatusList(#[serde(deserialize_with = "lenient_list")] pub Vec<Status>);

/// Anything but an array decodes as empty; malformed entries are dropped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping malformed entry");
                None
            }
        })
        .collect())
}

/// Any non-negative number, truncated. Anything else counts as absent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Number(count) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    Ok(count
        .as_u64()
        .or_else(|| {
            count
                .as_f64()
                .filter(|count| count.is_finite() && *count >= 0.0)
                .map(|count| count as u64)
        })
        .map(|count| usize::try_from(count).unwrap_or(usize::MAX)))
}

fn author_name(created_by: Option<&AuthorRef>, owner: Option<&str>) -> String {
    match created_by {
        Some(author) => author.display_name(owner),
        None => owner
            .map(str::trim)
            .filter(|owner| !owner.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_owned(),
    }
}

fn author_initials(created_by: Option<&AuthorRef>, owner: Option<&str>) -> String {
    match created_by {
        Some(author) => author.initials(owner),
        None => AuthorRef::Inline(Author::default()).initials(owner),
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum DraftError {
    #[error("Please enter some content before posting.")]
    EmptyStatus,
    #[error("Please type a comment before submitting.")]
    EmptyComment,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreateStatus {
    pub content: String,
}

impl CreateStatus {
    pub fn from_draft(draft: &str) -> Result<Self, DraftError> {
        let content = draft.trim();
        if content.is_empty() {
            return Err(DraftError::EmptyStatus);
        }

        Ok(Self {
            content: content.to_owned(),
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub content: String,
    pub status_id: Id<StatusMarker>,
}

impl CreateComment {
    pub fn from_draft(status_id: Id<StatusMarker>, draft: &str) -> Result<Self, DraftError> {
        let content = draft.trim();
        if content.is_empty() {
            return Err(DraftError::EmptyComment);
        }

        Ok(Self {
            content: content.to_owned(),
            status_id,
        })
    }
}
