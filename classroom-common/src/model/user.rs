use crate::model::Id;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_AUTHOR: &str = "Unknown member";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// An author record inlined into a status, comment or like list.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Author {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Id<UserMarker>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A relation to a member, either as a bare id or as an inlined record.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Reference(Id<UserMarker>),
    Inline(Author),
}

impl AuthorRef {
    #[must_use]
    pub fn id(&self) -> Option<&Id<UserMarker>> {
        match self {
            AuthorRef::Reference(id) => Some(id),
            AuthorRef::Inline(author) => author.id.as_ref(),
        }
    }

    #[must_use]
    pub fn refers_to(&self, user: &Id<UserMarker>) -> bool {
        self.id() == Some(user)
    }

    /// Resolves the name shown for this author.
    ///
    /// Inline records prefer an explicit name, then first and last name, then
    /// the legacy `owner` field, the email, the id and finally
    /// [`UNKNOWN_AUTHOR`]. Bare references use `owner`, then the id.
    #[must_use]
    pub fn display_name(&self, owner: Option<&str>) -> String {
        let owner = non_blank(owner);

        let resolved = match self {
            AuthorRef::Reference(id) => owner.or(Some(id.as_str())),
            AuthorRef::Inline(author) => {
                let full_name = full_name(author.firstname.as_deref(), author.lastname.as_deref());

                return non_blank(author.name.as_deref())
                    .map(str::to_owned)
                    .or(full_name)
                    .or_else(|| owner.map(str::to_owned))
                    .or_else(|| non_blank(author.email.as_deref()).map(str::to_owned))
                    .or_else(|| author.id.as_ref().map(|id| id.as_str().to_owned()))
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());
            }
        };

        resolved.unwrap_or(UNKNOWN_AUTHOR).to_owned()
    }

    /// Two-letter avatar initials, `?` when nothing usable is known.
    #[must_use]
    pub fn initials(&self, owner: Option<&str>) -> String {
        let fallback = match self {
            AuthorRef::Reference(id) => id.as_str().to_owned(),
            AuthorRef::Inline(author) => author
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .or_else(|| full_name(author.firstname.as_deref(), author.lastname.as_deref()))
                .or_else(|| author.email.clone().filter(|email| !email.is_empty()))
                .or_else(|| author.id.as_ref().map(|id| id.as_str().to_owned()))
                .or_else(|| owner.map(str::to_owned))
                .unwrap_or_default(),
        };

        [derive_initials(&self.display_name(owner)), derive_initials(&fallback)]
            .into_iter()
            .find(|initials| !initials.is_empty())
            .unwrap_or_else(|| "?".to_owned())
    }
}

impl From<Id<UserMarker>> for AuthorRef {
    fn from(value: Id<UserMarker>) -> Self {
        AuthorRef::Reference(value)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn full_name(firstname: Option<&str>, lastname: Option<&str>) -> Option<String> {
    let segments: Vec<&str> = [firstname, lastname]
        .into_iter()
        .filter_map(non_blank)
        .collect();

    (!segments.is_empty()).then(|| segments.join(" "))
}

fn derive_initials(value: &str) -> String {
    let normalized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c.to_ascii_uppercase()
            } else {
                ' '
            }
        })
        .collect();

    let mut words = normalized.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => String::new(),
        (Some(word), None) => word.chars().take(2).collect(),
        (Some(first), Some(second)) => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect(),
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct School {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Advisor {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub enrollment_year: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<School>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor: Option<Advisor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A member of the classroom service, as returned for the signed-in user and
/// for classmate listings.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: Id<UserMarker>,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub education: Option<Education>,
    #[serde(default)]
    pub job: Vec<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub type Classmate = Profile;

impl Profile {
    #[must_use]
    pub fn full_name(&self) -> String {
        full_name(Some(self.firstname.as_str()), Some(self.lastname.as_str()))
            .unwrap_or_else(|| self.email.clone())
    }

    #[must_use]
    pub fn enrollment_year(&self) -> Option<&str> {
        self.education
            .as_ref()
            .and_then(|education| education.enrollment_year.as_deref())
    }
}
