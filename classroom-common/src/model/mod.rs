pub mod auth;
pub mod like;
pub mod status;
pub mod user;

use derive_where::derive_where;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("An id must not be empty")]
pub struct InvalidIdError;

/// Opaque upstream identifier, tagged with the kind of record it names.
///
/// Ids are trimmed on construction and never empty.
#[derive_where(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Id<Marker>(String, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdError> {
        let id = id.into();
        let trimmed = id.trim();

        if trimmed.is_empty() {
            return Err(InvalidIdError);
        }

        let id = if trimmed.len() == id.len() {
            id
        } else {
            trimmed.to_owned()
        };

        Ok(Self(id, PhantomData))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> TryFrom<String> for Id<Marker> {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<Marker> TryFrom<&str> for Id<Marker> {
    type Error = InvalidIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for String {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<'de, Marker> Deserialize<'de> for Id<Marker> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Id::new(inner.as_str()).map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"Id"))
    }
}
