use crate::model::user::Profile;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Opaque credential issued by the upstream on sign-in.
#[derive(Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[redacted]").finish()
    }
}

#[derive(Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

impl Debug for SignInCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The upstream sign-in payload: the member's profile plus their token.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SignedInUser {
    #[serde(flatten)]
    pub profile: Profile,
    pub token: BearerToken,
}

#[cfg(test)]
mod tests {
    use crate::model::auth::{BearerToken, SignInCredentials, SignedInUser};

    #[test]
    fn secrets_are_redacted() {
        let token = BearerToken::new("very-secret");
        assert!(!format!("{token:?}").contains("very-secret"));

        let credentials = SignInCredentials {
            email: "a@kku.ac.th".to_owned(),
            password: "hunter2".to_owned(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("a@kku.ac.th"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn signed_in_user_splits_token_from_profile() {
        let user: SignedInUser = serde_json::from_str(
            r#"{
                "_id": "u1",
                "firstname": "Ada",
                "lastname": "Lovelace",
                "email": "ada@kku.ac.th",
                "role": "student",
                "token": "tok"
            }"#,
        )
        .unwrap();

        assert_eq!(user.profile.id.as_str(), "u1");
        assert_eq!(user.token.header_value(), "Bearer tok");
    }
}
