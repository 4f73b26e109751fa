use classroom_common::{
    board::ToggleError,
    model::{
        Id,
        auth::{BearerToken, SignInCredentials, SignedInUser},
        like::{LikeAction, LikeRequest},
        status::{CreateComment, CreateStatus, DraftError, Status, StatusList, StatusMarker},
        user::{Classmate, Profile},
    },
};
use reqwest::{
    RequestBuilder, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

pub const SIGN_IN_FAILED: &str = "Sign in failed. Check email/password.";
pub const PROFILE_FAILED: &str = "Unable to load profile.";
pub const CLASSMATES_FAILED: &str = "Unable to load classmates.";
pub const STATUSES_FAILED: &str = "Unable to load statuses.";
pub const CREATE_STATUS_FAILED: &str = "Unable to create status.";
pub const COMMENT_FAILED: &str = "Unable to add comment.";
pub const LIKE_FAILED: &str = "Unable to like status.";
pub const UNLIKE_FAILED: &str = "Unable to unlike status.";
pub const SESSION_FAILED: &str = "Unable to store session.";

/// Every failure renders as a message fit to show the member.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The proxy answered with an error status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("{message}")]
    Unreachable {
        message: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{message}")]
    Decode {
        message: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Please provide both email and password.")]
    MissingCredentials,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Toggle(#[from] ToggleError),
}

impl ClientError {
    /// Picks the message of an error reply: its `error` field, else its
    /// `message` field, else `fallback`.
    #[must_use]
    pub fn from_reply(status: StatusCode, body: &str, fallback: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|body| body.get(name))
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_owned)
        };

        let message = field("error")
            .or_else(|| field("message"))
            .unwrap_or_else(|| fallback.to_owned());

        ClientError::Api { status, message }
    }

    /// Whether the member has to sign in again.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct OpenSession<'a> {
    token: &'a str,
}

/// Client of the classroom proxy endpoints.
#[derive(Clone, Debug)]
pub struct ClassroomClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClassroomClient {
    /// `base_url` is where the proxy routes are mounted, such as
    /// `http://localhost:3000/api`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str, token: &BearerToken) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, token.header_value())
    }

    fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&BearerToken>,
        body: &T,
    ) -> RequestBuilder {
        let builder = self
            .http
            .post(self.url(path))
            .header(ACCEPT, "application/json")
            .json(body);

        match token {
            Some(token) => builder.header(AUTHORIZATION, token.header_value()),
            None => builder,
        }
    }

    /// Sends `request`, returning the body of a successful reply.
    async fn execute(&self, request: RequestBuilder, fallback: &'static str) -> Result<String> {
        let unreachable = |source| ClientError::Unreachable {
            message: fallback,
            source,
        };

        let response = request.send().await.map_err(unreachable)?;
        let status = response.status();
        let body = response.text().await.map_err(unreachable)?;

        if status.is_success() {
            Ok(body)
        } else {
            debug!(%status, "Proxy replied with an error");
            Err(ClientError::from_reply(status, &body, fallback))
        }
    }

    async fn data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &'static str,
    ) -> Result<T> {
        let body = self.execute(request, fallback).await?;

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|source| ClientError::Decode {
                message: fallback,
                source,
            })
    }

    pub async fn sign_in(&self, credentials: &SignInCredentials) -> Result<SignedInUser> {
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        self.data(self.post("/signin", None, credentials), SIGN_IN_FAILED)
            .await
    }

    /// Signs in and mirrors the token into the session cookie.
    ///
    /// The cookie only serves server-rendered pages, so failing to set it is
    /// logged and otherwise ignored.
    pub async fn sign_in_with_session(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<SignedInUser> {
        let user = self.sign_in(credentials).await?;

        if let Err(e) = self.open_session(&user.token).await {
            warn!(error = %e, "Could not store the session cookie");
        }

        Ok(user)
    }

    pub async fn open_session(&self, token: &BearerToken) -> Result<()> {
        let body = OpenSession { token: token.get() };
        self.execute(self.post("/session", None, &body), SESSION_FAILED)
            .await
            .map(drop)
    }

    pub async fn close_session(&self) -> Result<()> {
        let request = self.http.delete(self.url("/session"));
        self.execute(request, SESSION_FAILED).await.map(drop)
    }

    pub async fn fetch_profile(&self, token: &BearerToken) -> Result<Profile> {
        self.data(self.get("/profile", token), PROFILE_FAILED).await
    }

    pub async fn fetch_classmates(
        &self,
        year: &str,
        token: &BearerToken,
    ) -> Result<Vec<Classmate>> {
        let request = self.get("/classmates", token).query(&[("year", year)]);
        self.data(request, CLASSMATES_FAILED).await
    }

    pub async fn fetch_statuses(&self, token: &BearerToken) -> Result<Vec<Status>> {
        self.data(self.get("/status", token), STATUSES_FAILED)
            .await
            .map(|StatusList(posts)| posts)
    }

    pub async fn create_status(
        &self,
        status: &CreateStatus,
        token: &BearerToken,
    ) -> Result<Status> {
        self.data(self.post("/status", Some(token), status), CREATE_STATUS_FAILED)
            .await
    }

    pub async fn create_comment(
        &self,
        comment: &CreateComment,
        token: &BearerToken,
    ) -> Result<Status> {
        self.data(self.post("/comment", Some(token), comment), COMMENT_FAILED)
            .await
    }

    /// Likes or unlikes `status_id`. The reply body is not relied upon; its
    /// shape depends on which upstream route accepted the request.
    pub async fn set_like(
        &self,
        status_id: &Id<StatusMarker>,
        action: LikeAction,
        token: &BearerToken,
    ) -> Result<()> {
        let fallback = match action {
            LikeAction::Like => LIKE_FAILED,
            LikeAction::Unlike => UNLIKE_FAILED,
        };
        let body = LikeRequest::new(status_id.clone(), action);

        self.execute(self.post("/like", Some(token), &body), fallback)
            .await
            .map(drop)
    }

    pub async fn like_status(
        &self,
        status_id: &Id<StatusMarker>,
        token: &BearerToken,
    ) -> Result<()> {
        self.set_like(status_id, LikeAction::Like, token).await
    }

    pub async fn unlike_status(
        &self,
        status_id: &Id<StatusMarker>,
        token: &BearerToken,
    ) -> Result<()> {
        self.set_like(status_id, LikeAction::Unlike, token).await
    }
}
