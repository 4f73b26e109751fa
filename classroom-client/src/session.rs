use crate::client::{ClassroomClient, Result};
use classroom_common::{
    board::{PendingToggle, StatusBoard, ToggleError},
    insights::BoardInsights,
    model::{
        Id,
        auth::BearerToken,
        like::LikeAction,
        status::{CreateComment, CreateStatus, Status, StatusMarker},
        user::UserMarker,
    },
};
use tracing::{debug, warn};

/// One signed-in member's view of the status board.
///
/// Every mutation goes through the proxy and is followed by a reload, except
/// like toggles, which are shown optimistically first.
#[derive(Clone, Debug)]
pub struct BoardSession {
    client: ClassroomClient,
    token: BearerToken,
    board: StatusBoard,
}

impl BoardSession {
    #[must_use]
    pub fn new(
        client: ClassroomClient,
        token: BearerToken,
        viewer: Option<Id<UserMarker>>,
    ) -> Self {
        Self {
            client,
            token,
            board: StatusBoard::new(viewer),
        }
    }

    #[must_use]
    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    #[must_use]
    pub fn posts(&self) -> &[Status] {
        self.board.posts()
    }

    #[must_use]
    pub fn insights(&self) -> BoardInsights {
        BoardInsights::summarize(self.board.posts())
    }

    pub async fn reload(&mut self) -> Result<()> {
        let posts = self.client.fetch_statuses(&self.token).await?;
        debug!(posts = posts.len(), "Reloaded status board");
        self.board.replace(posts);
        Ok(())
    }

    /// Posts `draft` as a new status. Blank drafts never reach the network.
    pub async fn post_status(&mut self, draft: &str) -> Result<Status> {
        let status = CreateStatus::from_draft(draft)?;
        let created = self.client.create_status(&status, &self.token).await?;
        self.reload().await?;
        Ok(created)
    }

    pub async fn comment(&mut self, status_id: Id<StatusMarker>, draft: &str) -> Result<Status> {
        let comment = CreateComment::from_draft(status_id, draft)?;
        let updated = self.client.create_comment(&comment, &self.token).await?;
        self.reload().await?;
        Ok(updated)
    }

    /// Flips the viewer's like on `status_id`.
    ///
    /// The board shows the predicted state until the proxy answers. On
    /// failure, or when this future is dropped before the proxy answers, the
    /// board is restored exactly. On success the board is reloaded; a failed
    /// reload keeps the predicted state.
    pub async fn toggle_like(&mut self, status_id: &Id<StatusMarker>) -> Result<LikeAction> {
        let toggle = self.board.begin_toggle(status_id)?;
        let action = toggle.action();
        let guard = InFlightToggle {
            board: &mut self.board,
            toggle: Some(toggle),
        };

        match self.client.set_like(status_id, action, &self.token).await {
            Ok(()) => guard.confirm()?,
            Err(e) => {
                guard.roll_back()?;
                return Err(e);
            }
        }

        if let Err(e) = self.reload().await {
            warn!(error = %e, "Could not refresh the board after a like toggle");
        }

        Ok(action)
    }
}

/// Rolls its toggle back unless it was settled first.
struct InFlightToggle<'a> {
    board: &'a mut StatusBoard,
    toggle: Option<PendingToggle>,
}

impl InFlightToggle<'_> {
    fn confirm(mut self) -> std::result::Result<(), ToggleError> {
        match self.toggle.take() {
            Some(toggle) => self.board.confirm(toggle),
            None => Ok(()),
        }
    }

    fn roll_back(mut self) -> std::result::Result<(), ToggleError> {
        match self.toggle.take() {
            Some(toggle) => self.board.roll_back(toggle),
            None => Ok(()),
        }
    }
}

impl Drop for InFlightToggle<'_> {
    fn drop(&mut self) {
        if let Some(toggle) = self.toggle.take() {
            warn!(
                status_id = %toggle.status_id(),
                "Like toggle abandoned before the proxy answered"
            );
            if let Err(e) = self.board.roll_back(toggle) {
                warn!(error = %e, "Could not roll back abandoned like toggle");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{ClientError, tests::spawn},
        session::BoardSession,
    };
    use axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
    };
    use classroom_common::{
        board::ToggleError,
        model::{Id, auth::BearerToken, like::LikeAction, status::DraftError},
    };
    use serde_json::{Value, json};
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
        time::Duration,
    };

    /// A proxy stub holding one post liked by `u2`.
    #[derive(Clone)]
    struct Proxy {
        posts: Arc<Mutex<Value>>,
        accept_likes: Arc<AtomicBool>,
        stall_likes: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl Proxy {
        fn new(accept_likes: bool) -> Self {
            Self {
                posts: Arc::new(Mutex::new(json!([{
                    "_id": "s1",
                    "content": "hello",
                    "createdBy": {"_id": "u2", "name": "Bo"},
                    "like": ["u2"],
                    "comment": []
                }]))),
                accept_likes: Arc::new(AtomicBool::new(accept_likes)),
                stall_likes: Arc::new(AtomicBool::new(false)),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn router(&self) -> Router {
            Router::new()
                .route("/api/status", get(list).post(create))
                .route("/api/comment", post(comment))
                .route("/api/like", post(like))
                .with_state(self.clone())
        }
    }

    async fn list(State(proxy): State<Proxy>) -> Json<Value> {
        Json(json!({"data": proxy.posts.lock().unwrap().clone()}))
    }

    async fn create(State(proxy): State<Proxy>, Json(body): Json<Value>) -> Json<Value> {
        proxy.calls.fetch_add(1, Ordering::SeqCst);
        let post = json!({"_id": "s2", "content": body["content"], "like": [], "comment": []});
        proxy
            .posts
            .lock()
            .unwrap()
            .as_array_mut()
            .unwrap()
            .push(post.clone());
        Json(json!({"data": post}))
    }

    async fn comment(State(proxy): State<Proxy>, Json(body): Json<Value>) -> Json<Value> {
        proxy.calls.fetch_add(1, Ordering::SeqCst);
        let mut posts = proxy.posts.lock().unwrap();
        let post = &mut posts[0];
        post["comment"]
            .as_array_mut()
            .unwrap()
            .push(json!({"_id": "c1", "content": body["content"]}));
        Json(json!({"data": post.clone()}))
    }

    async fn like(State(proxy): State<Proxy>, Json(body): Json<Value>) -> Response {
        proxy.calls.fetch_add(1, Ordering::SeqCst);
        if proxy.stall_likes.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        if !proxy.accept_likes.load(Ordering::SeqCst) {
            return (StatusCode::FORBIDDEN, Json(json!({"error": "Likes are closed"})))
                .into_response();
        }

        let mut posts = proxy.posts.lock().unwrap();
        let likes = posts[0]["like"].as_array_mut().unwrap();
        if body["action"] == "unlike" {
            likes.retain(|entry| entry != "u1");
        } else {
            likes.push(json!("u1"));
        }
        StatusCode::OK.into_response()
    }

    async fn session(proxy: &Proxy) -> BoardSession {
        let client = spawn(proxy.router()).await;
        let mut session = BoardSession::new(
            client,
            BearerToken::new("tok"),
            Some(Id::new("u1").unwrap()),
        );
        session.reload().await.unwrap();
        session
    }

    #[tokio::test]
    async fn reload_normalizes_posts() {
        let proxy = Proxy::new(true);
        let session = session(&proxy).await;

        let post = &session.posts()[0];
        assert_eq!(post.like_count, Some(1));
        assert_eq!(post.has_liked, Some(false));
        assert_eq!(session.insights().likes, 1);
    }

    #[tokio::test]
    async fn blank_drafts_stay_local() {
        let proxy = Proxy::new(true);
        let mut session = session(&proxy).await;

        let error = session.post_status("   ").await.unwrap_err();
        assert!(matches!(error, ClientError::Draft(DraftError::EmptyStatus)));
        assert_eq!(error.to_string(), "Please enter some content before posting.");

        let error = session
            .comment(Id::new("s1").unwrap(), "")
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Please type a comment before submitting.");

        assert_eq!(proxy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn posting_and_commenting_reload_the_board() {
        let proxy = Proxy::new(true);
        let mut session = session(&proxy).await;

        let created = session.post_status("  new post ").await.unwrap();
        assert_eq!(created.content, "new post");
        assert_eq!(session.posts().len(), 2);

        session
            .comment(Id::new("s1").unwrap(), "nice")
            .await
            .unwrap();
        assert_eq!(session.posts()[0].comment.len(), 1);
        assert_eq!(session.posts()[0].comment[0].content, "nice");
    }

    #[tokio::test]
    async fn confirmed_toggles_follow_the_upstream() {
        let proxy = Proxy::new(true);
        let mut session = session(&proxy).await;
        let s1 = Id::new("s1").unwrap();

        assert_eq!(session.toggle_like(&s1).await.unwrap(), LikeAction::Like);
        let post = session.board().status(&s1).unwrap();
        assert_eq!(post.resolved_like_count(), 2);
        assert_eq!(post.has_liked, Some(true));
        assert_eq!(session.board().pending(), None);

        assert_eq!(session.toggle_like(&s1).await.unwrap(), LikeAction::Unlike);
        let post = session.board().status(&s1).unwrap();
        assert_eq!(post.resolved_like_count(), 1);
        assert_eq!(post.has_liked, Some(false));
    }

    #[tokio::test]
    async fn failed_toggles_roll_back() {
        let proxy = Proxy::new(false);
        let mut session = session(&proxy).await;
        let before = session.posts().to_vec();

        let error = session
            .toggle_like(&Id::new("s1").unwrap())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Likes are closed");
        assert_eq!(session.posts(), before.as_slice());
        assert_eq!(session.board().pending(), None);
    }

    #[tokio::test]
    async fn abandoned_toggles_roll_back() {
        let proxy = Proxy::new(true);
        proxy.stall_likes.store(true, Ordering::SeqCst);
        let mut session = session(&proxy).await;
        let s1 = Id::new("s1").unwrap();
        let before = session.posts().to_vec();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(200), session.toggle_like(&s1)).await;
        assert!(abandoned.is_err());
        assert_eq!(session.posts(), before.as_slice());
        assert_eq!(session.board().pending(), None);

        proxy.stall_likes.store(false, Ordering::SeqCst);
        assert_eq!(session.toggle_like(&s1).await.unwrap(), LikeAction::Like);
        assert_eq!(session.board().status(&s1).unwrap().has_liked, Some(true));
    }

    #[tokio::test]
    async fn unknown_posts_cannot_be_toggled() {
        let proxy = Proxy::new(true);
        let mut session = session(&proxy).await;

        let error = session
            .toggle_like(&Id::new("missing").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ClientError::Toggle(ToggleError::UnknownStatus(_))
        ));
        assert_eq!(proxy.calls.load(Ordering::SeqCst), 0);
    }
}
