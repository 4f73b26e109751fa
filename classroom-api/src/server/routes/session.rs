use crate::server::{CookieSettings, Result, ServerError, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    routing::{RouterExt, TypedPath},
};
use serde::{Deserialize, Serialize};
use time::Duration;

pub const SESSION_COOKIE: &str = "classroom-token";
const SESSION_LIFETIME: Duration = Duration::hours(12);

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(open_session)
        .typed_delete(close_session)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/session", rejection(ServerError))]
struct SessionPath();

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct OpenSession {
    token: Option<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct Acknowledged {
    ok: bool,
}

const ACKNOWLEDGED: Acknowledged = Acknowledged { ok: true };

/// Stores the bearer token in a cookie readable by page scripts.
async fn open_session(
    SessionPath(): SessionPath,
    State(settings): State<CookieSettings>,
    jar: CookieJar,
    Json(OpenSession { token }): Json<OpenSession>,
) -> Result<(CookieJar, Json<Acknowledged>)> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or(ServerError::MissingToken)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(SESSION_LIFETIME);

    Ok((jar.add(cookie), Json(ACKNOWLEDGED)))
}

async fn close_session(
    SessionPath(): SessionPath,
    jar: CookieJar,
) -> (CookieJar, Json<Acknowledged>) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO);

    (jar.add(cookie), Json(ACKNOWLEDGED))
}
