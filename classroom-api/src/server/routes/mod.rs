use crate::server::ServerRouter;

mod classmates;
mod comment;
mod like;
mod profile;
mod session;
mod signin;
mod status;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(signin::routes())
        .merge(session::routes())
        .merge(profile::routes())
        .merge(classmates::routes())
        .merge(status::routes())
        .merge(comment::routes())
        .merge(like::routes())
}
