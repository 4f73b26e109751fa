//! Optimistic like updates for the status board.
//!
//! [`apply`] predicts the outcome of a like toggle so it can be rendered
//! before the upstream confirms it, and hands back the untouched list as the
//! snapshot to restore if the upstream call fails.

use crate::model::{
    Id,
    status::{Status, StatusMarker},
    user::{AuthorRef, UserMarker},
};

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct OptimisticUpdate {
    /// The list to render immediately.
    pub next: Vec<Status>,
    /// The list exactly as it was before the toggle.
    pub undo: Vec<Status>,
}

/// Predicts the post list after the viewer toggles their like on `target`.
///
/// With a known viewer the like membership is updated and the count is its
/// size. Without one, membership is left alone and the previous count is
/// moved by one. Every other post is copied unchanged.
#[must_use]
pub fn apply(
    posts: &[Status],
    target: &Id<StatusMarker>,
    viewer: Option<&Id<UserMarker>>,
    currently_liked: bool,
) -> OptimisticUpdate {
    let next = posts
        .iter()
        .map(|post| {
            if &post.id == target {
                toggled(post, viewer, currently_liked)
            } else {
                post.clone()
            }
        })
        .collect();

    OptimisticUpdate {
        next,
        undo: posts.to_vec(),
    }
}

fn toggled(post: &Status, viewer: Option<&Id<UserMarker>>, currently_liked: bool) -> Status {
    let mut next = post.clone();
    let previous_count = post.resolved_like_count();

    next.like_count = Some(match viewer {
        Some(viewer) => {
            if currently_liked {
                next.like.retain(|entry| !entry.refers_to(viewer));
            } else if !post.is_liked_by(viewer) {
                next.like.push(AuthorRef::Reference(viewer.clone()));
            }
            next.like.len()
        }
        None if currently_liked => previous_count.saturating_sub(1),
        None => previous_count.saturating_add(1),
    });
    next.has_liked = Some(!currently_liked);

    next
}
