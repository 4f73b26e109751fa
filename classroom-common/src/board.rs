use crate::{
    model::{
        Id,
        like::LikeAction,
        status::{Status, StatusMarker},
        user::UserMarker,
    },
    reconcile,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ToggleError {
    #[error("Status with id {0} is not on the board.")]
    UnknownStatus(Id<StatusMarker>),
    #[error("A like update for status {0} is still in progress.")]
    InFlight(Id<StatusMarker>),
    #[error("The like update for status {0} was already settled or replaced.")]
    Stale(Id<StatusMarker>),
}

/// A like toggle that has been applied locally and awaits the upstream.
///
/// Hand it back to [`StatusBoard::confirm`] or [`StatusBoard::roll_back`].
/// Only the board's current toggle is accepted; any other is stale.
#[must_use]
#[derive(Eq, PartialEq, Debug)]
pub struct PendingToggle {
    ticket: u64,
    status_id: Id<StatusMarker>,
    action: LikeAction,
    undo: Vec<Status>,
}

impl PendingToggle {
    pub fn status_id(&self) -> &Id<StatusMarker> {
        &self.status_id
    }

    pub fn action(&self) -> LikeAction {
        self.action
    }
}

/// The posts shown to one viewer, plus the like toggle currently in flight.
///
/// At most one toggle is pending at a time. Rolling back restores the list
/// captured when that toggle began, so a second concurrent toggle could be
/// silently undone by the first one's failure. A reload cancels the pending
/// toggle.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct StatusBoard {
    posts: Vec<Status>,
    viewer: Option<Id<UserMarker>>,
    pending: Option<Ticket>,
    next_ticket: u64,
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct Ticket {
    number: u64,
    status_id: Id<StatusMarker>,
}

impl StatusBoard {
    #[must_use]
    pub fn new(viewer: Option<Id<UserMarker>>) -> Self {
        Self {
            posts: Vec::new(),
            viewer,
            pending: None,
            next_ticket: 0,
        }
    }

    #[must_use]
    pub fn posts(&self) -> &[Status] {
        &self.posts
    }

    #[must_use]
    pub fn viewer(&self) -> Option<&Id<UserMarker>> {
        self.viewer.as_ref()
    }

    #[must_use]
    pub fn status(&self, id: &Id<StatusMarker>) -> Option<&Status> {
        self.posts.iter().find(|post| &post.id == id)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&Id<StatusMarker>> {
        self.pending.as_ref().map(|ticket| &ticket.status_id)
    }

    /// Replaces the board with a fresh list from the upstream.
    ///
    /// A toggle still pending is cancelled: confirming or rolling it back
    /// afterwards fails with [`ToggleError::Stale`] and leaves the new list.
    pub fn replace(&mut self, posts: Vec<Status>) {
        if let Some(cancelled) = self.pending.take() {
            debug!(status_id = %cancelled.status_id, "Reload cancelled pending like toggle");
        }

        let viewer = self.viewer.as_ref();
        self.posts = posts
            .into_iter()
            .map(|post| post.normalized(viewer))
            .collect();
    }

    /// Applies the viewer's like toggle on `status_id` optimistically.
    pub fn begin_toggle(
        &mut self,
        status_id: &Id<StatusMarker>,
    ) -> Result<PendingToggle, ToggleError> {
        if let Some(pending) = &self.pending {
            return Err(ToggleError::InFlight(pending.status_id.clone()));
        }

        let currently_liked = self
            .status(status_id)
            .ok_or_else(|| ToggleError::UnknownStatus(status_id.clone()))?
            .resolved_has_liked(self.viewer.as_ref());

        let update = reconcile::apply(
            &self.posts,
            status_id,
            self.viewer.as_ref(),
            currently_liked,
        );
        let action = LikeAction::toggled_from(currently_liked);

        debug!(%status_id, %action, "Applied optimistic like toggle");

        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.posts = update.next;
        self.pending = Some(Ticket {
            number: ticket,
            status_id: status_id.clone(),
        });

        Ok(PendingToggle {
            ticket,
            status_id: status_id.clone(),
            action,
            undo: update.undo,
        })
    }

    /// Accepts the optimistic state of a toggle the upstream confirmed.
    pub fn confirm(&mut self, toggle: PendingToggle) -> Result<(), ToggleError> {
        self.settle(&toggle)?;
        debug!(status_id = %toggle.status_id, action = %toggle.action, "Like toggle confirmed");
        Ok(())
    }

    /// Restores the list as it was before the toggle began.
    pub fn roll_back(&mut self, toggle: PendingToggle) -> Result<(), ToggleError> {
        self.settle(&toggle)?;
        warn!(status_id = %toggle.status_id, action = %toggle.action, "Rolling back like toggle");
        self.posts = toggle.undo;
        Ok(())
    }

    fn settle(&mut self, toggle: &PendingToggle) -> Result<(), ToggleError> {
        match &self.pending {
            Some(current) if current.number == toggle.ticket => {
                self.pending = None;
                Ok(())
            }
            _ => {
                debug!(status_id = %toggle.status_id, "Ignoring stale like toggle");
                Err(ToggleError::Stale(toggle.status_id.clone()))
            }
        }
    }
}
