//! Application layer: the stores and their coordination.

pub mod assignment;
pub mod booking_store;
pub mod busy;
pub mod catalog_store;
pub mod error;
pub mod plan_types;
pub mod response;
pub mod roster_store;
pub mod sequencing;
pub mod session_store;

pub use assignment::AssignmentCoordinator;
pub use booking_store::{AssignmentChange, BookingState, BookingStore};
pub use busy::{BusyFlags, BusyGuard, BusyKey};
pub use catalog_store::{CatalogState, CatalogStore};
pub use error::{AuthFailure, StoreError};
pub use plan_types::PlanTypeDirectory;
pub use roster_store::{RosterState, RosterStore};
pub use session_store::{SessionCredentials, SessionState, SessionStatus, SessionStore};

use std::sync::Arc;

use tokio::sync::watch;

use sequencing::{Settlements, Ticket};

/// Bookkeeping every store snapshot carries.
pub trait StoreState: Send + Sync + 'static {
    fn busy_mut(&mut self) -> &mut BusyFlags;
    fn settlements_mut(&mut self) -> &mut Settlements;
    fn error_mut(&mut self) -> &mut Option<String>;
}

/// Observable store state shared between a store and its busy guards.
pub(crate) type Shared<S> = Arc<watch::Sender<S>>;

pub(crate) fn shared<S: StoreState + Default>() -> Shared<S> {
    Arc::new(watch::Sender::new(S::default()))
}

/// Apply `reconcile` if `ticket` is still current; returns whether it ran.
pub(crate) fn settle<S, F>(state: &Shared<S>, ticket: &Ticket, reconcile: F) -> bool
where
    S: StoreState,
    F: FnOnce(&mut S),
{
    let applied = state.send_if_modified(|s| {
        let admitted = s.settlements_mut().admit(ticket);
        if admitted {
            reconcile(s);
        }
        admitted
    });
    if !applied {
        tracing::debug!(key = ticket.key(), "Discarding superseded settlement");
    }
    applied
}

/// Record `error` on the store and hand it back for propagation.
pub(crate) fn record_failure<S: StoreState>(state: &Shared<S>, error: StoreError) -> StoreError {
    let message = error.user_message();
    tracing::warn!(error = %error, "Store operation failed");
    state.send_modify(|s| *s.error_mut() = Some(message));
    error
}

pub(crate) fn clear_error<S: StoreState>(state: &Shared<S>) {
    state.send_if_modified(|s| s.error_mut().take().is_some());
}
