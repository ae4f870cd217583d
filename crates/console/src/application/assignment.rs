//! Booking/engineer assignment across the two stores that own each side.

use std::sync::Arc;

use fixdesk_domain::{Booking, BookingId, EngineerId};

use super::{BookingStore, RosterStore, StoreError};

/// Keeps `Booking::assigned_engineer` and `Engineer::assigned_orders` in
/// step. The booking side goes through the remote API; the roster side is a
/// local mirror of each booking settlement that is actually applied, moving
/// the booking off the engineer that settlement replaced.
pub struct AssignmentCoordinator {
    bookings: Arc<BookingStore>,
    roster: Arc<RosterStore>,
}

impl AssignmentCoordinator {
    pub fn new(bookings: Arc<BookingStore>, roster: Arc<RosterStore>) -> Self {
        Self { bookings, roster }
    }

    /// Assign `engineer` to `booking`.
    ///
    /// Fails with [`StoreError::UnknownEngineer`] before any remote call when
    /// the engineer is not in the loaded roster.
    pub async fn assign(
        &self,
        booking: &BookingId,
        engineer: &EngineerId,
    ) -> Result<Option<Booking>, StoreError> {
        if !self.roster.contains_engineer(engineer) {
            tracing::warn!(booking_id = %booking, engineer_id = %engineer, "Refusing to assign an unknown engineer");
            return Err(self
                .bookings
                .report(StoreError::UnknownEngineer(engineer.clone())));
        }

        let Some(change) = self.bookings.assign_tracked(booking, engineer).await? else {
            tracing::debug!(booking_id = %booking, "Assignment superseded; roster left as is");
            return Ok(None);
        };

        if let Some(previous) = change.previous.as_ref().filter(|p| *p != engineer) {
            self.roster.mirror_assignment(previous, booking, false);
        }
        self.roster.mirror_assignment(engineer, booking, true);
        Ok(Some(change.booking))
    }

    pub async fn unassign(&self, booking: &BookingId) -> Result<Option<Booking>, StoreError> {
        let Some(change) = self.bookings.unassign_tracked(booking).await? else {
            tracing::debug!(booking_id = %booking, "Unassignment superseded; roster left as is");
            return Ok(None);
        };

        match &change.previous {
            Some(previous) => {
                self.roster.mirror_assignment(previous, booking, false);
            }
            None => tracing::debug!(booking_id = %booking, "Unassigned booking had no engineer"),
        }
        Ok(Some(change.booking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::fixtures::{sample_bookings, sample_engineers, to_data};
    use crate::infrastructure::testing::GatedGateway;
    use crate::ports::MockRequestGateway;
    use fixdesk_shared::{routes, Envelope};
    use serde_json::Value;

    fn gateway() -> MockRequestGateway {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_get()
            .withf(|path| path == routes::BOOKINGS)
            .returning(|_| Ok(Envelope::ok(to_data(&sample_bookings()))));
        gateway
            .expect_get()
            .withf(|path| path == routes::ENGINEERS)
            .returning(|_| Ok(Envelope::ok(to_data(&sample_engineers()))));
        gateway
    }

    async fn coordinator(gateway: MockRequestGateway) -> (AssignmentCoordinator, Arc<BookingStore>, Arc<RosterStore>) {
        let gateway = Arc::new(gateway);
        let bookings = Arc::new(BookingStore::new(gateway.clone()));
        let roster = Arc::new(RosterStore::new(gateway));
        bookings.list_bookings().await.unwrap();
        roster.list_engineers().await.unwrap();
        (
            AssignmentCoordinator::new(bookings.clone(), roster.clone()),
            bookings,
            roster,
        )
    }

    #[tokio::test]
    async fn assign_mirrors_booking_into_engineer_orders() {
        let mut gateway = gateway();
        gateway
            .expect_put()
            .returning(|_, _| Ok(Envelope::ok(Value::Null)));
        let (coordinator, bookings, roster) = coordinator(gateway).await;
        let b1 = BookingId::new("b1");

        coordinator.assign(&b1, &EngineerId::new("e1")).await.unwrap();
        assert!(roster
            .snapshot()
            .engineer(&EngineerId::new("e1"))
            .unwrap()
            .assigned_orders
            .contains(&b1));

        // Reassignment moves the booking between engineers.
        coordinator.assign(&b1, &EngineerId::new("e4")).await.unwrap();
        let state = roster.snapshot();
        assert!(!state.engineer(&EngineerId::new("e1")).unwrap().assigned_orders.contains(&b1));
        assert!(state.engineer(&EngineerId::new("e4")).unwrap().assigned_orders.contains(&b1));

        coordinator.unassign(&b1).await.unwrap();
        assert!(roster
            .snapshot()
            .engineer(&EngineerId::new("e4"))
            .unwrap()
            .assigned_orders
            .is_empty());
        assert_eq!(bookings.snapshot().booking(&b1).unwrap().assigned_engineer, None);
    }

    #[tokio::test]
    async fn unknown_engineer_is_rejected_without_a_remote_call() {
        let mut gateway = gateway();
        gateway.expect_put().never();
        let (coordinator, bookings, _roster) = coordinator(gateway).await;

        let result = coordinator
            .assign(&BookingId::new("b1"), &EngineerId::new("ghost"))
            .await;

        assert!(matches!(result, Err(StoreError::UnknownEngineer(_))));
        assert_eq!(
            bookings.snapshot().error.as_deref(),
            Some("Engineer ghost is not in the roster")
        );
    }

    #[tokio::test]
    async fn failed_remote_assignment_leaves_roster_untouched() {
        let mut gateway = gateway();
        gateway
            .expect_put()
            .returning(|_, _| Ok(Envelope::rejected("Engineer is busy")));
        let (coordinator, _bookings, roster) = coordinator(gateway).await;
        let before = roster.snapshot().engineers;

        let result = coordinator
            .assign(&BookingId::new("b1"), &EngineerId::new("e1"))
            .await;

        assert!(result.is_err());
        assert_eq!(roster.snapshot().engineers, before);
    }

    #[tokio::test]
    async fn superseded_assignment_leaves_a_single_holder() {
        let gateway = Arc::new(GatedGateway::default());
        let bookings = Arc::new(BookingStore::new(gateway.clone()));
        let roster = Arc::new(RosterStore::new(gateway.clone()));
        let loading = tokio::spawn({
            let (bookings, roster) = (bookings.clone(), roster.clone());
            async move {
                bookings.list_bookings().await.unwrap();
                roster.list_engineers().await.unwrap();
            }
        });
        gateway.wait_for(1).await;
        gateway.release_oldest(routes::BOOKINGS, Ok(Envelope::ok(to_data(&sample_bookings()))));
        gateway.wait_for(2).await;
        gateway.release_oldest(routes::ENGINEERS, Ok(Envelope::ok(to_data(&sample_engineers()))));
        loading.await.unwrap();

        let coordinator = Arc::new(AssignmentCoordinator::new(bookings.clone(), roster.clone()));
        let b1 = BookingId::new("b1");
        let older = tokio::spawn({
            let (coordinator, b1) = (coordinator.clone(), b1.clone());
            async move { coordinator.assign(&b1, &EngineerId::new("e1")).await }
        });
        gateway.wait_for(3).await;
        let newer = tokio::spawn({
            let (coordinator, b1) = (coordinator.clone(), b1.clone());
            async move { coordinator.assign(&b1, &EngineerId::new("e4")).await }
        });
        gateway.wait_for(4).await;

        let path = routes::assign_engineer(&b1);
        assert!(gateway.release_latest(&path, Ok(Envelope::ok(Value::Null))));
        assert!(newer.await.unwrap().unwrap().is_some());
        assert!(gateway.release_oldest(&path, Ok(Envelope::ok(Value::Null))));
        assert_eq!(older.await.unwrap().unwrap(), None);

        assert_eq!(
            bookings.snapshot().booking(&b1).unwrap().assigned_engineer,
            Some(EngineerId::new("e4"))
        );
        let holders: Vec<EngineerId> = roster
            .snapshot()
            .engineers
            .iter()
            .filter(|e| e.assigned_orders.contains(&b1))
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(holders, vec![EngineerId::new("e4")]);
    }
}
