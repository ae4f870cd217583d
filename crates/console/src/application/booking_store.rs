//! BookingStore - bookings, their order status, and engineer assignment.
//!
//! Assignment here only writes `Booking::assigned_engineer`. The matching
//! `Engineer::assigned_orders` entry is not touched by this store; callers
//! that need both sides updated go through
//! [`AssignmentCoordinator`](super::AssignmentCoordinator).

use std::sync::Arc;

use tokio::sync::watch;

use fixdesk_domain::selectors::{filter_bookings, BookingFilters, BookingStats};
use fixdesk_domain::{
    find_by_id, replace_by_id, Booking, BookingId, EngineerId, OrderStatus, PaymentStatus,
    Service,
};
use fixdesk_shared::{routes, AssignEngineerBody, OrderStatusBody, RequestBody};

use super::busy::{BusyFlags, BusyGuard, BusyKey};
use super::response::{accept, ParseEnvelope};
use super::sequencing::{Sequencer, Settlements};
use super::{clear_error, record_failure, settle, shared, Shared, StoreError, StoreState};
use crate::ports::RequestGateway;

const LIST: &str = "list-bookings";

fn assign_key(id: &BookingId) -> BusyKey {
    BusyKey::new(format!("assign-{id}"))
}

fn unassign_key(id: &BookingId) -> BusyKey {
    BusyKey::new(format!("unassign-{id}"))
}

fn status_key(id: &BookingId) -> BusyKey {
    BusyKey::new(format!("status-{id}"))
}

/// An applied assignment settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentChange {
    pub booking: Booking,
    /// Engineer held by the booking just before this settlement.
    pub previous: Option<EngineerId>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingState {
    pub bookings: Vec<Booking>,
    /// Total reported by the server with the last listing.
    pub count: u64,
    pub error: Option<String>,
    pub busy: BusyFlags,
    pub filters: BookingFilters,
    settlements: Settlements,
}

impl BookingState {
    pub fn is_loading(&self) -> bool {
        self.busy.is_set(&BusyKey::new(LIST))
    }

    pub fn is_assigning(&self, id: &BookingId) -> bool {
        self.busy.is_set(&assign_key(id))
    }

    pub fn is_unassigning(&self, id: &BookingId) -> bool {
        self.busy.is_set(&unassign_key(id))
    }

    pub fn is_updating_status(&self, id: &BookingId) -> bool {
        self.busy.is_set(&status_key(id))
    }

    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        find_by_id(&self.bookings, id)
    }

    /// `catalog` resolves plan names for bookings that carry a bare plan id.
    pub fn filtered<'a>(&'a self, catalog: &[Service]) -> Vec<&'a Booking> {
        filter_bookings(&self.bookings, &self.filters, catalog)
    }

    pub fn stats(&self) -> BookingStats {
        BookingStats::compute(&self.bookings)
    }
}

impl StoreState for BookingState {
    fn busy_mut(&mut self) -> &mut BusyFlags {
        &mut self.busy
    }

    fn settlements_mut(&mut self) -> &mut Settlements {
        &mut self.settlements
    }

    fn error_mut(&mut self) -> &mut Option<String> {
        &mut self.error
    }
}

pub struct BookingStore {
    state: Shared<BookingState>,
    gateway: Arc<dyn RequestGateway>,
    sequencer: Sequencer,
}

impl BookingStore {
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            state: shared(),
            gateway,
            sequencer: Sequencer::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BookingState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> BookingState {
        self.state.borrow().clone()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.state.send_modify(|s| s.filters.search_term = term);
    }

    /// `None` shows every payment status.
    pub fn set_payment_status_filter(&self, status: Option<PaymentStatus>) {
        self.state.send_modify(|s| s.filters.payment_status = status);
    }

    /// `None` shows every order status.
    pub fn set_order_status_filter(&self, status: Option<OrderStatus>) {
        self.state.send_modify(|s| s.filters.order_status = status);
    }

    pub fn clear_filters(&self) {
        self.state.send_modify(|s| s.filters = BookingFilters::default());
    }

    pub fn clear_error(&self) {
        clear_error(&self.state);
    }

    pub(crate) fn report(&self, error: StoreError) -> StoreError {
        record_failure(&self.state, error)
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        const ACTION: &str = "fetch bookings";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(LIST));
        let ticket = self.sequencer.issue("bookings");
        self.state.send_modify(|s| s.error = None);
        tracing::debug!("Fetching bookings");

        let envelope = accept(self.gateway.get(routes::BOOKINGS).await, ACTION)
            .map_err(|e| record_failure(&self.state, e))?;
        let bookings: Vec<Booking> = envelope
            .parse_list(ACTION)
            .map_err(|e| record_failure(&self.state, e))?;
        let count = envelope.count.unwrap_or(0);

        if settle(&self.state, &ticket, |s| {
            s.bookings = bookings.clone();
            s.count = count;
        }) {
            tracing::info!(count = bookings.len(), total = count, "Bookings loaded");
        }
        Ok(bookings)
    }

    /// Ask the server to move `id` to `status`.
    ///
    /// Nothing changes locally until the server answers; the local booking
    /// then takes its status fields from the server copy.
    pub async fn set_order_status(
        &self,
        id: &BookingId,
        status: OrderStatus,
    ) -> Result<Option<Booking>, StoreError> {
        const ACTION: &str = "update booking status";
        let _busy = BusyGuard::acquire(&self.state, status_key(id));
        let ticket = self.sequencer.issue(format!("status:{id}"));
        tracing::debug!(booking_id = %id, status = %status, "Updating order status");

        let body = RequestBody::json(&OrderStatusBody { status })
            .map_err(|e| StoreError::Parse {
                action: ACTION,
                message: e.to_string(),
            })
            .map_err(|e| record_failure(&self.state, e))?;
        let server: Option<Booking> =
            accept(self.gateway.put(&routes::update_order_status(id), body).await, ACTION)
                .and_then(|envelope| envelope.parse_optional(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        let Some(server) = server else {
            tracing::warn!(booking_id = %id, "Status updated but the response carried no booking");
            return Ok(None);
        };

        let mut patched = None;
        settle(&self.state, &ticket, |s| {
            let Some(local) = find_by_id(&s.bookings, id) else {
                tracing::warn!(booking_id = %id, "Updated booking is not in the local list");
                return;
            };
            let mut local = local.clone();
            local.apply_status_from(&server);
            if let Some(next) = replace_by_id(&s.bookings, local.clone()) {
                s.bookings = next;
                patched = Some(local);
            }
        });
        if patched.is_some() {
            tracing::info!(booking_id = %id, status = %server.order_status, "Order status updated");
        }
        Ok(patched)
    }

    /// Link `engineer` to booking `id`. Returns the patched local booking,
    /// or `None` when the booking is not in the local list.
    pub async fn assign_engineer(
        &self,
        id: &BookingId,
        engineer: &EngineerId,
    ) -> Result<Option<Booking>, StoreError> {
        let change = self.assign_tracked(id, engineer).await?;
        Ok(change.map(|c| c.booking))
    }

    pub async fn unassign_engineer(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        let change = self.unassign_tracked(id).await?;
        Ok(change.map(|c| c.booking))
    }

    /// Like [`assign_engineer`](Self::assign_engineer), also reporting the
    /// engineer the applied settlement replaced. `None` when the settlement
    /// was superseded or the booking is not loaded.
    pub(crate) async fn assign_tracked(
        &self,
        id: &BookingId,
        engineer: &EngineerId,
    ) -> Result<Option<AssignmentChange>, StoreError> {
        const ACTION: &str = "assign engineer to booking";
        let _busy = BusyGuard::acquire(&self.state, assign_key(id));
        let ticket = self.sequencer.issue(format!("assignment:{id}"));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(booking_id = %id, engineer_id = %engineer, "Assigning engineer");

        let body = RequestBody::json(&AssignEngineerBody {
            engineer_id: engineer.clone(),
        })
        .map_err(|e| StoreError::Parse {
            action: ACTION,
            message: e.to_string(),
        })
        .map_err(|e| record_failure(&self.state, e))?;
        accept(self.gateway.put(&routes::assign_engineer(id), body).await, ACTION)
            .map_err(|e| record_failure(&self.state, e))?;

        let change = self.patch_assignment(id, Some(engineer.clone()), &ticket);
        tracing::info!(booking_id = %id, engineer_id = %engineer, "Engineer assigned");
        Ok(change)
    }

    pub(crate) async fn unassign_tracked(
        &self,
        id: &BookingId,
    ) -> Result<Option<AssignmentChange>, StoreError> {
        const ACTION: &str = "unassign engineer from booking";
        let _busy = BusyGuard::acquire(&self.state, unassign_key(id));
        let ticket = self.sequencer.issue(format!("assignment:{id}"));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(booking_id = %id, "Unassigning engineer");

        accept(
            self.gateway
                .put(&routes::unassign_engineer(id), RequestBody::empty())
                .await,
            ACTION,
        )
        .map_err(|e| record_failure(&self.state, e))?;

        let change = self.patch_assignment(id, None, &ticket);
        tracing::info!(booking_id = %id, "Engineer unassigned");
        Ok(change)
    }

    fn patch_assignment(
        &self,
        id: &BookingId,
        engineer: Option<EngineerId>,
        ticket: &super::sequencing::Ticket,
    ) -> Option<AssignmentChange> {
        let mut change = None;
        settle(&self.state, ticket, |s| {
            let Some(local) = find_by_id(&s.bookings, id) else {
                tracing::warn!(booking_id = %id, "Assigned booking is not in the local list");
                return;
            };
            let mut local = local.clone();
            let previous = std::mem::replace(&mut local.assigned_engineer, engineer);
            if let Some(next) = replace_by_id(&s.bookings, local.clone()) {
                s.bookings = next;
                change = Some(AssignmentChange {
                    booking: local,
                    previous,
                });
            }
        });
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::fixtures::{sample_bookings, sample_services, to_data};
    use crate::infrastructure::testing::GatedGateway;
    use crate::ports::{GatewayError, MockRequestGateway};
    use fixdesk_shared::Envelope;
    use serde_json::json;

    fn listing_gateway() -> MockRequestGateway {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_get()
            .withf(|path| path == routes::BOOKINGS)
            .returning(|_| Ok(Envelope::ok(to_data(&sample_bookings())).with_count(3)));
        gateway
    }

    async fn loaded(gateway: MockRequestGateway) -> BookingStore {
        let store = BookingStore::new(Arc::new(gateway));
        store.list_bookings().await.unwrap();
        store
    }

    #[tokio::test]
    async fn listing_records_envelope_count() {
        let store = loaded(listing_gateway()).await;
        let state = store.snapshot();
        assert_eq!(state.bookings.len(), 3);
        assert_eq!(state.count, 3);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn assign_then_unassign_restores_the_booking() {
        let mut gateway = listing_gateway();
        gateway
            .expect_put()
            .withf(|path, body| {
                path == "/api/engineer/assignEngineerToOrder/b1"
                    && body.as_json() == Some(&json!({"engineerId": "e1"}))
            })
            .times(1)
            .returning(|_, _| Ok(Envelope::ok(json!({"message": "assigned"}))));
        gateway
            .expect_put()
            .withf(|path, body| {
                path == "/api/engineer/unAssignEngineerFromOrder/b1"
                    && body.as_json() == Some(&json!({}))
            })
            .times(1)
            .returning(|_, _| Ok(Envelope::ok(serde_json::Value::Null)));
        let store = loaded(gateway).await;
        let original = store.snapshot().booking(&BookingId::new("b1")).cloned().unwrap();

        let assigned = store
            .assign_engineer(&BookingId::new("b1"), &EngineerId::new("e1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assigned.assigned_engineer, Some(EngineerId::new("e1")));

        store.unassign_engineer(&BookingId::new("b1")).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.booking(&BookingId::new("b1")), Some(&original));
        assert!(!state.is_assigning(&BookingId::new("b1")));
        assert!(!state.is_unassigning(&BookingId::new("b1")));
    }

    #[tokio::test]
    async fn status_update_applies_only_server_status_fields() {
        let mut gateway = listing_gateway();
        gateway
            .expect_put()
            .withf(|path, body| {
                path == "/api/services/updateOrderStatus/b2"
                    && body.as_json() == Some(&json!({"status": "Completed"}))
            })
            .returning(|_, _| {
                let mut server = sample_bookings()[1].clone();
                server.order_status = OrderStatus::Completed;
                server.customer_details.name = "Server Side Name".into();
                Ok(Envelope::ok(to_data(&server)))
            });
        let store = loaded(gateway).await;

        store
            .set_order_status(&BookingId::new("b2"), OrderStatus::Completed)
            .await
            .unwrap();

        let state = store.snapshot();
        let booking = state.booking(&BookingId::new("b2")).unwrap();
        assert_eq!(booking.order_status, OrderStatus::Completed);
        assert_eq!(booking.customer_details.name, sample_bookings()[1].customer_details.name);
        assert!(!state.is_updating_status(&BookingId::new("b2")));
    }

    #[tokio::test]
    async fn status_is_not_changed_before_the_server_answers() {
        let gateway = Arc::new(GatedGateway::default());
        let store = Arc::new(BookingStore::new(gateway.clone()));
        store.state.send_modify(|s| s.bookings = sample_bookings());

        let id = BookingId::new("b1");
        let pending = tokio::spawn({
            let store = store.clone();
            let id = id.clone();
            async move { store.set_order_status(&id, OrderStatus::Cancelled).await }
        });
        gateway.wait_for(1).await;

        let state = store.snapshot();
        assert_eq!(state.booking(&id).unwrap().order_status, OrderStatus::Upcoming);
        assert!(state.is_updating_status(&id));

        gateway.release_oldest(
            &routes::update_order_status(&id),
            Err(GatewayError::Status {
                status: 500,
                message: String::new(),
            }),
        );
        assert!(pending.await.unwrap().is_err());

        let state = store.snapshot();
        assert_eq!(state.booking(&id).unwrap().order_status, OrderStatus::Upcoming);
        assert_eq!(state.error.as_deref(), Some("Failed to update booking status"));
        assert!(state.busy.is_empty());
    }

    #[tokio::test]
    async fn failed_assignment_leaves_bookings_untouched() {
        let mut gateway = listing_gateway();
        gateway.expect_put().returning(|_, _| {
            Err(GatewayError::Status {
                status: 404,
                message: "Engineer not found".into(),
            })
        });
        let store = loaded(gateway).await;
        let before = store.snapshot().bookings;

        let result = store
            .assign_engineer(&BookingId::new("b1"), &EngineerId::new("e404"))
            .await;

        assert!(result.is_err());
        let state = store.snapshot();
        assert_eq!(state.bookings, before);
        assert_eq!(state.error.as_deref(), Some("Engineer not found"));
        assert!(!state.is_assigning(&BookingId::new("b1")));
    }

    #[tokio::test]
    async fn filters_resolve_plan_names_through_the_catalog() {
        let store = loaded(listing_gateway()).await;
        let catalog = sample_services();

        store.set_search_term("pipe");
        let state = store.snapshot();
        let ids: Vec<_> = state.filtered(&catalog).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b3"]);

        store.clear_filters();
        store.set_payment_status_filter(Some(PaymentStatus::Paid));
        assert_eq!(store.snapshot().filtered(&catalog).len(), 2);

        let stats = store.snapshot().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.revenue, 499.0 + 150.0);
    }
}
