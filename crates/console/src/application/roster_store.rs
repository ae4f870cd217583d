//! RosterStore - engineers and the available-engineers index.
//!
//! The index is a list of engineer ids patched alongside every roster
//! change. Each patch re-evaluates the full availability predicate for the
//! touched engineer, so the index always equals
//! `recompute_available(&engineers)`.

use std::sync::Arc;

use tokio::sync::watch;

use fixdesk_domain::selectors::{
    available_engineers, drop_available, filter_engineers, recompute_available, sync_available,
    AvailabilityFilter, EngineerFilters, EngineerStatusFilter, VerificationFilter,
};
use fixdesk_domain::{
    find_by_id, remove_by_id, replace_by_id, upsert_by_id, BookingId, Engineer, EngineerId,
    StatusField,
};
use fixdesk_shared::{
    routes, EngineerForm, EngineerPatch, RequestBody, StatusToggleBody, VerifyBody,
};

use super::busy::{BusyFlags, BusyGuard, BusyKey};
use super::response::{accept, ParseEnvelope};
use super::sequencing::{Sequencer, Settlements};
use super::{clear_error, record_failure, settle, shared, Shared, StoreError, StoreState};
use crate::ports::RequestGateway;

const LIST: &str = "list-engineers";
const ADD: &str = "add-engineer";

#[derive(Debug, Clone, Default)]
pub struct RosterState {
    pub engineers: Vec<Engineer>,
    /// Ids of dispatchable engineers.
    pub available: Vec<EngineerId>,
    pub error: Option<String>,
    pub busy: BusyFlags,
    pub filters: EngineerFilters,
    settlements: Settlements,
}

impl RosterState {
    pub fn is_loading(&self) -> bool {
        self.busy.is_set(&BusyKey::new(LIST))
    }

    pub fn is_adding(&self) -> bool {
        self.busy.is_set(&BusyKey::new(ADD))
    }

    /// Busy state of one operation (`delete`, `verify`, `toggle`, `update`)
    /// on one engineer.
    pub fn is_busy(&self, operation: &str, id: &EngineerId) -> bool {
        self.busy.is_set(&BusyKey::scoped(operation, id))
    }

    /// True while any operation on `id` is in flight.
    pub fn is_engineer_busy(&self, id: &EngineerId) -> bool {
        self.busy.keys().any(|key| key.targets(id.as_str()))
    }

    pub fn engineer(&self, id: &EngineerId) -> Option<&Engineer> {
        find_by_id(&self.engineers, id)
    }

    pub fn available_engineers(&self) -> Vec<&Engineer> {
        available_engineers(&self.engineers, &self.available)
    }

    pub fn filtered(&self) -> Vec<&Engineer> {
        filter_engineers(&self.engineers, &self.filters)
    }

    fn replace_engineers(&mut self, engineers: Vec<Engineer>) {
        self.available = recompute_available(&engineers);
        self.engineers = engineers;
    }

    /// Replace the engineer sharing `engineer`'s id and resync the index.
    /// Returns false when the engineer is not in the roster.
    fn patch_engineer(&mut self, engineer: Engineer) -> bool {
        match replace_by_id(&self.engineers, engineer.clone()) {
            Some(next) => {
                self.engineers = next;
                self.available = sync_available(&self.available, &engineer);
                true
            }
            None => false,
        }
    }
}

impl StoreState for RosterState {
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

pub struct RosterStore {
    state: Shared<RosterState>,
    gateway: Arc<dyn RequestGateway>,
    sequencer: Sequencer,
}

impl RosterStore {
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            state: shared(),
            gateway,
            sequencer: Sequencer::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RosterState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RosterState {
        self.state.borrow().clone()
    }

    pub fn contains_engineer(&self, id: &EngineerId) -> bool {
        self.state.borrow().engineer(id).is_some()
    }

    pub fn is_engineer_busy(&self, id: &EngineerId) -> bool {
        self.state.borrow().is_engineer_busy(id)
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.state.send_modify(|s| s.filters.search_term = term);
    }

    pub fn set_availability_filter(&self, filter: AvailabilityFilter) {
        self.state.send_modify(|s| s.filters.availability = filter);
    }

    pub fn set_status_filter(&self, filter: EngineerStatusFilter) {
        self.state.send_modify(|s| s.filters.status = filter);
    }

    pub fn set_verification_filter(&self, filter: VerificationFilter) {
        self.state.send_modify(|s| s.filters.verification = filter);
    }

    pub fn clear_filters(&self) {
        self.state.send_modify(|s| s.filters = EngineerFilters::default());
    }

    pub fn clear_error(&self) {
        clear_error(&self.state);
    }

    /// Fetch the full roster and rebuild the index from it.
    pub async fn list_engineers(&self) -> Result<Vec<Engineer>, StoreError> {
        const ACTION: &str = "fetch engineers";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(LIST));
        let ticket = self.sequencer.issue("engineers");
        self.state.send_modify(|s| s.error = None);
        tracing::debug!("Fetching engineers");

        let engineers: Vec<Engineer> = accept(self.gateway.get(routes::ENGINEERS).await, ACTION)
            .and_then(|envelope| envelope.parse_list(ACTION))
            .map_err(|e| record_failure(&self.state, e))?;

        if settle(&self.state, &ticket, |s| s.replace_engineers(engineers.clone())) {
            tracing::info!(count = engineers.len(), "Engineers loaded");
        }
        Ok(engineers)
    }

    /// Fetch the server's available-engineers listing.
    ///
    /// The fetched engineers are upserted into the roster and the index is
    /// rebuilt from the merged roster, so an engineer the server lists but
    /// whose flags make it undispatchable never enters the index.
    pub async fn list_available_engineers(&self) -> Result<Vec<Engineer>, StoreError> {
        const ACTION: &str = "fetch available engineers";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(LIST));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!("Fetching available engineers");

        let fetched: Vec<Engineer> =
            accept(self.gateway.get(routes::AVAILABLE_ENGINEERS).await, ACTION)
                .and_then(|envelope| envelope.parse_list(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        self.state.send_modify(|s| {
            let merged = fetched
                .iter()
                .cloned()
                .fold(s.engineers.clone(), |roster, e| upsert_by_id(&roster, e));
            s.replace_engineers(merged);
        });
        tracing::info!(count = fetched.len(), "Available engineers loaded");
        Ok(fetched)
    }

    pub async fn add_engineer(&self, form: &EngineerForm) -> Result<Option<Engineer>, StoreError> {
        const ACTION: &str = "add engineer";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(ADD));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(name = %form.name, "Adding engineer");

        let body = json_body(form, ACTION).map_err(|e| record_failure(&self.state, e))?;
        let created: Option<Engineer> =
            accept(self.gateway.post(routes::ADD_ENGINEER, body).await, ACTION)
                .and_then(|envelope| envelope.parse_optional(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        if let Some(engineer) = &created {
            self.state.send_modify(|s| {
                s.engineers = upsert_by_id(&s.engineers, engineer.clone());
                s.available = sync_available(&s.available, engineer);
            });
            tracing::info!(engineer_id = %engineer.id, "Engineer added");
        }
        Ok(created)
    }

    pub async fn update_engineer(
        &self,
        id: &EngineerId,
        patch: &EngineerPatch,
    ) -> Result<Option<Engineer>, StoreError> {
        const ACTION: &str = "update engineer";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::scoped("update", id));
        let ticket = self.sequencer.issue(engineer_ticket(id));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(engineer_id = %id, "Updating engineer");

        let body = json_body(patch, ACTION).map_err(|e| record_failure(&self.state, e))?;
        let updated: Option<Engineer> =
            accept(self.gateway.put(&routes::update_engineer(id), body).await, ACTION)
                .and_then(|envelope| envelope.parse_optional(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        if let Some(engineer) = &updated {
            self.apply_server_copy(&ticket, engineer.clone());
        }
        Ok(updated)
    }

    /// Remove `id` from the roster and the index in one settlement.
    pub async fn delete_engineer(&self, id: &EngineerId) -> Result<(), StoreError> {
        const ACTION: &str = "delete engineer";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::scoped("delete", id));
        let ticket = self.sequencer.issue(engineer_ticket(id));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(engineer_id = %id, "Deleting engineer");

        accept(self.gateway.delete(&routes::delete_engineer(id)).await, ACTION)
            .map_err(|e| record_failure(&self.state, e))?;

        settle(&self.state, &ticket, |s| {
            match remove_by_id(&s.engineers, id) {
                Some(next) => s.engineers = next,
                None => tracing::warn!(engineer_id = %id, "Deleted engineer is not in the local roster"),
            }
            s.available = drop_available(&s.available, id);
        });
        tracing::info!(engineer_id = %id, "Engineer deleted");
        Ok(())
    }

    /// Set one status flag of `id`, patching the engineer and the index.
    pub async fn toggle_status(
        &self,
        id: &EngineerId,
        field: StatusField,
        value: bool,
    ) -> Result<(), StoreError> {
        const ACTION: &str = "update engineer status";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::scoped("toggle", id));
        let ticket = self.sequencer.issue(engineer_ticket(id));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(engineer_id = %id, field = %field, value, "Toggling engineer status");

        let body = json_body(&StatusToggleBody { field, value }, ACTION)
            .map_err(|e| record_failure(&self.state, e))?;
        accept(
            self.gateway.put(&routes::toggle_engineer_status(id), body).await,
            ACTION,
        )
        .map_err(|e| record_failure(&self.state, e))?;

        settle(&self.state, &ticket, |s| {
            let Some(mut engineer) = s.engineer(id).cloned() else {
                tracing::warn!(engineer_id = %id, "Toggled engineer is not in the local roster");
                return;
            };
            engineer.set_status(field, value);
            s.patch_engineer(engineer);
        });
        tracing::info!(engineer_id = %id, field = %field, value, "Engineer status updated");
        Ok(())
    }

    pub async fn verify(&self, id: &EngineerId) -> Result<Option<Engineer>, StoreError> {
        const ACTION: &str = "verify engineer";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::scoped("verify", id));
        let ticket = self.sequencer.issue(engineer_ticket(id));
        self.state.send_modify(|s| s.error = None);
        tracing::debug!(engineer_id = %id, "Verifying engineer");

        let body = json_body(&VerifyBody::default(), ACTION)
            .map_err(|e| record_failure(&self.state, e))?;
        let verified: Option<Engineer> =
            accept(self.gateway.put(&routes::verify_engineer(id), body).await, ACTION)
                .and_then(|envelope| envelope.parse_optional(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        match &verified {
            Some(engineer) => self.apply_server_copy(&ticket, engineer.clone()),
            None => {
                settle(&self.state, &ticket, |s| {
                    if let Some(mut engineer) = s.engineer(id).cloned() {
                        engineer.is_verified = true;
                        s.patch_engineer(engineer);
                    }
                });
            }
        }
        tracing::info!(engineer_id = %id, "Engineer verified");
        Ok(verified)
    }

    /// Local-only patch of `Engineer::assigned_orders`. No remote call.
    ///
    /// Returns false when the engineer is not in the roster.
    pub fn mirror_assignment(&self, engineer: &EngineerId, booking: &BookingId, assigned: bool) -> bool {
        let mut found = false;
        self.state.send_if_modified(|s| {
            let Some(mut local) = s.engineer(engineer).cloned() else {
                return false;
            };
            found = true;
            let changed = if assigned {
                local.assigned_orders.insert(booking.clone())
            } else {
                local.assigned_orders.remove(booking)
            };
            if changed {
                s.patch_engineer(local);
            }
            changed
        });
        found
    }

    fn apply_server_copy(&self, ticket: &super::sequencing::Ticket, engineer: Engineer) {
        let id = engineer.id.clone();
        let mut found = true;
        let applied = settle(&self.state, ticket, |s| found = s.patch_engineer(engineer));
        if applied && !found {
            tracing::warn!(engineer_id = %id, "Updated engineer is not in the local roster");
        } else if applied {
            tracing::info!(engineer_id = %id, "Engineer updated");
        }
    }
}

/// Every mutation that writes an engineer settles under this key.
fn engineer_ticket(id: &EngineerId) -> String {
    format!("engineer:{id}")
}

fn json_body<T: serde::Serialize>(payload: &T, action: &'static str) -> Result<RequestBody, StoreError> {
    RequestBody::json(payload).map_err(|e| StoreError::Parse {
        action,
        message: e.to_string(),
    })
}
