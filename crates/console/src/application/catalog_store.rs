//! CatalogStore - services, categories, and the catalog screen state.
//!
//! List fetches replace the canonical lists wholesale. Mutations patch a
//! single entity by id (update/delete) or append it (create). Busy keys
//! follow the catalog screen: one shared `save` key for create and update,
//! one shared `category` key for category create and delete, and one key
//! per service id for delete.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use fixdesk_domain::common::ALL;
use fixdesk_domain::selectors::{filter_categories, filter_services, CatalogStats, ServiceFilter};
use fixdesk_domain::{
    remove_by_id, replace_by_id, upsert_by_id, Category, CategoryId, Service, ServiceId, ViewMode,
};
use fixdesk_shared::{routes, CategoryForm, FileAttachment, RequestBody, ServiceForm};

use super::busy::{BusyFlags, BusyGuard, BusyKey};
use super::response::{accept, ParseEnvelope};
use super::sequencing::{Sequencer, Settlements};
use super::{clear_error, record_failure, settle, shared, Shared, StoreError, StoreState};
use crate::ports::RequestGateway;

const LIST_SERVICES: &str = "list-services";
const LIST_CATEGORIES: &str = "list-categories";
const SAVE: &str = "save";
const CATEGORY: &str = "category";

fn delete_key(id: &ServiceId) -> BusyKey {
    BusyKey::scoped("delete", id)
}

#[derive(Debug, Clone)]
pub struct CatalogState {
    pub services: Vec<Service>,
    pub categories: Vec<Category>,
    pub error: Option<String>,
    pub busy: BusyFlags,
    pub search_term: String,
    /// `"all"` or a category id.
    pub category_filter: String,
    pub view_mode: ViewMode,
    settlements: Settlements,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            categories: Vec::new(),
            error: None,
            busy: BusyFlags::default(),
            search_term: String::new(),
            category_filter: ALL.to_string(),
            view_mode: ViewMode::default(),
            settlements: Settlements::default(),
        }
    }
}

impl CatalogState {
    pub fn is_loading(&self) -> bool {
        self.busy.is_set(&BusyKey::new(LIST_SERVICES))
    }

    pub fn categories_loading(&self) -> bool {
        self.busy.is_set(&BusyKey::new(LIST_CATEGORIES))
    }

    pub fn is_saving(&self) -> bool {
        self.busy.is_set(&BusyKey::new(SAVE))
    }

    pub fn is_saving_category(&self) -> bool {
        self.busy.is_set(&BusyKey::new(CATEGORY))
    }

    pub fn is_deleting(&self, id: &ServiceId) -> bool {
        self.busy.is_set(&delete_key(id))
    }

    pub fn service_filter(&self) -> ServiceFilter {
        ServiceFilter::from_ui(&self.search_term, &self.category_filter)
    }

    pub fn filtered_services(&self) -> Vec<&Service> {
        filter_services(&self.services, &self.service_filter())
    }

    pub fn filtered_categories(&self, text: &str) -> Vec<&Category> {
        filter_categories(&self.categories, text)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CatalogStats {
        CatalogStats::compute(&self.services, &self.categories, now)
    }
}

impl StoreState for CatalogState {
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

pub struct CatalogStore {
    state: Shared<CatalogState>,
    gateway: Arc<dyn RequestGateway>,
    sequencer: Sequencer,
}

impl CatalogStore {
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            state: shared(),
            gateway,
            sequencer: Sequencer::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.state.send_modify(|s| s.search_term = term);
    }

    pub fn set_category_filter(&self, category: impl Into<String>) {
        let category = category.into();
        self.state.send_modify(|s| s.category_filter = category);
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.state.send_modify(|s| s.view_mode = mode);
    }

    pub fn clear_error(&self) {
        clear_error(&self.state);
    }

    /// Fetch services matching `filter` server-side and replace the list.
    pub async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<Service>, StoreError> {
        const ACTION: &str = "fetch services";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(LIST_SERVICES));
        let ticket = self.sequencer.issue("services");
        self.state.send_modify(|s| s.error = None);

        let path = routes::services_dashboard(filter.text.as_deref(), filter.category_id.as_ref());
        tracing::debug!(path = %path, "Fetching services");

        let services: Vec<Service> = accept(self.gateway.get(&path).await, ACTION)
            .and_then(|envelope| envelope.parse_list(ACTION))
            .map_err(|e| record_failure(&self.state, e))?;

        if settle(&self.state, &ticket, |s| s.services = services.clone()) {
            tracing::info!(count = services.len(), "Services loaded");
        }
        Ok(services)
    }

    /// Re-run [`Self::list_services`] with the current screen filters.
    pub async fn refresh_services(&self) -> Result<Vec<Service>, StoreError> {
        let filter = self.state.borrow().service_filter();
        self.list_services(&filter).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        const ACTION: &str = "fetch categories";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(LIST_CATEGORIES));
        let ticket = self.sequencer.issue("categories");
        tracing::debug!("Fetching categories");

        let categories: Vec<Category> = accept(self.gateway.get(routes::CATEGORIES).await, ACTION)
            .and_then(|envelope| envelope.parse_list(ACTION))
            .map_err(|e| record_failure(&self.state, e))?;

        if settle(&self.state, &ticket, |s| s.categories = categories.clone()) {
            tracing::info!(count = categories.len(), "Categories loaded");
        }
        Ok(categories)
    }

    /// Create a service plan. The server's copy is appended on success.
    pub async fn create_service(
        &self,
        form: &ServiceForm,
        image: Option<FileAttachment>,
    ) -> Result<Option<Service>, StoreError> {
        const ACTION: &str = "create service";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(SAVE));
        tracing::debug!(name = %form.name, "Creating service");

        let body = RequestBody::Multipart(form.to_form_payload(image));
        let created: Option<Service> =
            accept(self.gateway.post(routes::CREATE_SERVICE, body).await, ACTION)
                .and_then(|envelope| envelope.parse_optional(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        match &created {
            Some(service) => {
                self.state
                    .send_modify(|s| s.services = upsert_by_id(&s.services, service.clone()));
                tracing::info!(service_id = %service.id, "Service created");
            }
            None => tracing::warn!("Service created but the response carried no data"),
        }
        Ok(created)
    }

    pub async fn update_service(
        &self,
        id: &ServiceId,
        form: &ServiceForm,
        image: Option<FileAttachment>,
    ) -> Result<Option<Service>, StoreError> {
        const ACTION: &str = "update service";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(SAVE));
        let ticket = self.sequencer.issue(format!("service:{id}"));
        tracing::debug!(service_id = %id, "Updating service");

        let body = RequestBody::Multipart(form.to_form_payload(image));
        let updated: Option<Service> =
            accept(self.gateway.put(&routes::edit_service(id), body).await, ACTION)
                .and_then(|envelope| envelope.parse_optional(ACTION))
                .map_err(|e| record_failure(&self.state, e))?;

        let Some(service) = &updated else {
            tracing::warn!(service_id = %id, "Service updated but the response carried no data");
            return Ok(None);
        };

        let mut found = true;
        let applied = settle(&self.state, &ticket, |s| {
            match replace_by_id(&s.services, service.clone()) {
                Some(next) => s.services = next,
                None => found = false,
            }
        });
        if applied && !found {
            tracing::warn!(service_id = %id, "Updated service is not in the local list");
        } else if applied {
            tracing::info!(service_id = %id, "Service updated");
        }
        Ok(updated)
    }

    pub async fn delete_service(&self, id: &ServiceId) -> Result<(), StoreError> {
        const ACTION: &str = "delete service";
        let _busy = BusyGuard::acquire(&self.state, delete_key(id));
        let ticket = self.sequencer.issue(format!("service:{id}"));
        tracing::debug!(service_id = %id, "Deleting service");

        accept(self.gateway.delete(&routes::delete_service(id)).await, ACTION)
            .map_err(|e| record_failure(&self.state, e))?;

        settle(&self.state, &ticket, |s| match remove_by_id(&s.services, id) {
            Some(next) => s.services = next,
            None => tracing::warn!(service_id = %id, "Deleted service is not in the local list"),
        });
        tracing::info!(service_id = %id, "Service deleted");
        Ok(())
    }

    pub async fn create_category(
        &self,
        form: &CategoryForm,
        image: Option<FileAttachment>,
    ) -> Result<Option<Category>, StoreError> {
        const ACTION: &str = "create category";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(CATEGORY));
        tracing::debug!(name = %form.name, "Creating category");

        let body = RequestBody::Multipart(form.to_form_payload(image));
        let created: Option<Category> = accept(self.gateway.post(routes::CATEGORIES, body).await, ACTION)
            .and_then(|envelope| envelope.parse_optional(ACTION))
            .map_err(|e| record_failure(&self.state, e))?;

        if let Some(category) = &created {
            self.state
                .send_modify(|s| s.categories = upsert_by_id(&s.categories, category.clone()));
            tracing::info!(category_id = %category.id, "Category created");
        }
        Ok(created)
    }

    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        const ACTION: &str = "delete category";
        let _busy = BusyGuard::acquire(&self.state, BusyKey::new(CATEGORY));
        let ticket = self.sequencer.issue(format!("category:{id}"));
        tracing::debug!(category_id = %id, "Deleting category");

        accept(self.gateway.delete(&routes::delete_category(id)).await, ACTION)
            .map_err(|e| record_failure(&self.state, e))?;

        settle(&self.state, &ticket, |s| match remove_by_id(&s.categories, id) {
            Some(next) => s.categories = next,
            None => tracing::warn!(category_id = %id, "Deleted category is not in the local list"),
        });
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::fixtures::{sample_categories, sample_services, to_data};
    use crate::infrastructure::testing::GatedGateway;
    use crate::ports::{GatewayError, MockRequestGateway};
    use fixdesk_domain::Features;
    use fixdesk_shared::Envelope;

    fn listing_gateway() -> MockRequestGateway {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_get()
            .withf(|path| path == routes::SERVICES_DASHBOARD)
            .returning(|_| Ok(Envelope::ok(to_data(&sample_services()))));
        gateway
    }

    fn ids(services: &[Service]) -> Vec<&str> {
        services.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn text_filter_selects_case_insensitively() {
        let store = CatalogStore::new(Arc::new(listing_gateway()));
        store.list_services(&ServiceFilter::default()).await.unwrap();

        store.set_search_term("ac");
        store.set_category_filter("all");

        let state = store.snapshot();
        let filtered: Vec<_> = state.filtered_services().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(filtered, vec!["s1"]);
    }

    #[tokio::test]
    async fn list_forwards_server_side_filters() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_get()
            .withf(|path| path == "/api/services/allServicesDashboard?search=fan&category=c2")
            .times(1)
            .returning(|_| Ok(Envelope::ok(serde_json::json!([]))));
        let store = CatalogStore::new(Arc::new(gateway));

        store.set_search_term("fan");
        store.set_category_filter("c2");
        let services = store.refresh_services().await.unwrap();

        assert!(services.is_empty());
        assert!(!store.snapshot().is_loading());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_and_keeps_order() {
        let mut gateway = listing_gateway();
        gateway
            .expect_delete()
            .withf(|path| path == "/api/services/deleteService/s2")
            .returning(|_| Ok(Envelope::ok(serde_json::Value::Null)));
        let store = CatalogStore::new(Arc::new(gateway));
        store.list_services(&ServiceFilter::default()).await.unwrap();

        store.delete_service(&ServiceId::new("s2")).await.unwrap();

        let state = store.snapshot();
        assert_eq!(ids(&state.services), vec!["s1", "s3"]);
        assert!(!state.is_deleting(&ServiceId::new("s2")));
    }

    #[tokio::test]
    async fn failed_delete_leaves_list_identical_and_clears_flag() {
        let mut gateway = listing_gateway();
        gateway
            .expect_delete()
            .returning(|_| Err(GatewayError::Transport("connection reset".into())));
        let store = CatalogStore::new(Arc::new(gateway));
        store.list_services(&ServiceFilter::default()).await.unwrap();
        let before = store.snapshot().services;

        let result = store.delete_service(&ServiceId::new("s1")).await;

        assert!(matches!(result, Err(StoreError::Gateway { .. })));
        let state = store.snapshot();
        assert_eq!(state.services, before);
        assert!(state.busy.is_empty());
        assert_eq!(state.error.as_deref(), Some("Failed to delete service"));
    }

    #[tokio::test]
    async fn rejected_update_records_server_message() {
        let mut gateway = listing_gateway();
        gateway
            .expect_put()
            .returning(|_, _| Ok(Envelope::rejected("Price must be positive")));
        let store = CatalogStore::new(Arc::new(gateway));
        store.list_services(&ServiceFilter::default()).await.unwrap();
        let before = store.snapshot().services;

        let form = ServiceForm::new("AC Repair", "c1", -1.0);
        let result = store.update_service(&ServiceId::new("s1"), &form, None).await;

        assert!(matches!(result, Err(StoreError::Rejected { .. })));
        let state = store.snapshot();
        assert_eq!(state.services, before);
        assert_eq!(state.error.as_deref(), Some("Price must be positive"));
        assert!(!state.is_saving());

        store.clear_error();
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn create_sends_multipart_and_appends_server_copy() {
        let mut gateway = listing_gateway();
        gateway
            .expect_post()
            .withf(|path, body| {
                path == routes::CREATE_SERVICE
                    && body
                        .as_form()
                        .is_some_and(|form| form.field("features") == Some(r#"["Wiring"]"#))
            })
            .returning(|_, _| {
                let created = Service::new("s4", "Switchboard Repair", sample_categories()[1].clone())
                    .with_features(Features::new(["Wiring"]));
                Ok(Envelope::ok(to_data(&created)))
            });
        let store = CatalogStore::new(Arc::new(gateway));
        store.list_services(&ServiceFilter::default()).await.unwrap();

        let form = ServiceForm::new("Switchboard Repair", "c2", 299.0)
            .with_features(Features::new(["Wiring", ""]));
        store.create_service(&form, None).await.unwrap();

        assert_eq!(ids(&store.snapshot().services), vec!["s1", "s2", "s3", "s4"]);
    }

    #[tokio::test]
    async fn update_of_unknown_service_is_a_tolerated_no_op() {
        let mut gateway = listing_gateway();
        gateway.expect_put().returning(|_, _| {
            let ghost = Service::new("s9", "Ghost", sample_categories()[0].clone());
            Ok(Envelope::ok(to_data(&ghost)))
        });
        let store = CatalogStore::new(Arc::new(gateway));
        store.list_services(&ServiceFilter::default()).await.unwrap();
        let before = store.snapshot().services;

        let form = ServiceForm::new("Ghost", "c1", 1.0);
        let result = store.update_service(&ServiceId::new("s9"), &form, None).await;

        assert!(result.is_ok());
        assert_eq!(store.snapshot().services, before);
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn later_issued_update_wins_even_when_it_settles_first() {
        let gateway = Arc::new(GatedGateway::default());
        let store = Arc::new(CatalogStore::new(gateway.clone()));
        store.state.send_modify(|s| s.services = sample_services());

        let path = routes::edit_service(&ServiceId::new("s1"));
        let first = tokio::spawn({
            let store = store.clone();
            async move {
                let form = ServiceForm::new("AC Repair v1", "c1", 100.0);
                store.update_service(&ServiceId::new("s1"), &form, None).await
            }
        });
        gateway.wait_for(1).await;
        let second = tokio::spawn({
            let store = store.clone();
            async move {
                let form = ServiceForm::new("AC Repair v2", "c1", 200.0);
                store.update_service(&ServiceId::new("s1"), &form, None).await
            }
        });
        gateway.wait_for(2).await;
        assert!(store.snapshot().is_saving());

        let mut v2 = sample_services()[0].clone();
        v2.name = "AC Repair v2".into();
        assert!(gateway.release_latest(&path, Ok(Envelope::ok(to_data(&v2)))));
        second.await.unwrap().unwrap();
        assert!(store.snapshot().is_saving());

        let mut v1 = sample_services()[0].clone();
        v1.name = "AC Repair v1".into();
        assert!(gateway.release_oldest(&path, Ok(Envelope::ok(to_data(&v1)))));
        first.await.unwrap().unwrap();

        let state = store.snapshot();
        assert_eq!(state.services[0].name, "AC Repair v2");
        assert!(!state.is_saving());
    }

    #[tokio::test]
    async fn category_lifecycle() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_get()
            .withf(|path| path == routes::CATEGORIES)
            .returning(|_| Ok(Envelope::ok(to_data(&sample_categories()))));
        gateway
            .expect_post()
            .withf(|path, body| path == routes::CATEGORIES && body.is_multipart())
            .returning(|_, _| Ok(Envelope::ok(to_data(&Category::new("c4", "Carpentry")))));
        gateway
            .expect_delete()
            .withf(|path| path == "/api/services/deleteCategory/c1")
            .returning(|_| Ok(Envelope::ok(serde_json::Value::Null)));
        let store = CatalogStore::new(Arc::new(gateway));

        store.list_categories().await.unwrap();
        store
            .create_category(&CategoryForm::new("Carpentry", "Wood work"), None)
            .await
            .unwrap();
        store.delete_category(&CategoryId::new("c1")).await.unwrap();

        let state = store.snapshot();
        let names: Vec<_> = state.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Electrical", "Plumbing", "Carpentry"]);
        assert!(!state.is_saving_category());
        assert_eq!(state.filtered_categories("carp").len(), 1);
    }

    #[tokio::test]
    async fn delete_flag_is_distinct_from_shared_flags() {
        let gateway = Arc::new(GatedGateway::default());
        let store = Arc::new(CatalogStore::new(gateway.clone()));
        let named_like_a_flag = ServiceId::new(SAVE);

        let delete = tokio::spawn({
            let (store, id) = (store.clone(), named_like_a_flag.clone());
            async move { store.delete_service(&id).await }
        });
        gateway.wait_for(1).await;

        let state = store.snapshot();
        assert!(state.is_deleting(&named_like_a_flag));
        assert!(!state.is_saving());

        gateway.release_oldest(
            &routes::delete_service(&named_like_a_flag),
            Ok(Envelope::ok(serde_json::Value::Null)),
        );
        delete.await.unwrap().unwrap();
        assert!(!store.snapshot().is_deleting(&named_like_a_flag));
    }
}
