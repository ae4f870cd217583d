//! Read-only plan type lookup.

use std::sync::Arc;

use tokio::sync::OnceCell;

use fixdesk_domain::{find_by_id, PlanType, PlanTypeId};
use fixdesk_shared::routes;

use super::response::{accept, ParseEnvelope};
use super::StoreError;
use crate::ports::RequestGateway;

/// Plan types fetched once and served from memory afterwards.
///
/// A failed fetch is not cached; the next call tries again.
pub struct PlanTypeDirectory {
    gateway: Arc<dyn RequestGateway>,
    plan_types: OnceCell<Vec<PlanType>>,
}

impl PlanTypeDirectory {
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            gateway,
            plan_types: OnceCell::new(),
        }
    }

    pub async fn plan_types(&self) -> Result<&[PlanType], StoreError> {
        const ACTION: &str = "fetch plan types";
        let plan_types = self
            .plan_types
            .get_or_try_init(|| async {
                tracing::debug!("Fetching plan types");
                let plan_types: Vec<PlanType> =
                    accept(self.gateway.get(routes::PLAN_TYPES).await, ACTION)?
                        .parse_list(ACTION)?;
                tracing::info!(count = plan_types.len(), "Plan types loaded");
                Ok::<_, StoreError>(plan_types)
            })
            .await?;
        Ok(plan_types)
    }

    pub async fn label_of(&self, id: &PlanTypeId) -> Result<Option<String>, StoreError> {
        let plan_types = self.plan_types().await?;
        Ok(find_by_id(plan_types, id).map(|p| p.label.clone()))
    }

    /// Cached list, without fetching.
    pub fn cached(&self) -> Option<&[PlanType]> {
        self.plan_types.get().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{GatewayError, MockRequestGateway};
    use fixdesk_shared::Envelope;
    use mockall::Sequence;
    use serde_json::json;

    #[tokio::test]
    async fn fetches_once_and_serves_the_cache() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_get()
            .withf(|path| path == routes::PLAN_TYPES)
            .times(1)
            .returning(|_| {
                Ok(Envelope::ok(json!([
                    {"_id": "p1", "label": "Basic"},
                    {"_id": "p2", "label": "Premium"}
                ])))
            });
        let directory = PlanTypeDirectory::new(Arc::new(gateway));

        assert!(directory.cached().is_none());
        assert_eq!(directory.plan_types().await.unwrap().len(), 2);
        assert_eq!(
            directory.label_of(&PlanTypeId::new("p2")).await.unwrap().as_deref(),
            Some("Premium")
        );
        assert_eq!(directory.label_of(&PlanTypeId::new("p9")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried() {
        let mut gateway = MockRequestGateway::new();
        let mut seq = Sequence::new();
        gateway
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(GatewayError::Transport("connection refused".into())));
        gateway
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Envelope::ok(json!([{"_id": "p1", "label": "Basic"}]))));
        let directory = PlanTypeDirectory::new(Arc::new(gateway));

        assert!(directory.plan_types().await.is_err());
        assert_eq!(directory.plan_types().await.unwrap().len(), 1);
    }
}
