//! Service plans offered in the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::reference::Reference;
use crate::collections::Identified;
use crate::ids::{CategoryId, PlanTypeId, ServiceId};
use crate::value_objects::Features;

pub type CategoryRef = Reference<CategoryId, Category>;
pub type PlanTypeRef = Reference<PlanTypeId, PlanType>;
pub type ServicePlanRef = Reference<ServiceId, Service>;

/// Read-only plan tier reference data (e.g. "Basic", "Premium").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanType {
    #[serde(rename = "_id", alias = "id")]
    pub id: PlanTypeId,
    #[serde(rename = "planType", alias = "label")]
    pub label: String,
}

impl Identified for PlanType {
    type Id = PlanTypeId;

    fn id(&self) -> &PlanTypeId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id", alias = "id")]
    pub id: ServiceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default, rename = "image", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub features: Features,
    pub category: CategoryRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<PlanTypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Service {
    pub fn new(id: impl Into<ServiceId>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subtitle: None,
            price: 0.0,
            image_ref: None,
            features: Features::default(),
            category: Reference::Embedded(category),
            plan_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn category_id(&self) -> &CategoryId {
        self.category.id()
    }

    /// Category display name, when the category is embedded.
    pub fn category_name(&self) -> Option<&str> {
        self.category.embedded().map(|c| c.name.as_str())
    }
}

impl Identified for Service {
    type Id = ServiceId;

    fn id(&self) -> &ServiceId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_embedded_relations() {
        let json = r#"{
            "_id": "s1",
            "name": "AC Repair",
            "price": 499,
            "features": ["Gas Refilling"],
            "category": {"_id": "c1", "name": "HVAC"},
            "planType": {"_id": "p1", "planType": "Basic"}
        }"#;
        let service: Service = serde_json::from_str(json).unwrap();

        assert_eq!(service.category_id().as_str(), "c1");
        assert_eq!(service.category_name(), Some("HVAC"));
        assert_eq!(
            service.plan_type.as_ref().and_then(|p| p.embedded()).map(|p| p.label.as_str()),
            Some("Basic")
        );
    }

    #[test]
    fn decodes_bare_id_relations() {
        let json = r#"{
            "_id": "s2",
            "name": "Fan Install",
            "price": 150.5,
            "features": [],
            "category": "c9",
            "planType": "p2"
        }"#;
        let service: Service = serde_json::from_str(json).unwrap();

        assert_eq!(service.category_id().as_str(), "c9");
        assert_eq!(service.category_name(), None);
        assert_eq!(service.plan_type.as_ref().map(|p| p.id().as_str()), Some("p2"));
    }
}
