//! Typed request payloads for each remote mutation.

use fixdesk_domain::{CategoryId, EngineerId, Features, OrderStatus, PlanTypeId, StatusField};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::request::{FileAttachment, FormPayload};

/// Create/update payload of a service plan, sent as multipart.
///
/// Relations are submitted by id even though list fetches return them
/// embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceForm {
    pub name: String,
    pub subtitle: Option<String>,
    pub price: f64,
    pub plan_type: Option<PlanTypeId>,
    pub category: CategoryId,
    pub features: Features,
}

impl ServiceForm {
    pub fn new(name: impl Into<String>, category: impl Into<CategoryId>, price: f64) -> Self {
        Self {
            name: name.into(),
            subtitle: None,
            price,
            plan_type: None,
            category: category.into(),
            features: Features::default(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_plan_type(mut self, plan_type: impl Into<PlanTypeId>) -> Self {
        self.plan_type = Some(plan_type.into());
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn to_form_payload(&self, image: Option<FileAttachment>) -> FormPayload {
        FormPayload::new()
            .text("name", self.name.as_str())
            .text("subtitle", self.subtitle.clone().unwrap_or_default())
            .text("price", self.price.to_string())
            .optional_text("planType", self.plan_type.as_ref().map(|id| id.as_str()))
            .text("category", self.category.as_str())
            .text("features", self.features.to_form_value())
            .file("image", image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
}

impl CategoryForm {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn to_form_payload(&self, image: Option<FileAttachment>) -> FormPayload {
        FormPayload::new()
            .text("name", self.name.as_str())
            .text("description", self.description.as_str())
            .file("image", image)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
}

/// Partial engineer update; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

impl From<EngineerForm> for EngineerPatch {
    fn from(form: EngineerForm) -> Self {
        Self {
            name: Some(form.name),
            email: Some(form.email),
            phone: Some(form.phone),
            skills: Some(form.skills),
        }
    }
}

/// `{ "status": "<order status>" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderStatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignEngineerBody {
    pub engineer_id: EngineerId,
}

/// Single-flag toggle, serialized as `{ "<wireName>": value }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusToggleBody {
    pub field: StatusField,
    pub value: bool,
}

impl Serialize for StatusToggleBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field.wire_name(), &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBody {
    pub is_verified: bool,
}

impl Default for VerifyBody {
    fn default() -> Self {
        Self { is_verified: true }
    }
}
