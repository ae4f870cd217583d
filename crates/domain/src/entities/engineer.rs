//! Field engineers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::Identified;
use crate::ids::{BookingId, EngineerId};
use crate::value_objects::StatusField;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engineer {
    #[serde(rename = "_id", alias = "id")]
    pub id: EngineerId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default)]
    pub assigned_orders: BTreeSet<BookingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Engineer {
    /// A new, active and available engineer with no assignments.
    pub fn new(id: impl Into<EngineerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            skills: BTreeSet::new(),
            is_available: true,
            is_verified: false,
            is_active: true,
            is_deleted: false,
            is_blocked: false,
            is_suspended: false,
            assigned_orders: BTreeSet::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, field: StatusField, value: bool) -> Self {
        self.set_status(field, value);
        self
    }

    pub fn status(&self, field: StatusField) -> bool {
        match field {
            StatusField::IsAvailable => self.is_available,
            StatusField::IsActive => self.is_active,
            StatusField::IsBlocked => self.is_blocked,
            StatusField::IsSuspended => self.is_suspended,
        }
    }

    pub fn set_status(&mut self, field: StatusField, value: bool) {
        match field {
            StatusField::IsAvailable => self.is_available = value,
            StatusField::IsActive => self.is_active = value,
            StatusField::IsBlocked => self.is_blocked = value,
            StatusField::IsSuspended => self.is_suspended = value,
        }
    }

    /// True when this engineer belongs in the available-engineers view.
    pub fn is_dispatchable(&self) -> bool {
        is_dispatchable(self)
    }
}

/// Membership rule of the available-engineers view.
pub fn is_dispatchable(engineer: &Engineer) -> bool {
    engineer.is_available && engineer.is_active && !engineer.is_blocked && !engineer.is_suspended
}

impl Identified for Engineer {
    type Id = EngineerId;

    fn id(&self) -> &EngineerId {
        &self.id
    }
}
