//! Customer bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::{Service, ServicePlanRef};
use crate::collections::{find_by_id, Identified};
use crate::ids::{BookingId, EngineerId, ServiceId, UserId};
use crate::value_objects::{OrderStatus, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Labels captured when the order was placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotes {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub service_plan_id: Option<ServiceId>,
    #[serde(default)]
    pub service_plan_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingLineItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub date: String,
    pub time: String,
    pub address: String,
    #[serde(default, rename = "services")]
    pub line_items: Vec<BookingLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", alias = "id")]
    pub id: BookingId,
    pub order_id: String,
    pub user_id: UserId,
    pub service_plan: ServicePlanRef,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "status")]
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub customer_details: CustomerDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<BookingNotes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_details: Option<BookingDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_engineer: Option<EngineerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn service_plan_id(&self) -> &ServiceId {
        self.service_plan.id()
    }

    /// Customer-facing name of the booked plan.
    ///
    /// Resolution order: the embedded plan, then the plan looked up by id in
    /// `catalog`, then the name captured in the booking notes.
    pub fn plan_label<'a>(&'a self, catalog: &'a [Service]) -> Option<&'a str> {
        match &self.service_plan {
            ServicePlanRef::Embedded(plan) => Some(plan.name.as_str()),
            ServicePlanRef::Id(id) => find_by_id(catalog, id)
                .map(|plan| plan.name.as_str())
                .or_else(|| {
                    self.notes
                        .as_ref()
                        .and_then(|notes| notes.service_plan_name.as_deref())
                }),
        }
    }

    /// Copy the server-owned status fields from `server` onto this booking.
    pub fn apply_status_from(&mut self, server: &Booking) {
        self.order_status = server.order_status;
        self.payment_status = server.payment_status;
        if server.updated_at.is_some() {
            self.updated_at = server.updated_at;
        }
    }
}

impl Identified for Booking {
    type Id = BookingId;

    fn id(&self) -> &BookingId {
        &self.id
    }
}
