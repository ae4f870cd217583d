//! Fixdesk domain model.
//!
//! Server-owned entities (services, categories, bookings, engineers), the
//! pure list-patching helpers every store uses at settlement, and the
//! selectors that derive filtered views from canonical lists.

extern crate self as fixdesk_domain;

pub mod collections;
pub mod common;
pub mod entities;
pub mod error;
pub mod ids;
pub mod selectors;
pub mod value_objects;

pub use collections::{
    contains_id, find_by_id, remove_by_id, replace_by_id, upsert_by_id, Identified,
};
pub use entities::{
    is_dispatchable, Booking, BookingDetails, BookingLineItem, BookingNotes, Category,
    CategoryRef, CustomerDetails, Engineer, PlanType, PlanTypeRef, Reference, Role, Service,
    ServicePlanRef, Session, User,
};
pub use error::DomainError;
pub use ids::{BookingId, CategoryId, EngineerId, PlanTypeId, ServiceId, UserId};
pub use value_objects::{Features, OrderStatus, PaymentStatus, StatusField, ViewMode};
