//! Derived views computed from canonical lists.
//!
//! Selectors are pure and recomputed on read; nothing here is stored.

pub mod bookings;
pub mod catalog;
pub mod roster;

pub use bookings::{filter_bookings, BookingFilters, BookingStats};
pub use catalog::{filter_categories, filter_services, CatalogStats, ServiceFilter};
pub use roster::{
    available_engineers, drop_available, filter_engineers, recompute_available, sync_available,
    AvailabilityFilter, EngineerFilters, EngineerStatusFilter, VerificationFilter,
};
