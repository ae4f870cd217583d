//! Fixdesk admin console: the client-side state-synchronization layer.
//!
//! Each store owns one slice of server state, publishes snapshots through a
//! `tokio::sync::watch` channel, and reconciles its canonical lists after
//! every remote mutation settles.

pub mod application;
pub mod infrastructure;
pub mod ports;

pub use application::{
    AssignmentCoordinator, BookingStore, BusyKey, CatalogStore, PlanTypeDirectory, RosterStore,
    SessionStore, StoreError,
};
