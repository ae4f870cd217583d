//! Value objects - Immutable objects defined by their attributes

mod features;
mod statuses;

pub use features::Features;
pub use statuses::{OrderStatus, PaymentStatus, StatusField, ViewMode};
