//! Server-owned entities held by the console stores.

mod account;
mod booking;
mod category;
mod engineer;
mod reference;
mod service;

pub use account::{Role, Session, User};
pub use booking::{Booking, BookingDetails, BookingLineItem, BookingNotes, CustomerDetails};
pub use category::Category;
pub use engineer::{is_dispatchable, Engineer};
pub use reference::Reference;
pub use service::{CategoryRef, PlanType, PlanTypeRef, Service, ServicePlanRef};
