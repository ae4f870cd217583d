//! Booking selectors.

use crate::common::contains_ignore_case;
use crate::entities::{Booking, Service};
use crate::value_objects::{OrderStatus, PaymentStatus};

/// Filters shown above the bookings table. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilters {
    pub search_term: String,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
}

impl BookingFilters {
    /// `catalog` resolves plans that the booking only references by id.
    pub fn matches(&self, booking: &Booking, catalog: &[Service]) -> bool {
        let term = self.search_term.as_str();
        let search_matches = term.is_empty()
            || contains_ignore_case(&booking.customer_details.name, term)
            || contains_ignore_case(&booking.order_id, term)
            || booking
                .plan_label(catalog)
                .is_some_and(|label| contains_ignore_case(label, term));

        search_matches
            && self.payment_status.map_or(true, |s| booking.payment_status == s)
            && self.order_status.map_or(true, |s| booking.order_status == s)
    }
}

pub fn filter_bookings<'a>(
    bookings: &'a [Booking],
    filters: &BookingFilters,
    catalog: &[Service],
) -> Vec<&'a Booking> {
    bookings
        .iter()
        .filter(|b| filters.matches(b, catalog))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BookingStats {
    pub total: usize,
    pub upcoming: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Sum of `amount` over paid bookings.
    pub revenue: f64,
}

impl BookingStats {
    pub fn compute(bookings: &[Booking]) -> Self {
        bookings.iter().fold(
            Self {
                total: bookings.len(),
                ..Self::default()
            },
            |mut stats, booking| {
                match booking.order_status {
                    OrderStatus::Upcoming => stats.upcoming += 1,
                    OrderStatus::InProgress => stats.in_progress += 1,
                    OrderStatus::Completed => stats.completed += 1,
                    OrderStatus::Cancelled => stats.cancelled += 1,
                }
                if booking.payment_status == PaymentStatus::Paid {
                    stats.revenue += booking.amount;
                }
                stats
            },
        )
    }
}
