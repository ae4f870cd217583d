//! Sample server data shared by store tests.

use chrono::{TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use fixdesk_domain::{
    Booking, BookingId, BookingNotes, Category, CustomerDetails, Engineer, Features, OrderStatus,
    PaymentStatus, Reference, Service, ServiceId, StatusField, UserId,
};

/// Serialize a fixture the way the server would send it.
pub fn to_data<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub fn sample_categories() -> Vec<Category> {
    let created = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).single();
    let with_date = |category: Category| match created {
        Some(at) => category.with_created_at(at),
        None => category,
    };
    vec![
        with_date(
            Category::new("c1", "HVAC")
                .with_description("Heating and cooling")
                .with_image("https://cdn.example.com/hvac.png"),
        ),
        with_date(Category::new("c2", "Electrical").with_description("Wiring and fixtures")),
        with_date(Category::new("c3", "Plumbing").with_description("Pipes and drains")),
    ]
}

pub fn sample_services() -> Vec<Service> {
    let categories = sample_categories();
    vec![
        Service::new("s1", "AC Repair", categories[0].clone())
            .with_price(499.0)
            .with_features(Features::new(["Gas Refilling", "Filter Cleaning"])),
        Service::new("s2", "Fan Installation", categories[1].clone())
            .with_price(150.0)
            .with_features(Features::new(["Ceiling Fan", "Wiring"])),
        Service::new("s3", "Pipe Leak Fix", categories[2].clone())
            .with_price(350.0)
            .with_features(Features::new(["Leak Detection"])),
    ]
}

fn booking(
    id: &str,
    customer: &str,
    plan: Reference<ServiceId, Service>,
    amount: f64,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
) -> Booking {
    Booking {
        id: BookingId::new(id),
        order_id: format!("order_{id}"),
        user_id: UserId::new(format!("u-{id}")),
        service_plan: plan,
        amount,
        currency: Some("INR".into()),
        payment_status,
        order_status,
        customer_details: CustomerDetails {
            name: customer.into(),
            email: String::new(),
            phone: String::new(),
        },
        notes: None,
        booking_details: None,
        assigned_engineer: None,
        created_at: None,
        updated_at: None,
    }
}

/// b1 embeds its plan, b2 and b3 reference theirs by id.
pub fn sample_bookings() -> Vec<Booking> {
    let services = sample_services();
    let mut b3 = booking(
        "b3",
        "Anita Rao",
        Reference::Id(ServiceId::new("s3")),
        350.0,
        PaymentStatus::Created,
        OrderStatus::Upcoming,
    );
    b3.notes = Some(BookingNotes {
        order_id: b3.order_id.clone(),
        service_plan_id: Some(ServiceId::new("s3")),
        service_plan_name: Some("Pipe Leak Fix".into()),
        user_id: Some(b3.user_id.clone()),
    });

    vec![
        booking(
            "b1",
            "Priya Singh",
            Reference::Embedded(services[0].clone()),
            499.0,
            PaymentStatus::Paid,
            OrderStatus::Upcoming,
        ),
        booking(
            "b2",
            "Rahul Mehta",
            Reference::Id(ServiceId::new("s2")),
            150.0,
            PaymentStatus::Paid,
            OrderStatus::InProgress,
        ),
        b3,
    ]
}

/// e1 is the only verified dispatchable engineer; e2 is unavailable, e3
/// inactive, e4 dispatchable but unverified.
pub fn sample_engineers() -> Vec<Engineer> {
    let contact = |mut engineer: Engineer, email: &str, phone: &str| {
        engineer.email = email.into();
        engineer.phone = phone.into();
        engineer
    };
    let mut e1 = contact(
        Engineer::new("e1", "Amit Sharma").with_skills(["AC", "Wiring"]),
        "amit@example.com",
        "555-0101",
    );
    e1.is_verified = true;

    vec![
        e1,
        contact(
            Engineer::new("e2", "Ravi Kumar")
                .with_skills(["Electrical"])
                .with_status(StatusField::IsAvailable, false),
            "ravi@example.com",
            "555-0102",
        ),
        contact(
            Engineer::new("e3", "Suresh Patel")
                .with_skills(["Plumbing"])
                .with_status(StatusField::IsActive, false),
            "suresh@example.com",
            "555-0103",
        ),
        contact(
            Engineer::new("e4", "Deepak Verma").with_skills(["Carpentry", "Painting"]),
            "deepak@example.com",
            "555-0104",
        ),
    ]
}
