//! Route table of the remote admin API.

use fixdesk_domain::common::{none_if_blank, ALL};
use fixdesk_domain::{BookingId, CategoryId, EngineerId, ServiceId};

pub const SERVICES_DASHBOARD: &str = "/api/services/allServicesDashboard";
pub const CATEGORIES: &str = "/api/services/category";
pub const CREATE_SERVICE: &str = "/api/services/createServicePlan";
pub const PLAN_TYPES: &str = "/api/services/planTypes";
pub const BOOKINGS: &str = "/api/services/allBookings";
pub const ENGINEERS: &str = "/api/engineer/getEngineers";
// Misspelled on the server.
pub const AVAILABLE_ENGINEERS: &str = "/api/engineer/getAvialbleEngineers";
pub const ADD_ENGINEER: &str = "/api/engineer/addEngineer";
pub const LOGOUT: &str = "/api/auth/logout";

/// Dashboard listing with the optional server-side filters.
///
/// Blank search text and the "all" category are omitted.
pub fn services_dashboard(search: Option<&str>, category: Option<&CategoryId>) -> String {
    let mut params = Vec::new();
    if let Some(search) = search.and_then(none_if_blank) {
        params.push(format!("search={}", encode_component(search)));
    }
    if let Some(category) = category.filter(|c| c.as_str() != ALL) {
        params.push(format!("category={}", encode_component(category.as_str())));
    }
    if params.is_empty() {
        SERVICES_DASHBOARD.to_string()
    } else {
        format!("{SERVICES_DASHBOARD}?{}", params.join("&"))
    }
}

pub fn edit_service(id: &ServiceId) -> String {
    format!("/api/services/editServicePlan/{id}")
}

pub fn delete_service(id: &ServiceId) -> String {
    format!("/api/services/deleteService/{id}")
}

pub fn delete_category(id: &CategoryId) -> String {
    format!("/api/services/deleteCategory/{id}")
}

pub fn update_order_status(id: &BookingId) -> String {
    format!("/api/services/updateOrderStatus/{id}")
}

pub fn assign_engineer(booking: &BookingId) -> String {
    format!("/api/engineer/assignEngineerToOrder/{booking}")
}

pub fn unassign_engineer(booking: &BookingId) -> String {
    format!("/api/engineer/unAssignEngineerFromOrder/{booking}")
}

pub fn update_engineer(id: &EngineerId) -> String {
    format!("/api/engineer/updateEngineer/{id}")
}

pub fn delete_engineer(id: &EngineerId) -> String {
    format!("/api/engineer/deleteEngineer/{id}")
}

pub fn toggle_engineer_status(id: &EngineerId) -> String {
    format!("/api/engineer/toggleEngineerStatus/{id}")
}

pub fn verify_engineer(id: &EngineerId) -> String {
    format!("/api/engineer/verifyEngineer/{id}")
}

/// Percent-encodes everything outside the URL "unreserved" set.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_query_omits_blank_search_and_all_category() {
        assert_eq!(services_dashboard(None, None), SERVICES_DASHBOARD);
        assert_eq!(
            services_dashboard(Some("  "), Some(&CategoryId::new("all"))),
            SERVICES_DASHBOARD
        );
    }

    #[test]
    fn dashboard_query_encodes_parameters() {
        assert_eq!(
            services_dashboard(Some("ac & fan"), Some(&CategoryId::new("c1"))),
            "/api/services/allServicesDashboard?search=ac+%26+fan&category=c1"
        );
    }

    #[test]
    fn entity_routes_embed_the_id() {
        assert_eq!(
            unassign_engineer(&BookingId::new("b7")),
            "/api/engineer/unAssignEngineerFromOrder/b7"
        );
        assert_eq!(
            toggle_engineer_status(&EngineerId::new("e1")),
            "/api/engineer/toggleEngineerStatus/e1"
        );
    }
}
