//! Roster selectors and the available-engineers index.
//!
//! The index is a list of engineer ids. It can be rebuilt from the roster
//! with [`recompute_available`] or patched one engineer at a time with
//! [`sync_available`] and [`drop_available`]; applying the patches after
//! every roster change keeps it equal to the full recomputation.

use crate::common::contains_ignore_case;
use crate::entities::{is_dispatchable, Engineer};
use crate::ids::EngineerId;

/// Full recomputation of the index, in roster order.
pub fn recompute_available(engineers: &[Engineer]) -> Vec<EngineerId> {
    engineers
        .iter()
        .filter(|e| is_dispatchable(e))
        .map(|e| e.id.clone())
        .collect()
}

/// Re-evaluate one engineer against the index.
///
/// Inserts the id when the engineer qualifies and is missing, removes it
/// when the engineer no longer qualifies, and otherwise returns the index
/// unchanged. Never produces duplicates.
pub fn sync_available(index: &[EngineerId], engineer: &Engineer) -> Vec<EngineerId> {
    let present = index.contains(&engineer.id);
    match (is_dispatchable(engineer), present) {
        (true, false) => {
            let mut next = index.to_vec();
            next.push(engineer.id.clone());
            next
        }
        (false, true) => drop_available(index, &engineer.id),
        _ => index.to_vec(),
    }
}

pub fn drop_available(index: &[EngineerId], id: &EngineerId) -> Vec<EngineerId> {
    index.iter().filter(|e| *e != id).cloned().collect()
}

/// Resolve the index against the roster.
pub fn available_engineers<'a>(engineers: &'a [Engineer], index: &[EngineerId]) -> Vec<&'a Engineer> {
    index
        .iter()
        .filter_map(|id| engineers.iter().find(|e| &e.id == id))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AvailabilityFilter {
    #[default]
    All,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineerStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Blocked,
    Suspended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationFilter {
    #[default]
    All,
    Verified,
    Unverified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineerFilters {
    pub search_term: String,
    pub availability: AvailabilityFilter,
    pub status: EngineerStatusFilter,
    pub verification: VerificationFilter,
}

impl EngineerFilters {
    pub fn matches(&self, engineer: &Engineer) -> bool {
        let term = self.search_term.as_str();
        let search = term.is_empty()
            || contains_ignore_case(&engineer.name, term)
            || contains_ignore_case(&engineer.email, term)
            || contains_ignore_case(&engineer.phone, term)
            || engineer.skills.iter().any(|s| contains_ignore_case(s, term));

        let availability = match self.availability {
            AvailabilityFilter::All => true,
            AvailabilityFilter::Available => engineer.is_available,
            AvailabilityFilter::Unavailable => !engineer.is_available,
        };

        let status = match self.status {
            EngineerStatusFilter::All => true,
            EngineerStatusFilter::Active => engineer.is_active,
            EngineerStatusFilter::Inactive => !engineer.is_active,
            EngineerStatusFilter::Blocked => engineer.is_blocked,
            EngineerStatusFilter::Suspended => engineer.is_suspended,
        };

        let verification = match self.verification {
            VerificationFilter::All => true,
            VerificationFilter::Verified => engineer.is_verified,
            VerificationFilter::Unverified => !engineer.is_verified,
        };

        search && availability && status && verification
    }
}

pub fn filter_engineers<'a>(engineers: &'a [Engineer], filters: &EngineerFilters) -> Vec<&'a Engineer> {
    engineers.iter().filter(|e| filters.matches(e)).collect()
}
