//! Common utility functions shared across the domain.
//!
//! Pure functions only: no side effects, no I/O.

pub mod string;

pub use string::{contains_ignore_case, none_if_blank, ALL};
