//! Fixdesk Shared - the wire contract of the remote admin API
//!
//! This crate contains the types exchanged with the remote collaborator:
//! - The uniform response [`Envelope`]
//! - Request bodies, JSON or multipart ([`RequestBody`], [`FormPayload`])
//! - Typed request payloads for each mutation ([`forms`])
//! - The route table ([`routes`])
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No transport** - nothing here performs I/O

pub mod envelope;
pub mod forms;
pub mod request;
pub mod routes;

pub use envelope::{Envelope, EnvelopeError};
pub use forms::{
    AssignEngineerBody, CategoryForm, EngineerForm, EngineerPatch, OrderStatusBody, ServiceForm,
    StatusToggleBody, VerifyBody,
};
pub use request::{FileAttachment, FormPayload, RequestBody};
