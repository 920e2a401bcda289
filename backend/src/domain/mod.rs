//! Domain primitives, services and ports.
//!
//! Purpose: define the contact entity and its field rules, the error payload
//! shared by every adapter, and the ports separating business logic from
//! storage and transport.
//!
//! Public surface:
//! - Error / ErrorCode / FieldErrors: transport-agnostic error payload.
//! - Contact, ContactDetails, ContactDraft, ContactId: the contact entity.
//! - ContactsService: implementation of the contact driving ports.
//! - ContactFilter: local search semantics for list views.
//! - TraceId: request correlation identifier.

pub mod contact;
pub mod contact_filter;
pub mod contacts_service;
pub mod error;
pub mod ports;
pub mod trace_id;

pub use self::contact::{
    Contact, ContactDetails, ContactDraft, ContactField, ContactId, ContactValidationError,
    ContactViolation,
};
pub use self::contact_filter::ContactFilter;
pub use self::contacts_service::ContactsService;
pub use self::error::{Error, ErrorCode, FieldErrors};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
