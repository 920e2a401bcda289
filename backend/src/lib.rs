//! Contacts backend library: a hexagonal CRUD service for contacts.
//!
//! - [`domain`] holds the contact entity, its validation rules, the error
//!   payload and the ports.
//! - [`outbound`] implements the repository port for PostgreSQL (query
//!   builder or stored functions) and for a process-local store.
//! - [`inbound`] exposes the REST API under `/api/contatos`.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
