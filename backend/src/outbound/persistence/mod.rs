//! PostgreSQL persistence adapters using Diesel.
//!
//! Two implementations of [`ContactRepository`](crate::domain::ports::ContactRepository)
//! live here:
//!
//! - [`DieselContactRepository`] builds statements with the Diesel DSL.
//! - [`DieselProcedureContactRepository`] calls the stored functions created
//!   by the contacts migration.
//!
//! Both share the same pool, row models, error mapping and retry policy, and
//! are interchangeable behind the port.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contacts_backend::outbound::persistence::{
//!     DbPool, DieselContactRepository, PoolConfig, RetryPolicy,
//! };
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/contacts")).await?;
//! let repo = DieselContactRepository::new(
//!     pool,
//!     Arc::new(mockable::DefaultClock),
//!     RetryPolicy::default(),
//! );
//! ```

mod diesel_contact_repository;
mod diesel_procedure_contact_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod retry;
mod schema;

pub use diesel_contact_repository::DieselContactRepository;
pub use diesel_procedure_contact_repository::DieselProcedureContactRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
pub use retry::RetryPolicy;
