//! In-process adapters for tests and store-less local runs.

mod in_memory_contact_repository;

pub use in_memory_contact_repository::InMemoryContactRepository;
