//! Port for contact persistence.

use async_trait::async_trait;

use crate::domain::{Contact, ContactDetails, ContactId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by contact repository adapters.
    pub enum ContactRepositoryError {
        /// Repository connection could not be established or was lost.
        Connection { message: String } =>
            "contact repository connection failed: {message}",
        /// A store call exceeded its time bound.
        Timeout { message: String } =>
            "contact repository timed out: {message}",
        /// The store rejected a write because the email is already taken.
        DuplicateEmail => "email already registered",
        /// No contact has the requested identifier.
        NotFound { id: ContactId } => "contact {id} not found",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "contact repository query failed: {message}",
    }
}

impl ContactRepositoryError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Port for reading and writing contacts.
///
/// Adapters stamp `created_at` on insert and `updated_at` on every update
/// themselves; callers never supply timestamps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Every contact ordered by name ascending, ties broken by id.
    async fn list_all(&self) -> Result<Vec<Contact>, ContactRepositoryError>;

    /// Find a contact by id.
    async fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Find a contact by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Insert a contact, assigning its id and creation time.
    ///
    /// Fails with [`ContactRepositoryError::DuplicateEmail`] when the email is
    /// taken; storage is left untouched in that case.
    async fn create(&self, details: &ContactDetails) -> Result<Contact, ContactRepositoryError>;

    /// Overwrite every mutable field of contact `id` and stamp `updated_at`.
    ///
    /// Fails with [`ContactRepositoryError::NotFound`] when `id` is unknown.
    async fn update(
        &self,
        id: ContactId,
        details: &ContactDetails,
    ) -> Result<Contact, ContactRepositoryError>;

    /// Remove contact `id`, returning whether it existed.
    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError>;

    /// Whether a contact with `id` exists.
    async fn exists(&self, id: ContactId) -> Result<bool, ContactRepositoryError>;

    /// Whether `email` is used by a contact other than `excluding`.
    async fn email_exists(
        &self,
        email: &str,
        excluding: Option<ContactId>,
    ) -> Result<bool, ContactRepositoryError>;

    /// Single round-trip to the store without touching data. Not retried, so
    /// health checks answer within one operation timeout.
    async fn ping(&self) -> Result<(), ContactRepositoryError>;
}
