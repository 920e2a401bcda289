//! Driving port for contact mutations.

use async_trait::async_trait;

use crate::domain::{Contact, ContactDraft, ContactId, Error};

/// Driving port for creating, replacing and deleting contacts.
///
/// Inbound adapters hand over raw drafts; validation, uniqueness checks and
/// error translation happen behind this port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactsCommand: Send + Sync {
    /// Validate and insert a new contact.
    async fn create(&self, draft: ContactDraft) -> Result<Contact, Error>;

    /// Validate and overwrite contact `id` wholesale.
    async fn update(&self, id: ContactId, draft: ContactDraft) -> Result<Contact, Error>;

    /// Remove contact `id`; unknown ids yield a not-found error.
    async fn delete(&self, id: ContactId) -> Result<(), Error>;
}
