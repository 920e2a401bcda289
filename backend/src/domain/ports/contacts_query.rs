//! Driving port for contact reads.

use async_trait::async_trait;

use crate::domain::{Contact, ContactId, Error};

/// Driving port for reading contacts and probing the backing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactsQuery: Send + Sync {
    /// Every contact ordered by name.
    async fn list(&self) -> Result<Vec<Contact>, Error>;

    /// One contact by id; unknown ids yield a not-found error.
    async fn get(&self, id: ContactId) -> Result<Contact, Error>;

    /// Succeeds when the backing store answers.
    async fn check_store(&self) -> Result<(), Error>;
}
