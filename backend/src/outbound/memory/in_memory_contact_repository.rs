//! `ContactRepository` kept in process memory.
//!
//! Each instance owns its own state; nothing is shared globally. A single
//! mutex guards the map so concurrent requests observe the same uniqueness
//! rules a database would enforce.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{ContactRepository, ContactRepositoryError};
use crate::domain::{Contact, ContactDetails, ContactId};

#[derive(Default)]
struct State {
    last_id: i32,
    contacts: BTreeMap<ContactId, Contact>,
}

impl State {
    fn email_taken(&self, email: &str, excluding: Option<ContactId>) -> bool {
        self.contacts
            .values()
            .any(|c| c.details().email() == email && Some(c.id()) != excluding)
    }
}

/// Thread-safe in-memory contact store.
pub struct InMemoryContactRepository {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryContactRepository {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryContactRepository {
    /// Create an empty store stamping timestamps from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ContactRepositoryError> {
        self.state
            .lock()
            .map_err(|_| ContactRepositoryError::query("in-memory contact store poisoned"))
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn list_all(&self) -> Result<Vec<Contact>, ContactRepositoryError> {
        let state = self.lock()?;
        let mut contacts: Vec<Contact> = state.contacts.values().cloned().collect();
        // Case-insensitive first, like the database collation.
        contacts.sort_by_cached_key(|contact| {
            let name = contact.details().name();
            (name.to_lowercase(), name.to_owned(), contact.id())
        });
        Ok(contacts)
    }

    async fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, ContactRepositoryError> {
        Ok(self.lock()?.contacts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, ContactRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .contacts
            .values()
            .find(|c| c.details().email() == email)
            .cloned())
    }

    async fn create(&self, details: &ContactDetails) -> Result<Contact, ContactRepositoryError> {
        let mut state = self.lock()?;
        if state.email_taken(details.email(), None) {
            return Err(ContactRepositoryError::duplicate_email());
        }
        let next = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| ContactRepositoryError::query("contact id space exhausted"))?;
        state.last_id = next;

        let contact = Contact::new(ContactId::new(next), details.clone(), self.clock.utc(), None);
        state.contacts.insert(contact.id(), contact.clone());
        Ok(contact)
    }

    async fn update(
        &self,
        id: ContactId,
        details: &ContactDetails,
    ) -> Result<Contact, ContactRepositoryError> {
        let mut state = self.lock()?;
        if !state.contacts.contains_key(&id) {
            return Err(ContactRepositoryError::not_found(id));
        }
        if state.email_taken(details.email(), Some(id)) {
            return Err(ContactRepositoryError::duplicate_email());
        }
        let now = self.clock.utc();
        let contact = state
            .contacts
            .get_mut(&id)
            .ok_or_else(|| ContactRepositoryError::not_found(id))?;
        contact.overwrite(details.clone(), now);
        Ok(contact.clone())
    }

    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        Ok(self.lock()?.contacts.remove(&id).is_some())
    }

    async fn exists(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        Ok(self.lock()?.contacts.contains_key(&id))
    }

    async fn email_exists(
        &self,
        email: &str,
        excluding: Option<ContactId>,
    ) -> Result<bool, ContactRepositoryError> {
        Ok(self.lock()?.email_taken(email, excluding))
    }

    async fn ping(&self) -> Result<(), ContactRepositoryError> {
        self.lock().map(|_| ())
    }
}
