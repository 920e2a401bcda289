//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{ContactsCommand, ContactsQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub contacts: Arc<dyn ContactsCommand>,
    pub contacts_query: Arc<dyn ContactsQuery>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use contacts_backend::domain::ContactsService;
    /// use contacts_backend::inbound::http::state::HttpState;
    /// use contacts_backend::outbound::memory::InMemoryContactRepository;
    ///
    /// let service = Arc::new(ContactsService::new(Arc::new(
    ///     InMemoryContactRepository::default(),
    /// )));
    /// let _state = HttpState::new(service.clone(), service);
    /// ```
    pub fn new(contacts: Arc<dyn ContactsCommand>, contacts_query: Arc<dyn ContactsQuery>) -> Self {
        Self {
            contacts,
            contacts_query,
        }
    }
}
