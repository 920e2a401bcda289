//! Contact domain service.
//!
//! Implements the contact driving ports on top of a [`ContactRepository`]:
//! validates drafts, pre-checks email uniqueness, and translates repository
//! failures into API errors.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::domain::ports::{
    ContactRepository, ContactRepositoryError, ContactsCommand, ContactsQuery,
};
use crate::domain::{
    Contact, ContactDetails, ContactDraft, ContactField, ContactId, ContactValidationError,
    Error, FieldErrors,
};

/// Summary message for field validation failures.
pub const VALIDATION_MESSAGE: &str = "Erro de validação";
/// Message for writes that collide with an existing email.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Já existe um contato com este email";

fn validation_error(error: &ContactValidationError) -> Error {
    let fields = error
        .by_field()
        .into_iter()
        .map(|(field, messages)| FieldErrors::new(field.api_name(), messages))
        .collect();
    Error::invalid_request(VALIDATION_MESSAGE).with_field_errors(fields)
}

fn duplicate_email_error() -> Error {
    Error::conflict(DUPLICATE_EMAIL_MESSAGE).with_field_errors(vec![FieldErrors::new(
        ContactField::Email.api_name(),
        vec![DUPLICATE_EMAIL_MESSAGE.to_owned()],
    )])
}

fn not_found_error(id: ContactId) -> Error {
    Error::not_found(format!("Contato {id} não encontrado"))
}

fn map_repository_error(
    operation: &'static str,
    contact_id: Option<ContactId>,
    error: ContactRepositoryError,
) -> Error {
    let contact_id = contact_id.map(ContactId::get);
    match error {
        ContactRepositoryError::DuplicateEmail => {
            warn!(operation, contact_id, "store rejected duplicate email");
            duplicate_email_error()
        }
        ContactRepositoryError::NotFound { id } => {
            warn!(operation, contact_id = id.get(), "contact vanished during write");
            not_found_error(id)
        }
        ContactRepositoryError::Connection { .. } | ContactRepositoryError::Timeout { .. } => {
            error!(operation, contact_id, error = %error, "contact store unavailable");
            Error::service_unavailable("Armazenamento de contatos indisponível")
        }
        ContactRepositoryError::Query { .. } => {
            error!(operation, contact_id, error = %error, "contact store failure");
            Error::internal(format!("contact repository error: {error}"))
        }
    }
}

/// Contact service implementing [`ContactsCommand`] and [`ContactsQuery`].
#[derive(Clone)]
pub struct ContactsService<R> {
    repository: Arc<R>,
}

impl<R> ContactsService<R> {
    /// Create a new service over the contact repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R> ContactsService<R>
where
    R: ContactRepository,
{
    fn validate(
        operation: &'static str,
        contact_id: Option<ContactId>,
        draft: ContactDraft,
    ) -> Result<ContactDetails, Error> {
        ContactDetails::new(draft).map_err(|err| {
            let fields: Vec<&str> = err
                .by_field()
                .into_iter()
                .map(|(field, _)| field.api_name())
                .collect();
            debug!(
                operation,
                contact_id = contact_id.map(ContactId::get),
                ?fields,
                "contact draft rejected"
            );
            validation_error(&err)
        })
    }

    async fn ensure_email_free(
        &self,
        operation: &'static str,
        email: &str,
        excluding: Option<ContactId>,
    ) -> Result<(), Error> {
        let taken = self
            .repository
            .email_exists(email, excluding)
            .await
            .map_err(|err| map_repository_error(operation, excluding, err))?;
        if taken {
            debug!(
                operation,
                contact_id = excluding.map(ContactId::get),
                "email already registered"
            );
            return Err(duplicate_email_error());
        }
        Ok(())
    }
}

#[async_trait]
impl<R> ContactsCommand for ContactsService<R>
where
    R: ContactRepository,
{
    async fn create(&self, draft: ContactDraft) -> Result<Contact, Error> {
        const OPERATION: &str = "create";
        let details = Self::validate(OPERATION, None, draft)?;
        self.ensure_email_free(OPERATION, details.email(), None)
            .await?;

        let contact = self
            .repository
            .create(&details)
            .await
            .map_err(|err| map_repository_error(OPERATION, None, err))?;
        debug!(operation = OPERATION, contact_id = contact.id().get(), "contact created");
        Ok(contact)
    }

    async fn update(&self, id: ContactId, draft: ContactDraft) -> Result<Contact, Error> {
        const OPERATION: &str = "update";
        let details = Self::validate(OPERATION, Some(id), draft)?;

        let exists = self
            .repository
            .exists(id)
            .await
            .map_err(|err| map_repository_error(OPERATION, Some(id), err))?;
        if !exists {
            debug!(operation = OPERATION, contact_id = id.get(), "contact not found");
            return Err(not_found_error(id));
        }
        self.ensure_email_free(OPERATION, details.email(), Some(id))
            .await?;

        let contact = self
            .repository
            .update(id, &details)
            .await
            .map_err(|err| map_repository_error(OPERATION, Some(id), err))?;
        debug!(operation = OPERATION, contact_id = id.get(), "contact updated");
        Ok(contact)
    }

    async fn delete(&self, id: ContactId) -> Result<(), Error> {
        const OPERATION: &str = "delete";
        let existed = self
            .repository
            .delete(id)
            .await
            .map_err(|err| map_repository_error(OPERATION, Some(id), err))?;
        if !existed {
            debug!(operation = OPERATION, contact_id = id.get(), "contact not found");
            return Err(not_found_error(id));
        }
        debug!(operation = OPERATION, contact_id = id.get(), "contact deleted");
        Ok(())
    }
}

#[async_trait]
impl<R> ContactsQuery for ContactsService<R>
where
    R: ContactRepository,
{
    async fn list(&self) -> Result<Vec<Contact>, Error> {
        self.repository
            .list_all()
            .await
            .map_err(|err| map_repository_error("list", None, err))
    }

    async fn get(&self, id: ContactId) -> Result<Contact, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|err| map_repository_error("get", Some(id), err))?
            .ok_or_else(|| {
                debug!(operation = "get", contact_id = id.get(), "contact not found");
                not_found_error(id)
            })
    }

    async fn check_store(&self) -> Result<(), Error> {
        self.repository
            .ping()
            .await
            .map_err(|err| map_repository_error("health", None, err))
    }
}

#[cfg(test)]
#[path = "contacts_service_tests.rs"]
mod tests;
