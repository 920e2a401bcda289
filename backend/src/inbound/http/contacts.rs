//! Contact API handlers.
//!
//! ```text
//! GET    /api/contatos
//! GET    /api/contatos/{id}
//! POST   /api/contatos {"nome":"Ana","dataNasc":"1990-01-01","telefone":"11999990000","email":"ana@x.com"}
//! PUT    /api/contatos/{id}
//! DELETE /api/contatos/{id}
//! ```
//!
//! Wire field names are Portuguese (`idPessoa`, `nome`, `dataNasc`, `obs`,
//! `telefone`, `email`, `dataCriacao`, `dataAtualizacao`). Bodies are read
//! leniently, with every field optional, so missing values surface as field
//! validation errors instead of deserialisation failures.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, error::PathError, get, post, put, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::contacts_service::VALIDATION_MESSAGE;
use crate::domain::{Contact, ContactDraft, ContactId, Error, FieldErrors};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Base path of the contacts collection, used for `Location` headers.
pub const CONTACTS_PATH: &str = "/api/contatos";

/// Contact body accepted by `POST` and `PUT`.
///
/// Server-assigned fields (`dataCriacao`, `dataAtualizacao`) are ignored when
/// present.
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    /// Must match the path id on `PUT`; ignored on `POST`.
    #[schema(example = 1)]
    pub id_pessoa: Option<i32>,
    #[schema(example = "Ana")]
    pub nome: Option<String>,
    /// Birth date, `YYYY-MM-DD`.
    #[schema(format = "date", example = "1990-01-01")]
    pub data_nasc: Option<String>,
    pub obs: Option<String>,
    #[schema(example = "11999990000")]
    pub telefone: Option<String>,
    #[schema(example = "ana@x.com")]
    pub email: Option<String>,
}

impl From<ContactRequest> for ContactDraft {
    fn from(value: ContactRequest) -> Self {
        Self {
            name: value.nome.unwrap_or_default(),
            birth_date: value.data_nasc,
            notes: value.obs,
            phone: value.telefone.unwrap_or_default(),
            email: value.email.unwrap_or_default(),
        }
    }
}

/// Contact as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    #[schema(example = 1)]
    pub id_pessoa: i32,
    #[schema(example = "Ana")]
    pub nome: String,
    #[schema(example = "1990-01-01")]
    pub data_nasc: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs: Option<String>,
    #[schema(example = "11999990000")]
    pub telefone: String,
    #[schema(example = "ana@x.com")]
    pub email: String,
    pub data_criacao: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_atualizacao: Option<DateTime<Utc>>,
}

impl From<&Contact> for ContactResponse {
    fn from(contact: &Contact) -> Self {
        let details = contact.details();
        Self {
            id_pessoa: contact.id().get(),
            nome: details.name().to_owned(),
            data_nasc: details.birth_date(),
            obs: details.notes().map(str::to_owned),
            telefone: details.phone().to_owned(),
            email: details.email().to_owned(),
            data_criacao: contact.created_at(),
            data_atualizacao: contact.updated_at(),
        }
    }
}

/// Reject non-numeric ids with the standard error envelope.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("Identificador de contato inválido: {err}")).into()
}

fn id_mismatch_error(path_id: ContactId, body_id: i32) -> Error {
    Error::invalid_request(VALIDATION_MESSAGE).with_field_errors(vec![FieldErrors::new(
        "idPessoa",
        vec![format!(
            "O idPessoa do corpo ({body_id}) difere do id da rota ({path_id})"
        )],
    )])
}

/// List every contact ordered by name.
#[utoipa::path(
    get,
    path = "/api/contatos",
    responses(
        (status = 200, description = "Contacts ordered by name", body = [ContactResponse]),
        (status = 503, description = "Contact store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "listContacts"
)]
#[get("/contatos")]
pub async fn list_contacts(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<ContactResponse>>> {
    let contacts = state.contacts_query.list().await?;
    Ok(web::Json(contacts.iter().map(ContactResponse::from).collect()))
}

/// Fetch one contact.
#[utoipa::path(
    get,
    path = "/api/contatos/{id}",
    params(("id" = i32, Path, description = "Contact identifier")),
    responses(
        (status = 200, description = "Contact", body = ContactResponse),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Contact not found", body = Error),
        (status = 503, description = "Contact store unavailable", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "getContact"
)]
#[get("/contatos/{id}")]
pub async fn get_contact(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<ContactResponse>> {
    let id = ContactId::new(path.into_inner());
    let contact = state.contacts_query.get(id).await?;
    Ok(web::Json(ContactResponse::from(&contact)))
}

/// Create a contact.
#[utoipa::path(
    post,
    path = "/api/contatos",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Contact created", body = ContactResponse,
            headers(("Location" = String, description = "URL of the new contact"))),
        (status = 400, description = "Validation failed", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Contact store unavailable", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "createContact"
)]
#[post("/contatos")]
pub async fn create_contact(
    state: web::Data<HttpState>,
    payload: web::Json<ContactRequest>,
) -> ApiResult<HttpResponse> {
    let contact = state
        .contacts
        .create(ContactDraft::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("{CONTACTS_PATH}/{}", contact.id())))
        .json(ContactResponse::from(&contact)))
}

/// Replace a contact wholesale.
#[utoipa::path(
    put,
    path = "/api/contatos/{id}",
    params(("id" = i32, Path, description = "Contact identifier")),
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ContactResponse),
        (status = 400, description = "Validation failed or id mismatch", body = Error),
        (status = 404, description = "Contact not found", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Contact store unavailable", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "updateContact"
)]
#[put("/contatos/{id}")]
pub async fn update_contact(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<ContactRequest>,
) -> ApiResult<web::Json<ContactResponse>> {
    let id = ContactId::new(path.into_inner());
    let request = payload.into_inner();
    if let Some(body_id) = request.id_pessoa.filter(|body_id| *body_id != id.get()) {
        return Err(id_mismatch_error(id, body_id));
    }
    let contact = state
        .contacts
        .update(id, ContactDraft::from(request))
        .await?;
    Ok(web::Json(ContactResponse::from(&contact)))
}

/// Delete a contact.
#[utoipa::path(
    delete,
    path = "/api/contatos/{id}",
    params(("id" = i32, Path, description = "Contact identifier")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found", body = Error),
        (status = 503, description = "Contact store unavailable", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "deleteContact"
)]
#[delete("/contatos/{id}")]
pub async fn delete_contact(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    state
        .contacts
        .delete(ContactId::new(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the contact routes and their extractor configuration.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use contacts_backend::inbound::http::contacts;
///
/// let app = App::new().service(web::scope("/api").configure(contacts::configure));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(super::error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(list_contacts)
        .service(get_contact)
        .service(create_contact)
        .service(update_contact)
        .service(delete_contact);
}

#[cfg(test)]
#[path = "contacts_tests.rs"]
mod tests;
