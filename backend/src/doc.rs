//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers the contact endpoints, the
//! health checks and the error payload schemas.
//!
//! The generated document is served by Swagger UI in debug builds.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, FieldErrors};
use crate::inbound::http::contacts::{ContactRequest, ContactResponse};
use crate::inbound::http::health::HealthReport;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Contacts API",
        description = "CRUD interface for contacts plus health checks."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::contacts::list_contacts,
        crate::inbound::http::contacts::get_contact,
        crate::inbound::http::contacts::create_contact,
        crate::inbound::http::contacts::update_contact,
        crate::inbound::http::contacts::delete_contact,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ContactRequest,
        ContactResponse,
        Error,
        ErrorCode,
        FieldErrors,
        HealthReport
    )),
    tags(
        (name = "contacts", description = "Contact management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
