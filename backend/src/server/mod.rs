//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppSettings, PersistenceBackend, ServerConfig, SettingsError};
pub use state_builders::{StateBuildError, build_http_state};

use actix_cors::Cors;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use contacts_backend::Trace;
#[cfg(debug_assertions)]
use contacts_backend::doc::ApiDoc;
use contacts_backend::inbound::http::contacts;
use contacts_backend::inbound::http::health::{health, live, ready};
use contacts_backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Allow the configured origins with credentials and any method or header.
fn build_cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

fn build_app(
    http_state: web::Data<HttpState>,
    allowed_origins: Vec<String>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api").configure(contacts::configure);

    let app = App::new()
        .app_data(http_state)
        .wrap(build_cors(&allowed_origins))
        .wrap(Trace)
        .service(api)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server serving `http_state`.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(http_state: HttpState, config: ServerConfig) -> std::io::Result<Server> {
    let http_state = web::Data::new(http_state);
    let ServerConfig {
        bind_addr,
        allowed_origins,
    } = config;

    let server = HttpServer::new(move || build_app(http_state.clone(), allowed_origins.clone()))
        .bind(bind_addr)?
        .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Wiring tests for the assembled application.

    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::test as actix_test;
    use contacts_backend::domain::TRACE_ID_HEADER;
    use contacts_backend::outbound::memory::InMemoryContactRepository;
    use rstest::{fixture, rstest};

    #[fixture]
    fn state() -> web::Data<HttpState> {
        web::Data::new(state_builders::http_state_for(
            InMemoryContactRepository::default(),
        ))
    }

    fn origins() -> Vec<String> {
        vec!["http://localhost:4201".to_owned()]
    }

    #[rstest]
    #[actix_web::test]
    async fn routes_are_mounted_with_trace_header(state: web::Data<HttpState>) {
        let app = actix_test::init_service(build_app(state, origins())).await;

        for uri in ["/api/contatos", "/health", "/health/live", "/health/ready"] {
            let response =
                actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                    .await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert!(response.headers().contains_key(TRACE_ID_HEADER), "{uri}");
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn cors_allows_configured_origin_with_credentials(state: web::Data<HttpState>) {
        let app = actix_test::init_service(build_app(state, origins())).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/contatos")
            .insert_header((header::ORIGIN, "http://localhost:4201"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        let headers = response.headers();
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:4201")
        );
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn cors_rejects_unknown_origin(state: web::Data<HttpState>) {
        let app = actix_test::init_service(build_app(state, origins())).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/contatos")
            .insert_header((header::ORIGIN, "http://evil.example"))
            .to_request();
        let response = actix_test::try_call_service(&app, request).await;

        match response {
            Ok(response) => assert!(
                !response
                    .headers()
                    .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            ),
            Err(error) => assert_eq!(
                error.as_response_error().status_code(),
                StatusCode::BAD_REQUEST
            ),
        }
    }
}
