//! End-to-end flow over the public HTTP surface with the in-memory store.
//!
//! Drives a full create, read, update and delete cycle through the same
//! middleware stack the server mounts, checking status codes, headers and
//! the Portuguese wire names.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test, web};
use contacts_backend::Trace;
use contacts_backend::domain::{ContactsService, TRACE_ID_HEADER};
use contacts_backend::inbound::http::contacts;
use contacts_backend::inbound::http::health::{health, live, ready};
use contacts_backend::inbound::http::state::HttpState;
use contacts_backend::outbound::memory::InMemoryContactRepository;
use mockable::DefaultClock;
use serde_json::{Value, json};

fn memory_state() -> HttpState {
    let repository = InMemoryContactRepository::new(Arc::new(DefaultClock));
    let service = Arc::new(ContactsService::new(Arc::new(repository)));
    HttpState::new(service.clone(), service)
}

macro_rules! init_app {
    () => {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new(memory_state()))
                .wrap(Trace)
                .service(web::scope("/api").configure(contacts::configure))
                .service(health)
                .service(ready)
                .service(live),
        )
        .await
    };
}

#[actix_web::test]
async fn contact_lifecycle_round_trips_through_the_api() {
    let app = init_app!();

    let created = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/contatos")
            .set_json(json!({
                "nome": "Bruno",
                "dataNasc": "1985-07-20",
                "obs": "colega",
                "telefone": "21988887777",
                "email": "bruno@x.com"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert!(created.headers().contains_key(TRACE_ID_HEADER));
    let location = created
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("location header");
    let body: Value = actix_test::read_body_json(created).await;
    let id = body["idPessoa"].as_i64().expect("assigned id");
    assert_eq!(location, format!("/api/contatos/{id}"));
    assert!(body.get("dataAtualizacao").is_none());

    let updated = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&location)
            .set_json(json!({
                "idPessoa": id,
                "nome": "Bruno Lima",
                "dataNasc": "1985-07-20",
                "telefone": "21988887777",
                "email": "bruno@x.com"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(updated).await;
    assert_eq!(body["nome"], "Bruno Lima");
    assert!(body.get("obs").is_none());
    assert!(body["dataAtualizacao"].is_string());

    let listed: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get().uri("/api/contatos").to_request(),
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let deleted = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete().uri(&location).to_request(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri(&location).to_request(),
    )
    .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(gone).await;
    assert_eq!(body["code"], "not_found");
    assert!(body["traceId"].is_string());
}

#[actix_web::test]
async fn invalid_contact_reports_every_field() {
    let app = init_app!();

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/contatos")
            .set_json(json!({ "nome": "", "dataNasc": "31/12/1990", "email": "sem-arroba" }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("field errors")
        .iter()
        .filter_map(|entry| entry["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["nome", "dataNasc", "telefone", "email"]);
}

#[actix_web::test]
async fn health_endpoints_report_a_reachable_store() {
    let app = init_app!();

    for path in ["/health", "/health/ready", "/health/live"] {
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(path).to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}
