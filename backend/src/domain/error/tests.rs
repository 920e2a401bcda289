//! Tests for the domain error payload and its serialised shape.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("Erro de validação")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("duplicate"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;

    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serialises_field_errors_when_present(base_error: Error) {
    let error = base_error.with_field_errors(vec![
        FieldErrors::new("nome", vec!["O nome é obrigatório".to_owned()]),
        FieldErrors::new("email", vec!["Email inválido".to_owned()]),
    ]);

    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "Erro de validação",
            "errors": [
                { "field": "nome", "errors": ["O nome é obrigatório"] },
                { "field": "email", "errors": ["Email inválido"] }
            ]
        })
    );
}

#[rstest]
fn omits_empty_optional_members() {
    let value = serde_json::to_value(Error::not_found("missing")).expect("serialise error");
    assert!(value.get("errors").is_none());
    assert!(value.get("traceId").is_none());
}

#[rstest]
fn deserialises_minimal_payload() {
    let error: Error = serde_json::from_value(json!({
        "code": "conflict",
        "message": "duplicate",
        "traceId": TRACE_ID
    }))
    .expect("deserialise error");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.trace_id(), Some(TRACE_ID));
    assert!(error.field_errors().is_empty());
}
