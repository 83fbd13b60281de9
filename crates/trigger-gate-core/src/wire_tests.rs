//! Tests for the wire types shared with interceptor services.

use super::*;
use serde_json::json;

// ============================================================================
// InterceptorRequest
// ============================================================================

#[test]
fn test_request_uses_protocol_field_names() {
    let request = InterceptorRequest {
        body: "{}".to_string(),
        header: Headers::from([("X-Github-Event".to_string(), vec!["push".to_string()])]),
        extensions: Map::new(),
        interceptor_params: Map::from_iter([("filter".to_string(), json!("true"))]),
        context: Some(TriggerContext {
            event_url: "http://listener".to_string(),
            event_id: "abc".to_string(),
            trigger_id: "namespaces/ns/triggers/t".to_string(),
        }),
    };

    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["header"]["X-Github-Event"], json!(["push"]));
    assert_eq!(value["interceptorParams"]["filter"], json!("true"));
    assert_eq!(value["context"]["eventURL"], json!("http://listener"));
    assert_eq!(value["context"]["eventID"], json!("abc"));
    assert_eq!(value["context"]["triggerID"], json!("namespaces/ns/triggers/t"));
}

#[test]
fn test_request_decodes_with_missing_fields() {
    let request: InterceptorRequest = serde_json::from_str(r#"{"body":"x"}"#).unwrap();
    assert_eq!(request.body, "x");
    assert!(request.header.is_empty());
    assert!(request.context.is_none());
}

#[test]
fn test_header_value_is_canonical() {
    let request = InterceptorRequest {
        header: Headers::from([("x-github-event".to_string(), vec!["push".to_string()])]),
        ..InterceptorRequest::default()
    };
    assert_eq!(request.header_value("X-GitHub-Event"), Some("push"));
}

#[test]
fn test_received_headers_are_canonical_in_arrival_order() {
    let request: InterceptorRequest = serde_json::from_str(
        r#"{"body":"x","header":{"x-hub-signature":["sha1=aa"],"X-HUB-SIGNATURE":["sha1=bb"]}}"#,
    )
    .unwrap();

    assert_eq!(request.header.len(), 1);
    assert_eq!(request.header["X-Hub-Signature"], vec!["sha1=aa", "sha1=bb"]);
    assert_eq!(request.header_value("X-Hub-Signature"), Some("sha1=aa"));
}

// ============================================================================
// TriggerContext
// ============================================================================

#[test]
fn test_context_namespace_from_trigger_id() {
    let context = TriggerContext::new("http://listener", "namespaces/team-a/triggers/push");
    assert_eq!(context.namespace(), Some("team-a"));
    assert!(!context.event_id.is_empty());
}

#[test]
fn test_context_namespace_absent_for_other_formats() {
    assert_eq!(TriggerContext::new("", "push").namespace(), None);
    assert_eq!(TriggerContext::new("", "namespaces//triggers/x").namespace(), None);
}

// ============================================================================
// InterceptorResponse
// ============================================================================

#[test]
fn test_passing_response_omits_status_and_extensions() {
    let value = serde_json::to_value(InterceptorResponse::proceed()).unwrap();
    assert_eq!(value, json!({"continue": true}));
}

#[test]
fn test_failing_response_carries_integer_code() {
    let response = InterceptorResponse::fail(StatusCode::FailedPrecondition, "filter rejected");
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(
        value,
        json!({"continue": false, "status": {"code": 9, "message": "filter rejected"}})
    );
}

#[test]
fn test_response_decodes_code_by_name() {
    let response: InterceptorResponse = serde_json::from_str(
        r#"{"continue": false, "status": {"code": "PERMISSION_DENIED", "message": "no"}}"#,
    )
    .unwrap();

    assert!(!response.continue_flow);
    assert_eq!(response.status.code, StatusCode::PermissionDenied);
}

#[test]
fn test_response_rejects_unknown_code() {
    let result = serde_json::from_str::<InterceptorResponse>(r#"{"status": {"code": 42}}"#);
    assert!(result.is_err());
}

#[test]
fn test_response_missing_continue_is_false() {
    let response: InterceptorResponse = serde_json::from_str("{}").unwrap();
    assert!(!response.continue_flow);
    assert!(response.status.is_ok());
}

// ============================================================================
// StatusCode
// ============================================================================

#[test]
fn test_status_code_numbering_matches_grpc() {
    assert_eq!(StatusCode::Ok.as_u32(), 0);
    assert_eq!(StatusCode::InvalidArgument.as_u32(), 3);
    assert_eq!(StatusCode::FailedPrecondition.as_u32(), 9);
    assert_eq!(StatusCode::Internal.as_u32(), 13);
    assert_eq!(StatusCode::Unauthenticated.as_u32(), 16);
    assert_eq!(StatusCode::from_u32(17), None);
}

#[test]
fn test_status_code_names_round_trip() {
    for value in 0..17 {
        let code = StatusCode::from_u32(value).unwrap();
        assert_eq!(StatusCode::from_name(code.as_str()), Some(code));
    }
}

#[test]
fn test_status_code_http_mapping() {
    assert_eq!(StatusCode::FailedPrecondition.http_status(), 412);
    assert_eq!(StatusCode::InvalidArgument.http_status(), 400);
    assert_eq!(StatusCode::PermissionDenied.http_status(), 403);
    assert_eq!(StatusCode::Unauthenticated.http_status(), 401);
    assert_eq!(StatusCode::NotFound.http_status(), 404);
}
