//! Tests for the crate-level error taxonomy.

use super::*;

fn io_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused")
}

mod interceptor_error_tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_security_and_permanent() {
        let err = InterceptorError::from(ValidationError::SignatureMismatch {
            header: "X-Hub-Signature".to_string(),
        });

        assert!(!err.is_transient());
        assert_eq!(err.error_category(), ErrorCategory::Security);
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("X-Hub-Signature"));
    }

    #[test]
    fn test_transport_errors_are_transient() {
        let err = InterceptorError::transport("http://interceptor.local/cel", io_error());

        assert!(err.is_transient());
        assert_eq!(err.error_category(), ErrorCategory::Transient);
        assert_eq!(err.http_status(), 502);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_upstream_server_errors_are_transient() {
        let err = InterceptorError::Upstream {
            url: "http://interceptor.local".to_string(),
            status: 503,
        };
        assert!(err.is_transient());
        assert_eq!(err.error_category(), ErrorCategory::Transient);
    }

    #[test]
    fn test_upstream_client_errors_are_permanent() {
        let err = InterceptorError::Upstream {
            url: "http://interceptor.local".to_string(),
            status: 404,
        };
        assert!(!err.is_transient());
        assert_eq!(err.error_category(), ErrorCategory::Permanent);
        assert_eq!(err.http_status(), 502);
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_not_found_is_configuration() {
        let err = InterceptorError::from(NotFoundError::Secret {
            namespace: "ns".to_string(),
            name: "webhook".to_string(),
        });
        assert!(!err.is_transient());
        assert_eq!(err.error_category(), ErrorCategory::Configuration);
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.to_string(), "secret ns/webhook not found");
    }

    #[test]
    fn test_no_url_renders_not_ready_message() {
        let err = InterceptorError::NoUrl {
            name: "cel".to_string(),
        };
        assert!(err.to_string().contains("not ready"));
        assert_eq!(err.http_status(), 503);
    }

    #[test]
    fn test_marshal_encode_message_is_matchable() {
        let source = serde_json::to_value(std::collections::BTreeMap::from([((1, 2), 3)]))
            .unwrap_err();
        let err = InterceptorError::from(MarshalError::Encode(source));

        assert!(err.to_string().contains("failed to marshal json"));
        assert_eq!(err.error_category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_decode_errors_are_permanent() {
        let source = serde_json::from_str::<wire::InterceptorResponse>("not json").unwrap_err();
        let err = InterceptorError::Decode {
            url: "http://interceptor.local".to_string(),
            source,
        };
        assert!(!err.is_transient());
        assert_eq!(err.http_status(), 502);
    }
}
