use super::*;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn store_with(
    endpoint: InterceptorEndpoint,
) -> impl Fn(&str) -> Result<InterceptorEndpoint, EndpointStoreError> {
    move |name: &str| {
        if name == endpoint.name {
            Ok(endpoint.clone())
        } else {
            Err(EndpointStoreError::NotFound)
        }
    }
}

#[test]
fn test_ready_address_preferred_over_spec_url() {
    let store = store_with(
        InterceptorEndpoint::new("cel")
            .with_spec_url(url("http://static.example/cel"))
            .with_address_url(url("http://cel-svc.tekton.svc:8443/cel")),
    );

    let resolved = resolve_to_url(&store, "cel").unwrap();

    assert_eq!(resolved.as_str(), "http://cel-svc.tekton.svc:8443/cel");
}

#[test]
fn test_spec_url_used_when_not_ready() {
    let store = store_with(
        InterceptorEndpoint::new("cel").with_spec_url(url("http://static.example/cel")),
    );

    assert_eq!(
        resolve_to_url(&store, "cel").unwrap().as_str(),
        "http://static.example/cel"
    );
}

#[test]
fn test_service_reference_is_last_resort() {
    let store = store_with(
        InterceptorEndpoint::new("github").with_service(
            ServiceReference::new("core-interceptors", "tekton-pipelines")
                .with_path("/github")
                .with_port(8443),
        ),
    );

    assert_eq!(
        resolve_to_url(&store, "github").unwrap().as_str(),
        "http://core-interceptors.tekton-pipelines.svc:8443/github"
    );
}

#[test]
fn test_service_reference_defaults() {
    let service = ServiceReference::new("interceptors", "ns");
    assert_eq!(service.url().unwrap().as_str(), "http://interceptors.ns.svc/");

    let relative = ServiceReference::new("interceptors", "ns").with_path("cel");
    assert_eq!(relative.url().unwrap().as_str(), "http://interceptors.ns.svc/cel");
}

#[test]
fn test_endpoint_without_any_url_is_no_url() {
    let store = store_with(InterceptorEndpoint::new("cel"));

    let err = resolve_to_url(&store, "cel").unwrap_err();

    assert!(matches!(err, InterceptorError::NoUrl { ref name } if name == "cel"));
}

#[test]
fn test_empty_address_status_falls_through() {
    let mut endpoint = InterceptorEndpoint::new("cel").with_spec_url(url("http://static.example/"));
    endpoint.status.address = Some(Addressable { url: None });

    assert_eq!(
        resolve_to_url(&store_with(endpoint), "cel").unwrap().as_str(),
        "http://static.example/"
    );
}

#[test]
fn test_unknown_interceptor_is_not_found() {
    let store = store_with(InterceptorEndpoint::new("cel"));

    let err = resolve_to_url(&store, "bitbucket").unwrap_err();

    assert!(matches!(
        err,
        InterceptorError::NotFound(NotFoundError::Endpoint { ref name }) if name == "bitbucket"
    ));
}

#[test]
fn test_store_failure_is_unavailable() {
    let store = |_: &str| -> Result<InterceptorEndpoint, EndpointStoreError> {
        Err(EndpointStoreError::Unavailable {
            message: "informer not synced".to_string(),
        })
    };

    let err = resolve_to_url(&store, "cel").unwrap_err();

    assert!(matches!(err, InterceptorError::StoreUnavailable { .. }));
    assert!(err.is_transient());
}

#[test]
fn test_endpoint_deserializes_from_resource_shape() {
    let endpoint: InterceptorEndpoint = serde_json::from_str(
        r#"{
            "name": "cel",
            "spec": {"clientConfig": {"service": {"name": "core", "namespace": "tekton", "path": "/cel"}}},
            "status": {"address": {"url": "http://core.tekton.svc:8443/cel"}}
        }"#,
    )
    .unwrap();

    assert_eq!(
        endpoint.address_url().map(Url::as_str),
        Some("http://core.tekton.svc:8443/cel")
    );
    assert_eq!(
        endpoint.spec.client_config.service.as_ref().unwrap().path.as_deref(),
        Some("/cel")
    );
}
