use super::*;
use crate::endpoint::resolve_to_url;

#[test]
fn test_secret_store_returns_all_fields() {
    let store = InMemorySecretStore::new()
        .with_secret("ns", "webhook", "token", "t0k3n")
        .with_secret("ns", "webhook", "other", "x");

    let data = store.get_secret("ns", "webhook").unwrap();

    assert_eq!(data.len(), 2);
    assert_eq!(data["token"].expose(), b"t0k3n");
    assert_eq!(store.lookups(), 1);
}

#[test]
fn test_secret_store_is_namespaced() {
    let store = InMemorySecretStore::new().with_secret("ns", "webhook", "token", "t");

    assert!(matches!(
        store.get_secret("other", "webhook"),
        Err(SecretStoreError::NotFound)
    ));
}

#[test]
fn test_secret_store_remove() {
    let store = InMemorySecretStore::new().with_secret("ns", "webhook", "token", "t");
    store.remove("ns", "webhook");

    assert!(store.get_secret("ns", "webhook").is_err());
    assert_eq!(store.lookups(), 1);
}

#[test]
fn test_endpoint_store_lookup() {
    let store = InMemoryEndpointStore::new().with_endpoint(
        InterceptorEndpoint::new("cel")
            .with_spec_url(url::Url::parse("http://interceptors.local/cel").unwrap()),
    );

    assert_eq!(
        resolve_to_url(&store, "cel").unwrap().as_str(),
        "http://interceptors.local/cel"
    );
    assert!(matches!(
        store.get_by_name("github"),
        Err(EndpointStoreError::NotFound)
    ));
    assert_eq!(store.lookups(), 2);
}

#[test]
fn test_endpoint_store_insert_replaces() {
    let store = InMemoryEndpointStore::new();
    store.insert(InterceptorEndpoint::new("cel"));
    store.insert(
        InterceptorEndpoint::new("cel")
            .with_address_url(url::Url::parse("http://ready.local/").unwrap()),
    );

    let endpoint = store.get_by_name("cel").unwrap();
    assert!(endpoint.address_url().is_some());
}
