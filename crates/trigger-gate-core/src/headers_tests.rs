use super::*;

/// Build a header map without canonicalizing; repeated keys append
fn headers(pairs: &[(&str, &str)]) -> Headers {
    let mut out = Headers::new();
    for (key, value) in pairs {
        out.entry(key.to_string()).or_default().push(value.to_string());
    }
    out
}

#[test]
fn test_canonical_key_rewrites_each_segment() {
    assert_eq!(canonical_key("x-github-event"), "X-Github-Event");
    assert_eq!(canonical_key("X-GITHUB-EVENT"), "X-Github-Event");
    assert_eq!(canonical_key("content-type"), "Content-Type");
    assert_eq!(canonical_key("etag"), "Etag");
}

#[test]
fn test_canonical_key_leaves_invalid_names_alone() {
    assert_eq!(canonical_key("x abc"), "x abc");
    assert_eq!(canonical_key("x-ä"), "x-ä");
}

#[test]
fn test_upper_and_lower_case_keys_canonicalize_identically() {
    let expected = headers(&[("X-Abc", "foo")]);

    assert_eq!(canonical(&headers(&[("X-ABC", "foo")])), expected);
    assert_eq!(canonical(&headers(&[("x-abc", "foo")])), expected);
}

#[test]
fn test_canonical_preserves_value_order() {
    let input = headers(&[("x-multi", "one"), ("x-multi", "two"), ("x-multi", "three")]);
    let out = canonical(&input);
    assert_eq!(out["X-Multi"], vec!["one", "two", "three"]);
}

#[test]
fn test_canonical_merges_differently_cased_keys() {
    let input = headers(&[("x-abc", "lower"), ("X-ABC", "upper")]);
    let out = canonical(&input);

    // A built map only knows byte order: "X-ABC" sorts before "x-abc".
    assert_eq!(out.len(), 1);
    assert_eq!(out["X-Abc"], vec!["upper", "lower"]);
}

#[derive(Debug, serde::Deserialize)]
struct WireHeaders {
    #[serde(deserialize_with = "deserialize_canonical")]
    header: Headers,
}

#[test]
fn test_deserialize_merges_case_variants_in_arrival_order() {
    let wire: WireHeaders =
        serde_json::from_str(r#"{"header":{"x-abc":["first"],"X-ABC":["second"]}}"#).unwrap();

    assert_eq!(wire.header.len(), 1);
    assert_eq!(wire.header["X-Abc"], vec!["first", "second"]);
    assert_eq!(first_value(&wire.header, "X-ABC"), Some("first"));
}

#[test]
fn test_deserialize_keeps_upper_case_first_when_it_arrives_first() {
    let wire: WireHeaders =
        serde_json::from_str(r#"{"header":{"X-ABC":["first"],"x-abc":["second","third"]}}"#)
            .unwrap();

    assert_eq!(wire.header["X-Abc"], vec!["first", "second", "third"]);
}

#[test]
fn test_deserialize_rejects_non_list_values() {
    let result = serde_json::from_str::<WireHeaders>(r#"{"header":{"X-Abc":"single"}}"#);
    assert!(result.is_err());
}

#[test]
fn test_from_pairs_keeps_arrival_order() {
    let out = canonical_from_pairs([("x-abc", "b"), ("X-Abc", "a")]);
    assert_eq!(out["X-Abc"], vec!["b", "a"]);
}

#[test]
fn test_first_value_ignores_casing() {
    let input = headers(&[("x-hub-signature", "sha1=00"), ("x-hub-signature", "sha1=11")]);

    assert_eq!(first_value(&input, "X-Hub-Signature"), Some("sha1=00"));
    assert_eq!(first_value(&input, "X-HUB-SIGNATURE"), Some("sha1=00"));
    assert_eq!(first_value(&input, "X-Github-Event"), None);
}

#[test]
fn test_first_value_with_empty_value_list() {
    let input = Headers::from([("X-Empty".to_string(), Vec::new())]);
    assert_eq!(first_value(&input, "x-empty"), None);
}
