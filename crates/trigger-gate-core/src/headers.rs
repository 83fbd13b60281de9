//! # Header Canonicalization
//!
//! Event sources disagree on header casing (`X-GitHub-Event`,
//! `x-github-event`, `X-GITHUB-EVENT`). Everything the pipeline inspects is
//! looked up through the canonical MIME form so casing never changes the
//! outcome of a check.

use serde::{
    de::{MapAccess, Visitor},
    Deserializer,
};
use std::{collections::BTreeMap, fmt};

/// Multi-value header map as carried on the wire.
///
/// A `BTreeMap` does not remember the order keys arrived in. Canonicalize at
/// the boundary, with [`canonical_from_pairs`] or [`deserialize_canonical`],
/// so case variants of one name are merged in arrival order.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Canonical MIME form of a header name.
///
/// The first letter and every letter following a hyphen are upper-cased, all
/// other letters are lower-cased. Names containing bytes that are not valid
/// in a header token are returned unchanged.
///
/// ```rust
/// use trigger_gate_core::headers::canonical_key;
///
/// assert_eq!(canonical_key("x-abc"), "X-Abc");
/// assert_eq!(canonical_key("X-ABC"), "X-Abc");
/// assert_eq!(canonical_key("content-TYPE"), "Content-Type");
/// ```
pub fn canonical_key(key: &str) -> String {
    if !key.bytes().all(is_token_byte) {
        return key.to_string();
    }

    let mut upper = true;
    key.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

/// Rewrite every key of `headers` into canonical form.
///
/// Values and their order are preserved. Keys that collapse to the same
/// canonical name are merged in the map's key order, which for an already
/// built map is byte order, not arrival order.
pub fn canonical(headers: &Headers) -> Headers {
    canonical_from_pairs(
        headers
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str()))),
    )
}

/// Build a canonical header map from `(name, value)` pairs in arrival order.
pub fn canonical_from_pairs<I, K, V>(pairs: I) -> Headers
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut out = Headers::new();
    for (key, value) in pairs {
        out.entry(canonical_key(key.as_ref()))
            .or_default()
            .push(value.into());
    }
    out
}

/// Deserialize a wire header object into canonical form.
///
/// Entries are visited in document order, so values of `x-abc` and `X-ABC`
/// end up under `X-Abc` in the order they were received.
pub fn deserialize_canonical<'de, D>(deserializer: D) -> Result<Headers, D::Error>
where
    D: Deserializer<'de>,
{
    struct CanonicalVisitor;

    impl<'de> Visitor<'de> for CanonicalVisitor {
        type Value = Headers;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of header names to lists of values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Headers, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Headers::new();
            while let Some((key, values)) = map.next_entry::<String, Vec<String>>()? {
                out.entry(canonical_key(&key)).or_default().extend(values);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(CanonicalVisitor)
}

/// First value stored under `name`, compared canonically.
///
/// On a map that was not canonicalized, case variants are searched in key
/// order; canonicalize first when several variants may be present.
pub fn first_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    let wanted = canonical_key(name);
    let values = match headers.get(&wanted) {
        Some(values) => values,
        None => {
            headers
                .iter()
                .find(|(key, _)| canonical_key(key) == wanted)?
                .1
        }
    };
    values.first().map(String::as_str)
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
