//! Cache Key Builder
//!
//! Deterministic key construction from a name prefix and an unordered
//! parameter set. Callers on different code paths must converge on the same
//! cache entry, so equal prefix + equal params always produce an identical
//! string regardless of the order the params were supplied in.

use std::fmt::Display;

// == Build Key ==
/// Builds a cache key of the form `prefix:name1:value1|name2:value2`.
///
/// Parameters are sorted lexicographically by name before rendering. When
/// `params` is empty, the bare prefix is returned with no separator.
///
/// ```
/// use campus_cache::cache::build_key;
///
/// let a = build_key("chat_messages", &[("limit", 100), ("offset", 0)]);
/// let b = build_key("chat_messages", &[("offset", 0), ("limit", 100)]);
/// assert_eq!(a, "chat_messages:limit:100|offset:0");
/// assert_eq!(a, b);
/// ```
pub fn build_key<K, T>(prefix: &str, params: &[(K, T)]) -> String
where
    K: AsRef<str>,
    T: Display,
{
    if params.is_empty() {
        return prefix.to_string();
    }

    let mut rendered: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (name.as_ref().to_string(), value.to_string()))
        .collect();
    rendered.sort_by(|a, b| a.0.cmp(&b.0));

    let joined = rendered
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("|");

    format!("{prefix}:{joined}")
}
