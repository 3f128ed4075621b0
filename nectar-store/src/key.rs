//! Storage key namespacing
//!
//! Every meta key and taxonomy name the engine writes carries the `nc_`
//! namespace so it can coexist with host-owned keys. Callers work with bare
//! names; prefixing happens at the storage seam.

/// Namespace applied to all engine-owned storage identifiers.
pub const NAMESPACE: &str = "nc_";

/// Prefix a bare name with the engine namespace.
pub fn prefix(name: &str) -> String {
    format!("{NAMESPACE}{name}")
}

/// Strip the engine namespace from a storage identifier, if present.
pub fn unprefix(key: &str) -> &str {
    key.strip_prefix(NAMESPACE).unwrap_or(key)
}

/// Normalize a slug into a storage-safe key: lowercase ASCII alphanumerics,
/// `_` and `-`, everything else dropped.
pub fn sanitize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c == '_' || c == '-' {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}
