//! One-Way Indexable Field Hashing
//!
//! Deterministic SHA-256 hashing for fields that must stay opaque at
//! rest but support equality lookup (email addresses, TOTP secret
//! fingerprints). Hashes are namespaced by application id so identical
//! plaintexts in different tenants produce unrelated digests.
//!
//! Deliberately weaker than password hashing: only use for values that
//! are independently rate-limited or peppered elsewhere, never for
//! secrets that need brute-force resistance on their own.

use crate::crypto::sha256;

/// Hash a field value under a namespace, returning lowercase hex.
///
/// The digest covers `namespace:value`, so
/// `hash_field(v, ns1) != hash_field(v, ns2)` for distinct namespaces.
pub fn hash_field(value: &str, namespace: &str) -> String {
    let digest = sha256(format!("{namespace}:{value}").as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
