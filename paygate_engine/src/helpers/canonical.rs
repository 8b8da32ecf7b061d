//! # Canonical-string signing
//!
//! Payment gateways authenticate both the requests we send them and the callbacks they send us with a digest over a
//! *canonical string*: the request fields serialised as `key=value` pairs, joined with `&`, in a **fixed,
//! protocol-defined order**, with the shared secret appended as a final unkeyed segment:
//!
//! ```text
//!    key1=value1&key2=value2&...&keyN=valueN&SECRET
//! ```
//!
//! The digest is the lowercase hex SHA-256 of that string.
//!
//! The field order is part of the wire contract, it is *not* alphabetical, and it differs between the outbound
//! (create-payment) and inbound (callback) directions. Each provider client owns its two orderings as named
//! constants; this module never sorts or normalises the fields it is given. Changing the order, the casing of a
//! key, or the secret breaks interoperability with the real gateway.
//!
//! Verification recomputes the digest and compares in constant time so that callback forgeries cannot use timing
//! to recover the expected signature byte by byte.

use pg_common::Secret;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Builds the canonical string for the given fields, in the order given, with the secret appended.
fn canonical_string(fields: &[(&str, &str)], secret: &Secret<String>) -> String {
    let mut canonical = fields.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    canonical.push('&');
    canonical.push_str(secret.reveal());
    canonical
}

/// Signs the ordered field list, returning the lowercase hex SHA-256 digest of the canonical string.
pub fn sign_fields(fields: &[(&str, &str)], secret: &Secret<String>) -> String {
    let canonical = canonical_string(fields, secret);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

/// Recomputes the digest for the ordered field list and compares it to `provided` in constant time.
/// Hex digests are compared case-insensitively, since gateways differ on digest casing.
pub fn verify_fields(fields: &[(&str, &str)], secret: &Secret<String>, provided: &str) -> bool {
    let expected = sign_fields(fields, secret);
    let provided = provided.to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod test {
    use super::*;

    fn secret() -> Secret<String> {
        Secret::new("s3cr3t".to_string())
    }

    fn fields() -> Vec<(&'static str, &'static str)> {
        vec![("MerchantID", "M-001"), ("OrderNo", "pl_0a1b2c3d_77"), ("Amount", "102")]
    }

    #[test]
    fn signing_is_deterministic() {
        let a = sign_fields(&fields(), &secret());
        let b = sign_fields(&fields(), &secret());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn known_vector() {
        // sha256("MerchantID=M-001&OrderNo=pl_0a1b2c3d_77&Amount=102&s3cr3t")
        let digest = sign_fields(&fields(), &secret());
        assert_eq!(digest, "e38418a7d788ece1f5e5c02f745f5f8a4fb53e62183140cc1cbd0e63590e4ae3");
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let base = sign_fields(&fields(), &secret());
        let mut tampered = fields();
        tampered[2].1 = "103";
        assert_ne!(base, sign_fields(&tampered, &secret()));
        assert_ne!(base, sign_fields(&fields(), &Secret::new("other".to_string())));
        // Order is part of the contract
        let mut reordered = fields();
        reordered.swap(0, 1);
        assert_ne!(base, sign_fields(&reordered, &secret()));
    }

    #[test]
    fn verify_sign_symmetry() {
        let digest = sign_fields(&fields(), &secret());
        assert!(verify_fields(&fields(), &secret(), &digest));
        assert!(verify_fields(&fields(), &secret(), &digest.to_uppercase()));
        let mut flipped = digest.clone().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        assert!(!verify_fields(&fields(), &secret(), std::str::from_utf8(&flipped).unwrap()));
        assert!(!verify_fields(&fields(), &secret(), ""));
    }
}
