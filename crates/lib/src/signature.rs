//! Callback signature: SHA-1 over the sorted (timestamp, nonce, token) triple.
//!
//! The platform sorts the three strings byte-wise, concatenates them without a
//! separator and sends the lower-case hex SHA-1 as the `signature` query parameter.

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

/// Compute the hex signature the platform would send for this timestamp, nonce and token.
pub fn sign(timestamp: &str, nonce: &str, token: &str) -> String {
    let mut parts = [timestamp, nonce, token];
    parts.sort_unstable();
    let mut hasher = Sha1::new();
    for p in parts {
        hasher.update(p.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// True when `signature` matches [`sign`] for the given inputs. Comparison is constant-time.
pub fn verify(timestamp: &str, nonce: &str, token: &str, signature: &str) -> bool {
    let expected = sign(timestamp, nonce, token);
    // Length is public (always 40 hex chars for SHA-1); only contents are compared in constant time.
    if expected.len() != signature.len() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha1_hex(s: &str) -> String {
        let mut h = Sha1::new();
        h.update(s.as_bytes());
        hex::encode(h.finalize())
    }

    #[test]
    fn sign_sorts_before_hashing() {
        // "1400000000" < "abc123" < "mytoken" byte-wise.
        assert_eq!(
            sign("1400000000", "abc123", "mytoken"),
            sha1_hex("1400000000abc123mytoken")
        );
        assert_eq!(sign("zzz", "aaa", "mmm"), sha1_hex("aaammmzzz"));
    }

    #[test]
    fn sign_is_order_independent() {
        let a = sign("1", "2", "3");
        assert_eq!(a, sign("3", "1", "2"));
        assert_eq!(a, sign("2", "3", "1"));
    }

    #[test]
    fn verify_accepts_valid_signature() {
        let sig = sign("1400000000", "abc123", "mytoken");
        assert_eq!(sig.len(), 40);
        assert!(verify("1400000000", "abc123", "mytoken", &sig));
    }

    #[test]
    fn verify_rejects_single_char_mutation() {
        let sig = sign("1400000000", "abc123", "mytoken");
        for i in 0..sig.len() {
            let mut bytes = sig.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!verify("1400000000", "abc123", "mytoken", &mutated), "index {}", i);
        }
    }

    #[test]
    fn verify_rejects_wrong_token_and_length() {
        let sig = sign("1400000000", "abc123", "mytoken");
        assert!(!verify("1400000000", "abc123", "other", &sig));
        assert!(!verify("1400000000", "abc123", "mytoken", &sig[..39]));
        assert!(!verify("1400000000", "abc123", "mytoken", ""));
        assert!(!verify("1400000000", "abc123", "mytoken", &sig.to_uppercase()));
    }

    #[test]
    fn empty_inputs_still_sign() {
        assert_eq!(sign("", "", ""), sha1_hex(""));
        assert!(verify("", "", "", &sha1_hex("")));
    }
}
