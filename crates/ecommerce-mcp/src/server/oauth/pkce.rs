//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Implements S256 code challenge verification per RFC 7636. S256 is the
//! only method this server accepts at the token endpoint.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Compute the S256 challenge for a verifier: `BASE64URL(SHA256(verifier))`.
#[must_use]
pub fn challenge_for(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Verify a PKCE S256 code challenge.
///
/// The computed challenge must equal the stored one byte for byte.
#[must_use]
pub fn verify_s256(code_verifier: &str, code_challenge: &str) -> bool {
    challenge_for(code_verifier) == code_challenge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s256_valid() {
        // RFC 7636 Appendix B test vector
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert!(verify_s256(verifier, challenge));
        assert_eq!(challenge_for(verifier), challenge);
    }

    #[test]
    fn test_s256_invalid_verifier() {
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert!(!verify_s256("wrong-verifier", challenge));
    }

    #[test]
    fn test_s256_invalid_challenge() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert!(!verify_s256(verifier, "wrong-challenge"));
    }

    #[test]
    fn test_s256_roundtrip() {
        let verifier = "a]random/verifier_string.with";
        let challenge = challenge_for(verifier);
        assert!(verify_s256(verifier, &challenge));
    }
}
