use crate::models::session::Session;
use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};

const SECRET_LEN: usize = 32;

/// Generate a fresh per-session CSRF secret. Created with the session and
/// rotated whenever the session is replaced (login) or destroyed (logout),
/// so a fixated token dies with the old session.
pub fn generate_secret() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SECRET_LEN)
}

/// The token embedded in state-changing forms. Tied to the session, not a
/// single render: several open tabs all submit the same valid token.
pub fn issue_token(session: &Session) -> &str {
    &session.csrf_secret
}

/// Compare a submitted token against the session's secret. Both sides are
/// hashed first and the digests compared, so the comparison runs over
/// fixed-length values and a mismatch position reveals nothing about the
/// secret.
pub fn verify_token(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }

    let expected_digest = hex::encode(Sha256::digest(expected.as_bytes()));
    let submitted_digest = hex::encode(Sha256::digest(submitted.as_bytes()));
    expected_digest == submitted_digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_distinct_and_fixed_length() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), SECRET_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn matching_token_verifies() {
        let secret = generate_secret();
        assert!(verify_token(&secret, &secret));
    }

    #[test]
    fn mismatched_token_fails() {
        assert!(!verify_token("expected-secret", "submitted-other"));
    }

    #[test]
    fn empty_values_never_verify() {
        assert!(!verify_token("", ""));
        assert!(!verify_token("secret", ""));
        assert!(!verify_token("", "secret"));
    }
}
