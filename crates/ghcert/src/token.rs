// ABOUTME: Session token generation for correlating a dispatch with its fetches.
// ABOUTME: Fixed-length random strings over the 62-symbol alphanumeric alphabet.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a session token in characters.
pub const SESSION_TOKEN_LENGTH: usize = 20;

/// Correlation key linking one certificate request to its fetches.
///
/// Not a credential: authorization comes from the authenticated dispatch
/// channel. Tokens live only in process memory and are never reused. With
/// 62^20 possibilities collisions are possible in principle and accepted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token of [`SESSION_TOKEN_LENGTH`] characters.
    pub fn generate() -> Self {
        Self::with_length(SESSION_TOKEN_LENGTH)
    }

    /// Generate a fresh token of `length` characters from the thread RNG.
    pub fn with_length(length: usize) -> Self {
        Self::from_rng(&mut rand::thread_rng(), length)
    }

    /// Generate a token from a caller-supplied RNG.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Self {
        let token = rng
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Only the first characters, so logs at DEBUG can be correlated without
// publishing the whole token.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.0.chars().take(4).collect();
        write!(f, "SessionToken({shown}…)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn in_alphabet(c: char) -> bool {
        c.is_ascii_alphanumeric()
    }

    #[test]
    fn test_default_length() {
        let token = SessionToken::generate();
        assert_eq!(token.as_str().len(), SESSION_TOKEN_LENGTH);
        assert_eq!(token.as_str().chars().count(), 20);
    }

    #[test]
    fn test_requested_lengths_and_alphabet() {
        for length in [0, 1, 7, 20, 64, 257] {
            let token = SessionToken::with_length(length);
            assert_eq!(token.as_str().chars().count(), length);
            assert!(token.as_str().chars().all(in_alphabet), "{token}");
        }
    }

    #[test]
    fn test_independent_tokens_differ() {
        let tokens: HashSet<SessionToken> = (0..1000).map(|_| SessionToken::generate()).collect();
        // A collision in 62^20 across a thousand samples would mean a broken RNG.
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_alphabet_is_fully_used() {
        let mut rng = StdRng::seed_from_u64(7);
        let token = SessionToken::from_rng(&mut rng, 10_000);
        let seen: HashSet<char> = token.as_str().chars().collect();
        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a = SessionToken::from_rng(&mut StdRng::seed_from_u64(42), 20);
        let b = SessionToken::from_rng(&mut StdRng::seed_from_u64(42), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug_does_not_reveal_token() {
        let token = SessionToken::generate();
        let debug = format!("{:?}", token);
        assert!(!debug.contains(token.as_str()));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let token = SessionToken::from_rng(&mut StdRng::seed_from_u64(1), 20);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{}\"", token));
    }
}
