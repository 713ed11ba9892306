//! Share link token generation.

use rand::Rng;

/// Number of random bytes per token (hex-encoded to twice as many chars).
const TOKEN_BYTES: usize = 16;

/// Generates unguessable tokens for public share links.
///
/// Tokens are fixed-length hex strings drawn from the thread-local
/// CSPRNG. Generation is pure; uniqueness against previously issued
/// tokens is enforced by [`super::ShareLinkService`].
#[derive(Debug, Clone)]
pub struct TokenGenerator;

impl TokenGenerator {
    /// Creates a new token generator.
    pub fn new() -> Self {
        Self
    }

    /// Generates a fresh 32-character hex token (128 bits of entropy).
    pub fn next(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_token_shape() {
        let token = TokenGenerator::new().next();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let generator = TokenGenerator::new();
        let tokens: HashSet<String> = (0..100).map(|_| generator.next()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
