//! Token numbers identifying one upload batch.

use nanoid::nanoid;
use serde::{Deserialize, Serialize};

/// Alphabet for generated tokens: unambiguous to read out over a counter.
const TOKEN_ALPHABET: [char; 36] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Length of generated tokens.
const TOKEN_LEN: usize = 6;

/// Short human-readable code shared by all jobs of one upload batch.
///
/// Tokens are not globally unique across time: an unrelated batch may reuse
/// a code long after the first one is gone, so token-scoped operations always
/// mean "all jobs presently tagged with this token".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenNumber(String);

impl TokenNumber {
    /// Wrap an existing token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh 6-character token.
    pub fn generate() -> Self {
        Self(nanoid!(TOKEN_LEN, &TOKEN_ALPHABET))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenNumber {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
