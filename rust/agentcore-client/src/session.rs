use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LENGTH: usize = 9;

/// Identifier of a server-side agent conversation.
///
/// Reusing a session across invocations lets the agent keep conversational
/// state; generating a new one starts a fresh conversation upstream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(String);

impl Session {
    /// Generate a new session id of the form `session-<unix millis>-<9 base36 chars>`.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();

        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LENGTH)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();

        Self(format!("session-{}-{}", millis, suffix))
    }

    /// Get the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Session {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Session {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
