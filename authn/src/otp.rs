use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Outstanding one-time passcode for a user. At most one per user; a new
/// challenge replaces the old one.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

impl OtpChallenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Constant-time comparison against a submitted code.
    pub fn matches(&self, submitted: &str) -> bool {
        self.code.as_bytes().ct_eq(submitted.as_bytes()).into()
    }
}

impl fmt::Debug for OtpChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpChallenge")
            .field("code", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("attempts", &self.attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn challenge(code: &str) -> OtpChallenge {
        let now = Utc::now();
        OtpChallenge {
            code: code.into(),
            created_at: now,
            expires_at: now + Duration::minutes(5),
            attempts: 0,
        }
    }

    #[test]
    fn matches_exact_code_only() {
        let ch = challenge("042917");
        assert!(ch.matches("042917"));
        assert!(!ch.matches("042918"));
        assert!(!ch.matches("42917"));
        assert!(!ch.matches(""));
    }

    #[test]
    fn debug_redacts_code() {
        let s = format!("{:?}", challenge("123456"));
        assert!(!s.contains("123456"));
        assert!(s.contains("redacted"));
    }
}
