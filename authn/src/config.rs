use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Session and OTP policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session lifetime and default extension (default: 30 minutes).
    pub session_ttl_minutes: u32,
    /// Digits per OTP (default: 6).
    pub otp_length: usize,
    /// OTP validity window (default: 5 minutes).
    pub otp_ttl_minutes: u32,
    /// Wrong guesses allowed before the challenge is dropped (default: 3).
    pub otp_max_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: 30,
            otp_length: 6,
            otp_ttl_minutes: 5,
            otp_max_attempts: 3,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.session_ttl_minutes == 0 {
            return Err(AuthError::InvalidConfig("session_ttl_minutes must be positive".into()));
        }
        if self.otp_length == 0 {
            return Err(AuthError::InvalidConfig("otp_length must be positive".into()));
        }
        if self.otp_ttl_minutes == 0 {
            return Err(AuthError::InvalidConfig("otp_ttl_minutes must be positive".into()));
        }
        if self.otp_max_attempts == 0 {
            return Err(AuthError::InvalidConfig("otp_max_attempts must be positive".into()));
        }
        Ok(())
    }
}
