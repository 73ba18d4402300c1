use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the user proved their identity when the session was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    VoiceBiometric,
    Pin,
    Otp,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoiceBiometric => "voice_biometric",
            Self::Pin => "pin",
            Self::Otp => "otp",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice_biometric" | "voice" => Ok(Self::VoiceBiometric),
            "pin" => Ok(Self::Pin),
            "otp" => Ok(Self::Otp),
            other => Err(format!("unknown authentication method: {other}")),
        }
    }
}

/// An authenticated interaction window. The token that names it is the
/// store key and is not part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub authentication_method: AuthMethod,
    pub is_active: bool,
}

impl Session {
    /// Expired strictly after `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
