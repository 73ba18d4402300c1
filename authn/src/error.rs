use thiserror::Error;

/// Failure of a [`crate::StateStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store: backend error: {0}")]
    Backend(String),
}

/// Errors returned by authentication operations.
///
/// Session and OTP variants describe normal lifecycle outcomes; callers
/// match on them to decide between re-issuing a challenge, asking the user
/// to log in again, or locking out.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authn: unknown session")]
    UnknownSession,

    #[error("authn: session expired")]
    ExpiredSession,

    #[error("authn: session deactivated")]
    InactiveSession,

    #[error("authn: no outstanding otp")]
    NoOtp,

    #[error("authn: otp expired")]
    OtpExpired,

    #[error("authn: otp attempts exhausted")]
    OtpAttemptsExhausted,

    #[error("authn: otp mismatch (attempt {attempts}, {remaining} remaining)")]
    OtpMismatch { attempts: u32, remaining: u32 },

    #[error("authn: pin mismatch")]
    PinMismatch,

    #[error("authn: user id must not be empty")]
    InvalidUserId,

    #[error("authn: invalid config: {0}")]
    InvalidConfig(String),

    #[error("authn: entropy source failed: {0}")]
    Entropy(String),

    #[error("authn: {0}")]
    Store(#[from] StoreError),
}
