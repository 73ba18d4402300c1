//! Authentication state that is independent of how identity was
//! established: sessions, one-time passcodes and PIN hashes.
//!
//! # State machines
//!
//! ```text
//! session:  absent -> active -> (expired | ended)
//! otp:      none -> issued -> (verified | expired | attempts_exhausted)
//! ```
//!
//! Expiry is checked lazily on read; [`AuthenticationManager::cleanup_expired_sessions`]
//! and [`AuthenticationManager::cleanup_expired_otps`] only reclaim memory.
//!
//! Session and OTP tables sit behind [`StateStore`] so a deployment can back
//! them with a shared cache. [`MemoryStateStore`] is the in-process default.

mod clock;
mod config;
mod error;
mod manager;
mod otp;
pub mod pin;
mod session;
mod store;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use error::{AuthError, StoreError};
pub use manager::AuthenticationManager;
pub use otp::OtpChallenge;
pub use pin::{hash_pin, hash_pin_salted, verify_pin};
pub use session::{AuthMethod, Session};
pub use store::{MemoryStateStore, StateStore};
pub use token::mask_token;
