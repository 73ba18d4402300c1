//! Adaptive trust: turns environmental and biometric signals into a
//! discrete [`TrustLevel`], and maps each level to the authentication
//! factors it demands and the operations it permits.
//!
//! Scoring starts at 1.0 and subtracts a fixed penalty for each
//! independent risk factor:
//!
//! | factor                                    | penalty |
//! |-------------------------------------------|---------|
//! | noise above `noise_threshold`             | 0.3     |
//! | voice confidence below `biometric_threshold` | 0.3  |
//! | amount above `high_value_threshold`       | 0.2     |
//! | location risk `high`                      | 0.2     |
//!
//! The score falls into one of four bands (`>= 0.8` HIGH, `>= 0.5` MEDIUM,
//! `>= 0.3` LOW, otherwise CRITICAL). Penalties are tallied in whole
//! hundredths so band edges are exact.

mod config;
mod engine;
mod error;
mod level;
mod operation;
mod policy;

pub use config::TrustConfig;
pub use engine::{AdaptiveTrustEngine, Penalty, TrustAssessment, TrustFactors, TrustSignals};
pub use error::TrustError;
pub use level::{LocationRisk, TrustLevel};
pub use operation::Operation;
pub use policy::{AllowedOperations, AuthFactor, RequiredAuthentication};
