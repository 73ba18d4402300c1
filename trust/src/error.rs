use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("trust: unknown trust level: {0}")]
    UnknownLevel(String),

    #[error("trust: unknown location risk: {0}")]
    UnknownLocationRisk(String),

    #[error("trust: unknown operation: {0}")]
    UnknownOperation(String),

    #[error("trust: invalid config: {0}")]
    InvalidConfig(String),
}
