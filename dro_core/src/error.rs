use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DroError {
    #[error("malformed {attribute} payload: expected {expected} bytes, got {got}")]
    Decode {
        attribute: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unknown attribute handle {0}")]
    UnknownAttribute(u8),
    #[error("attribute {0} is not writable")]
    ReadOnly(&'static str),
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
    #[error("invalid {attribute} value: {reason}")]
    InvalidValue {
        attribute: &'static str,
        reason: String,
    },
    #[error("calibration store error: {0}")]
    Store(String),
    #[error("counter error: {0}")]
    Counter(String),
    #[error("counter timeout")]
    Timeout,
    #[error("attribute transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
