use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("spi error: {0}")]
    Spi(String),
    #[error("counter timeout")]
    Timeout,
    #[error("nvm access at offset {offset} out of range for {len}-byte image")]
    OutOfRange { offset: u16, len: usize },
    #[error("nvm image is {got} bytes, expected {expected}")]
    ImageSize { expected: usize, got: usize },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
