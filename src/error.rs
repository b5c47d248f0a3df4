use thiserror::Error;

/// Everything that can make a compression attempt fail.
///
/// The UI treats every variant as "compression failed"; the variants exist so
/// logs and callers can tell the stages apart.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("source image is empty")]
    EmptySource,

    #[error("quality must be within 0.0..=1.0, got {0}")]
    InvalidQuality(f64),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("compression routine failed: {0}")]
    Routine(String),

    #[error("unknown fallback policy: {0}")]
    UnknownPolicy(String),

    #[error("failed to create display handle: {0}")]
    Display(String),
}

impl CompressError {
    pub fn routine<T: Into<String>>(msg: T) -> Self {
        Self::Routine(msg.into())
    }

    pub fn display<T: Into<String>>(msg: T) -> Self {
        Self::Display(msg.into())
    }
}

pub type CompressResult<T> = Result<T, CompressError>;
