use std::fmt;
use std::sync::Arc;

use crate::source::SourceImage;

const BYTES_PER_MB: f64 = 1_048_576.0;

pub const JPEG_MIME: &str = "image/jpeg";

/// Which branch of the compressor produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Quality was at maximum; the source is returned untouched.
    Identity,
    /// Output of the compression routine.
    Primary,
    /// Output of the decode + re-encode fallback.
    Fallback,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Identity => "identity",
            Stage::Primary => "primary",
            Stage::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionResult {
    bytes: Arc<[u8]>,
    mime: String,
    stage: Stage,
}

impl CompressionResult {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, stage: Stage) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            stage,
        }
    }

    pub fn identity(source: &SourceImage) -> Self {
        Self::new(source.bytes().to_vec(), source.mime(), Stage::Identity)
    }

    pub fn jpeg(bytes: Vec<u8>, stage: Stage) -> Self {
        Self::new(bytes, JPEG_MIME, stage)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn size_label(&self) -> String {
        format_megabytes(self.size())
    }
}

/// Human-readable size, e.g. `"1.50 MB"`.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB)
}

/// File name offered for the downloaded artifact.
pub fn download_name(original: &str) -> String {
    format!("compressed_{}", original)
}
