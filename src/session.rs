use std::sync::Arc;

use crate::error::CompressError;
use crate::quality::QualityFraction;
use crate::result::{download_name, format_megabytes, CompressionResult};
use crate::source::SourceImage;

/// A compression the caller should run and hand back to [`Session::complete`].
#[derive(Debug, Clone)]
pub struct Request {
    pub seq: u64,
    pub source: Arc<SourceImage>,
    pub quality: QualityFraction,
}

/// Outcome of [`Session::complete`].
#[derive(Debug)]
pub enum Completion {
    /// The result is now the current one.
    Applied,
    /// The latest request failed; the previous result is still current.
    Failed(CompressError),
    /// A newer request was issued meanwhile; nothing changed.
    Stale,
}

/// State of one page: the selected image, the slider value and the single
/// current-result slot.
///
/// Every selection or quality change issues a request with a higher sequence
/// number. Only the completion of the latest request is applied, so a slow
/// compression that finishes after a newer one cannot overwrite it.
#[derive(Debug, Default)]
pub struct Session {
    source: Option<Arc<SourceImage>>,
    quality: QualityFraction,
    result: Option<CompressionResult>,
    latest_seq: u64,
}

impl Session {
    pub fn new(quality: QualityFraction) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    /// Replaces the selected image. The quality is kept as it is.
    pub fn select(&mut self, source: SourceImage) -> Request {
        log::info!(
            "selected {} ({}, {})",
            source.name(),
            source.mime(),
            format_megabytes(source.size())
        );
        let source = Arc::new(source);
        self.source = Some(Arc::clone(&source));
        self.result = None;
        self.issue(source)
    }

    /// Records a new slider value; returns a request once an image is selected.
    pub fn set_quality(&mut self, quality: QualityFraction) -> Option<Request> {
        self.quality = quality;
        let source = self.source.clone()?;
        Some(self.issue(source))
    }

    pub fn complete(
        &mut self,
        seq: u64,
        outcome: Result<CompressionResult, CompressError>,
    ) -> Completion {
        if !self.is_latest(seq) {
            log::debug!("discarding stale result #{} (latest #{})", seq, self.latest_seq);
            return Completion::Stale;
        }
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                Completion::Applied
            }
            Err(err) => {
                log::warn!("compression #{} failed: {}", seq, err);
                Completion::Failed(err)
            }
        }
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    pub fn quality(&self) -> QualityFraction {
        self.quality
    }

    pub fn result(&self) -> Option<&CompressionResult> {
        self.result.as_ref()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Whether `seq` is still the newest request, i.e. its result would apply.
    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    pub fn original_size_label(&self) -> Option<String> {
        self.source().map(|s| format_megabytes(s.size()))
    }

    pub fn result_size_label(&self) -> Option<String> {
        self.result().map(CompressionResult::size_label)
    }

    pub fn download_name(&self) -> Option<String> {
        self.source().map(|s| download_name(s.name()))
    }

    fn issue(&mut self, source: Arc<SourceImage>) -> Request {
        self.latest_seq += 1;
        Request {
            seq: self.latest_seq,
            source,
            quality: self.quality,
        }
    }
}
