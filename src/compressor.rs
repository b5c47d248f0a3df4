use std::str::FromStr;

use crate::error::{CompressError, CompressResult};
use crate::quality::QualityFraction;
use crate::reencode::{CanvasReencoder, Reencoder};
use crate::result::{CompressionResult, Stage};
use crate::routine::{CompressionRoutine, JpegSearchRoutine, RoutineOptions};
use crate::source::SourceImage;

pub const DEFAULT_MAX_DIMENSION: u32 = 2048;
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;
pub const DEFAULT_FALLBACK_FACTOR: f64 = 0.9;

/// What to do with the primary output once the fallback has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Keep whichever candidate is smaller; the primary output wins ties.
    #[default]
    KeepSmaller,
    /// The fallback output replaces the primary one unconditionally.
    AlwaysReplace,
}

impl FromStr for FallbackPolicy {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-smaller" => Ok(FallbackPolicy::KeepSmaller),
            "always-replace" => Ok(FallbackPolicy::AlwaysReplace),
            other => Err(CompressError::UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressorOptions {
    pub max_dimension: u32,
    pub max_iterations: u32,
    pub keep_resolution: bool,
    /// Multiplier applied to the quality for the fallback pass.
    pub fallback_factor: f64,
    pub policy: FallbackPolicy,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            keep_resolution: true,
            fallback_factor: DEFAULT_FALLBACK_FACTOR,
            policy: FallbackPolicy::default(),
        }
    }
}

/// Two-stage image compressor.
///
/// Stage 1 hands the source to the compression routine with a size target of
/// `source.size * quality`. If the output does not come in under that
/// threshold, stage 2 decodes the original and re-encodes it at
/// `quality * fallback_factor`. At maximum quality the source is returned
/// untouched.
pub struct Compressor<R = JpegSearchRoutine, E = CanvasReencoder> {
    routine: R,
    reencoder: E,
    options: CompressorOptions,
}

pub type DefaultCompressor = Compressor<JpegSearchRoutine, CanvasReencoder>;

impl Default for DefaultCompressor {
    fn default() -> Self {
        Self::new(JpegSearchRoutine, CanvasReencoder, CompressorOptions::default())
    }
}

impl<R, E> Compressor<R, E>
where
    R: CompressionRoutine,
    E: Reencoder,
{
    pub fn new(routine: R, reencoder: E, options: CompressorOptions) -> Self {
        Self {
            routine,
            reencoder,
            options,
        }
    }

    pub fn options(&self) -> &CompressorOptions {
        &self.options
    }

    /// Options passed to the routine for a given source and quality.
    pub fn routine_options(&self, source: &SourceImage, quality: QualityFraction) -> RoutineOptions {
        RoutineOptions {
            max_size_bytes: target_size(source, quality) as u64,
            max_dimension: self.options.max_dimension,
            quality,
            initial_quality: quality,
            max_iterations: self.options.max_iterations,
            keep_resolution: self.options.keep_resolution,
        }
    }

    pub async fn compress(
        &self,
        source: &SourceImage,
        quality: QualityFraction,
    ) -> CompressResult<CompressionResult> {
        if quality.is_identity() {
            log::debug!("{}: quality at maximum, keeping original", source.name());
            return Ok(CompressionResult::identity(source));
        }
        if source.is_empty() {
            return Err(CompressError::EmptySource);
        }

        let options = self.routine_options(source, quality);
        let primary = self.routine.compress(source.bytes(), &options).await?;
        let threshold = target_size(source, quality);

        if (primary.len() as f64) < threshold {
            log::info!(
                "{}: {} -> {} bytes (primary)",
                source.name(),
                source.size(),
                primary.len()
            );
            return Ok(CompressionResult::jpeg(primary, Stage::Primary));
        }

        let fallback_quality = quality.scaled(self.options.fallback_factor);
        log::debug!(
            "{}: primary output {} bytes >= {:.0} threshold, re-encoding at q={}",
            source.name(),
            primary.len(),
            threshold,
            fallback_quality.encoder_quality()
        );
        let fallback = self
            .reencoder
            .reencode(source.bytes(), fallback_quality, self.options.max_dimension)
            .await?;

        let result = match self.options.policy {
            FallbackPolicy::AlwaysReplace => CompressionResult::jpeg(fallback, Stage::Fallback),
            FallbackPolicy::KeepSmaller if fallback.len() < primary.len() => {
                CompressionResult::jpeg(fallback, Stage::Fallback)
            }
            FallbackPolicy::KeepSmaller => CompressionResult::jpeg(primary, Stage::Primary),
        };
        log::info!(
            "{}: {} -> {} bytes ({})",
            source.name(),
            source.size(),
            result.size(),
            result.stage()
        );
        Ok(result)
    }
}

/// Proportional size target: `source.size * quality`, in bytes.
fn target_size(source: &SourceImage, quality: QualityFraction) -> f64 {
    source.size() as f64 * quality.value()
}
