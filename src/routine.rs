use std::future::Future;

use image::GenericImageView;

use crate::codec;
use crate::error::CompressResult;
use crate::quality::QualityFraction;

/// Per-step quality and resolution multiplier of the size-fitting search.
const STEP_FACTOR: f64 = 0.95;

/// Settings handed to a [`CompressionRoutine`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineOptions {
    /// Upper bound hint for the output size. Not a guarantee.
    pub max_size_bytes: u64,
    /// Longer side cap applied before any encoding.
    pub max_dimension: u32,
    /// Highest quality the search may use.
    pub quality: QualityFraction,
    /// Where the size-fitting search starts, if not above `quality`.
    pub initial_quality: QualityFraction,
    /// Upper bound on encode attempts.
    pub max_iterations: u32,
    /// When set, the search only lowers encoder quality, never geometry.
    pub keep_resolution: bool,
}

/// The primary compression stage: `(bytes, options) -> bytes`, fallible and
/// asynchronous. No cancellation.
pub trait CompressionRoutine {
    fn compress(
        &self,
        source: &[u8],
        options: &RoutineOptions,
    ) -> impl Future<Output = CompressResult<Vec<u8>>>;
}

/// Default routine built on the `image` crate's JPEG encoder.
///
/// Encodes at `initial_quality` (capped by `quality`), then keeps lowering the
/// quality until the output fits `max_size_bytes` or `max_iterations` encodes
/// have been spent. Every encode uses a lower encoder quality than the one
/// before, so no attempt repeats an earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegSearchRoutine;

/// Outcome of one size-fitting search.
struct Search {
    output: Vec<u8>,
    /// Encoder quality of each attempt, in order.
    qualities: Vec<u8>,
}

impl JpegSearchRoutine {
    pub fn run(&self, source: &[u8], options: &RoutineOptions) -> CompressResult<Vec<u8>> {
        Ok(self.search(source, options)?.output)
    }

    fn search(&self, source: &[u8], options: &RoutineOptions) -> CompressResult<Search> {
        let mut img = codec::cap_dimensions(codec::decode(source)?, options.max_dimension);
        let mut fraction = if options.initial_quality > options.quality {
            options.quality
        } else {
            options.initial_quality
        };
        let mut encoder_quality = fraction.encoder_quality();
        let mut output = codec::encode_jpeg(&img, encoder_quality)?;
        let mut qualities = vec![encoder_quality];

        while (output.len() as u64) > options.max_size_bytes
            && (qualities.len() as u32) < options.max_iterations
        {
            if options.keep_resolution && encoder_quality <= 1 {
                break;
            }
            fraction = fraction.scaled(STEP_FACTOR);
            encoder_quality = next_encoder_quality(encoder_quality, fraction);
            if !options.keep_resolution {
                img = codec::shrink(&img, STEP_FACTOR);
            }
            output = codec::encode_jpeg(&img, encoder_quality)?;
            qualities.push(encoder_quality);
        }

        let (w, h) = img.dimensions();
        log::debug!(
            "routine: {} iteration(s), {}x{}, q={}, {} -> {} bytes (target {})",
            qualities.len(),
            w,
            h,
            encoder_quality,
            source.len(),
            output.len(),
            options.max_size_bytes
        );
        Ok(Search { output, qualities })
    }
}

/// Follows the stepped fraction but always goes at least one below `previous`,
/// never under 1.
fn next_encoder_quality(previous: u8, fraction: QualityFraction) -> u8 {
    fraction
        .encoder_quality()
        .min(previous.saturating_sub(1))
        .max(1)
}

impl CompressionRoutine for JpegSearchRoutine {
    async fn compress(&self, source: &[u8], options: &RoutineOptions) -> CompressResult<Vec<u8>> {
        self.run(source, options)
    }
}
