pub mod codec;
pub mod compressor;
pub mod error;
pub mod quality;
pub mod reencode;
pub mod result;
pub mod routine;
pub mod session;
pub mod source;
pub mod web;

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;

pub use compressor::{Compressor, CompressorOptions, DefaultCompressor, FallbackPolicy};
pub use error::{CompressError, CompressResult};
pub use quality::QualityFraction;
pub use result::{download_name, format_megabytes, CompressionResult, Stage};
pub use session::{Completion, Request, Session};
pub use source::{accepts_drop, SourceImage};

/// One-shot compression for pages that do not need a session.
#[wasm_bindgen(js_name = compressImage)]
pub async fn compress_image(
    input: Vec<u8>,
    mime: String,
    quality_percent: u8,
) -> Result<Uint8Array, JsError> {
    console_error_panic_hook::set_once();
    let source = SourceImage::new("image", mime, input);
    let quality = QualityFraction::from_percent(quality_percent);
    let result = DefaultCompressor::default()
        .compress(&source, quality)
        .await
        .map_err(|e| JsError::new(&format!("Failed to compress image: {}", e)))?;
    Ok(Uint8Array::from(result.bytes()))
}
