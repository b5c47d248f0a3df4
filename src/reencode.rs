use std::future::Future;

use crate::codec;
use crate::error::CompressResult;
use crate::quality::QualityFraction;

/// The fallback stage: decode the original and re-encode it as a lossy JPEG.
pub trait Reencoder {
    fn reencode(
        &self,
        source: &[u8],
        quality: QualityFraction,
        max_dimension: u32,
    ) -> impl Future<Output = CompressResult<Vec<u8>>>;
}

/// Draws the decoded image onto a plain RGB surface and exports it as JPEG,
/// like a canvas `toDataURL("image/jpeg", q)` round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasReencoder;

impl CanvasReencoder {
    pub fn run(
        &self,
        source: &[u8],
        quality: QualityFraction,
        max_dimension: u32,
    ) -> CompressResult<Vec<u8>> {
        let surface = codec::cap_dimensions(codec::decode(source)?, max_dimension);
        let output = codec::encode_jpeg(&surface, quality.encoder_quality())?;
        log::debug!(
            "re-encode: JPEG(q={}) {}x{}, {} bytes",
            quality.encoder_quality(),
            surface.width(),
            surface.height(),
            output.len()
        );
        Ok(output)
    }
}

impl Reencoder for CanvasReencoder {
    async fn reencode(
        &self,
        source: &[u8],
        quality: QualityFraction,
        max_dimension: u32,
    ) -> CompressResult<Vec<u8>> {
        self.run(source, quality, max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_reencode_keeps_natural_size() {
        let png = png_bytes(&DynamicImage::new_rgba8(320, 200));
        let out = CanvasReencoder
            .run(&png, QualityFraction::from_percent(45), 2048)
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (320, 200));
        assert_eq!(&out[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_reencode_caps_large_surfaces() {
        let png = png_bytes(&DynamicImage::new_rgb8(1200, 4800));
        let out = CanvasReencoder
            .run(&png, QualityFraction::from_percent(45), 2048)
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (512, 2048));
    }

    #[test]
    fn test_reencode_rejects_garbage() {
        let err = CanvasReencoder.run(b"\x00\x01", QualityFraction::from_percent(50), 2048);
        assert!(err.is_err());
    }
}
