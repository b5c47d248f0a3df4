use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::{CompressError, CompressResult};

pub fn decode(bytes: &[u8]) -> CompressResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(CompressError::EmptySource);
    }
    image::load_from_memory(bytes).map_err(CompressError::Decode)
}

/// Shrinks the image so its longer side is at most `max_dim`, keeping the
/// aspect ratio. Smaller images are returned as-is.
pub fn cap_dimensions(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_dim && h <= max_dim {
        return img;
    }
    let resized = img.resize(max_dim, max_dim, FilterType::Lanczos3);
    log::debug!(
        "resize {}x{} -> {}x{}",
        w,
        h,
        resized.width(),
        resized.height()
    );
    resized
}

/// Scales both sides by `factor`, never below one pixel.
pub fn shrink(img: &DynamicImage, factor: f64) -> DynamicImage {
    let (w, h) = img.dimensions();
    let new_w = ((f64::from(w) * factor).round() as u32).max(1);
    let new_h = ((f64::from(h) * factor).round() as u32).max(1);
    img.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Baseline JPEG at the given quality (1-100). Alpha is dropped, the same
/// way a canvas JPEG export drops it.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> CompressResult<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder).map_err(CompressError::Encode)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        assert!(matches!(decode(&[]), Err(CompressError::EmptySource)));
        assert!(matches!(decode(b"not an image"), Err(CompressError::Decode(_))));
    }

    #[test]
    fn test_cap_dimensions_landscape() {
        let img = DynamicImage::new_rgb8(4096, 1024);
        let capped = cap_dimensions(img, 2048);
        assert_eq!(capped.dimensions(), (2048, 512));
    }

    #[test]
    fn test_cap_dimensions_leaves_small_images() {
        let img = DynamicImage::new_rgb8(300, 200);
        let capped = cap_dimensions(img, 2048);
        assert_eq!(capped.dimensions(), (300, 200));
    }

    #[test]
    fn test_shrink_never_hits_zero() {
        let img = DynamicImage::new_rgb8(1, 3);
        let small = shrink(&img, 0.1);
        assert_eq!(small.dimensions(), (1, 1));
    }

    #[test]
    fn test_encode_jpeg_magic() {
        let img = DynamicImage::new_rgba8(16, 16);
        let data = encode_jpeg(&img, 80).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
        let decoded = decode(&data).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
    }
}
