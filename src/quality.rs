use crate::error::{CompressError, CompressResult};

/// Normalized compression quality. `1.0` means "keep the original".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct QualityFraction(f64);

impl QualityFraction {
    pub const MAX: QualityFraction = QualityFraction(1.0);

    pub fn new(value: f64) -> CompressResult<Self> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(CompressError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    /// Slider percentage (0-100). Anything above 100 is treated as 100.
    pub fn from_percent(percent: u8) -> Self {
        Self(f64::from(percent.min(100)) / 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 >= 1.0
    }

    /// Scales the fraction down, e.g. `0.9` for the fallback pass.
    pub fn scaled(self, factor: f64) -> Self {
        Self((self.0 * factor).clamp(0.0, 1.0))
    }

    /// JPEG encoder quality (1-100). The encoder rejects 0, so it maps to 1.
    pub fn encoder_quality(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for QualityFraction {
    fn default() -> Self {
        Self::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_percent_normalizes() {
        assert_eq!(QualityFraction::from_percent(80).value(), 0.8);
        assert_eq!(QualityFraction::from_percent(0).value(), 0.0);
        assert!(QualityFraction::from_percent(100).is_identity());
        assert!(QualityFraction::from_percent(250).is_identity());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(QualityFraction::new(0.5).is_ok());
        assert!(matches!(
            QualityFraction::new(1.5),
            Err(CompressError::InvalidQuality(_))
        ));
        assert!(QualityFraction::new(-0.1).is_err());
        assert!(QualityFraction::new(f64::NAN).is_err());
    }

    #[test]
    fn test_encoder_quality_bounds() {
        assert_eq!(QualityFraction::from_percent(0).encoder_quality(), 1);
        assert_eq!(QualityFraction::from_percent(45).encoder_quality(), 45);
        assert_eq!(QualityFraction::MAX.encoder_quality(), 100);
    }

    #[test]
    fn test_scaled_for_fallback() {
        let q = QualityFraction::from_percent(50).scaled(0.9);
        assert!((q.value() - 0.45).abs() < 1e-9);
        assert_eq!(q.encoder_quality(), 45);
    }
}
