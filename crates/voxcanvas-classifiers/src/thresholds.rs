//! Severity → rating threshold tables

use serde::{Deserialize, Serialize};
use voxcanvas_core::{Error, RatingCategory, Result};

/// Text severity at which a prompt becomes `Teen`
pub const TEXT_TEEN_THRESHOLD: f32 = 0.25;
/// Text severity at which a prompt becomes `Mature`
pub const TEXT_MATURE_THRESHOLD: f32 = 0.50;
/// Text severity at which a prompt becomes `Adult`
pub const TEXT_ADULT_THRESHOLD: f32 = 0.75;

/// Image severity at which an image becomes `Teen`
pub const IMAGE_TEEN_THRESHOLD: f32 = 0.20;
/// Image severity at which an image becomes `Mature`
pub const IMAGE_MATURE_THRESHOLD: f32 = 0.45;
/// Image severity at which an image becomes `Adult`
pub const IMAGE_ADULT_THRESHOLD: f32 = 0.70;

/// Maps a normalized severity onto the four rating buckets.
///
/// `severity < teen` is General, `[teen, mature)` Teen, `[mature, adult)`
/// Mature and `severity >= adult` Adult.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub teen: f32,
    pub mature: f32,
    pub adult: f32,
}

impl ThresholdTable {
    /// Calibration for prompt text
    pub const TEXT: ThresholdTable = ThresholdTable {
        teen: TEXT_TEEN_THRESHOLD,
        mature: TEXT_MATURE_THRESHOLD,
        adult: TEXT_ADULT_THRESHOLD,
    };

    /// Calibration for image signals (nudity, gore, graphic violence)
    pub const IMAGE: ThresholdTable = ThresholdTable {
        teen: IMAGE_TEEN_THRESHOLD,
        mature: IMAGE_MATURE_THRESHOLD,
        adult: IMAGE_ADULT_THRESHOLD,
    };

    /// Create a validated table
    pub fn new(teen: f32, mature: f32, adult: f32) -> Result<Self> {
        let table = Self { teen, mature, adult };
        table.validate()?;
        Ok(table)
    }

    /// Thresholds must be strictly increasing within (0, 1]
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 < self.teen && self.teen < self.mature && self.mature < self.adult;
        if !ordered || self.adult > 1.0 {
            return Err(Error::config(format!(
                "thresholds must satisfy 0 < teen < mature < adult <= 1, got {}/{}/{}",
                self.teen, self.mature, self.adult
            )));
        }
        Ok(())
    }

    /// Bucket a severity. Out-of-range input is clamped; NaN rates as Adult.
    pub fn categorize(&self, severity: f32) -> RatingCategory {
        if severity.is_nan() {
            return RatingCategory::Adult;
        }
        let severity = severity.clamp(0.0, 1.0);

        if severity >= self.adult {
            RatingCategory::Adult
        } else if severity >= self.mature {
            RatingCategory::Mature
        } else if severity >= self.teen {
            RatingCategory::Teen
        } else {
            RatingCategory::General
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_buckets() {
        let table = ThresholdTable::TEXT;
        assert_eq!(table.categorize(0.0), RatingCategory::General);
        assert_eq!(table.categorize(0.2499), RatingCategory::General);
        assert_eq!(table.categorize(0.25), RatingCategory::Teen);
        assert_eq!(table.categorize(0.49), RatingCategory::Teen);
        assert_eq!(table.categorize(0.50), RatingCategory::Mature);
        assert_eq!(table.categorize(0.75), RatingCategory::Adult);
        assert_eq!(table.categorize(1.0), RatingCategory::Adult);
    }

    #[test]
    fn test_image_buckets_are_stricter() {
        assert_eq!(ThresholdTable::IMAGE.categorize(0.45), RatingCategory::Mature);
        assert_eq!(ThresholdTable::TEXT.categorize(0.45), RatingCategory::Teen);
    }

    #[test]
    fn test_out_of_range_severity() {
        let table = ThresholdTable::TEXT;
        assert_eq!(table.categorize(-3.0), RatingCategory::General);
        assert_eq!(table.categorize(7.0), RatingCategory::Adult);
        assert_eq!(table.categorize(f32::NAN), RatingCategory::Adult);
    }

    #[test]
    fn test_builtin_tables_valid() {
        assert!(ThresholdTable::TEXT.validate().is_ok());
        assert!(ThresholdTable::IMAGE.validate().is_ok());
    }

    #[test]
    fn test_invalid_tables() {
        assert!(ThresholdTable::new(0.5, 0.5, 0.9).is_err());
        assert!(ThresholdTable::new(0.0, 0.5, 0.9).is_err());
        assert!(ThresholdTable::new(0.2, 0.5, 1.2).is_err());
        assert!(ThresholdTable::new(0.6, 0.5, 0.9).is_err());
    }

    #[test]
    fn test_monotone() {
        let table = ThresholdTable::TEXT;
        let mut previous = RatingCategory::General;
        for step in 0..=100 {
            let category = table.categorize(step as f32 / 100.0);
            assert!(category >= previous);
            previous = category;
        }
    }
}
