use std::path::Path;

use image::DynamicImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    QualityLabel, SharpnessResult,
    error::{Result, TrustError},
    image_utils::{ensure_not_empty, laplacian_variance, load_image, resize_gray, rgb_to_gray, round_to},
    scoring::tiers::TierTable,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpnessConfig {
    /// Laplacian variance below this is blurry.
    pub threshold: f64,
    pub sharp_multiplier: f64,
    pub canonical_size: u32,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            sharp_multiplier: 1.5,
            canonical_size: 500,
        }
    }
}

impl SharpnessConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(TrustError::Config(format!(
                "sharpness threshold must be positive, got {}",
                self.threshold
            )));
        }
        if !self.sharp_multiplier.is_finite() || self.sharp_multiplier < 1.0 {
            return Err(TrustError::Config(format!(
                "sharp_multiplier must be at least 1.0, got {}",
                self.sharp_multiplier
            )));
        }
        if self.canonical_size < 3 {
            return Err(TrustError::Config(
                "sharpness canonical_size must be at least 3".into(),
            ));
        }
        Ok(())
    }
}

pub struct SharpnessAnalyzer {
    config: SharpnessConfig,
    quality_tiers: TierTable<QualityLabel>,
}

impl SharpnessAnalyzer {
    pub fn new(config: SharpnessConfig) -> Self {
        let quality_tiers = TierTable::descending(
            &[
                (config.threshold * config.sharp_multiplier, QualityLabel::Sharp),
                (config.threshold, QualityLabel::Acceptable),
            ],
            QualityLabel::Blurry,
        );

        Self {
            config,
            quality_tiers,
        }
    }

    pub fn with_threshold(self, threshold: f64) -> Self {
        Self::new(SharpnessConfig {
            threshold,
            ..self.config
        })
    }

    /// Never fails: unreadable files map to `QualityLabel::Unreadable`.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> SharpnessResult {
        let path = path.as_ref();
        match load_image(path) {
            Ok(image) => self.analyze_image(&image),
            Err(e) => {
                warn!("Sharpness: could not read {}: {}", path.display(), e);
                SharpnessResult::unreadable()
            }
        }
    }

    pub fn analyze_image(&self, image: &DynamicImage) -> SharpnessResult {
        match self.measure(image) {
            Ok(variance) => self.classify(variance),
            Err(e) => {
                warn!("Sharpness measurement failed: {}", e);
                SharpnessResult::error()
            }
        }
    }

    pub fn measure(&self, image: &DynamicImage) -> Result<f64> {
        ensure_not_empty(image)?;
        if self.config.canonical_size < 3 {
            return Err(TrustError::Config(format!(
                "sharpness canonical_size must be at least 3, got {}",
                self.config.canonical_size
            )));
        }

        let gray = rgb_to_gray(&image.to_rgb8());
        let resized = resize_gray(&gray, self.config.canonical_size);
        let variance = laplacian_variance(&resized)?;

        debug!(
            "Laplacian variance {:.2} at {}x{}",
            variance, self.config.canonical_size, self.config.canonical_size
        );

        Ok(variance)
    }

    pub fn classify(&self, variance: f64) -> SharpnessResult {
        SharpnessResult {
            blur_score: round_to(variance.max(0.0), 2),
            is_blurry: variance < self.config.threshold,
            quality_label: self.quality_tiers.evaluate(variance),
        }
    }
}

impl Default for SharpnessAnalyzer {
    fn default() -> Self {
        Self::new(SharpnessConfig::default())
    }
}
