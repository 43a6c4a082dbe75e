use std::{path::Path, sync::Arc};

use image::DynamicImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisKind, ConditionLabel, ConditionResult, UNKNOWN_PREDICTION, VisualFeatures,
    analysis::features::FeatureExtractor,
    error::{Result, TrustError},
    image_utils::{load_image, round_to},
    recognition::{Prediction, RecognitionBackbone, humanize_label},
    scoring::tiers::{Bound, TierTable},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackWeights {
    pub brightness: f64,
    pub saturation: f64,
    pub smoothness: f64,
    /// Edge density at and above which the smoothness share is zero.
    pub edge_ceiling: f64,
    pub labels: TierTable<ConditionLabel>,
}

impl Default for FallbackWeights {
    fn default() -> Self {
        Self {
            brightness: 40.0,
            saturation: 40.0,
            smoothness: 20.0,
            edge_ceiling: 0.3,
            labels: TierTable::descending(
                &[(60.0, ConditionLabel::Good), (35.0, ConditionLabel::Moderate)],
                ConditionLabel::Damaged,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionConfig {
    pub canonical_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub brightness_points: TierTable<f64>,
    pub saturation_points: TierTable<f64>,
    pub edge_density_points: TierTable<f64>,
    /// Points per unit of top-1 recognition confidence.
    pub recognition_bonus: f64,
    pub labels: TierTable<ConditionLabel>,
    pub fallback: FallbackWeights,
    pub top_k: usize,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            canonical_size: 224,
            canny_low: 50.0,
            canny_high: 150.0,
            brightness_points: TierTable::new(
                vec![(Bound::Within(80.0, 180.0), 35.0), (Bound::Within(50.0, 200.0), 20.0)],
                5.0,
            ),
            saturation_points: TierTable::descending(&[(80.0, 30.0), (40.0, 20.0)], 5.0),
            // Clean outline scores best; too few edges hints at blur, too many at scratches.
            edge_density_points: TierTable::new(
                vec![(Bound::Within(0.05, 0.25), 25.0), (Bound::Below(0.05), 15.0)],
                5.0,
            ),
            recognition_bonus: 10.0,
            labels: TierTable::descending(
                &[(70.0, ConditionLabel::Good), (45.0, ConditionLabel::Moderate)],
                ConditionLabel::Damaged,
            ),
            fallback: FallbackWeights::default(),
            top_k: 3,
        }
    }
}

impl ConditionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canonical_size < 3 {
            return Err(TrustError::Config(
                "condition canonical_size must be at least 3".into(),
            ));
        }
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return Err(TrustError::Config(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        if !self.fallback.edge_ceiling.is_finite() || self.fallback.edge_ceiling <= 0.0 {
            return Err(TrustError::Config(
                "fallback edge_ceiling must be positive".into(),
            ));
        }
        if self.top_k == 0 {
            return Err(TrustError::Config("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

/// Classifies visible item condition from visual features, optionally nudged by
/// a recognition backbone.
///
/// Degrades in two steps: without a working backbone it scores features alone,
/// and when features cannot be extracted it reports `ConditionLabel::Unknown`.
pub struct ConditionAnalyzer {
    config: ConditionConfig,
    extractor: FeatureExtractor,
    backbone: Option<Arc<dyn RecognitionBackbone>>,
}

impl ConditionAnalyzer {
    pub fn new(config: ConditionConfig) -> Self {
        let extractor = FeatureExtractor::new(config.canonical_size, config.canny_low, config.canny_high);
        Self {
            config,
            extractor,
            backbone: None,
        }
    }

    pub fn with_backbone(mut self, backbone: Arc<dyn RecognitionBackbone>) -> Self {
        self.backbone = Some(backbone);
        self
    }

    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> ConditionResult {
        let path = path.as_ref();
        match load_image(path) {
            Ok(image) => self.analyze_image(&image),
            Err(e) => {
                warn!("Condition: could not read {}: {}", path.display(), e);
                ConditionResult::failed()
            }
        }
    }

    pub fn analyze_image(&self, image: &DynamicImage) -> ConditionResult {
        let features = match self.extractor.extract(image) {
            Ok(features) => features,
            Err(e) => {
                warn!("Condition feature extraction failed: {}", e);
                return ConditionResult::failed();
            }
        };

        debug!(
            "Condition features: edges={} brightness={} saturation={} hue_std={}",
            features.edge_density, features.brightness, features.saturation, features.hue_std
        );

        match self.recognize(image) {
            Ok(prediction) => self.score_primary(features, &prediction),
            Err(TrustError::ModelUnavailable(reason)) => {
                debug!("Recognition unavailable ({}), scoring features only", reason);
                self.score_fallback(features)
            }
            Err(e) => {
                warn!("Recognition failed, scoring features only: {}", e);
                self.score_fallback(features)
            }
        }
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Prediction> {
        let backbone = self
            .backbone
            .as_ref()
            .ok_or_else(|| TrustError::ModelUnavailable("no recognition backbone configured".into()))?;

        let top = backbone
            .classify(image, self.config.top_k)?
            .into_iter()
            .next()
            .ok_or_else(|| TrustError::Inference(format!("{} returned no predictions", backbone.name())))?;

        if !top.confidence.is_finite() {
            return Err(TrustError::Inference(format!(
                "{} returned a non-finite confidence for {}",
                backbone.name(),
                top.label
            )));
        }

        Ok(top)
    }

    pub fn score_primary(&self, features: VisualFeatures, prediction: &Prediction) -> ConditionResult {
        let score = self.config.brightness_points.evaluate(features.brightness)
            + self.config.saturation_points.evaluate(features.saturation)
            + self.config.edge_density_points.evaluate(features.edge_density)
            + prediction.confidence.clamp(0.0, 1.0) * self.config.recognition_bonus;

        debug!("Condition score {:.2} (top prediction {})", score, prediction.label);

        ConditionResult {
            label: self.config.labels.evaluate(score),
            confidence: confidence_from(score),
            top_prediction: humanize_label(&prediction.label),
            features: Some(features),
            kind: AnalysisKind::Primary,
        }
    }

    /// Linear feature-only score on a 0-100 scale.
    pub fn score_fallback(&self, features: VisualFeatures) -> ConditionResult {
        let weights = &self.config.fallback;
        let smoothness = (weights.edge_ceiling - features.edge_density).max(0.0) / weights.edge_ceiling;

        let score = features.brightness / 255.0 * weights.brightness
            + features.saturation / 255.0 * weights.saturation
            + smoothness * weights.smoothness;

        debug!("Fallback condition score {:.2}", score);

        ConditionResult {
            label: weights.labels.evaluate(score),
            confidence: confidence_from(score),
            top_prediction: UNKNOWN_PREDICTION.into(),
            features: Some(features),
            kind: AnalysisKind::Fallback,
        }
    }
}

impl Default for ConditionAnalyzer {
    fn default() -> Self {
        Self::new(ConditionConfig::default())
    }
}

fn confidence_from(score: f64) -> f64 {
    round_to((score / 100.0).clamp(0.0, 1.0), 2)
}
