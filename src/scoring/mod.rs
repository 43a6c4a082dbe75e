pub mod description;
pub mod tiers;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    ConditionLabel, ConditionResult, SharpnessResult,
    error::{Result, TrustError},
};

pub use description::evaluate_description;
use tiers::TierTable;

/// Share of each sub-score in the composite. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustWeights {
    pub image_quality: f64,
    pub condition: f64,
    pub description: f64,
}

impl TrustWeights {
    pub const DEFAULT: Self = Self {
        image_quality: 0.40,
        condition: 0.40,
        description: 0.20,
    };

    pub fn new(image_quality: f64, condition: f64, description: f64) -> Result<Self> {
        let weights = Self {
            image_quality,
            condition,
            description,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        let parts = [self.image_quality, self.condition, self.description];

        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(TrustError::InvalidParameter(format!(
                "trust weights must be non-negative, got {parts:?}"
            )));
        }

        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(TrustError::InvalidParameter(format!(
                "trust weights must sum to 1.0, got {sum}"
            )));
        }

        Ok(())
    }
}

impl Default for TrustWeights {
    fn default() -> Self {
        debug_assert!(Self::DEFAULT.validate().is_ok());
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionBaseScores {
    pub good: f64,
    pub moderate: f64,
    pub damaged: f64,
    pub unknown: f64,
}

impl Default for ConditionBaseScores {
    fn default() -> Self {
        Self {
            good: 90.0,
            moderate: 60.0,
            damaged: 30.0,
            unknown: 20.0,
        }
    }
}

impl ConditionBaseScores {
    pub fn for_label(&self, label: ConditionLabel) -> f64 {
        match label {
            ConditionLabel::Good => self.good,
            ConditionLabel::Moderate => self.moderate,
            ConditionLabel::Damaged => self.damaged,
            ConditionLabel::Unknown => self.unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub weights: TrustWeights,
    pub blurry_cap: f64,
    /// Variance at which a blurry photo would reach `blurry_cap`.
    pub blurry_scale: f64,
    pub sharp_floor: f64,
    /// Variance at which a sharp photo reaches 100.
    pub variance_ceiling: f64,
    pub condition_base: ConditionBaseScores,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            weights: TrustWeights::default(),
            blurry_cap: 40.0,
            blurry_scale: 100.0,
            sharp_floor: 60.0,
            variance_ceiling: 1000.0,
            condition_base: ConditionBaseScores::default(),
        }
    }
}

impl TrustConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights
            .validate()
            .map_err(|e| TrustError::Config(e.to_string()))?;

        for (name, value) in [
            ("blurry_scale", self.blurry_scale),
            ("variance_ceiling", self.variance_ceiling),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TrustError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        for (name, value) in [
            ("blurry_cap", self.blurry_cap),
            ("sharp_floor", self.sharp_floor),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(TrustError::Config(format!(
                    "{name} must lie within [0, 100], got {value}"
                )));
            }
        }

        Ok(())
    }
}

pub struct TrustScorer {
    config: TrustConfig,
}

impl TrustScorer {
    pub fn new(config: TrustConfig) -> Self {
        Self { config }
    }

    pub fn image_quality_score(&self, sharpness: &SharpnessResult) -> f64 {
        let c = &self.config;
        let blur_score = sharpness.blur_score.max(0.0);

        let score = if sharpness.is_blurry {
            (blur_score / c.blurry_scale * c.blurry_cap).min(c.blurry_cap)
        } else {
            let normalized = blur_score.min(c.variance_ceiling) / c.variance_ceiling;
            c.sharp_floor + normalized * (100.0 - c.sharp_floor)
        };

        clamp_score(score)
    }

    pub fn condition_score(&self, condition: &ConditionResult) -> f64 {
        let base = self.config.condition_base.for_label(condition.label);
        clamp_score(base * condition.confidence.clamp(0.0, 1.0))
    }

    pub fn description_score(&self, description: &str) -> f64 {
        evaluate_description(description) as f64
    }

    pub fn score(&self, sharpness: &SharpnessResult, condition: &ConditionResult, description: &str) -> u8 {
        let w = &self.config.weights;
        let composite = self.image_quality_score(sharpness) * w.image_quality
            + self.condition_score(condition) * w.condition
            + self.description_score(description) * w.description;

        clamp_score(composite.round_ties_even()) as u8
    }
}

impl Default for TrustScorer {
    fn default() -> Self {
        Self::new(TrustConfig::default())
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustTier {
    HighlyTrusted,
    Trusted,
    Moderate,
    Low,
}

impl TrustTier {
    pub fn label(&self) -> &'static str {
        match self {
            TrustTier::HighlyTrusted => "Highly Trusted",
            TrustTier::Trusted => "Trusted",
            TrustTier::Moderate => "Moderate Trust",
            TrustTier::Low => "Low Trust",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TrustTier::HighlyTrusted => "success",
            TrustTier::Trusted => "primary",
            TrustTier::Moderate => "warning",
            TrustTier::Low => "danger",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TrustTier::HighlyTrusted => "🟢",
            TrustTier::Trusted => "🔵",
            TrustTier::Moderate => "🟡",
            TrustTier::Low => "🔴",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrustLabel {
    pub label: &'static str,
    pub tier: TrustTier,
}

static TRUST_TIERS: Lazy<TierTable<TrustTier>> = Lazy::new(|| {
    TierTable::descending(
        &[
            (80.0, TrustTier::HighlyTrusted),
            (60.0, TrustTier::Trusted),
            (40.0, TrustTier::Moderate),
        ],
        TrustTier::Low,
    )
});

pub fn label_for(trust_score: u8) -> TrustLabel {
    let tier = TRUST_TIERS.evaluate(trust_score as f64);
    TrustLabel {
        label: tier.label(),
        tier,
    }
}
