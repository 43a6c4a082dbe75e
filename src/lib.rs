use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use image::DynamicImage;
use log::{debug, warn};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{
        condition::{ConditionAnalyzer, ConditionConfig},
        sharpness::{SharpnessAnalyzer, SharpnessConfig},
    },
    error::{Result, TrustError},
    image_utils::{decode_image, load_image},
    recognition::RecognitionBackbone,
    report::feedback::FeedbackComposer,
    scoring::{TrustConfig, TrustScorer},
};

pub mod analysis;
pub mod error;
pub mod image_utils;
pub mod recognition;
pub mod report;
pub mod scoring;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sharpness: SharpnessConfig,
    pub condition: ConditionConfig,
    pub trust: TrustConfig,
    pub max_concurrent_inference: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sharpness: SharpnessConfig::default(),
            condition: ConditionConfig::default(),
            trust: TrustConfig::default(),
            max_concurrent_inference: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TrustError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.sharpness.validate()?;
        self.condition.validate()?;
        self.trust.validate()?;

        if self.max_concurrent_inference == 0 {
            return Err(TrustError::Config(
                "max_concurrent_inference must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityLabel {
    Sharp,
    Acceptable,
    Blurry,
    Unreadable,
    Error,
}

impl QualityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Sharp => "Sharp",
            QualityLabel::Acceptable => "Acceptable",
            QualityLabel::Blurry => "Blurry",
            QualityLabel::Unreadable => "Unreadable",
            QualityLabel::Error => "Error",
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharpnessResult {
    pub blur_score: f64,
    pub is_blurry: bool,
    pub quality_label: QualityLabel,
}

impl SharpnessResult {
    pub fn unreadable() -> Self {
        Self {
            blur_score: 0.0,
            is_blurry: true,
            quality_label: QualityLabel::Unreadable,
        }
    }

    pub fn error() -> Self {
        Self {
            blur_score: 0.0,
            is_blurry: true,
            quality_label: QualityLabel::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionLabel {
    Good,
    Moderate,
    Damaged,
    Unknown,
}

impl ConditionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionLabel::Good => "Good",
            ConditionLabel::Moderate => "Moderate",
            ConditionLabel::Damaged => "Damaged",
            ConditionLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the condition pipeline actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    Primary,
    Fallback,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualFeatures {
    pub edge_density: f64,
    pub brightness: f64,
    pub saturation: f64,
    pub hue_std: f64,
}

pub const UNKNOWN_PREDICTION: &str = "Unknown";
pub const ERROR_PREDICTION: &str = "Error";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionResult {
    pub label: ConditionLabel,
    pub confidence: f64,
    pub top_prediction: String,
    pub features: Option<VisualFeatures>,
    pub kind: AnalysisKind,
}

impl ConditionResult {
    pub fn failed() -> Self {
        Self {
            label: ConditionLabel::Unknown,
            confidence: 0.0,
            top_prediction: ERROR_PREDICTION.into(),
            features: None,
            kind: AnalysisKind::Failed,
        }
    }

    pub fn has_identified_object(&self) -> bool {
        let prediction = self.top_prediction.trim();
        !prediction.is_empty() && prediction != UNKNOWN_PREDICTION && prediction != ERROR_PREDICTION
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub blur_score: f64,
    pub is_blurry: bool,
    pub condition_label: ConditionLabel,
    pub condition_confidence: f64,
    pub feedback_text: String,
    pub trust_score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailedAnalysis {
    pub sharpness: SharpnessResult,
    pub condition: ConditionResult,
    pub report: AnalysisReport,
}

#[derive(Debug, Clone)]
pub struct ListingInput {
    pub image_path: PathBuf,
    pub description: String,
}

impl ListingInput {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(image_path: P, description: S) -> Self {
        Self {
            image_path: image_path.into(),
            description: description.into(),
        }
    }
}

pub struct ListingAnalyzer {
    config: AnalysisConfig,
    sharpness: SharpnessAnalyzer,
    condition: ConditionAnalyzer,
    scorer: TrustScorer,
}

impl ListingAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            sharpness: SharpnessAnalyzer::new(config.sharpness.clone()),
            condition: ConditionAnalyzer::new(config.condition.clone()),
            scorer: TrustScorer::new(config.trust.clone()),
            config,
        }
    }

    pub fn with_backbone(mut self, backbone: Arc<dyn RecognitionBackbone>) -> Self {
        self.condition = self.condition.with_backbone(backbone);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze<P: AsRef<Path>>(&self, path: P, description: &str) -> AnalysisReport {
        self.analyze_detailed(path, description).report
    }

    pub fn analyze_bytes(&self, bytes: &[u8], description: &str) -> AnalysisReport {
        match decode_image(bytes) {
            Ok(image) => self.analyze_image(&image, description).report,
            Err(e) => {
                warn!("Could not decode image buffer ({} bytes): {}", bytes.len(), e);
                self.unreadable(description).report
            }
        }
    }

    pub fn analyze_detailed<P: AsRef<Path>>(&self, path: P, description: &str) -> DetailedAnalysis {
        let path = path.as_ref();
        match load_image(path) {
            Ok(image) => self.analyze_image(&image, description),
            Err(e) => {
                warn!("Could not read image {}: {}", path.display(), e);
                self.unreadable(description)
            }
        }
    }

    pub fn analyze_image(&self, image: &DynamicImage, description: &str) -> DetailedAnalysis {
        let sharpness = self.sharpness.analyze_image(image);
        let condition = self.condition.analyze_image(image);
        self.assemble(sharpness, condition, description)
    }

    /// Analyses every input on a pool no wider than `max_concurrent_inference`.
    /// Reports come back in input order.
    pub fn analyze_batch(&self, inputs: &[ListingInput]) -> Vec<AnalysisReport> {
        let run = || -> Vec<AnalysisReport> {
            inputs
                .par_iter()
                .map(|input| self.analyze(&input.image_path, &input.description))
                .collect()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrent_inference.max(1))
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("Could not build analysis pool, running sequentially: {}", e);
                inputs
                    .iter()
                    .map(|input| self.analyze(&input.image_path, &input.description))
                    .collect()
            }
        }
    }

    fn unreadable(&self, description: &str) -> DetailedAnalysis {
        self.assemble(SharpnessResult::unreadable(), ConditionResult::failed(), description)
    }

    fn assemble(
        &self,
        sharpness: SharpnessResult,
        condition: ConditionResult,
        description: &str,
    ) -> DetailedAnalysis {
        let trust_score = self.scorer.score(&sharpness, &condition, description);
        let feedback_text = FeedbackComposer::compose(&sharpness, &condition);

        debug!(
            "Listing analysed: quality={} condition={} ({:?}) trust={}",
            sharpness.quality_label, condition.label, condition.kind, trust_score
        );

        let report = AnalysisReport {
            blur_score: sharpness.blur_score,
            is_blurry: sharpness.is_blurry,
            condition_label: condition.label,
            condition_confidence: condition.confidence,
            feedback_text,
            trust_score,
        };

        DetailedAnalysis {
            sharpness,
            condition,
            report,
        }
    }
}

impl Default for ListingAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
