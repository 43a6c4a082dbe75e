pub mod feedback;

use serde::Serialize;

use crate::{
    AnalysisReport, ConditionLabel,
    scoring::{TrustTier, label_for},
};

#[derive(Serialize)]
pub struct JsonReport {
    pub blur_score: f64,
    pub is_blurry: bool,
    pub condition_label: ConditionLabel,
    pub condition_confidence: f64,
    pub feedback_text: String,
    pub trust_score: u8,
    pub trust_label: &'static str,
    pub trust_tier: TrustTier,
    pub trust_color: &'static str,
    pub trust_icon: &'static str,
}

impl From<&AnalysisReport> for JsonReport {
    fn from(report: &AnalysisReport) -> Self {
        let trust = label_for(report.trust_score);
        Self {
            blur_score: report.blur_score,
            is_blurry: report.is_blurry,
            condition_label: report.condition_label,
            condition_confidence: report.condition_confidence,
            feedback_text: report.feedback_text.clone(),
            trust_score: report.trust_score,
            trust_label: trust.label,
            trust_tier: trust.tier,
            trust_color: trust.tier.color(),
            trust_icon: trust.tier.icon(),
        }
    }
}

impl JsonReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
