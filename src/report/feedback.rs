use crate::{ConditionLabel, ConditionResult, QualityLabel, SharpnessResult};

pub const TIP_CLEARER_PHOTO: &str = "Re-upload a clearer photo for a higher trust score";
pub const TIP_CONDITION_DETAILS: &str = "Add details about product condition in your description";
pub const TIP_WELL_LIT: &str = "Try a well-lit photo with the product centered in frame";

const SECTION_SEPARATOR: &str = "\n\n";

pub struct FeedbackComposer;

impl FeedbackComposer {
    pub fn compose(sharpness: &SharpnessResult, condition: &ConditionResult) -> String {
        let mut sections = vec![
            Self::quality_remark(sharpness.quality_label).to_string(),
            Self::condition_remark(condition),
        ];

        if condition.has_identified_object() {
            sections.push(format!(
                "🔍 **Detected item type:** {}. Make sure your title and category match the actual product.",
                condition.top_prediction.trim()
            ));
        }

        let tips = Self::tips(sharpness, condition);
        if !tips.is_empty() {
            sections.push("💡 **Tips to improve your listing:**".to_string());
            sections.extend(tips.into_iter().map(|tip| format!("  • {tip}")));
        }

        sections.join(SECTION_SEPARATOR)
    }

    fn quality_remark(label: QualityLabel) -> &'static str {
        match label {
            QualityLabel::Sharp => {
                "📸 **Excellent image quality!** Your photo is clear and sharp. \
                 This helps buyers see the product details clearly."
            }
            QualityLabel::Acceptable => {
                "📸 **Acceptable image quality.** The photo is reasonably clear. \
                 For better results, try uploading in natural lighting with a steady hand."
            }
            QualityLabel::Blurry => {
                "⚠️ **Image appears blurry.** We recommend re-uploading a clearer photo. \
                 Tips: Use good lighting, hold your camera steady, and avoid zooming in too much."
            }
            QualityLabel::Unreadable | QualityLabel::Error => {
                "❓ **Could not assess image quality.** Please ensure the image is properly uploaded."
            }
        }
    }

    fn condition_remark(condition: &ConditionResult) -> String {
        let confidence = format_percent(condition.confidence);
        match condition.label {
            ConditionLabel::Good => format!(
                "✅ **Product condition: Good.** The item appears to be in good condition \
                 (confidence: {confidence}). This should attract interested buyers!"
            ),
            ConditionLabel::Moderate => format!(
                "🔶 **Product condition: Moderate.** The item shows some signs of use \
                 (confidence: {confidence}). Consider mentioning any wear or defects \
                 in your description to set accurate buyer expectations."
            ),
            ConditionLabel::Damaged => format!(
                "🔴 **Product condition: Needs attention.** The image suggests the item \
                 may have visible wear or damage (confidence: {confidence}). \
                 Please describe any defects honestly. Transparency builds trust!"
            ),
            ConditionLabel::Unknown => format!(
                "❓ **Condition could not be determined** (confidence: {confidence}). \
                 Please ensure the product is clearly visible in the image."
            ),
        }
    }

    fn tips(sharpness: &SharpnessResult, condition: &ConditionResult) -> Vec<&'static str> {
        let mut tips = Vec::new();

        if sharpness.is_blurry {
            tips.push(TIP_CLEARER_PHOTO);
        }
        if matches!(condition.label, ConditionLabel::Moderate | ConditionLabel::Damaged) {
            tips.push(TIP_CONDITION_DETAILS);
        }
        if condition.confidence < 0.5 {
            tips.push(TIP_WELL_LIT);
        }

        tips
    }
}

fn format_percent(fraction: f64) -> String {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    format!("{:.0}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisKind, VisualFeatures};

    fn sharp() -> SharpnessResult {
        SharpnessResult {
            blur_score: 420.0,
            is_blurry: false,
            quality_label: QualityLabel::Sharp,
        }
    }

    fn good(prediction: &str) -> ConditionResult {
        ConditionResult {
            label: ConditionLabel::Good,
            confidence: 0.87,
            top_prediction: prediction.into(),
            features: Some(VisualFeatures {
                edge_density: 0.1,
                brightness: 140.0,
                saturation: 95.0,
                hue_std: 20.0,
            }),
            kind: AnalysisKind::Primary,
        }
    }

    #[test]
    fn clean_listing_has_no_tips() {
        let text = FeedbackComposer::compose(&sharp(), &good("Backpack"));
        let sections: Vec<&str> = text.split(SECTION_SEPARATOR).collect();

        assert_eq!(sections.len(), 3);
        assert!(sections[0].contains("Excellent image quality"));
        assert!(sections[1].contains("confidence: 87%"));
        assert!(sections[2].contains("Detected item type:** Backpack"));
        assert!(!text.contains("Tips to improve"));
    }

    #[test]
    fn unknown_prediction_is_not_reported() {
        let text = FeedbackComposer::compose(&sharp(), &good("Unknown"));
        assert!(!text.contains("Detected item type"));
    }

    #[test]
    fn tips_follow_their_triggers_in_order() {
        let sharpness = SharpnessResult {
            blur_score: 12.0,
            is_blurry: true,
            quality_label: QualityLabel::Blurry,
        };
        let condition = ConditionResult {
            label: ConditionLabel::Damaged,
            confidence: 0.3,
            top_prediction: "Unknown".into(),
            features: None,
            kind: AnalysisKind::Fallback,
        };

        let text = FeedbackComposer::compose(&sharpness, &condition);

        let clearer = text.find(TIP_CLEARER_PHOTO).unwrap();
        let details = text.find(TIP_CONDITION_DETAILS).unwrap();
        let lit = text.find(TIP_WELL_LIT).unwrap();
        assert!(clearer < details && details < lit);
        assert!(text.contains("Image appears blurry"));
        assert!(text.contains("Needs attention"));
    }

    #[test]
    fn tolerates_both_analyzers_failing() {
        let text = FeedbackComposer::compose(&SharpnessResult::error(), &ConditionResult::failed());

        assert!(text.contains("Could not assess image quality"));
        assert!(text.contains("Condition could not be determined"));
        assert!(text.contains(TIP_CLEARER_PHOTO));
        assert!(text.contains(TIP_WELL_LIT));
        assert!(!text.contains(TIP_CONDITION_DETAILS));
        assert!(!text.contains("Detected item type"));
    }

    #[test]
    fn moderate_condition_asks_for_details() {
        let mut condition = good("Lamp");
        condition.label = ConditionLabel::Moderate;
        condition.confidence = 0.55;

        let text = FeedbackComposer::compose(&sharp(), &condition);
        assert!(text.contains("confidence: 55%"));
        assert!(text.contains(TIP_CONDITION_DETAILS));
        assert!(!text.contains(TIP_WELL_LIT));
    }
}
