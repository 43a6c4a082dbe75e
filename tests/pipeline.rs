use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use image::{DynamicImage, Rgb, RgbImage};
use listing_trust::{
    AnalysisConfig, AnalysisKind, ConditionLabel, ListingAnalyzer, ListingInput, QualityLabel,
    error::TrustError,
    recognition::{LazyBackbone, Prediction, RecognitionBackbone},
    report::JsonReport,
    scoring::{TrustScorer, evaluate_description, label_for},
};
use tempfile::TempDir;

fn solid(width: u32, height: u32, colour: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
}

fn textured(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let v = ((x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) ^ (x * y)) % 256;
        Rgb([v as u8, (255 - v) as u8, ((v * 3) % 256) as u8])
    }))
}

fn write(dir: &TempDir, name: &str, image: &DynamicImage) -> PathBuf {
    let path = dir.path().join(name);
    image.save(&path).unwrap();
    path
}

struct Labeller;

impl RecognitionBackbone for Labeller {
    fn name(&self) -> &str {
        "labeller"
    }

    fn input_size(&self) -> u32 {
        224
    }

    fn classify(&self, _image: &DynamicImage, _top_k: usize) -> listing_trust::error::Result<Vec<Prediction>> {
        Ok(vec![Prediction {
            label: "backpack".into(),
            confidence: 0.64,
        }])
    }
}

#[test]
fn solid_colour_with_no_description_scores_low() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "solid.png", &solid(200, 200, [180, 60, 30]));

    let analyzer = ListingAnalyzer::default();
    let detailed = analyzer.analyze_detailed(&path, "");

    assert_eq!(detailed.sharpness.quality_label, QualityLabel::Blurry);
    assert!(detailed.report.is_blurry);
    assert_eq!(detailed.report.blur_score, 0.0);
    assert_eq!(evaluate_description(""), 10);
    assert!(detailed.report.trust_score < 40);
}

#[test]
fn textured_photo_is_sharp() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "textured.png", &textured(400, 400));

    let detailed = ListingAnalyzer::default().analyze_detailed(&path, "");

    assert_eq!(detailed.sharpness.quality_label, QualityLabel::Sharp);
    assert!(!detailed.sharpness.is_blurry);
    assert!(detailed.sharpness.blur_score >= 150.0);
    assert!(TrustScorer::default().image_quality_score(&detailed.sharpness) >= 60.0);
}

#[test]
fn rich_description_is_clamped_to_100() {
    let filler = vec!["item"; 52].join(" ");
    let text = format!(
        "Selling my bag in excellent condition, like new, includes original box and receipt. {filler}"
    );

    assert_eq!(evaluate_description(&text), 100);
}

#[test]
fn repeated_analysis_is_identical() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "repeat.png", &textured(120, 90));

    let analyzer = ListingAnalyzer::default().with_backbone(Arc::new(Labeller));
    let first = analyzer.analyze(&path, "Used backpack, minor wear, includes rain cover");
    let second = analyzer.analyze(&path, "Used backpack, minor wear, includes rain cover");

    assert_eq!(first, second);
}

#[test]
fn unreadable_file_degrades_instead_of_failing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let detailed = ListingAnalyzer::default().analyze_detailed(&path, "");

    assert_eq!(detailed.sharpness.quality_label, QualityLabel::Unreadable);
    assert_eq!(detailed.report.blur_score, 0.0);
    assert!(detailed.report.is_blurry);
    assert_eq!(detailed.report.condition_label, ConditionLabel::Unknown);
    assert_eq!(detailed.report.condition_confidence, 0.0);
    assert_eq!(detailed.condition.kind, AnalysisKind::Failed);
    assert!(detailed.report.trust_score <= 100);
    assert!(detailed.report.feedback_text.contains("Could not assess image quality"));
}

#[test]
fn missing_file_degrades_instead_of_failing() {
    let report = ListingAnalyzer::default().analyze(Path::new("/nope/missing.jpg"), "like new");
    assert_eq!(report.condition_label, ConditionLabel::Unknown);
    assert!(report.is_blurry);
}

#[test]
fn byte_buffers_match_files() {
    let dir = TempDir::new().unwrap();
    let image = textured(64, 64);
    let path = write(&dir, "buffer.png", &image);
    let bytes = std::fs::read(&path).unwrap();

    let analyzer = ListingAnalyzer::default();
    assert_eq!(analyzer.analyze(&path, "brand new"), analyzer.analyze_bytes(&bytes, "brand new"));
}

#[test]
fn decodes_common_upload_formats() {
    let dir = TempDir::new().unwrap();
    let rgb = textured(96, 96);
    let rgba = DynamicImage::ImageRgba8(rgb.to_rgba8());

    let paths = [
        write(&dir, "photo.png", &rgb),
        write(&dir, "photo.jpg", &rgb),
        write(&dir, "photo.webp", &rgb),
        write(&dir, "photo.gif", &rgba),
    ];

    let analyzer = ListingAnalyzer::default();
    for path in &paths {
        let detailed = analyzer.analyze_detailed(path, "");
        assert_ne!(
            detailed.sharpness.quality_label,
            QualityLabel::Unreadable,
            "{} was not decoded",
            path.display()
        );
        assert_ne!(detailed.condition.kind, AnalysisKind::Failed);
    }
}

#[test]
fn backbone_that_never_loads_triggers_fallback() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "fallback.png", &textured(80, 80));

    let backbone = LazyBackbone::new("mobilenet", 224, || {
        Err(TrustError::ModelUnavailable("weights missing".into()))
    });
    let analyzer = ListingAnalyzer::default().with_backbone(Arc::new(backbone));

    let detailed = analyzer.analyze_detailed(&path, "");
    assert_eq!(detailed.condition.kind, AnalysisKind::Fallback);
    assert_eq!(detailed.condition.top_prediction, "Unknown");
    assert_ne!(detailed.report.condition_label, ConditionLabel::Unknown);
}

#[test]
fn working_backbone_names_the_item() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "item.png", &textured(80, 80));

    let analyzer = ListingAnalyzer::default().with_backbone(Arc::new(Labeller));
    let detailed = analyzer.analyze_detailed(&path, "");

    assert_eq!(detailed.condition.kind, AnalysisKind::Primary);
    assert_eq!(detailed.condition.top_prediction, "Backpack");
    assert!(detailed.report.feedback_text.contains("Detected item type:** Backpack"));
}

#[test]
fn batch_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let sharp = write(&dir, "a.png", &textured(100, 100));
    let flat = write(&dir, "b.png", &solid(100, 100, [20, 20, 20]));

    let config = AnalysisConfig {
        max_concurrent_inference: 2,
        ..AnalysisConfig::default()
    };
    let analyzer = ListingAnalyzer::new(config);

    let inputs = vec![
        ListingInput::new(&sharp, "first"),
        ListingInput::new(&flat, "second"),
        ListingInput::new(dir.path().join("missing.png"), "third"),
        ListingInput::new(&sharp, "first"),
    ];
    let reports = analyzer.analyze_batch(&inputs);

    assert_eq!(reports.len(), 4);
    assert!(reports[0].blur_score > reports[1].blur_score);
    assert!(reports[1].is_blurry);
    assert_eq!(reports[2].condition_label, ConditionLabel::Unknown);
    assert_eq!(reports[0], reports[3]);
    for (input, report) in inputs.iter().zip(&reports) {
        assert_eq!(*report, analyzer.analyze(&input.image_path, &input.description));
    }
}

#[test]
fn hand_built_config_with_bad_edge_parameters_degrades() {
    let image = textured(120, 120);

    let mut inverted = AnalysisConfig::default();
    inverted.condition.canny_low = 200.0;
    inverted.condition.canny_high = 100.0;

    let mut zero_size = AnalysisConfig::default();
    zero_size.condition.canonical_size = 0;
    zero_size.sharpness.canonical_size = 0;

    for config in [inverted, zero_size] {
        let outcome = std::panic::catch_unwind(|| {
            ListingAnalyzer::new(config).analyze_image(&image, "Used, works fine")
        });
        let detailed = outcome.expect("analysis must not panic on a bad config");

        assert_eq!(detailed.condition.kind, AnalysisKind::Failed);
        assert_eq!(detailed.report.condition_label, ConditionLabel::Unknown);
        assert!(detailed.report.trust_score <= 100);
    }
}

#[test]
fn scores_stay_in_range() {
    let analyzer = ListingAnalyzer::default().with_backbone(Arc::new(Labeller));
    let images = [
        solid(10, 10, [0, 0, 0]),
        solid(300, 40, [255, 255, 255]),
        textured(33, 200),
        textured(500, 500),
    ];

    for image in &images {
        for description in ["", "x", "Used, minor scratch, original box, purchased last year"] {
            let detailed = analyzer.analyze_image(image, description);
            assert!(detailed.report.trust_score <= 100);
            assert!((0.0..=1.0).contains(&detailed.report.condition_confidence));
            assert!(detailed.report.blur_score >= 0.0);
            assert!(!label_for(detailed.report.trust_score).label.is_empty());
        }
    }
}

#[test]
fn json_report_serializes() {
    let report = ListingAnalyzer::default().analyze_image(&textured(64, 64), "").report;
    let json = JsonReport::from(&report).to_json().unwrap();

    assert!(json.contains("\"trust_label\""));
    assert!(json.contains("\"feedback_text\""));
}
