use once_cell::sync::Lazy;

use super::tiers::TierTable;

/// Score for a missing or whitespace-only description, and the floor for any other.
pub const EMPTY_DESCRIPTION_SCORE: u32 = 10;

pub const CONDITION_KEYWORDS: [&str; 14] = [
    "new",
    "used",
    "good condition",
    "like new",
    "working",
    "functional",
    "minor",
    "scratch",
    "wear",
    "defect",
    "excellent",
    "perfect",
    "broken",
    "damaged",
];

pub const INFORMATIVE_KEYWORDS: [&str; 16] = [
    "brand",
    "model",
    "year",
    "size",
    "color",
    "weight",
    "original",
    "warranty",
    "receipt",
    "purchased",
    "month",
    "reason",
    "selling",
    "includes",
    "accessories",
    "box",
];

const POINTS_PER_KEYWORD: u32 = 10;
const MAX_KEYWORD_POINTS: u32 = 30;

static WORD_COUNT_POINTS: Lazy<TierTable<u32>> = Lazy::new(|| {
    TierTable::descending(&[(50.0, 40), (30.0, 30), (15.0, 20), (5.0, 10)], 5)
});

/// Rates how informative a listing description is, on `[10, 100]`.
///
/// Length contributes up to 40 points; condition and informative vocabulary up
/// to 30 each. Keywords are case-insensitive substring matches, each counted once.
pub fn evaluate_description(text: &str) -> u32 {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return EMPTY_DESCRIPTION_SCORE;
    }

    let word_count = normalized.split_whitespace().count();
    let score = WORD_COUNT_POINTS.evaluate(word_count as f64)
        + keyword_points(&normalized, &CONDITION_KEYWORDS)
        + keyword_points(&normalized, &INFORMATIVE_KEYWORDS);

    score.clamp(EMPTY_DESCRIPTION_SCORE, 100)
}

fn keyword_points(text: &str, vocabulary: &[&str]) -> u32 {
    let hits = vocabulary.iter().filter(|keyword| text.contains(*keyword)).count() as u32;
    (hits * POINTS_PER_KEYWORD).min(MAX_KEYWORD_POINTS)
}
