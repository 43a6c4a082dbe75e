use serde::{Deserialize, Serialize};

/// Condition under which a tier applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    AtLeast(f64),
    Below(f64),
    /// Inclusive on both ends.
    Within(f64, f64),
}

impl Bound {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Bound::AtLeast(min) => value >= min,
            Bound::Below(max) => value < max,
            Bound::Within(lo, hi) => value >= lo && value <= hi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier<T> {
    pub bound: Bound,
    pub value: T,
}

/// Ordered `(bound, value)` pairs evaluated top-down; the first matching tier wins,
/// otherwise `otherwise` is returned. NaN never matches a bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable<T> {
    pub tiers: Vec<Tier<T>>,
    pub otherwise: T,
}

impl<T: Clone> TierTable<T> {
    pub fn new(tiers: Vec<(Bound, T)>, otherwise: T) -> Self {
        Self {
            tiers: tiers
                .into_iter()
                .map(|(bound, value)| Tier { bound, value })
                .collect(),
            otherwise,
        }
    }

    /// Descending `AtLeast` cutoffs, the common case for score buckets.
    pub fn descending(cutoffs: &[(f64, T)], otherwise: T) -> Self {
        Self::new(
            cutoffs
                .iter()
                .map(|(min, value)| (Bound::AtLeast(*min), value.clone()))
                .collect(),
            otherwise,
        )
    }

    pub fn evaluate(&self, value: f64) -> T {
        self.tiers
            .iter()
            .find(|tier| tier.bound.contains(value))
            .map(|tier| tier.value.clone())
            .unwrap_or_else(|| self.otherwise.clone())
    }
}
