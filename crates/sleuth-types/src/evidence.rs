//! Quality-rated facts attached to a hypothesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Evidence Quality ────────────────────────────────────────────────────

/// How directly a piece of evidence bears on a hypothesis.
///
/// Ordered from strongest to weakest; each grade carries a fixed weight
/// used by the confidence calculator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceQuality {
    /// Observed directly in the data that the hypothesis makes claims about.
    Direct,
    /// Confirmed by two or more independent sources.
    Corroborated,
    /// Inferred from a related signal.
    Indirect,
    /// Consistent with the hypothesis but open to other readings.
    Suggestive,
    /// Barely informative.
    Weak,
}

impl EvidenceQuality {
    /// All grades, strongest first.
    pub const ALL: [EvidenceQuality; 5] = [
        Self::Direct,
        Self::Corroborated,
        Self::Indirect,
        Self::Suggestive,
        Self::Weak,
    ];

    /// Fixed numeric weight of this grade.
    pub fn weight(self) -> f64 {
        match self {
            Self::Direct => 1.0,
            Self::Corroborated => 0.7,
            Self::Indirect => 0.4,
            Self::Suggestive => 0.2,
            Self::Weak => 0.1,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Direct => 4,
            Self::Corroborated => 3,
            Self::Indirect => 2,
            Self::Suggestive => 1,
            Self::Weak => 0,
        }
    }
}

impl PartialOrd for EvidenceQuality {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EvidenceQuality {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for EvidenceQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Corroborated => write!(f, "corroborated"),
            Self::Indirect => write!(f, "indirect"),
            Self::Suggestive => write!(f, "suggestive"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

// ── Evidence ────────────────────────────────────────────────────────────

/// A fact supporting or contradicting a hypothesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Where the fact came from (opaque, e.g. "metrics:db-primary/cpu").
    pub source: String,
    /// Quality grade.
    pub quality: EvidenceQuality,
    /// `true` if the fact supports the hypothesis, `false` if it contradicts it.
    pub supports: bool,
    /// Confidence assigned by the producer (0.0 to 1.0).
    pub local_confidence: f64,
    /// Human-readable interpretation of the fact.
    pub interpretation: String,
    /// When the fact was collected.
    pub timestamp: DateTime<Utc>,
}

impl Evidence {
    /// Evidence in favour of the hypothesis.
    pub fn supporting(
        source: impl Into<String>,
        quality: EvidenceQuality,
        local_confidence: f64,
        interpretation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            quality,
            supports: true,
            local_confidence,
            interpretation: interpretation.into(),
            timestamp: Utc::now(),
        }
    }

    /// Evidence against the hypothesis.
    pub fn contradicting(
        source: impl Into<String>,
        quality: EvidenceQuality,
        local_confidence: f64,
        interpretation: impl Into<String>,
    ) -> Self {
        Self {
            supports: false,
            ..Self::supporting(source, quality, local_confidence, interpretation)
        }
    }

    /// Override the collection timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Signed contribution to the evidence sum: positive when supporting,
    /// negative when contradicting. Non-finite confidences contribute nothing.
    pub fn signed_weight(&self) -> f64 {
        if !self.local_confidence.is_finite() {
            return 0.0;
        }
        let magnitude = self.local_confidence.clamp(0.0, 1.0) * self.quality.weight();
        if self.supports {
            magnitude
        } else {
            -magnitude
        }
    }
}
