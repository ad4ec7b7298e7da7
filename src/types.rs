use serde::{Deserialize, Serialize};

/// Which quantity a classifier reports when strategies compare it to others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonMode {
    /// Fitness, hidden (0) until the rule is experienced enough to be trusted.
    Exploration,
    /// Deletion vote computed by the update strategy.
    Deletion,
    /// Raw accuracy used for subsumption decisions.
    Exploitation,
    PureFitness,
    PureAccuracy,
    /// Accuracy once the rule has seen the whole training set, 2.0 before that.
    Accuracy,
}

/// How a classifier came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierOrigin {
    Init,
    Cover,
    Ga,
}

impl ClassifierOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierOrigin::Init => "init",
            ClassifierOrigin::Cover => "cover",
            ClassifierOrigin::Ga => "ga",
        }
    }
}

/// Memoized outcome of matching one classifier against one training instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchState {
    #[default]
    Unknown,
    NoMatch,
    Match,
}

/// A rule's stance on one label of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAbility {
    /// Specific label gene agreeing with the instance.
    Positive,
    /// Wildcard label gene.
    Abstain,
    /// Specific label gene disagreeing with the instance.
    Negative,
}

impl LabelAbility {
    pub fn is_positive(self) -> bool {
        matches!(self, LabelAbility::Positive)
    }

    pub fn is_abstain(self) -> bool {
        matches!(self, LabelAbility::Abstain)
    }
}

/// Division that reports 0 instead of NaN or infinity on a zero denominator.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        let value = numerator / denominator;
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}
