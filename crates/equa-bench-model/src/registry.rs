use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::ValidationError;

/// Class of a metric in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricClass {
    Assessment,
    Outcome,
    Talent,
}

/// One numeric field on a data point. The variant order is the canonical
/// registry order used for all deterministic output ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    TotalEq,
    SelfAwareness,
    SelfManagement,
    SocialAwareness,
    RelationshipManagement,
    DecisionMaking,
    Effectiveness,
    Relationships,
    Wellbeing,
    QualityOfLife,
    Adaptability,
    Collaboration,
    CriticalThinking,
    Resilience,
    Vision,
    Drive,
}

const REGISTRY: [MetricKey; 16] = [
    MetricKey::TotalEq,
    MetricKey::SelfAwareness,
    MetricKey::SelfManagement,
    MetricKey::SocialAwareness,
    MetricKey::RelationshipManagement,
    MetricKey::DecisionMaking,
    MetricKey::Effectiveness,
    MetricKey::Relationships,
    MetricKey::Wellbeing,
    MetricKey::QualityOfLife,
    MetricKey::Adaptability,
    MetricKey::Collaboration,
    MetricKey::CriticalThinking,
    MetricKey::Resilience,
    MetricKey::Vision,
    MetricKey::Drive,
];

impl MetricKey {
    /// Every metric, in canonical registry order.
    #[must_use]
    pub const fn all() -> &'static [MetricKey] {
        &REGISTRY
    }

    /// Outcome metrics only, in registry order.
    pub fn outcomes() -> impl Iterator<Item = MetricKey> {
        REGISTRY
            .iter()
            .copied()
            .filter(|m| m.class() == MetricClass::Outcome)
    }

    /// Assessment (competency) metrics only, in registry order.
    pub fn competencies() -> impl Iterator<Item = MetricKey> {
        REGISTRY
            .iter()
            .copied()
            .filter(|m| m.class() == MetricClass::Assessment)
    }

    /// Talent metrics only, in registry order.
    pub fn talents() -> impl Iterator<Item = MetricKey> {
        REGISTRY
            .iter()
            .copied()
            .filter(|m| m.class() == MetricClass::Talent)
    }

    #[must_use]
    pub const fn class(self) -> MetricClass {
        match self {
            Self::TotalEq
            | Self::SelfAwareness
            | Self::SelfManagement
            | Self::SocialAwareness
            | Self::RelationshipManagement
            | Self::DecisionMaking => MetricClass::Assessment,
            Self::Effectiveness | Self::Relationships | Self::Wellbeing | Self::QualityOfLife => {
                MetricClass::Outcome
            }
            Self::Adaptability
            | Self::Collaboration
            | Self::CriticalThinking
            | Self::Resilience
            | Self::Vision
            | Self::Drive => MetricClass::Talent,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalEq => "total_eq",
            Self::SelfAwareness => "self_awareness",
            Self::SelfManagement => "self_management",
            Self::SocialAwareness => "social_awareness",
            Self::RelationshipManagement => "relationship_management",
            Self::DecisionMaking => "decision_making",
            Self::Effectiveness => "effectiveness",
            Self::Relationships => "relationships",
            Self::Wellbeing => "wellbeing",
            Self::QualityOfLife => "quality_of_life",
            Self::Adaptability => "adaptability",
            Self::Collaboration => "collaboration",
            Self::CriticalThinking => "critical_thinking",
            Self::Resilience => "resilience",
            Self::Vision => "vision",
            Self::Drive => "drive",
        }
    }

    /// Column name of this metric in the data-point table. Metric keys are
    /// fixed snake_case identifiers, so the key doubles as the column name.
    #[must_use]
    pub const fn column(self) -> &'static str {
        self.as_str()
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        REGISTRY
            .iter()
            .copied()
            .find(|m| m.as_str() == input)
            .ok_or_else(|| ValidationError(format!("unknown metric: {input}")))
    }

    /// Position of this metric in the canonical registry order.
    #[must_use]
    pub fn registry_index(self) -> usize {
        REGISTRY
            .iter()
            .position(|m| *m == self)
            .unwrap_or(REGISTRY.len())
    }
}

impl Display for MetricKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_is_stable() {
        let keys: Vec<&str> = MetricKey::all().iter().map(|m| m.as_str()).collect();
        assert_eq!(keys[0], "total_eq");
        assert_eq!(keys[6], "effectiveness");
        assert_eq!(keys[15], "drive");
        assert_eq!(keys.len(), 16);
    }

    #[test]
    fn parse_round_trips_every_key() {
        for m in MetricKey::all() {
            assert_eq!(MetricKey::parse(m.as_str()).expect("parse"), *m);
        }
        assert!(MetricKey::parse("charisma").is_err());
    }

    #[test]
    fn class_partition_is_complete() {
        let total = MetricKey::competencies().count()
            + MetricKey::outcomes().count()
            + MetricKey::talents().count();
        assert_eq!(total, MetricKey::all().len());
        assert_eq!(MetricKey::outcomes().count(), 4);
    }
}
