use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::ValidationError;

/// Categorical demographic field usable for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Region,
    Country,
    JobRole,
    JobFunction,
    Sector,
    AgeRange,
    Gender,
    Education,
    CognitiveStyle,
}

const ALL: [Dimension; 9] = [
    Dimension::Region,
    Dimension::Country,
    Dimension::JobRole,
    Dimension::JobFunction,
    Dimension::Sector,
    Dimension::AgeRange,
    Dimension::Gender,
    Dimension::Education,
    Dimension::CognitiveStyle,
];

impl Dimension {
    #[must_use]
    pub const fn all() -> &'static [Dimension] {
        &ALL
    }

    /// Allow-list for `group_by`. Every dimension is eligible; unknown
    /// parameter names are rejected at parse time.
    #[must_use]
    pub const fn groupable() -> &'static [Dimension] {
        &ALL
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Country => "country",
            Self::JobRole => "job_role",
            Self::JobFunction => "job_function",
            Self::Sector => "sector",
            Self::AgeRange => "age_range",
            Self::Gender => "gender",
            Self::Education => "education",
            Self::CognitiveStyle => "cognitive_style",
        }
    }

    /// Column name in the data-point table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        self.as_str()
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        ALL.iter()
            .copied()
            .find(|d| d.as_str() == input)
            .ok_or_else(|| ValidationError(format!("unknown dimension: {input}")))
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
