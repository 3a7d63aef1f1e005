//! Result orderings for search responses.

use serde::{Deserialize, Serialize};

use super::Experiment;

/// Ordering applied to fuzzy search results.
///
/// The set is closed: every variant is matched exhaustively in [`Sorting::apply`].
/// `Smart*` orderings refer to the order produced by the fuzzy matcher
/// (strongest match first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sorting {
    /// Salary, increasing.
    CostAscending,
    /// Salary, decreasing.
    CostDescending,
    /// Duration, increasing.
    DurationAscending,
    /// Duration, decreasing.
    DurationDescending,
    /// Weakest match first.
    SmartAscending,
    /// Strongest match first.
    #[default]
    SmartDescending,
}

impl Sorting {
    /// All orderings, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::CostAscending,
        Self::CostDescending,
        Self::DurationAscending,
        Self::DurationDescending,
        Self::SmartAscending,
        Self::SmartDescending,
    ];

    /// Returns the wire name of this ordering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CostAscending => "cost_ascending",
            Self::CostDescending => "cost_descending",
            Self::DurationAscending => "duration_ascending",
            Self::DurationDescending => "duration_descending",
            Self::SmartAscending => "smart_ascending",
            Self::SmartDescending => "smart_descending",
        }
    }

    /// Reorders `ranked`, which must be in match order (strongest first).
    ///
    /// Sorting is stable: records comparing equal keep their match order.
    #[must_use]
    pub fn apply(self, mut ranked: Vec<Experiment>) -> Vec<Experiment> {
        match self {
            Self::CostAscending => ranked.sort_by(|left, right| left.salary.total_cmp(&right.salary)),
            Self::CostDescending => {
                ranked.sort_by(|left, right| right.salary.total_cmp(&left.salary));
            }
            Self::DurationAscending => ranked.sort_by_key(|experiment| experiment.duration),
            Self::DurationDescending => {
                ranked.sort_by(|left, right| right.duration.cmp(&left.duration));
            }
            Self::SmartAscending => ranked.reverse(),
            Self::SmartDescending => {}
        }
        ranked
    }
}

impl std::fmt::Display for Sorting {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sorting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sorting| sorting.as_str() == value)
            .ok_or_else(|| {
                format!(
                    "Invalid sorting '{value}'. Valid values are: {}",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

// =============================================================================
// Tests
// =============================================================================
