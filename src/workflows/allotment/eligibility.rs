use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::StudentId;
use super::ranking::RankedStudent;

/// Order in which eligible students reach the allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityOrder {
    /// Every eligible student of GENERAL, then OBC, SC, ST, VJNT; ranks ascending inside.
    #[default]
    CategoryMajor,
    /// All rank-1 students across categories first, then rank-2, and so on.
    RankMajor,
}

impl EligibilityOrder {
    pub const fn label(self) -> &'static str {
        match self {
            EligibilityOrder::CategoryMajor => "category_major",
            EligibilityOrder::RankMajor => "rank_major",
        }
    }
}

impl fmt::Display for EligibilityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EligibilityOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "category_major" | "category" => Ok(Self::CategoryMajor),
            "rank_major" | "rank" => Ok(Self::RankMajor),
            other => Err(format!("unknown eligibility order '{other}'")),
        }
    }
}

pub const DEFAULT_CATEGORY_CUTOFF: usize = 2;

/// Run-wide eligibility settings: how many ranks per category, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllotmentPolicy {
    pub category_cutoff: usize,
    pub order: EligibilityOrder,
}

impl Default for AllotmentPolicy {
    fn default() -> Self {
        Self {
            category_cutoff: DEFAULT_CATEGORY_CUTOFF,
            order: EligibilityOrder::default(),
        }
    }
}

/// Keep the top `cutoff` ranks of each category that do not already hold a room.
///
/// `ranked` must come from [`rank_by_category`](super::ranking::rank_by_category); ranks
/// are computed over the full population, so an allotted student still occupies its slot.
pub fn eligible_students(
    ranked: Vec<RankedStudent>,
    allotted: &HashSet<StudentId>,
    cutoff: usize,
    order: EligibilityOrder,
) -> Vec<RankedStudent> {
    let mut eligible: Vec<RankedStudent> = ranked
        .into_iter()
        .filter(|entry| (entry.rank as usize) <= cutoff)
        .filter(|entry| !allotted.contains(&entry.student.id))
        .collect();

    match order {
        EligibilityOrder::CategoryMajor => eligible.sort_by(|left, right| {
            left.student
                .category
                .cmp(&right.student.category)
                .then(left.rank.cmp(&right.rank))
        }),
        EligibilityOrder::RankMajor => eligible.sort_by(|left, right| {
            left.rank
                .cmp(&right.rank)
                .then(left.student.category.cmp(&right.student.category))
        }),
    }

    eligible
}
