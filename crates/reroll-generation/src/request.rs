//! The request half of the generation contract.

use reroll_stats::StatSet;
use serde::{Deserialize, Serialize};

/// Coarse life phase, derived purely from age and never stored
/// independently of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    /// 小学 — under 13.
    Primary,
    /// 初中 — 13 to 15.
    Middle,
    /// 高中 — 16 and up.
    High,
}

impl LifeStage {
    /// The stage for a given age.
    #[must_use]
    pub fn for_age(age: u32) -> Self {
        if age < 13 {
            Self::Primary
        } else if age < 16 {
            Self::Middle
        } else {
            Self::High
        }
    }

    /// Chinese display label, used in prompts and UI copy.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "小学",
            Self::Middle => "初中",
            Self::High => "高中",
        }
    }
}

/// The school-year half, tracked only by the semester calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semester {
    /// 秋季学期 — the school year opens here.
    Autumn,
    /// 春季学期
    Spring,
}

impl Semester {
    /// The other semester.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Autumn => Self::Spring,
            Self::Spring => Self::Autumn,
        }
    }

    /// Chinese display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Autumn => "秋季学期",
            Self::Spring => "春季学期",
        }
    }
}

/// Everything the generator is told when asked for the next turn.
///
/// `history` is already capped by the caller to the session's sliding
/// window — most recent entries only, oldest silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnRequest {
    /// The student's age in years.
    pub age: u32,
    /// Life stage derived from `age`.
    pub stage: LifeStage,
    /// The semester, when the session tracks one.
    pub semester: Option<Semester>,
    /// Turn within the year or semester, 1 through 5.
    pub period: u32,
    /// Current stat values.
    pub stats: StatSet,
    /// The most recent narrative snippets, oldest first.
    pub history: Vec<String>,
    /// Whether options should carry action-point costs.
    pub budgeted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_stage_boundaries() {
        assert_eq!(LifeStage::for_age(6), LifeStage::Primary);
        assert_eq!(LifeStage::for_age(12), LifeStage::Primary);
        assert_eq!(LifeStage::for_age(13), LifeStage::Middle);
        assert_eq!(LifeStage::for_age(15), LifeStage::Middle);
        assert_eq!(LifeStage::for_age(16), LifeStage::High);
        assert_eq!(LifeStage::for_age(18), LifeStage::High);
    }

    #[test]
    fn test_semester_toggle_is_an_involution() {
        assert_eq!(Semester::Autumn.toggled(), Semester::Spring);
        assert_eq!(Semester::Spring.toggled().toggled(), Semester::Spring);
    }
}
