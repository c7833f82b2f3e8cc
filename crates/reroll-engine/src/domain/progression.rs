//! Period, semester, and age advancement.
//!
//! Life stage is always recomputed from age, never stored where it could
//! desync.

use reroll_generation::{LifeStage, Semester};
use serde::{Deserialize, Serialize};

use super::config::Calendar;

/// Turns per year (annual calendar) or per semester (semester calendar).
pub const PERIODS_PER_TERM: u32 = 5;

/// Where the student currently sits in their career.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerPosition {
    /// Age in years; starts at 6.
    pub age: u32,
    /// The current semester; `None` on the annual calendar.
    pub semester: Option<Semester>,
    /// Turn within the year or semester, 1 through 5.
    pub period: u32,
}

impl CareerPosition {
    /// The opening position: age 6, period 1, autumn when tracked.
    #[must_use]
    pub fn initial(calendar: Calendar) -> Self {
        Self {
            age: 6,
            semester: match calendar {
                Calendar::Annual => None,
                Calendar::Semester => Some(Semester::Autumn),
            },
            period: 1,
        }
    }

    /// The life stage at this position, derived purely from age.
    #[must_use]
    pub fn stage(&self) -> LifeStage {
        LifeStage::for_age(self.age)
    }

    /// The position one turn later.
    ///
    /// The period wraps after five turns. On the semester calendar the
    /// semester toggles on every wrap and age increments only when
    /// spring wraps back to autumn; on the annual calendar age
    /// increments on every wrap.
    #[must_use]
    pub fn advanced(&self) -> Self {
        let mut next = *self;
        next.period += 1;
        if next.period > PERIODS_PER_TERM {
            next.period = 1;
            match next.semester {
                Some(semester) => {
                    if semester == Semester::Spring {
                        next.age += 1;
                    }
                    next.semester = Some(semester.toggled());
                }
                None => next.age += 1,
            }
        }
        next
    }
}
