use serde::{Deserialize, Serialize};

use super::category::Section;
use super::rules::{RuleTable, UPPER_BONUS, UPPER_BONUS_THRESHOLD};
use super::sheet::Scoresheet;

/// Derived section sums for one scoresheet. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub upper: i32,
    pub bonus: i32,
    pub lower: i32,
    pub total: i32,
}

impl Totals {
    fn from_sections(upper: i32, lower: i32) -> Self {
        let bonus = upper_bonus(upper);
        Self {
            upper,
            bonus,
            lower,
            total: upper.saturating_add(bonus).saturating_add(lower),
        }
    }
}

pub fn upper_bonus(upper: i32) -> i32 {
    if upper >= UPPER_BONUS_THRESHOLD {
        UPPER_BONUS
    } else {
        0
    }
}

impl RuleTable {
    /// Totals calculator. Unfilled cells add nothing; the kniffel bonus counts
    /// towards the lower section.
    pub fn totals(&self, sheet: &Scoresheet) -> Totals {
        let section_sum = |section: Section| -> i32 {
            self.in_section(section)
                .filter_map(|rule| sheet.get(rule.category))
                .fold(0i32, |acc, value| acc.saturating_add(value))
        };
        Totals::from_sections(section_sum(Section::Upper), section_sum(Section::Lower))
    }
}
