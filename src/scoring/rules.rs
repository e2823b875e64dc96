use strum::EnumCount;

use super::category::{Category, Section};

/// Shape of the values a category accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Legality {
    /// Zero to five dice showing the face: `{0, f, 2f, 3f, 4f, 5f}`.
    FaceMultiple(i32),
    /// Any integer in the closed range.
    Range { min: i32, max: i32 },
    /// Either zero or the fixed value.
    ZeroOr(i32),
    /// Any non-negative multiple of the step, no upper bound.
    MultipleOf(i32),
}

impl Legality {
    pub fn accepts(self, value: i64) -> bool {
        if value < 0 {
            return false;
        }
        match self {
            Legality::FaceMultiple(face) => {
                let face = i64::from(face);
                value % face == 0 && value / face <= 5
            }
            Legality::Range { min, max } => (i64::from(min)..=i64::from(max)).contains(&value),
            Legality::ZeroOr(fixed) => value == 0 || value == i64::from(fixed),
            Legality::MultipleOf(step) => value % i64::from(step) == 0 && value <= i64::from(i32::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub category: Category,
    pub section: Section,
    pub face: Option<i32>,
    pub legality: Legality,
    /// Whether the value may be set by a direct score entry. The kniffel
    /// bonus is only ever produced by relative adjustment.
    pub direct_entry: bool,
}

impl Rule {
    const fn upper(category: Category, face: i32) -> Self {
        Self {
            category,
            section: Section::Upper,
            face: Some(face),
            legality: Legality::FaceMultiple(face),
            direct_entry: true,
        }
    }

    const fn lower(category: Category, legality: Legality) -> Self {
        Self {
            category,
            section: Section::Lower,
            face: None,
            legality,
            direct_entry: true,
        }
    }
}

pub const UPPER_BONUS_THRESHOLD: i32 = 63;
pub const UPPER_BONUS: i32 = 35;
pub const KNIFFEL_SCORE: i32 = 50;
pub const KNIFFEL_BONUS_STEP: i32 = 50;

const FREE_SUM: Legality = Legality::Range { min: 0, max: 30 };

/// The fixed category rule table. Indexed by [`Category::index`].
pub static RULES: RuleTable = RuleTable::standard();

#[derive(Debug)]
pub struct RuleTable {
    rules: [Rule; Category::COUNT],
}

/// Outcome of checking a proposed category value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Legal(i32),
    Illegal,
}

impl Validation {
    pub fn is_legal(self) -> bool {
        matches!(self, Validation::Legal(_))
    }
}

impl RuleTable {
    pub const fn standard() -> Self {
        Self {
            rules: [
                Rule::upper(Category::Ones, 1),
                Rule::upper(Category::Twos, 2),
                Rule::upper(Category::Threes, 3),
                Rule::upper(Category::Fours, 4),
                Rule::upper(Category::Fives, 5),
                Rule::upper(Category::Sixes, 6),
                Rule::lower(Category::ThreeKind, FREE_SUM),
                Rule::lower(Category::FourKind, FREE_SUM),
                Rule::lower(Category::FullHouse, Legality::ZeroOr(25)),
                Rule::lower(Category::SmallStraight, Legality::ZeroOr(30)),
                Rule::lower(Category::LargeStraight, Legality::ZeroOr(40)),
                Rule::lower(Category::Kniffel, Legality::ZeroOr(KNIFFEL_SCORE)),
                Rule::lower(Category::Chance, FREE_SUM),
                Rule {
                    category: Category::KniffelBonus,
                    section: Section::Lower,
                    face: None,
                    legality: Legality::MultipleOf(KNIFFEL_BONUS_STEP),
                    direct_entry: false,
                },
            ],
        }
    }

    pub fn rule(&self, category: Category) -> &Rule {
        &self.rules[category.index()]
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Score validator: pure and total over every category and integer.
    pub fn validate(&self, category: Category, value: i64) -> Validation {
        if self.rule(category).legality.accepts(value) {
            // accepts() bounds every legal value to i32
            Validation::Legal(value as i32)
        } else {
            Validation::Illegal
        }
    }

    pub fn in_section(&self, section: Section) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |rule| rule.section == section)
    }
}
