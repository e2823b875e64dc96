// Public API
pub use category::{Category, Section};
pub use rules::{
    Legality, Rule, RuleTable, Validation, KNIFFEL_BONUS_STEP, KNIFFEL_SCORE, RULES,
    UPPER_BONUS, UPPER_BONUS_THRESHOLD,
};
pub use sheet::Scoresheet;
pub use totals::{upper_bonus, Totals};

// Internal modules
mod category;
mod rules;
mod sheet;
mod totals;
