use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Which half of the scoresheet a category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    Upper,
    Lower,
}

/// Scoring categories in sheet order.
///
/// The discriminant doubles as the cell index of a [`super::Scoresheet`], so
/// the declaration order here is load-bearing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    ThreeKind,
    FourKind,
    FullHouse,
    SmallStraight,
    LargeStraight,
    Kniffel,
    Chance,
    KniffelBonus,
}

impl Category {
    pub const UPPER: [Category; 6] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
    ];

    /// The thirteen categories every player must fill before a game can finish.
    pub const CANONICAL: [Category; 13] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
        Category::ThreeKind,
        Category::FourKind,
        Category::FullHouse,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Kniffel,
        Category::Chance,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn section(self) -> Section {
        if self.face().is_some() {
            Section::Upper
        } else {
            Section::Lower
        }
    }

    /// Die face counted by an upper category.
    pub fn face(self) -> Option<i32> {
        match self {
            Category::Ones => Some(1),
            Category::Twos => Some(2),
            Category::Threes => Some(3),
            Category::Fours => Some(4),
            Category::Fives => Some(5),
            Category::Sixes => Some(6),
            _ => None,
        }
    }

    pub fn is_canonical(self) -> bool {
        self != Category::KniffelBonus
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = Category> {
        Category::iter()
    }
}
