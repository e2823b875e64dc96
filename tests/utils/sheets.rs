#![allow(dead_code)] // Test utilities may not all be used in every test

use knuffelboard::{scoring::Category, GameService};

use super::setup::TestSetup;

// ============================================================================
// Scoresheet Builders
// ============================================================================

/// Legal values for every category, written through the service
pub struct SheetBuilder {
    values: Vec<(Category, i64)>,
}

impl SheetBuilder {
    /// Every category scratched with 0
    pub fn zeros() -> Self {
        Self {
            values: Category::CANONICAL.iter().map(|&c| (c, 0)).collect(),
        }
    }

    /// Upper section exactly at the bonus threshold (63), lower worth 187
    pub fn bonus_sheet() -> Self {
        Self::zeros()
            .with(Category::Ones, 3)
            .with(Category::Twos, 6)
            .with(Category::Threes, 9)
            .with(Category::Fours, 12)
            .with(Category::Fives, 15)
            .with(Category::Sixes, 18)
            .with(Category::ThreeKind, 20)
            .with(Category::FullHouse, 25)
            .with(Category::SmallStraight, 30)
            .with(Category::LargeStraight, 40)
            .with(Category::Kniffel, 50)
            .with(Category::Chance, 22)
    }

    /// Upper section at 60, three short of the bonus, lower worth 68
    pub fn near_miss_sheet() -> Self {
        Self::zeros()
            .with(Category::Twos, 6)
            .with(Category::Threes, 9)
            .with(Category::Fours, 12)
            .with(Category::Fives, 15)
            .with(Category::Sixes, 18)
            .with(Category::ThreeKind, 18)
            .with(Category::SmallStraight, 30)
            .with(Category::Chance, 20)
    }

    /// Sheet whose total is just the chance value
    pub fn chance_only(points: i64) -> Self {
        Self::zeros().with(Category::Chance, points)
    }

    pub fn with(mut self, category: Category, value: i64) -> Self {
        match self.values.iter_mut().find(|(c, _)| *c == category) {
            Some(entry) => entry.1 = value,
            None => self.values.push((category, value)),
        }
        self
    }

    pub fn without(mut self, category: Category) -> Self {
        self.values.retain(|(c, _)| *c != category);
        self
    }

    pub async fn write(&self, service: &GameService, game_id: i64, player_id: i64) {
        for &(category, value) in &self.values {
            service
                .record_score(game_id, player_id, category.as_str(), value.into())
                .await
                .unwrap_or_else(|e| panic!("{} = {} rejected: {}", category, value, e));
        }
    }

    pub async fn write_for(&self, setup: &TestSetup, name: &str) {
        self.write(&setup.game_service, setup.game_id(), setup.player_id(name))
            .await;
    }
}
