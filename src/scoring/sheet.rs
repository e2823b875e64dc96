use serde::ser::{Serialize, SerializeMap, Serializer};
use strum::EnumCount;

use super::category::Category;

/// One player's entries for one game.
///
/// Each cell is `None` until a value is recorded. A recorded zero is `Some(0)`
/// and counts as filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoresheet {
    cells: [Option<i32>; Category::COUNT],
}

impl Scoresheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<i32> {
        self.cells[category.index()]
    }

    pub fn is_filled(&self, category: Category) -> bool {
        self.get(category).is_some()
    }

    /// Stores `value`, replacing any previous entry. Callers validate first.
    pub fn set(&mut self, category: Category, value: i32) -> Option<i32> {
        self.cells[category.index()].replace(value)
    }

    /// True when all thirteen canonical categories hold a value.
    pub fn is_complete(&self) -> bool {
        Category::CANONICAL.iter().all(|c| self.is_filled(*c))
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Filled cells in sheet order.
    pub fn entries(&self) -> impl Iterator<Item = (Category, i32)> + '_ {
        Category::all().filter_map(|c| self.get(c).map(|value| (c, value)))
    }
}

impl FromIterator<(Category, i32)> for Scoresheet {
    fn from_iter<T: IntoIterator<Item = (Category, i32)>>(iter: T) -> Self {
        let mut sheet = Scoresheet::new();
        for (category, value) in iter {
            sheet.set(category, value);
        }
        sheet
    }
}

// Serialized sparsely: unfilled categories are absent from the map.
impl Serialize for Scoresheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.filled_count()))?;
        for (category, value) in self.entries() {
            map.serialize_entry(category.as_str(), &value)?;
        }
        map.end()
    }
}
