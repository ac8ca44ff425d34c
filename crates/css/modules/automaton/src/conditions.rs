//! Candidate conditions, deduplicated by value.

use css_selectors::Condition;
use rustc_hash::FxHashMap;

/// Index of a condition in a [`ConditionTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(u32);

impl ConditionId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Conditions referenced by automaton edges. Equal conditions share an id so
/// that subset construction groups their edges.
#[derive(Clone, Debug, Default)]
pub struct ConditionTable {
    conditions: Vec<Condition>,
    index: FxHashMap<Condition, ConditionId>,
}

impl ConditionTable {
    /// Id of `condition`, adding it on first sight.
    pub fn intern(&mut self, condition: &Condition) -> ConditionId {
        if let Some(&id) = self.index.get(condition) {
            return id;
        }
        let id = ConditionId(u32::try_from(self.conditions.len()).unwrap_or(u32::MAX));
        self.conditions.push(condition.clone());
        self.index.insert(condition.clone(), id);
        id
    }

    #[inline]
    pub fn get(&self, id: ConditionId) -> Option<&Condition> {
        self.conditions.get(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
