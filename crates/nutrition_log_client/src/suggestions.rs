//! Staleness guard for racing food-name lookups.
//!
//! Every lookup takes a [`QueryToken`] from a monotonically increasing
//! counter. A response may only replace the visible list if its token is
//! still the latest one issued.

use crate::FoodSuggestion;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryToken(u64);

#[derive(Debug, Default)]
pub struct SuggestionBoard {
    issued: u64,
    suggestions: Vec<FoodSuggestion>,
}

impl SuggestionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a lookup, superseding any lookup still in flight.
    pub fn issue(&mut self) -> QueryToken {
        self.issued += 1;
        QueryToken(self.issued)
    }

    pub fn is_current(&self, token: QueryToken) -> bool {
        token.0 == self.issued
    }

    /// Apply a lookup result. Returns `false`, leaving the list untouched,
    /// when a newer lookup has been issued since `token`.
    pub fn apply(&mut self, token: QueryToken, suggestions: Vec<FoodSuggestion>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.suggestions = suggestions;
        true
    }

    /// Empty the list and invalidate every lookup in flight.
    pub fn clear(&mut self) {
        self.issued += 1;
        self.suggestions.clear();
    }

    pub fn suggestions(&self) -> &[FoodSuggestion] {
        &self.suggestions
    }
}
