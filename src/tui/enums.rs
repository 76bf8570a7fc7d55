//! Enumerations for TUI state management.

use crate::fields::SortKey;

/// Which screen the dashboard is showing.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    Dashboard,
    Help,
    Confirm,
}

/// Next sort key in the cycle none → due → priority → none.
pub fn next_sort(current: Option<SortKey>) -> Option<SortKey> {
    match current {
        None => Some(SortKey::Due),
        Some(SortKey::Due) => Some(SortKey::Priority),
        Some(SortKey::Priority) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_cycle_returns_to_unsorted() {
        let mut s = None;
        s = next_sort(s);
        assert_eq!(s, Some(SortKey::Due));
        s = next_sort(s);
        assert_eq!(s, Some(SortKey::Priority));
        assert_eq!(next_sort(s), None);
    }
}
