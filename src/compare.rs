// src/compare.rs

/// Whether every element of `pattern` occurs in `sequence` in the same
/// order, gaps allowed.
///
/// `["user", "profile", "view"]` contains `["user", "view"]` but not
/// `["view", "user"]`. An empty pattern never matches.
pub fn parts_match_in_order<S, P>(sequence: &[S], pattern: &[P]) -> bool
where
    S: PartialEq<P>,
{
    if pattern.is_empty() {
        return false;
    }

    let mut remaining = sequence.iter();
    pattern
        .iter()
        .all(|wanted| remaining.any(|part| part == wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_subsequence_matches() {
        assert!(parts_match_in_order(&["meal", "plan", "data", "handler"], &["data", "handler"]));
        assert!(parts_match_in_order(&["user", "profile", "view"], &["user", "view"]));
    }

    #[test]
    fn wrong_order_or_missing_part_fails() {
        assert!(!parts_match_in_order(&["handler", "data"], &["data", "handler"]));
        assert!(!parts_match_in_order(&["a", "b"], &["a", "c"]));
    }

    #[test]
    fn each_sequence_part_is_used_once() {
        assert!(!parts_match_in_order(&["a"], &["a", "a"]));
        assert!(parts_match_in_order(&["a", "x", "a"], &["a", "a"]));
    }

    #[test]
    fn empty_pattern_never_matches() {
        let empty: [&str; 0] = [];
        assert!(!parts_match_in_order(&["a"], &empty));
    }

    #[test]
    fn works_across_string_types() {
        let owned = vec!["src".to_string(), "watch".to_string(), "observer".to_string()];
        assert!(parts_match_in_order(&owned, &["src", "observer"]));
    }
}
