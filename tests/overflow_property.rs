//! Property tests for the overflow splitter.

use proptest::prelude::*;

use contextsmith::chunking::overflow::split_text;

fn char_len(text: &str) -> usize {
    text.chars().count()
}

proptest! {
    /// Every produced piece stays within the budget.
    #[test]
    fn pieces_respect_the_budget(
        text in "[a-zA-Z0-9 .,;\n]{0,1500}",
        max_len in 40usize..400,
        overlap in 0usize..30,
    ) {
        let pieces = split_text(&text, max_len, overlap);
        for piece in &pieces {
            prop_assert!(char_len(piece) <= max_len);
        }
    }

    /// Nothing is lost at the edges: output starts and ends exactly where
    /// the input does, and no text shorter than the budget is ever split.
    #[test]
    fn edges_are_preserved(
        text in "[a-z .\n]{1,1200}",
        max_len in 60usize..300,
        overlap in 0usize..40,
    ) {
        let pieces = split_text(&text, max_len, overlap);
        prop_assert!(!pieces.is_empty());
        let first = &pieces[0];
        let last = pieces.last().unwrap();
        prop_assert!(text.starts_with(first.chars().next().unwrap()));
        prop_assert!(text.ends_with(last.chars().last().unwrap()));
        if char_len(&text) <= max_len {
            prop_assert_eq!(pieces.len(), 1);
        }
    }

    /// With overlap disabled, pieces partition the input exactly.
    #[test]
    fn zero_overlap_is_a_partition(
        text in "[a-z ]{0,1000}",
        max_len in 50usize..200,
    ) {
        let pieces = split_text(&text, max_len, 0);
        let rebuilt: String = pieces.concat();
        prop_assert_eq!(rebuilt, text);
    }

    /// Piece count for separator-free text follows the covering-window
    /// rule: ceil((len - overlap) / (max - overlap)) once the text
    /// overflows the budget.
    #[test]
    fn uniform_text_piece_count_matches_the_window_rule(
        len in 1usize..3000,
        max_len in 50usize..400,
        overlap in 0usize..40,
    ) {
        prop_assume!(overlap < max_len);
        let text: String = "x".repeat(len);
        let pieces = split_text(&text, max_len, overlap);
        let expected = if len <= max_len {
            1
        } else {
            (len - overlap).div_ceil(max_len - overlap)
        };
        prop_assert_eq!(pieces.len(), expected);
    }
}
