//! Property tests for freeform windowing.

use folio_rag::chunking::{split_windows, window_spans};
use proptest::prelude::*;

/// Window size `W` and an overlap `O < W`.
fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (2usize..80).prop_flat_map(|size| (Just(size), 0..size))
}

/// Words joined by single spaces, with `W` and `2 <= O <= W - 2`.
fn arb_sentence_and_window() -> impl Strategy<Value = (String, usize, usize)> {
    (
        proptest::collection::vec("[a-z]{1,10}", 1..60).prop_map(|words| words.join(" ")),
        (4usize..60).prop_flat_map(|size| (Just(size), 2..=size - 2)),
    )
        .prop_map(|(text, (size, overlap))| (text, size, overlap))
}

/// Windows SHALL cover the whole text, stay within `W` characters, and each
/// one SHALL start `O` characters before the previous one ends.
mod prop_window_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn spans_cover_text_with_fixed_overlap(
            text in "[a-zé \n]{0,300}",
            (size, overlap) in arb_window(),
        ) {
            let len = text.chars().count();
            let spans = window_spans(&text, size, overlap);

            if len == 0 {
                prop_assert!(spans.is_empty());
                return Ok(());
            }
            prop_assert_eq!(spans[0].start, 0);
            prop_assert_eq!(spans[spans.len() - 1].end, len);
            for span in &spans {
                prop_assert!(!span.is_empty());
                prop_assert!(span.len() <= size, "span {:?} longer than {}", span, size);
            }
            for pair in spans.windows(2) {
                prop_assert_eq!(pair[1].start + overlap, pair[0].end);
            }
        }

        #[test]
        fn windows_are_trimmed_spans_within_size(
            text in "[a-zé \n]{0,300}",
            (size, overlap) in arb_window(),
        ) {
            let chars: Vec<char> = text.chars().collect();
            let expected: Vec<String> = window_spans(&text, size, overlap)
                .into_iter()
                .map(|span| chars[span].iter().collect::<String>().trim().to_string())
                .filter(|w| !w.is_empty())
                .collect();
            let windows = split_windows(&text, size, overlap);

            for window in &windows {
                prop_assert!(window.chars().count() <= size);
            }
            prop_assert_eq!(windows, expected);
        }

        #[test]
        fn consecutive_windows_share_text(
            (text, size, overlap) in arb_sentence_and_window(),
        ) {
            let windows = split_windows(&text, size, overlap);
            let covered: usize = windows.iter().flat_map(|w| w.split(' ')).count();
            prop_assert!(covered >= text.split(' ').count());

            for pair in windows.windows(2) {
                let (a, b): (Vec<char>, Vec<char>) = (pair[0].chars().collect(), pair[1].chars().collect());
                let shared = (1..=a.len().min(b.len())).any(|l| a[a.len() - l..] == b[..l]);
                prop_assert!(shared, "{:?} and {:?} share no text", pair[0], pair[1]);
            }
        }
    }
}
