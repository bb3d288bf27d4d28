//! Property-based tests for path naming and change detection.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{sanitize_title, ILLEGAL_PATH_CHARS};
    use crate::rule::SubstitutionRule;
    use proptest::prelude::*;

    // ============================================================================
    // sanitize_title property tests
    // ============================================================================

    proptest! {
        /// Property: sanitize_title never leaves an illegal character behind
        #[test]
        fn sanitize_title_never_produces_illegal_chars(input in ".*") {
            let result = sanitize_title(&input);
            for ch in ILLEGAL_PATH_CHARS {
                prop_assert!(
                    !result.contains(ch),
                    "sanitize_title left '{}' in output from input '{}'",
                    ch,
                    input
                );
            }
        }

        /// Property: sanitize_title is exactly "drop the illegal characters"
        #[test]
        fn sanitize_title_only_removes_illegal_chars(input in ".*") {
            let expected: String = input
                .chars()
                .filter(|c| !ILLEGAL_PATH_CHARS.contains(c))
                .collect();
            prop_assert_eq!(sanitize_title(&input), expected);
        }

        /// Property: titles without illegal characters pass through unchanged
        #[test]
        fn sanitize_title_preserves_clean_titles(input in "[a-zA-Z0-9 _.()-]*") {
            prop_assert_eq!(sanitize_title(&input), input);
        }

        /// Property: sanitizing twice is the same as sanitizing once
        #[test]
        fn sanitize_title_is_idempotent(input in ".*") {
            let once = sanitize_title(&input);
            prop_assert_eq!(sanitize_title(&once), once.clone());
        }
    }

    // ============================================================================
    // line matching property tests
    // ============================================================================

    proptest! {
        /// Property: a literal word is found iff some line contains it,
        /// honouring case sensitivity
        #[test]
        fn text_has_match_agrees_with_line_search(
            lines in prop::collection::vec("[a-zA-Z ]{0,20}", 0..8),
            word in "[a-zA-Z]{1,6}",
            ignore_case in any::<bool>(),
        ) {
            let content = lines.join("\n");
            let rule = SubstitutionRule::new(word.clone(), "").ignore_case(ignore_case);
            let expected = lines.iter().any(|line| {
                if ignore_case {
                    line.to_lowercase().contains(&word.to_lowercase())
                } else {
                    line.contains(&word)
                }
            });
            prop_assert_eq!(rule.text_has_match(&content).unwrap(), expected);
        }
    }
}
