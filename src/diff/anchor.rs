//! Divergence classification
//!
//! Both buffers are walked in lockstep. Where they disagree, the anchor at
//! the current position of each side (a word, its trailing whitespace and
//! the first char of the next word) is searched for further along the
//! other side. Finding the old anchor later in the new buffer means text
//! was inserted; finding the new anchor later in the old buffer means text
//! was removed. When neither is found the range is a mutation.

use std::thread;

use super::{DiffKind, DiffOptions, TextDiff};

/// Compute the divergent ranges between two buffers
pub fn difference(old: &str, new: &str) -> Vec<TextDiff> {
    difference_with(old, new, &DiffOptions::default())
}

/// [`difference`] with explicit options
pub fn difference_with(old: &str, new: &str, options: &DiffOptions) -> Vec<TextDiff> {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    diff_chars(&old, &new, options)
}

pub(crate) fn diff_chars(old: &[char], new: &[char], options: &DiffOptions) -> Vec<TextDiff> {
    let mut diffs = Vec::new();
    let (mut i, mut j) = (0, 0);

    loop {
        while i < old.len() && j < new.len() && old[i] == new[j] {
            i += 1;
            j += 1;
        }

        match (i < old.len(), j < new.len()) {
            (false, false) => break,
            (false, true) => {
                diffs.push(TextDiff::new(DiffKind::Insertion, j, new.len()));
                break;
            }
            (true, false) => {
                diffs.push(TextDiff::new(DiffKind::Removal, i, old.len()));
                break;
            }
            (true, true) => {
                let diff = classify(old, new, i, j, options);
                match diff.kind {
                    DiffKind::Insertion => j = diff.end,
                    DiffKind::Removal => i = diff.end,
                    DiffKind::Mutation => {
                        i += diff.len();
                        j = diff.end;
                    }
                }
                diffs.push(diff);
            }
        }
    }

    tracing::trace!(count = diffs.len(), "computed difference");
    diffs
}

/// Length of the anchor starting at `start`.
///
/// Leading whitespace, a word, the whitespace after it and the first char
/// of the following word. Runs to the end of the buffer when no following
/// word exists.
pub fn anchor_len(buf: &[char], start: usize) -> usize {
    let Some(rest) = buf.get(start..) else {
        return 0;
    };

    let mut in_word = false;
    let mut in_space = false;
    for (k, c) in rest.iter().enumerate() {
        if !c.is_whitespace() {
            if !in_word {
                in_word = true;
            } else if in_space {
                return k + 1;
            }
        } else if in_word {
            in_space = true;
        }
    }
    rest.len()
}

/// First offset at or after `from` where `needle` occurs
fn find_from(haystack: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Classify the divergence starting at `old[i]` / `new[j]`
fn classify(old: &[char], new: &[char], i: usize, j: usize, options: &DiffOptions) -> TextDiff {
    let old_anchor = &old[i..i + anchor_len(old, i)];
    let new_anchor = &new[j..j + anchor_len(new, j)];

    let scan_insertion = || find_from(new, j + 1, old_anchor).map(|k| TextDiff::new(DiffKind::Insertion, j, k));
    let scan_removal = || find_from(old, i + 1, new_anchor).map(|k| TextDiff::new(DiffKind::Removal, i, k));

    let remaining = (old.len() - i) + (new.len() - j);
    let (insertion, removal) = if remaining >= options.parallel_threshold {
        thread::scope(|s| {
            let handle = s.spawn(scan_insertion);
            let removal = scan_removal();
            let insertion = handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            (insertion, removal)
        })
    } else {
        (scan_insertion(), scan_removal())
    };

    match (insertion, removal) {
        // Smaller end wins, ties go to the insertion
        (Some(ins), Some(rem)) => {
            if ins.end <= rem.end {
                ins
            } else {
                rem
            }
        }
        (Some(ins), None) => ins,
        (None, Some(rem)) => rem,
        (None, None) => {
            let mut n = 1;
            while i + n < old.len() && j + n < new.len() && old[i + n] != new[j + n] {
                n += 1;
            }
            TextDiff::new(DiffKind::Mutation, j, j + n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_anchor_len() {
        assert_eq!(anchor_len(&chars("hello world"), 0), 7);
        assert_eq!(anchor_len(&chars("  hello  world"), 0), 10);
        assert_eq!(anchor_len(&chars("hello"), 0), 5);
        assert_eq!(anchor_len(&chars("hello "), 0), 6);
        assert_eq!(anchor_len(&chars("ab"), 5), 0);
    }

    #[test]
    fn test_identical_buffers() {
        assert!(difference("same text", "same text").is_empty());
        assert!(difference("", "").is_empty());
    }

    #[test]
    fn test_empty_sides() {
        assert_eq!(difference("", "abc"), vec![TextDiff::new(DiffKind::Insertion, 0, 3)]);
        assert_eq!(difference("abc", ""), vec![TextDiff::new(DiffKind::Removal, 0, 3)]);
    }

    #[test]
    fn test_word_insertion() {
        assert_eq!(
            difference("Hello World", "Hello Brave World"),
            vec![TextDiff::new(DiffKind::Insertion, 6, 12)]
        );
    }

    #[test]
    fn test_word_removal() {
        assert_eq!(
            difference("Hello Brave World", "Hello World"),
            vec![TextDiff::new(DiffKind::Removal, 6, 12)]
        );
    }

    #[test]
    fn test_mutation() {
        assert_eq!(difference("ab cd", "ab xd"), vec![TextDiff::new(DiffKind::Mutation, 3, 4)]);
        assert_eq!(difference("abc", "xbc"), vec![TextDiff::new(DiffKind::Mutation, 0, 1)]);
    }

    #[test]
    fn test_appended_tail() {
        assert_eq!(difference("50%", "50%!"), vec![TextDiff::new(DiffKind::Insertion, 3, 4)]);
    }

    #[test]
    fn test_truncated_tail() {
        assert_eq!(difference("progress 100", "progress 1"), vec![TextDiff::new(DiffKind::Removal, 10, 12)]);
    }

    #[test]
    fn test_both_scans_match_smaller_end_wins() {
        // After the leading insertion the walk diverges at old[3] / new[5],
        // where an insertion [5,6) and a removal [3,4) both find anchors
        let old = chars("a ba a a  ");
        let new = chars("  a b a ab   ");
        let options = DiffOptions::default();
        assert_eq!(classify(&old, &new, 3, 5, &options), TextDiff::new(DiffKind::Removal, 3, 4));

        assert_eq!(
            difference("a ba a a  ", "  a b a ab   "),
            vec![
                TextDiff::new(DiffKind::Insertion, 0, 2),
                TextDiff::new(DiffKind::Removal, 3, 4),
                TextDiff::new(DiffKind::Insertion, 9, 10),
                TextDiff::new(DiffKind::Insertion, 12, 13),
            ]
        );
    }

    #[test]
    fn test_both_scans_equal_end_prefers_insertion() {
        // Insertion [0,1) and removal [0,1) both end at 1
        assert_eq!(difference(" a a", "a a a"), vec![TextDiff::new(DiffKind::Insertion, 0, 1)]);
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        let old = "word ".repeat(100) + "tail end";
        let new = "word ".repeat(100) + "new tail end";
        let sequential = difference_with(&old, &new, &DiffOptions { parallel_threshold: usize::MAX });
        let parallel = difference_with(&old, &new, &DiffOptions { parallel_threshold: 0 });
        assert_eq!(sequential, parallel);
        assert_eq!(sequential, vec![TextDiff::new(DiffKind::Insertion, 500, 504)]);
    }
}
