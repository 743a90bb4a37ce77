//! # Text Flow
//!
//! Width-driven line breaking for the bounded text boxes the report engine
//! draws. A logical line (one bullet of a text block) becomes one or more
//! physical lines that fit the box width; the box height caps how many
//! physical lines are drawn, and overflow is cut off with an ellipsis marker
//! rather than allowed to grow the box.
//!
//! Breaking is greedy and word-boundary based with a hard mid-word fallback,
//! which is all the short bulleted content in a report needs.

/// Marker appended to the last visible line when a text block is cut off.
pub const TRUNCATION_MARKER: &str = "...";

/// The physical lines that fit a box, plus whether anything was cut off.
///
/// Truncation is deliberate, silent data loss: it caps the worst-case box
/// height instead of growing the box. Callers that care can inspect
/// `truncated` — the drawing path does not.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapOutcome {
    pub lines: Vec<String>,
    pub truncated: bool,
}

/// Find the char index at which `text` must break to stay within `max_width`.
///
/// Accumulates character widths left to right, remembering the last
/// whitespace seen. The instant the cumulative width exceeds `max_width` the
/// last whitespace index is returned if there is one past position zero;
/// otherwise the current index, forcing a mid-word break instead of an
/// overflow. Returns the char count when the whole text fits.
///
/// The only input that yields 0 is a first character that alone exceeds
/// `max_width`; callers guarantee forward progress by taking at least one
/// char per emitted line.
pub fn find_break_point(text: &str, max_width: f64, width_of: impl Fn(char) -> f64) -> usize {
    let mut current_width = 0.0;
    let mut last_space: Option<usize> = None;
    let mut count = 0;

    for (i, ch) in text.chars().enumerate() {
        count = i + 1;
        current_width += width_of(ch);
        if ch.is_whitespace() {
            last_space = Some(i);
        }
        if current_width > max_width {
            return match last_space {
                Some(s) if s > 0 => s,
                _ => i,
            };
        }
    }
    count
}

/// Wrap a sequence of logical lines into a box of `box_width` x `box_height`,
/// one physical line per `line_height` of vertical budget.
///
/// Emits physical lines in order until the budget is exhausted; the moment it
/// is, the marker is appended to the last emitted line and everything after
/// it is dropped.
pub fn wrap_to_box(
    lines: &[String],
    box_width: f64,
    box_height: f64,
    line_height: f64,
    width_of: impl Fn(char) -> f64,
) -> WrapOutcome {
    let budget = if line_height > 0.0 {
        (box_height / line_height).floor() as usize
    } else {
        0
    };

    let mut out: Vec<String> = Vec::new();
    let mut truncated = false;

    'logical: for line in lines {
        let mut rest: String = line.clone();
        loop {
            if out.len() >= budget {
                truncated = true;
                break 'logical;
            }

            let chars: Vec<char> = rest.chars().collect();
            if chars.is_empty() {
                out.push(String::new());
                break;
            }

            let break_point = find_break_point(&rest, box_width, &width_of);
            // At least one char per line, so a pathologically narrow box
            // still terminates.
            let take = break_point.max(1).min(chars.len());

            let emitted: String = chars[..take].iter().collect();
            out.push(emitted.trim_end().to_string());

            if take >= chars.len() {
                break;
            }
            rest = chars[take..].iter().collect::<String>().trim_start().to_string();
            if rest.is_empty() {
                break;
            }
        }
    }

    if truncated {
        if let Some(last) = out.last_mut() {
            last.push_str(TRUNCATION_MARKER);
        }
    }

    WrapOutcome {
        lines: out,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every char 10pt wide, spaces included.
    fn flat(_: char) -> f64 {
        10.0
    }

    #[test]
    fn test_break_point_all_fits() {
        assert_eq!(find_break_point("hello", 100.0, flat), 5);
    }

    #[test]
    fn test_break_point_at_last_space() {
        // "hello world" overflows at 8 chars; last space is index 5.
        assert_eq!(find_break_point("hello world", 75.0, flat), 5);
    }

    #[test]
    fn test_break_point_mid_word_without_space() {
        // No whitespace at all: break exactly where the width runs out.
        assert_eq!(find_break_point("abcdefghij", 45.0, flat), 4);
    }

    #[test]
    fn test_break_point_leading_space_not_used() {
        // The only whitespace is index 0, which must not be returned.
        assert_eq!(find_break_point(" abcdefgh", 35.0, flat), 3);
    }

    #[test]
    fn test_break_point_zero_only_for_oversized_first_char() {
        assert_eq!(find_break_point("wide", 5.0, flat), 0);
        assert_ne!(find_break_point("ab cd", 15.0, flat), 0);
    }

    #[test]
    fn test_wrap_fits_exactly() {
        let lines = vec!["ab cd".to_string()];
        // 30pt wide box: "ab" then "cd", two lines of budget.
        let outcome = wrap_to_box(&lines, 25.0, 28.0, 14.0, flat);
        assert_eq!(outcome.lines, vec!["ab", "cd"]);
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_wrap_truncates_with_marker() {
        let lines = vec!["ab cd ef gh".to_string()];
        let outcome = wrap_to_box(&lines, 25.0, 28.0, 14.0, flat);
        assert_eq!(outcome.lines.len(), 2);
        assert!(outcome.truncated);
        assert!(
            outcome.lines.last().unwrap().ends_with(TRUNCATION_MARKER),
            "last visible line must end with the marker"
        );
    }

    #[test]
    fn test_wrap_multiple_logical_lines() {
        let lines = vec!["one".to_string(), "two".to_string()];
        let outcome = wrap_to_box(&lines, 100.0, 42.0, 14.0, flat);
        assert_eq!(outcome.lines, vec!["one", "two"]);
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_wrap_zero_budget() {
        let lines = vec!["content".to_string()];
        let outcome = wrap_to_box(&lines, 100.0, 10.0, 14.0, flat);
        assert!(outcome.lines.is_empty());
        assert!(outcome.truncated);
    }

    #[test]
    fn test_wrap_narrow_box_terminates() {
        // Every char wider than the box: must still terminate, one char per line.
        let lines = vec!["abc".to_string()];
        let outcome = wrap_to_box(&lines, 5.0, 140.0, 14.0, flat);
        assert_eq!(outcome.lines, vec!["a", "b", "c"]);
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_wrap_empty_logical_line_takes_one_slot() {
        let lines = vec![String::new(), "x".to_string()];
        let outcome = wrap_to_box(&lines, 100.0, 28.0, 14.0, flat);
        assert_eq!(outcome.lines, vec!["", "x"]);
        assert!(!outcome.truncated);
    }
}
