//! Source-level classification of capture groups.
//!
//! Per-group annotation must annotate only the outermost capturing groups of
//! a caller-supplied pattern, ignoring groups nested inside another capture.
//! The regex engine numbers every capturing group but does not say which are
//! top-level, so this module scans the pattern source itself.

/// Return the 1-based indices of the top-level capturing groups of a regex
/// source string, in source order.
///
/// A group is top-level when it is not nested inside another capturing
/// group (non-capturing and lookaround groups do not count as nesting
/// levels). Escaped parentheses and parentheses inside character classes are
/// inert.
pub fn top_level_groups(source: &str) -> Vec<usize> {
    let chars: Vec<char> = source.chars().collect();
    let mut indices = Vec::new();
    // for each open paren: true if it opened a capturing group
    let mut stack: Vec<bool> = Vec::new();
    let mut capturing_depth = 0usize;
    let mut group_number = 0usize;
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                // escaped character, skip the pair
                i += 1;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                let capturing = is_capturing(&chars, i);
                if capturing {
                    group_number += 1;
                    if capturing_depth == 0 {
                        indices.push(group_number);
                    }
                    capturing_depth += 1;
                }
                stack.push(capturing);
            }
            ')' if !in_class => {
                if let Some(capturing) = stack.pop() {
                    if capturing {
                        capturing_depth = capturing_depth.saturating_sub(1);
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    indices
}

/// Decide whether the `(` at `open` starts a capturing group.
///
/// `(?:`, `(?=`, `(?!`, `(?<=`, `(?<!` and flag groups `(?flags)` are
/// non-capturing; `(?<name>` and `(?P<name>` are capturing; a bare `(` is
/// capturing.
fn is_capturing(chars: &[char], open: usize) -> bool {
    match chars.get(open + 1) {
        Some('?') => match chars.get(open + 2) {
            Some('<') => !matches!(chars.get(open + 3), Some('=') | Some('!')),
            Some('P') => matches!(chars.get(open + 3), Some('<')),
            _ => false,
        },
        _ => true,
    }
}
