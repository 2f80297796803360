//! Validation of caller-supplied annotation ranges.
//!
//! Ranges address byte offsets in the composite text of a pass. Before any
//! tree mutation happens they are sorted, clamped against the composite
//! length and checked for overlap; every range dropped here is reported back
//! through the `no_match` hook instead of failing the call.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A caller-supplied byte range over the composite text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRange {
    /// Start offset in bytes.
    pub start: usize,
    /// Length in bytes.
    pub length: usize,
}

impl MarkRange {
    /// Construct a range.
    pub fn new(start: usize, length: usize) -> Self {
        MarkRange { start, length }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Result of validating one batch of ranges.
#[derive(Debug, Default)]
pub struct ValidatedRanges {
    /// Ranges that will be annotated, sorted by start.
    pub accepted: Vec<MarkRange>,
    /// Ranges dropped during validation, in input order, each reported with
    /// the original (unclamped) bounds.
    pub rejected: Vec<MarkRange>,
}

/// Sort, clamp and de-conflict ranges against the composite text.
///
/// - a range starting at or beyond the end of the text is rejected;
/// - a range reaching past the end is clamped to the text length;
/// - zero-length ranges (before or after clamping) are rejected;
/// - offsets must fall on char boundaries of the composite text;
/// - unless `allow_overlap` is set, a range overlapping an earlier accepted
///   one is rejected.
pub fn validate_ranges(ranges: &[MarkRange], text: &str, allow_overlap: bool) -> ValidatedRanges {
    let total = text.len();
    let mut sorted: Vec<MarkRange> = ranges.to_vec();
    sorted.sort_by_key(|r| (r.start, r.length));

    let mut out = ValidatedRanges::default();
    let mut last_end = 0usize;
    for range in sorted {
        if range.length == 0 || range.start >= total {
            out.rejected.push(range);
            continue;
        }
        let clamped = MarkRange {
            start: range.start,
            length: range.length.min(total - range.start),
        };
        if clamped.length < range.length {
            debug!(
                start = range.start,
                length = range.length,
                clamped = clamped.length,
                "range clamped to text length"
            );
        }
        if !text.is_char_boundary(clamped.start) || !text.is_char_boundary(clamped.end()) {
            out.rejected.push(range);
            continue;
        }
        if !allow_overlap && clamped.start < last_end {
            out.rejected.push(range);
            continue;
        }
        last_end = last_end.max(clamped.end());
        out.accepted.push(clamped);
    }
    out
}
