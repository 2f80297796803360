//! Match scanning over the composite view.
//!
//! Each pass snapshots the composite value, scans it with one pattern (or a
//! validated range list), consults the filter hook per candidate, and hands
//! accepted spans to the wrapper. The snapshot never changes during the
//! pass; the segment table carries all offset corrections, so match
//! positions from the scan remain valid against the mutating tree.

use regex::Regex;

use crate::annotate::ranges::{MarkRange, validate_ranges};
use crate::annotate::wrapper::{wrap_composite_range, wrap_composite_range_overlapping};
use crate::callbacks::{EachDetail, Filtering, MarkHooks, MarkSummary, MatchCandidate, NoMatchReason};
use crate::compose::CompositeView;
use crate::config::MarkConfig;
use crate::error::Result;
use crate::pattern::{Pattern, top_level_groups};
use crate::tree::node::Document;

/// Run one keyword pass: scan the composite value with a built pattern and
/// annotate every accepted match. Returns the number of logical matches.
pub fn run_term_pass(
    doc: &mut Document,
    view: &mut CompositeView,
    pattern: &Pattern,
    term: &str,
    config: &MarkConfig,
    hooks: &mut MarkHooks<'_>,
    summary: &mut MarkSummary,
) -> Result<usize> {
    let haystack = view.value.clone();
    let mut matches = 0usize;

    for caps in pattern.regex.captures_iter(&haystack) {
        let Some(m) = caps.get(pattern.term_group) else {
            continue;
        };
        if m.start() == m.end() {
            continue;
        }
        if !pattern.boundary_ok(&haystack, m.end()) {
            continue;
        }

        let Some(node) = owning_node(view, m.start()) else {
            continue;
        };
        let candidate = MatchCandidate {
            text: m.as_str(),
            node,
            term,
            match_count: matches,
        };
        match hooks.filter(doc, &candidate) {
            Filtering::Halt => break,
            Filtering::Skip => continue,
            Filtering::Keep => {}
        }

        let match_count = matches + 1;
        let each = |doc: &mut Document, mark, first| {
            hooks.each(
                doc,
                mark,
                &EachDetail {
                    term: term.to_string(),
                    match_start: first,
                    match_count,
                },
            );
        };
        // cached views must keep earlier text addressable for later terms,
        // which needs exact record replacement instead of in-place re-basing
        let created = if config.cache_text_nodes {
            wrap_composite_range_overlapping(doc, view, m.start(), m.end(), config, false, each)?
        } else {
            wrap_composite_range(doc, view, m.start(), m.end(), config, each)?
        };
        if created > 0 {
            matches += 1;
            summary.total_marks += created;
            summary.total_matches += 1;
            *summary.term_counts.entry(term.to_string()).or_insert(0) += 1;
        }
    }
    Ok(matches)
}

/// Run one caller-regex pass. Which span gets annotated per match depends on
/// the group options: every top-level capture with `separate_groups`, capture
/// `ignore_groups + 1` when groups are ignored, the whole match otherwise.
pub fn run_regex_pass(
    doc: &mut Document,
    view: &mut CompositeView,
    regex: &Regex,
    config: &MarkConfig,
    hooks: &mut MarkHooks<'_>,
    summary: &mut MarkSummary,
) -> Result<usize> {
    let haystack = view.value.clone();
    let source = regex.as_str();
    let groups: Vec<usize> = if config.separate_groups {
        let top = top_level_groups(source);
        if top.is_empty() { vec![0] } else { top }
    } else if config.ignore_groups > 0 {
        vec![config.ignore_groups + 1]
    } else {
        vec![0]
    };

    let mut matches = 0usize;
    let mut halted = false;
    for caps in regex.captures_iter(&haystack) {
        if halted {
            break;
        }
        for &group in &groups {
            let Some(m) = caps.get(group) else {
                continue;
            };
            if m.start() == m.end() {
                continue;
            }

            let Some(node) = owning_node(view, m.start()) else {
                continue;
            };
            let candidate = MatchCandidate {
                text: m.as_str(),
                node,
                term: source,
                match_count: matches,
            };
            match hooks.filter(doc, &candidate) {
                Filtering::Halt => {
                    halted = true;
                    break;
                }
                Filtering::Skip => continue,
                Filtering::Keep => {}
            }

            let match_count = matches + 1;
            let each = |doc: &mut Document, mark, first| {
                hooks.each(
                    doc,
                    mark,
                    &EachDetail {
                        term: source.to_string(),
                        match_start: first,
                        match_count,
                    },
                );
            };
            let created = if config.wrap_all_ranges {
                wrap_composite_range_overlapping(
                    doc, view, m.start(), m.end(), config, true, each,
                )?
            } else {
                wrap_composite_range(doc, view, m.start(), m.end(), config, each)?
            };
            if created > 0 {
                matches += 1;
                summary.total_marks += created;
                summary.total_matches += 1;
                *summary.term_counts.entry(source.to_string()).or_insert(0) += 1;
            }
        }
    }
    Ok(matches)
}

/// Run one explicit-range pass. Invalid and dropped ranges are reported via
/// `no_match` with their original bounds; accepted ranges that end up
/// annotating nothing (already-consumed text) are reported the same way.
pub fn run_ranges_pass(
    doc: &mut Document,
    view: &mut CompositeView,
    ranges: &[MarkRange],
    config: &MarkConfig,
    hooks: &mut MarkHooks<'_>,
    summary: &mut MarkSummary,
) -> Result<usize> {
    let haystack = view.value.clone();
    let validated = validate_ranges(ranges, &haystack, config.wrap_all_ranges);
    for range in &validated.rejected {
        hooks.no_match(&NoMatchReason::Range(*range));
    }

    let mut matches = 0usize;
    for range in validated.accepted {
        let text = &haystack[range.start..range.end()];
        let Some(node) = owning_node(view, range.start) else {
            hooks.no_match(&NoMatchReason::Range(range));
            continue;
        };
        let candidate = MatchCandidate {
            text,
            node,
            term: text,
            match_count: matches,
        };
        match hooks.filter(doc, &candidate) {
            Filtering::Halt => break,
            Filtering::Skip => continue,
            Filtering::Keep => {}
        }

        let match_count = matches + 1;
        let each = |doc: &mut Document, mark, first| {
            hooks.each(
                doc,
                mark,
                &EachDetail {
                    term: text.to_string(),
                    match_start: first,
                    match_count,
                },
            );
        };
        let created = if config.wrap_all_ranges {
            wrap_composite_range_overlapping(
                doc, view, range.start, range.end(), config, true, each,
            )?
        } else {
            wrap_composite_range(doc, view, range.start, range.end(), config, each)?
        };
        if created > 0 {
            matches += 1;
            summary.total_marks += created;
            summary.total_matches += 1;
        } else {
            hooks.no_match(&NoMatchReason::Range(range));
        }
    }
    Ok(matches)
}

fn owning_node(view: &CompositeView, pos: usize) -> Option<crate::tree::node::NodeId> {
    view.segment_at_unordered(pos).map(|idx| view.segments[idx].node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternBuilder;
    use crate::tree::MARKER_ATTRIBUTE;
    use crate::tree::node::NodeId;

    fn single_node(text: &str) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        let t = doc.append_text(p, text);
        (doc, vec![t])
    }

    fn mark_texts(doc: &Document) -> Vec<String> {
        doc.descendants(doc.root())
            .filter(|&id| doc.attribute(id, MARKER_ATTRIBUTE).is_some())
            .map(|id| doc.text_content(id))
            .collect()
    }

    #[test]
    fn test_term_pass_counts_and_wraps() {
        let (mut doc, nodes) = single_node("ipsum high ipsum");
        let config = MarkConfig::default();
        let pattern = PatternBuilder::new(&config).build("ipsum").unwrap();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut hooks = MarkHooks::new();
        let mut summary = MarkSummary::default();
        let n = run_term_pass(
            &mut doc, &mut view, &pattern, "ipsum", &config, &mut hooks, &mut summary,
        )
        .unwrap();
        assert_eq!(n, 2);
        assert_eq!(summary.total_marks, 2);
        assert_eq!(summary.total_matches, 2);
        assert_eq!(summary.term_counts.get("ipsum"), Some(&2));
        assert_eq!(mark_texts(&doc), vec!["ipsum", "ipsum"]);
    }

    #[test]
    fn test_filter_skip_and_halt() {
        let (mut doc, nodes) = single_node("a b a b a");
        let config = MarkConfig::default();
        let pattern = PatternBuilder::new(&config).build("a").unwrap();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut summary = MarkSummary::default();
        let mut seen = 0;
        let mut hooks = MarkHooks::new().with_filter(move |_, c| {
            seen += 1;
            match seen {
                1 => Filtering::Skip,
                2 => {
                    assert_eq!(c.match_count, 0);
                    Filtering::Keep
                }
                _ => Filtering::Halt,
            }
        });
        let n = run_term_pass(
            &mut doc, &mut view, &pattern, "a", &config, &mut hooks, &mut summary,
        )
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(mark_texts(&doc).len(), 1);
    }

    #[test]
    fn test_each_reports_match_start_across_nodes() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        let s1 = doc.append_element(p, "span");
        let t1 = doc.append_text(s1, "Lorem ip");
        let s2 = doc.append_element(p, "span");
        let t2 = doc.append_text(s2, "sum dolor");
        let config = MarkConfig::default()
            .with_across_elements(true)
            .with_separate_word_search(false);
        let pattern = PatternBuilder::new(&config).build("ipsum").unwrap();
        let mut view = CompositeView::build(&doc, &[t1, t2], &config, true);

        let mut details: Vec<(bool, usize)> = Vec::new();
        let mut hooks =
            MarkHooks::new().with_each(|_, _, d| details.push((d.match_start, d.match_count)));
        let mut summary = MarkSummary::default();
        let n = run_term_pass(
            &mut doc, &mut view, &pattern, "ipsum", &config, &mut hooks, &mut summary,
        )
        .unwrap();
        drop(hooks);
        assert_eq!(n, 1);
        assert_eq!(summary.total_matches, 1);
        assert_eq!(summary.total_marks, 2);
        assert_eq!(details, vec![(true, 1), (false, 1)]);
        assert_eq!(mark_texts(&doc), vec!["ip", "sum"]);
    }

    #[test]
    fn test_regex_pass_whole_match() {
        let (mut doc, nodes) = single_node("call 555-1234 now");
        let config = MarkConfig::default();
        let regex = Regex::new(r"\d{3}-\d{4}").unwrap();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut hooks = MarkHooks::new();
        let mut summary = MarkSummary::default();
        let n = run_regex_pass(&mut doc, &mut view, &regex, &config, &mut hooks, &mut summary)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(mark_texts(&doc), vec!["555-1234"]);
    }

    #[test]
    fn test_regex_pass_ignore_groups() {
        let (mut doc, nodes) = single_node("key: value");
        let config = MarkConfig::default().with_ignore_groups(1);
        let regex = Regex::new(r"(\w+): (\w+)").unwrap();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut hooks = MarkHooks::new();
        let mut summary = MarkSummary::default();
        run_regex_pass(&mut doc, &mut view, &regex, &config, &mut hooks, &mut summary).unwrap();
        assert_eq!(mark_texts(&doc), vec!["value"]);
    }

    #[test]
    fn test_regex_pass_separate_groups() {
        let (mut doc, nodes) = single_node("from 10 to 20");
        let config = MarkConfig::default().with_separate_groups(true);
        let regex = Regex::new(r"from (\d+) to (\d+)").unwrap();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut hooks = MarkHooks::new();
        let mut summary = MarkSummary::default();
        let n = run_regex_pass(&mut doc, &mut view, &regex, &config, &mut hooks, &mut summary)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(mark_texts(&doc), vec!["10", "20"]);
    }

    #[test]
    fn test_zero_length_matches_are_skipped() {
        let (mut doc, nodes) = single_node("abc");
        let config = MarkConfig::default();
        let regex = Regex::new(r"x*").unwrap();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut hooks = MarkHooks::new();
        let mut summary = MarkSummary::default();
        let n = run_regex_pass(&mut doc, &mut view, &regex, &config, &mut hooks, &mut summary)
            .unwrap();
        assert_eq!(n, 0);
        assert!(mark_texts(&doc).is_empty());
    }

    #[test]
    fn test_ranges_pass_reports_rejections() {
        let (mut doc, nodes) = single_node("Lorem ipsum");
        let config = MarkConfig::default();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut rejected = Vec::new();
        let mut hooks = MarkHooks::new().with_no_match(|r| {
            if let NoMatchReason::Range(range) = r {
                rejected.push(*range);
            }
        });
        let mut summary = MarkSummary::default();
        let ranges = [MarkRange::new(6, 5), MarkRange::new(40, 2)];
        let n = run_ranges_pass(
            &mut doc, &mut view, &ranges, &config, &mut hooks, &mut summary,
        )
        .unwrap();
        drop(hooks);
        assert_eq!(n, 1);
        assert_eq!(rejected, vec![MarkRange::new(40, 2)]);
        assert_eq!(mark_texts(&doc), vec!["ipsum"]);
    }

    #[test]
    fn test_ranges_pass_clamps_to_text_length() {
        let (mut doc, nodes) = single_node("Lorem");
        let config = MarkConfig::default();
        let mut view = CompositeView::build(&doc, &nodes, &config, false);
        let mut hooks = MarkHooks::new();
        let mut summary = MarkSummary::default();
        let n = run_ranges_pass(
            &mut doc,
            &mut view,
            &[MarkRange::new(3, 10)],
            &config,
            &mut hooks,
            &mut summary,
        )
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(mark_texts(&doc), vec!["em"]);
    }
}
