//! The public mark/unmark facade.
//!
//! A [`Marker`] binds one [`MarkConfig`] and exposes the four operations:
//! keyword marking, regex marking, explicit-range marking and unmarking.
//! Terms are processed strictly one after another; each term runs as its own
//! pass over a freshly built (or cached and re-based) composite view, so a
//! later term sees the tree exactly as the previous term left it.

use regex::Regex;
use tracing::debug;

use crate::annotate::engine::{run_ranges_pass, run_regex_pass, run_term_pass};
use crate::annotate::ranges::MarkRange;
use crate::annotate::unwrap;
use crate::callbacks::{MarkHooks, MarkSummary, NoMatchReason};
use crate::compose::CompositeView;
use crate::config::MarkConfig;
use crate::error::Result;
use crate::pattern::PatternBuilder;
use crate::tree::iterator::{Context, TreeWalk, WalkConfig, resolve_contexts};
use crate::tree::node::Document;

/// Annotates and un-annotates matches in a document tree.
///
/// ```
/// use textmark::config::MarkConfig;
/// use textmark::callbacks::MarkHooks;
/// use textmark::marker::Marker;
/// use textmark::tree::{Context, Document};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> textmark::error::Result<()> {
/// let mut doc = Document::new();
/// let p = doc.append_element(doc.root(), "p");
/// doc.append_text(p, "Lorem ipsum dolor");
///
/// let marker = Marker::new(MarkConfig::default());
/// let summary = marker
///     .mark(&mut doc, &[Context::Root], &["ipsum".to_string()], &mut MarkHooks::new())
///     .await?;
/// assert_eq!(summary.total_matches, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Marker {
    config: MarkConfig,
}

impl Marker {
    /// Create a marker with the given configuration.
    pub fn new(config: MarkConfig) -> Self {
        Marker { config }
    }

    /// The bound configuration.
    pub fn config(&self) -> &MarkConfig {
        &self.config
    }

    /// Annotate every occurrence of the given keywords.
    ///
    /// With `separate_word_search` (the default) multi-word terms are split
    /// on whitespace and each word searched independently; terms are
    /// deduplicated and processed longest first. A term with zero matches
    /// fires the `no_match` hook. The summary is also handed to the `done`
    /// hook before returning.
    pub async fn mark(
        &self,
        doc: &mut Document,
        contexts: &[Context],
        terms: &[String],
        hooks: &mut MarkHooks<'_>,
    ) -> Result<MarkSummary> {
        let roots = resolve_contexts(doc, contexts)?;
        let walk = WalkConfig::from_config(&self.config, true)?;
        let terms = prepare_terms(terms, self.config.separate_word_search);
        let mut summary = MarkSummary::default();
        if self.config.debug {
            debug!(terms = terms.len(), roots = roots.len(), "starting keyword pass");
        }

        let cross = self.config.across_elements;
        let mut cached: Option<CompositeView> = None;
        for term in &terms {
            let pattern = PatternBuilder::new(&self.config).build(term)?;
            let mut view = match cached.take() {
                Some(mut view) if self.config.cache_text_nodes => {
                    view.reset_cursors();
                    view
                }
                _ => {
                    let nodes = TreeWalk::collect_text_nodes(doc, &roots, &walk).await;
                    CompositeView::build(doc, &nodes, &self.config, cross)
                }
            };
            let matched =
                run_term_pass(doc, &mut view, &pattern, term, &self.config, hooks, &mut summary)?;
            if matched == 0 {
                hooks.no_match(&NoMatchReason::Term(term.clone()));
            }
            if self.config.debug {
                debug!(term = term.as_str(), matched, "keyword pass finished");
            }
            cached = Some(view);
        }

        hooks.done(&summary);
        Ok(summary)
    }

    /// Annotate every match of a caller-supplied regex.
    ///
    /// The regex is used as given; term normalization (synonyms, diacritics,
    /// accuracy) does not apply. Group handling follows `separate_groups`
    /// and `ignore_groups`.
    pub async fn mark_regexp(
        &self,
        doc: &mut Document,
        contexts: &[Context],
        regex: &Regex,
        hooks: &mut MarkHooks<'_>,
    ) -> Result<MarkSummary> {
        let roots = resolve_contexts(doc, contexts)?;
        let walk = WalkConfig::from_config(&self.config, true)?;
        let nodes = TreeWalk::collect_text_nodes(doc, &roots, &walk).await;
        let mut view = CompositeView::build(doc, &nodes, &self.config, self.config.across_elements);

        let mut summary = MarkSummary::default();
        let matched = run_regex_pass(doc, &mut view, regex, &self.config, hooks, &mut summary)?;
        if matched == 0 {
            hooks.no_match(&NoMatchReason::Term(regex.as_str().to_string()));
        }
        hooks.done(&summary);
        Ok(summary)
    }

    /// Annotate explicit byte ranges of the flattened text.
    ///
    /// The view is a plain concatenation of the text nodes (no synthetic
    /// boundaries), so range offsets address exactly the bytes of
    /// `Document::text_content` over the search scope. Invalid, overlapping
    /// (without `wrap_all_ranges`) and empty ranges are reported through
    /// `no_match` and skipped.
    pub async fn mark_ranges(
        &self,
        doc: &mut Document,
        contexts: &[Context],
        ranges: &[MarkRange],
        hooks: &mut MarkHooks<'_>,
    ) -> Result<MarkSummary> {
        let roots = resolve_contexts(doc, contexts)?;
        let walk = WalkConfig::from_config(&self.config, true)?;
        let nodes = TreeWalk::collect_text_nodes(doc, &roots, &walk).await;
        let mut view = CompositeView::build(doc, &nodes, &self.config, false);

        let mut summary = MarkSummary::default();
        run_ranges_pass(doc, &mut view, ranges, &self.config, hooks, &mut summary)?;
        hooks.done(&summary);
        Ok(summary)
    }

    /// Remove every annotation element previously created with this
    /// configuration's element name. Returns the number removed.
    pub async fn unmark(&self, doc: &mut Document, contexts: &[Context]) -> Result<usize> {
        let roots = resolve_contexts(doc, contexts)?;
        unwrap::unmark(doc, &roots, &self.config).await
    }
}

/// Split (when enabled), trim, deduplicate and order the search terms.
/// Longer terms run first so they win positions a shorter term would
/// otherwise consume.
fn prepare_terms(terms: &[String], separate_words: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        if separate_words {
            for word in term.split_whitespace() {
                if !out.iter().any(|t| t == word) {
                    out.push(word.to_string());
                }
            }
        } else {
            let trimmed = term.trim();
            if !trimmed.is_empty() && !out.iter().any(|t| t == trimmed) {
                out.push(trimmed.to_string());
            }
        }
    }
    out.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    out
}
