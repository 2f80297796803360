//! Configuration for mark/unmark operations.
//!
//! A [`MarkConfig`] is an immutable value constructed once per public call
//! and threaded through every internal operation. Nothing mutates it after
//! construction, so sequential term passes can never bleed options into each
//! other.

use std::time::Duration;

use ahash::AHashMap;

/// Boundary policy for keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyMode {
    /// Match anywhere, including inside words. The default.
    Partially,
    /// Widen partial matches to the enclosing word.
    Complementary,
    /// Only whole words/phrases, delimited by boundary characters.
    Exactly,
}

/// Accuracy mode plus optional custom limiter characters.
///
/// When `limiters` is empty, `Complementary` falls back to whitespace plus a
/// fixed punctuation set, and `Exactly` to whitespace only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accuracy {
    /// The boundary mode.
    pub mode: AccuracyMode,
    /// Caller-supplied boundary characters.
    pub limiters: Vec<char>,
}

impl Accuracy {
    /// Match anywhere (default).
    pub fn partially() -> Self {
        Accuracy {
            mode: AccuracyMode::Partially,
            limiters: Vec::new(),
        }
    }

    /// Widen matches to the enclosing word.
    pub fn complementary() -> Self {
        Accuracy {
            mode: AccuracyMode::Complementary,
            limiters: Vec::new(),
        }
    }

    /// Whole words/phrases only.
    pub fn exactly() -> Self {
        Accuracy {
            mode: AccuracyMode::Exactly,
            limiters: Vec::new(),
        }
    }

    /// Attach custom limiter characters to this accuracy.
    pub fn with_limiters(mut self, limiters: Vec<char>) -> Self {
        self.limiters = limiters;
        self
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Accuracy::partially()
    }
}

/// Wildcard handling in search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wildcards {
    /// `?` and `*` are ordinary characters. The default.
    #[default]
    Disabled,
    /// `?` matches zero or one non-space character, `*` zero or more.
    Enabled,
    /// Like `Enabled`, but the wildcard classes also cover whitespace.
    WithSpaces,
}

/// Synthetic boundary insertion between block-level elements when matching
/// across elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBoundary {
    /// Whether block boundaries are inserted at all.
    pub enabled: bool,
    /// The marker character inserted before the separating space.
    pub boundary_char: char,
    /// Element names treated as block-level in addition to the built-in set.
    pub extra_elements: Vec<String>,
}

impl Default for BlockBoundary {
    fn default() -> Self {
        BlockBoundary {
            enabled: false,
            boundary_char: '\u{1}',
            extra_elements: Vec::new(),
        }
    }
}

/// Immutable configuration for one mark/unmark call.
///
/// Built with [`MarkConfig::default`] plus chained `with_*` setters:
///
/// ```
/// use textmark::config::{Accuracy, MarkConfig};
///
/// let config = MarkConfig::default()
///     .with_element("span")
///     .with_class_name("hit")
///     .with_accuracy(Accuracy::exactly());
/// assert_eq!(config.element, "span");
/// ```
#[derive(Debug, Clone)]
pub struct MarkConfig {
    /// Tag name of the annotation element.
    pub element: String,
    /// Optional class set on each annotation element.
    pub class_name: Option<String>,
    /// Exclusion selectors; a text node inside a matching element is never
    /// searched.
    pub exclude: Vec<String>,
    /// Descend into nested sub-documents.
    pub sub_documents: bool,
    /// How long to wait for a pending sub-document before skipping it.
    pub sub_document_timeout: Duration,
    /// Split multi-word terms on whitespace into independent sub-terms.
    pub separate_word_search: bool,
    /// Allow matches to span multiple sibling text segments.
    pub across_elements: bool,
    /// Annotate each top-level capture group of a caller regex separately.
    pub separate_groups: bool,
    /// Annotate capture group `ignore_groups + 1` instead of the whole
    /// match (caller regexes only).
    pub ignore_groups: usize,
    /// Allow overlapping and nested ranges/matches to be annotated.
    pub wrap_all_ranges: bool,
    /// Treat diacritic variants of a character as equivalent.
    pub diacritics: bool,
    /// Replacement diacritics table: pairs of (lowercase class, uppercase
    /// class). None uses the built-in table.
    pub diacritics_table: Option<Vec<(String, String)>>,
    /// Synonym sets; matching any member matches all of them.
    pub synonyms: AHashMap<String, Vec<String>>,
    /// Boundary policy for keyword matches.
    pub accuracy: Accuracy,
    /// Case-sensitive matching.
    pub case_sensitive: bool,
    /// Tolerate invisible joiner characters inside terms.
    pub ignore_joiners: bool,
    /// Punctuation characters tolerated inside terms.
    pub ignore_punctuation: Vec<char>,
    /// Wildcard handling in terms.
    pub wildcards: Wildcards,
    /// Block-boundary insertion for cross-element matching.
    pub block_boundary: BlockBoundary,
    /// Reuse the composite view across the terms of one call.
    pub cache_text_nodes: bool,
    /// Emit observational debug events (never affects control flow).
    pub debug: bool,
}

impl Default for MarkConfig {
    fn default() -> Self {
        MarkConfig {
            element: "mark".to_string(),
            class_name: None,
            exclude: Vec::new(),
            sub_documents: true,
            sub_document_timeout: Duration::from_millis(5000),
            separate_word_search: true,
            across_elements: false,
            separate_groups: false,
            ignore_groups: 0,
            wrap_all_ranges: false,
            diacritics: true,
            diacritics_table: None,
            synonyms: AHashMap::new(),
            accuracy: Accuracy::default(),
            case_sensitive: false,
            ignore_joiners: false,
            ignore_punctuation: Vec::new(),
            wildcards: Wildcards::default(),
            block_boundary: BlockBoundary::default(),
            cache_text_nodes: false,
            debug: false,
        }
    }
}

impl MarkConfig {
    /// Set the annotation element tag name.
    pub fn with_element<S: Into<String>>(mut self, element: S) -> Self {
        self.element = element.into();
        self
    }

    /// Set the annotation element class.
    pub fn with_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Add an exclusion selector.
    pub fn with_exclude<S: Into<String>>(mut self, selector: S) -> Self {
        self.exclude.push(selector.into());
        self
    }

    /// Enable or disable sub-document traversal.
    pub fn with_sub_documents(mut self, enabled: bool) -> Self {
        self.sub_documents = enabled;
        self
    }

    /// Set the sub-document readiness timeout.
    pub fn with_sub_document_timeout(mut self, timeout: Duration) -> Self {
        self.sub_document_timeout = timeout;
        self
    }

    /// Enable or disable splitting terms on whitespace.
    pub fn with_separate_word_search(mut self, enabled: bool) -> Self {
        self.separate_word_search = enabled;
        self
    }

    /// Enable or disable cross-element matching.
    pub fn with_across_elements(mut self, enabled: bool) -> Self {
        self.across_elements = enabled;
        self
    }

    /// Enable per-group annotation for caller regexes.
    pub fn with_separate_groups(mut self, enabled: bool) -> Self {
        self.separate_groups = enabled;
        self
    }

    /// Skip the first `n` capture groups of a caller regex.
    pub fn with_ignore_groups(mut self, n: usize) -> Self {
        self.ignore_groups = n;
        self
    }

    /// Enable overlapping/nested range annotation.
    pub fn with_wrap_all_ranges(mut self, enabled: bool) -> Self {
        self.wrap_all_ranges = enabled;
        self
    }

    /// Enable or disable diacritics equivalence.
    pub fn with_diacritics(mut self, enabled: bool) -> Self {
        self.diacritics = enabled;
        self
    }

    /// Add a synonym set: the key and every value match each other.
    pub fn with_synonym<S: Into<String>>(mut self, term: S, synonyms: Vec<String>) -> Self {
        self.synonyms.insert(term.into(), synonyms);
        self
    }

    /// Set the accuracy policy.
    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Enable case-sensitive matching.
    pub fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Tolerate invisible joiners inside terms.
    pub fn with_ignore_joiners(mut self, enabled: bool) -> Self {
        self.ignore_joiners = enabled;
        self
    }

    /// Tolerate the given punctuation characters inside terms.
    pub fn with_ignore_punctuation(mut self, punctuation: Vec<char>) -> Self {
        self.ignore_punctuation = punctuation;
        self
    }

    /// Set wildcard handling.
    pub fn with_wildcards(mut self, wildcards: Wildcards) -> Self {
        self.wildcards = wildcards;
        self
    }

    /// Set the block-boundary policy.
    pub fn with_block_boundary(mut self, block_boundary: BlockBoundary) -> Self {
        self.block_boundary = block_boundary;
        self
    }

    /// Reuse the composite view across terms of one call.
    pub fn with_cache_text_nodes(mut self, enabled: bool) -> Self {
        self.cache_text_nodes = enabled;
        self
    }

    /// Enable observational debug events.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// True when joiner/punctuation tolerance is active.
    pub fn joiner_tolerance(&self) -> bool {
        self.ignore_joiners || !self.ignore_punctuation.is_empty()
    }
}
