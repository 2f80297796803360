//! Term-to-pattern compilation.
//!
//! A raw search term passes through a fixed sequence of rewriting stages,
//! each feeding the next: wildcard placeholders, metacharacter escaping,
//! synonym alternation, joiner placeholders, diacritics classes, joiner
//! realization, wildcard realization, blank collapsing, and finally the
//! accuracy wrapper. Blank collapsing runs after every placeholder has been
//! realized: its token may carry the configured block-boundary marker, and
//! that character must never be visible to a placeholder substitution. The
//! result always exposes exactly two capture groups: group 1 is a
//! discardable prefix (a required leading boundary in `exactly` mode, empty
//! otherwise) and group 2 is the annotatable span.
//!
//! The underlying engine has no lookaround, so the trailing boundary of
//! `exactly` mode is carried on the compiled [`Pattern`] as an explicit
//! post-match check instead of a zero-width lookahead.

use regex::{NoExpand, Regex, RegexBuilder};

use crate::config::{AccuracyMode, MarkConfig, Wildcards};
use crate::error::{Result, TextmarkError};
use crate::pattern::diacritics::default_diacritics_table;

/// Placeholder for an un-escaped `?` wildcard.
const WILDCARD_ONE: char = '\u{1}';
/// Placeholder for an un-escaped `*` wildcard.
const WILDCARD_MANY: char = '\u{2}';
/// Placeholder marking a position where joiner characters are tolerated.
const JOINER: char = '\u{0}';

/// Characters with special meaning to the pattern engine.
const METACHARACTERS: &str = r"\.+*?()[]{}|^$-";

/// Default boundary punctuation for `complementary` accuracy.
const COMPLEMENTARY_BOUNDARY: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~¡¿";

/// Invisible joiner code points tolerated by `ignore_joiners`.
const JOINER_CODE_POINTS: &str = "\u{00ad}\u{200b}\u{200c}\u{200d}";

/// A compiled, ready-to-execute match pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The compiled regex.
    pub regex: Regex,
    /// Capture index of the annotatable span (always 2 for built patterns).
    pub term_group: usize,
    /// For `exactly` accuracy: the span must be followed by end-of-text,
    /// whitespace, or one of these characters.
    pub follow_boundary: Option<Vec<char>>,
}

impl Pattern {
    /// Check the character following a candidate span against the trailing
    /// boundary requirement, if any.
    pub fn boundary_ok(&self, haystack: &str, span_end: usize) -> bool {
        let Some(limiters) = &self.follow_boundary else {
            return true;
        };
        match haystack[span_end..].chars().next() {
            None => true,
            Some(c) => c.is_whitespace() || limiters.contains(&c),
        }
    }
}

/// Builds [`Pattern`]s from raw terms according to one [`MarkConfig`].
#[derive(Debug)]
pub struct PatternBuilder<'c> {
    config: &'c MarkConfig,
}

impl<'c> PatternBuilder<'c> {
    /// Create a builder over the given configuration.
    pub fn new(config: &'c MarkConfig) -> Self {
        PatternBuilder { config }
    }

    /// Run the full pipeline on one term.
    pub fn build(&self, term: &str) -> Result<Pattern> {
        let mut str = term.to_string();
        if self.config.wildcards != Wildcards::Disabled {
            str = setup_wildcards(&str);
        }
        str = escape_metacharacters(&str);
        if !self.config.synonyms.is_empty() {
            str = self.create_synonyms(&str)?;
        }
        if self.config.joiner_tolerance() {
            str = setup_joiner_placeholders(&str);
        }
        if self.config.diacritics {
            str = self.create_diacritics(&str);
        }
        if self.config.joiner_tolerance() {
            str = self.create_joiners(&str);
        }
        if self.config.wildcards != Wildcards::Disabled {
            str = create_wildcards(&str, self.config.wildcards == Wildcards::WithSpaces);
        }
        str = merge_blanks(&str, self.boundary_char());
        let (source, follow_boundary) = self.create_accuracy(&str);

        let regex = RegexBuilder::new(&source)
            .multi_line(true)
            .case_insensitive(!self.config.case_sensitive)
            .build()
            .map_err(|e| TextmarkError::pattern(format!("term {term:?}: {e}")))?;
        Ok(Pattern {
            regex,
            term_group: 2,
            follow_boundary,
        })
    }

    /// Replace every occurrence of a synonym-set member with an alternation
    /// group covering the whole set. Alternatives are ordered longest first
    /// (ties lexicographic) so a shorter member never shadows a longer one.
    fn create_synonyms(&self, input: &str) -> Result<String> {
        let mut str = input.to_string();
        for (key, values) in &self.config.synonyms {
            let mut members: Vec<&str> = Vec::with_capacity(values.len() + 1);
            members.push(key.as_str());
            members.extend(values.iter().map(|v| v.as_str()));
            members.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

            let processed: Vec<String> = members
                .iter()
                .map(|m| {
                    let mut p = m.to_string();
                    if self.config.wildcards != Wildcards::Disabled {
                        p = setup_wildcards(&p);
                    }
                    p = escape_metacharacters(&p);
                    if self.config.joiner_tolerance() {
                        p = setup_joiner_placeholders(&p);
                    }
                    p
                })
                .collect();

            // locate members in their escaped form, since the term has
            // already been escaped
            let needles: Vec<String> = members
                .iter()
                .map(|m| {
                    let mut p = m.to_string();
                    if self.config.wildcards != Wildcards::Disabled {
                        p = setup_wildcards(&p);
                    }
                    literal_pattern(&escape_metacharacters(&p))
                })
                .collect();
            let finder = RegexBuilder::new(&needles.join("|"))
                .case_insensitive(!self.config.case_sensitive)
                .build()
                .map_err(|e| TextmarkError::pattern(format!("synonym {key:?}: {e}")))?;
            let replacement = format!("({})", processed.join("|"));
            str = finder.replace_all(&str, NoExpand(&replacement)).to_string();
        }
        Ok(str)
    }

    /// Substitute each literal character that belongs to an equivalence
    /// class with a bracket class covering all its equivalents. Each class
    /// is substituted at most once even when several term characters map to
    /// it.
    fn create_diacritics(&self, input: &str) -> String {
        let table = default_diacritics_table(self.config.diacritics_table.as_ref());
        let classes: Vec<String> = if self.config.case_sensitive {
            table
                .iter()
                .flat_map(|(lo, up)| [lo.clone(), up.clone()])
                .collect()
        } else {
            table
                .iter()
                .map(|(lo, up)| format!("{lo}{up}"))
                .collect()
        };

        let snapshot: Vec<char> = input.chars().collect();
        let mut str = input.to_string();
        let mut handled: Vec<usize> = Vec::new();
        for ch in snapshot {
            for (idx, class) in classes.iter().enumerate() {
                if !class.contains(ch) || handled.contains(&idx) {
                    continue;
                }
                let bracket = format!("[{class}]");
                str = str
                    .chars()
                    .map(|c| {
                        if class.contains(c) {
                            bracket.clone()
                        } else {
                            c.to_string()
                        }
                    })
                    .collect();
                handled.push(idx);
            }
        }
        str
    }

    /// Replace joiner placeholders with a bounded character class built from
    /// the ignored punctuation and/or the fixed joiner code points.
    fn create_joiners(&self, input: &str) -> String {
        let mut class = String::new();
        for c in &self.config.ignore_punctuation {
            push_class_char(&mut class, *c);
        }
        if self.config.ignore_joiners {
            class.push_str(JOINER_CODE_POINTS);
        }
        if class.is_empty() {
            return input.replace(JOINER, "");
        }
        let replacement = format!("[{class}]*");
        let mut out = String::with_capacity(input.len());
        let mut in_run = false;
        for c in input.chars() {
            if c == JOINER {
                if !in_run {
                    out.push_str(&replacement);
                    in_run = true;
                }
            } else {
                in_run = false;
                out.push(c);
            }
        }
        out
    }

    /// The synthetic block-boundary marker, when insertion is active.
    fn boundary_char(&self) -> Option<char> {
        self.config
            .block_boundary
            .enabled
            .then_some(self.config.block_boundary.boundary_char)
    }

    /// Apply the accuracy wrapper, producing group 1 (discardable prefix)
    /// and group 2 (annotatable span). The synthetic block-boundary marker
    /// counts as a word boundary: a word ending at the edge of a block is
    /// followed by the marker, not by whitespace.
    fn create_accuracy(&self, str: &str) -> (String, Option<Vec<char>>) {
        let accuracy = &self.config.accuracy;
        let boundary = self.boundary_char();
        match accuracy.mode {
            AccuracyMode::Partially => (format!("()({str})"), None),
            AccuracyMode::Complementary => {
                let mut class = String::from("\\s");
                if let Some(b) = boundary {
                    push_class_char(&mut class, b);
                }
                if accuracy.limiters.is_empty() {
                    for c in COMPLEMENTARY_BOUNDARY.chars() {
                        push_class_char(&mut class, c);
                    }
                } else {
                    for c in &accuracy.limiters {
                        push_class_char(&mut class, *c);
                    }
                }
                (format!("()([^{class}]*{str}[^{class}]*)"), None)
            }
            AccuracyMode::Exactly => {
                let mut class = String::from("\\s");
                if let Some(b) = boundary {
                    push_class_char(&mut class, b);
                }
                for c in &accuracy.limiters {
                    push_class_char(&mut class, *c);
                }
                let mut follow = accuracy.limiters.clone();
                if let Some(b) = boundary {
                    follow.push(b);
                }
                (format!("(^|[{class}])({str})"), Some(follow))
            }
        }
    }
}

/// Stage 1: swap un-escaped wildcard markers for placeholder characters.
/// An escaped `\?`/`\*` loses its backslash and passes through literally
/// (the escape stage re-protects it).
fn setup_wildcards(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if matches!(chars.get(i + 1), Some('?') | Some('*')) => {
                out.push(chars[i + 1]);
                i += 2;
            }
            '?' => {
                out.push(WILDCARD_ONE);
                i += 1;
            }
            '*' => {
                out.push(WILDCARD_MANY);
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Stage 2: escape every metacharacter. Placeholder characters pass through.
fn escape_metacharacters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if METACHARACTERS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A pattern that matches `escaped` literally when compiled as a regex,
/// used to find escaped synonym members inside the escaped term.
fn literal_pattern(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len() * 2);
    for c in escaped.chars() {
        if METACHARACTERS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Stage 4: insert a joiner placeholder between every pair of adjacent
/// literal characters that are not grouping/alternation controls.
fn setup_joiner_placeholders(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() * 2);
    for (i, c) in chars.iter().enumerate() {
        out.push(*c);
        if matches!(c, '(' | '|' | ')' | '\\') {
            continue;
        }
        match chars.get(i + 1) {
            None => {}
            Some('(' | '|' | ')' | '\\') => {}
            Some(_) => out.push(JOINER),
        }
    }
    out
}

/// Stage 8: collapse consecutive whitespace into a one-or-more token. When
/// block-boundary insertion is active the token also accepts the boundary
/// marker, so phrase terms can match across an inserted block boundary.
/// Must run after placeholder realization: the marker is a configurable
/// character and may collide with a placeholder code point.
fn merge_blanks(input: &str, boundary_char: Option<char>) -> String {
    let mut token = String::from("[\\s");
    if let Some(b) = boundary_char {
        push_class_char(&mut token, b);
    }
    token.push_str("]+");
    let mut out = String::with_capacity(input.len());
    let mut in_blank = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !in_blank {
                out.push_str(&token);
                in_blank = true;
            }
        } else {
            in_blank = false;
            out.push(c);
        }
    }
    out
}

/// Stage 7: realize wildcard placeholders as zero-or-one / zero-or-more
/// token classes.
fn create_wildcards(input: &str, with_spaces: bool) -> String {
    let one = if with_spaces { "[\\S\\s]?" } else { "\\S?" };
    let many = if with_spaces { "[\\S\\s]*?" } else { "\\S*" };
    input
        .replace(WILDCARD_ONE, one)
        .replace(WILDCARD_MANY, many)
}

/// Append a character to a bracket-class body, escaped where needed.
fn push_class_char(class: &mut String, c: char) {
    if matches!(c, '\\' | ']' | '^' | '-' | '[') {
        class.push('\\');
    }
    class.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Accuracy, BlockBoundary, MarkConfig, Wildcards};

    fn build(config: &MarkConfig, term: &str) -> Pattern {
        PatternBuilder::new(config).build(term).unwrap()
    }

    fn span<'t>(pattern: &Pattern, text: &'t str) -> Option<&'t str> {
        pattern
            .regex
            .captures(text)
            .and_then(|c| c.get(pattern.term_group))
            .map(|m| m.as_str())
    }

    #[test]
    fn test_plain_term_matches_case_insensitively() {
        let config = MarkConfig::default();
        let pattern = build(&config, "ipsum");
        assert_eq!(span(&pattern, "Lorem IPSUM dolor"), Some("IPSUM"));
    }

    #[test]
    fn test_case_sensitive() {
        let config = MarkConfig::default().with_case_sensitive(true);
        let pattern = build(&config, "ipsum");
        assert!(pattern.regex.captures("Lorem IPSUM dolor").is_none());
        assert_eq!(span(&pattern, "Lorem ipsum"), Some("ipsum"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let config = MarkConfig::default().with_diacritics(false);
        let pattern = build(&config, "a.b+c");
        assert_eq!(span(&pattern, "x a.b+c y"), Some("a.b+c"));
        assert!(pattern.regex.captures("xaXbYc").is_none());
    }

    #[test]
    fn test_diacritics_equivalence() {
        let config = MarkConfig::default();
        let pattern = build(&config, "resume");
        assert_eq!(span(&pattern, "see résumé here"), Some("résumé"));
        // and in the other direction
        let pattern = build(&config, "résumé");
        assert_eq!(span(&pattern, "see resume here"), Some("resume"));
    }

    #[test]
    fn test_diacritics_case_sensitive_classes() {
        let config = MarkConfig::default().with_case_sensitive(true);
        let pattern = build(&config, "uber");
        assert_eq!(span(&pattern, "über"), Some("über"));
        assert!(pattern.regex.captures("ÜBER").is_none());
    }

    #[test]
    fn test_synonyms_both_directions() {
        let config = MarkConfig::default()
            .with_synonym("lorem", vec!["ipsum".to_string()]);
        let pattern = build(&config, "lorem");
        assert_eq!(span(&pattern, "say ipsum now"), Some("ipsum"));

        let config = MarkConfig::default()
            .with_synonym("ipsum", vec!["lorem".to_string()]);
        let pattern = build(&config, "ipsum");
        assert_eq!(span(&pattern, "say lorem now"), Some("lorem"));
    }

    #[test]
    fn test_synonyms_longest_alternative_wins() {
        let config = MarkConfig::default()
            .with_synonym("one", vec!["oneself".to_string()]);
        let pattern = build(&config, "one");
        assert_eq!(span(&pattern, "oneself"), Some("oneself"));
    }

    #[test]
    fn test_wildcards() {
        let config = MarkConfig::default().with_wildcards(Wildcards::Enabled);
        let pattern = build(&config, "lor?m");
        assert_eq!(span(&pattern, "lorem"), Some("lorem"));
        assert_eq!(span(&pattern, "lorm"), Some("lorm"));
        assert!(pattern.regex.captures("lor m").is_none());

        let pattern = build(&config, "lor*m");
        assert_eq!(span(&pattern, "loreeem"), Some("loreeem"));
    }

    #[test]
    fn test_wildcards_with_spaces() {
        let config = MarkConfig::default().with_wildcards(Wildcards::WithSpaces);
        let pattern = build(&config, "lor*m");
        assert_eq!(span(&pattern, "lor e m"), Some("lor e m"));
    }

    #[test]
    fn test_escaped_wildcards_stay_literal() {
        let config = MarkConfig::default().with_wildcards(Wildcards::Enabled);
        let pattern = build(&config, r"lor\*m");
        assert_eq!(span(&pattern, "lor*m"), Some("lor*m"));
        assert!(pattern.regex.captures("lorem").is_none());
    }

    #[test]
    fn test_wildcards_disabled_are_literal() {
        let config = MarkConfig::default();
        let pattern = build(&config, "lor?m");
        assert_eq!(span(&pattern, "x lor?m y"), Some("lor?m"));
        assert!(pattern.regex.captures("lorem").is_none());
    }

    #[test]
    fn test_ignore_punctuation() {
        let config = MarkConfig::default().with_ignore_punctuation(vec!['\'', '-']);
        let pattern = build(&config, "dont");
        assert_eq!(span(&pattern, "don't"), Some("don't"));
        assert_eq!(span(&pattern, "do-n-t"), Some("do-n-t"));
    }

    #[test]
    fn test_ignore_joiners() {
        let config = MarkConfig::default().with_ignore_joiners(true);
        let pattern = build(&config, "lorem");
        assert_eq!(span(&pattern, "lo\u{200b}rem"), Some("lo\u{200b}rem"));
    }

    #[test]
    fn test_blank_merge() {
        let config = MarkConfig::default();
        let pattern = build(&config, "lorem   ipsum");
        assert_eq!(span(&pattern, "lorem \n ipsum"), Some("lorem \n ipsum"));
    }

    #[test]
    fn test_wildcards_with_block_boundary() {
        let config = MarkConfig::default()
            .with_wildcards(Wildcards::Enabled)
            .with_block_boundary(BlockBoundary {
                enabled: true,
                ..BlockBoundary::default()
            });
        // the blank token tolerates the boundary marker but nothing else
        let pattern = build(&config, "lorem ipsum");
        assert!(pattern.regex.captures("loremXipsum").is_none());
        assert_eq!(
            span(&pattern, "lorem\u{1} ipsum"),
            Some("lorem\u{1} ipsum")
        );
        // wildcards still realize while the marker is active
        let pattern = build(&config, "lor?m");
        assert_eq!(span(&pattern, "lorem"), Some("lorem"));
        assert!(pattern.regex.captures("lor m").is_none());
    }

    #[test]
    fn test_exactly_word_at_block_edge() {
        let config = MarkConfig::default()
            .with_accuracy(Accuracy::exactly())
            .with_block_boundary(BlockBoundary {
                enabled: true,
                ..BlockBoundary::default()
            });
        // composite text of two blocks: marker plus space after "foo"
        let text = "foo\u{1} bar";
        let pattern = build(&config, "foo");
        let caps = pattern.regex.captures(text).unwrap();
        let m = caps.get(pattern.term_group).unwrap();
        assert_eq!(m.as_str(), "foo");
        assert!(pattern.boundary_ok(text, m.end()));

        let pattern = build(&config, "bar");
        let caps = pattern.regex.captures(text).unwrap();
        assert_eq!(caps.get(pattern.term_group).unwrap().as_str(), "bar");
    }

    #[test]
    fn test_accuracy_partially_default() {
        let config = MarkConfig::default();
        let pattern = build(&config, "ipsu");
        assert_eq!(span(&pattern, "ipsum"), Some("ipsu"));
    }

    #[test]
    fn test_accuracy_exactly_rejects_substring() {
        let config = MarkConfig::default().with_accuracy(Accuracy::exactly());
        let pattern = build(&config, "ipsu");
        let caps = pattern.regex.captures("only ipsum here");
        // the regex may find a leading boundary, but the follow-boundary
        // check rejects the span
        if let Some(c) = caps {
            let m = c.get(pattern.term_group).unwrap();
            assert!(!pattern.boundary_ok("only ipsum here", m.end()));
        }
        let pattern = build(&config, "ipsum");
        let caps = pattern.regex.captures("only ipsum here").unwrap();
        let m = caps.get(pattern.term_group).unwrap();
        assert_eq!(m.as_str(), "ipsum");
        assert!(pattern.boundary_ok("only ipsum here", m.end()));
    }

    #[test]
    fn test_accuracy_exactly_start_and_end_of_text() {
        let config = MarkConfig::default().with_accuracy(Accuracy::exactly());
        let pattern = build(&config, "lorem");
        let caps = pattern.regex.captures("lorem").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "");
        let m = caps.get(2).unwrap();
        assert_eq!(m.as_str(), "lorem");
        assert!(pattern.boundary_ok("lorem", m.end()));
    }

    #[test]
    fn test_accuracy_exactly_limiters() {
        let config = MarkConfig::default()
            .with_accuracy(Accuracy::exactly().with_limiters(vec![',', '.']));
        let pattern = build(&config, "ipsum");
        let text = "lorem,ipsum.";
        let caps = pattern.regex.captures(text).unwrap();
        let m = caps.get(2).unwrap();
        assert_eq!(m.as_str(), "ipsum");
        assert!(pattern.boundary_ok(text, m.end()));
    }

    #[test]
    fn test_accuracy_complementary_widens() {
        let config = MarkConfig::default().with_accuracy(Accuracy::complementary());
        let pattern = build(&config, "sum");
        assert_eq!(span(&pattern, "lorem ipsum dolor"), Some("ipsum"));
    }

    #[test]
    fn test_built_patterns_have_two_groups() {
        let config = MarkConfig::default();
        let pattern = build(&config, "x");
        assert_eq!(pattern.regex.captures_len(), 3); // whole match + 2
        assert_eq!(pattern.term_group, 2);
    }
}
