//! Minimal selector language for contexts and exclusion lists.
//!
//! Supports the subset the engine needs: `*`, tag names, `#id`, `.class`,
//! `[attr]`, `[attr=value]`, and compound forms such as `p.note[lang=en]`.
//! Combinators (descendant, child, sibling) are not supported; the walk
//! prunes the entire subtree of a matching element, which covers the common
//! "anything inside X" use.

use crate::error::{Result, TextmarkError};
use crate::tree::node::{Document, NodeId};

/// One attribute requirement of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

/// A parsed compound selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(TextmarkError::selector("empty selector"));
        }
        let mut sel = Selector::default();
        let chars: Vec<char> = source.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    i += 1;
                }
                '#' => {
                    let (word, next) = read_name(&chars, i + 1)?;
                    sel.id = Some(word);
                    i = next;
                }
                '.' => {
                    let (word, next) = read_name(&chars, i + 1)?;
                    sel.classes.push(word);
                    i = next;
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|&c| c == ']')
                        .map(|p| p + i)
                        .ok_or_else(|| {
                            TextmarkError::selector(format!("unclosed attribute in {source:?}"))
                        })?;
                    let body: String = chars[i + 1..close].iter().collect();
                    let (name, value) = match body.split_once('=') {
                        Some((n, v)) => (
                            n.trim().to_string(),
                            Some(v.trim().trim_matches('"').trim_matches('\'').to_string()),
                        ),
                        None => (body.trim().to_string(), None),
                    };
                    if name.is_empty() {
                        return Err(TextmarkError::selector(format!(
                            "empty attribute name in {source:?}"
                        )));
                    }
                    sel.attrs.push(AttrTest { name, value });
                    i = close + 1;
                }
                c if is_name_char(c) => {
                    let (word, next) = read_name(&chars, i)?;
                    if sel.tag.is_some() {
                        return Err(TextmarkError::selector(format!(
                            "multiple tag names in {source:?}"
                        )));
                    }
                    sel.tag = Some(word.to_ascii_lowercase());
                    i = next;
                }
                c => {
                    return Err(TextmarkError::selector(format!(
                        "unexpected character {c:?} in {source:?}"
                    )));
                }
            }
        }
        Ok(sel)
    }

    /// Parse a comma-separated selector list.
    pub fn parse_list(source: &str) -> Result<Vec<Selector>> {
        source
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Selector::parse)
            .collect()
    }

    /// Test a single element node against this selector.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(element) = doc.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if element.name != *tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if element.attributes.get("id") != Some(want) {
                return false;
            }
        }
        for class in &self.classes {
            if !doc.has_class(id, class) {
                return false;
            }
        }
        for attr in &self.attrs {
            match element.attributes.get(&attr.name) {
                Some(v) => {
                    if let Some(want) = &attr.value {
                        if v != want {
                            return false;
                        }
                    }
                }
                None => return false,
            }
        }
        true
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_name(chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut end = start;
    while end < chars.len() && is_name_char(chars[end]) {
        end += 1;
    }
    if end == start {
        return Err(TextmarkError::selector("expected a name"));
    }
    Ok((chars[start..end].iter().collect(), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_span() -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div");
        doc.set_attribute(div, "class", "outer skip").unwrap();
        let span = doc.append_element(div, "span");
        doc.set_attribute(span, "id", "target").unwrap();
        doc.set_attribute(span, "data-kind", "x").unwrap();
        (doc, span)
    }

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse("p.note[lang=en]").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("p"));
        assert_eq!(sel.classes, vec!["note".to_string()]);
        assert_eq!(sel.attrs.len(), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("p > span").is_err());
        assert!(Selector::parse("[unclosed").is_err());
    }

    #[test]
    fn test_match_tag_id_attr() {
        let (doc, span) = doc_with_span();
        assert!(Selector::parse("span").unwrap().matches(&doc, span));
        assert!(Selector::parse("#target").unwrap().matches(&doc, span));
        assert!(Selector::parse("[data-kind]").unwrap().matches(&doc, span));
        assert!(
            Selector::parse("[data-kind=x]")
                .unwrap()
                .matches(&doc, span)
        );
        assert!(
            !Selector::parse("[data-kind=y]")
                .unwrap()
                .matches(&doc, span)
        );
        assert!(!Selector::parse("div").unwrap().matches(&doc, span));
    }

    #[test]
    fn test_parse_list() {
        let list = Selector::parse_list("script, .ignore, [data-skip]").unwrap();
        assert_eq!(list.len(), 3);
    }
}
