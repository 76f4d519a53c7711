//! Locator for the stock status element.
//!
//! A deliberately small subset of CSS: one compound selector, no
//! combinators. `tag`, `#id`, `.class`, `[attr]` and `[attr=value]` may be
//! combined, e.g. `link[itemprop="availability"]` or `p.stock.in-stock`.

use std::fmt;
use std::str::FromStr;

use stockwatch_core::{Error, Result};

use crate::html::Tag;

/// An attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrCondition {
    /// Attribute name, lowercased
    pub name: String,
    /// Required exact value, or `None` for presence only
    pub value: Option<String>,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl Selector {
    /// Parse a selector.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(Error::selector(input, "selector is empty"));
        }
        if has_combinator(raw) {
            return Err(Error::selector(
                raw,
                "combinators are not supported; use a single compound selector",
            ));
        }

        let mut selector = Selector {
            raw: raw.to_string(),
            tag: None,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        };

        let mut chars = raw.char_indices().peekable();

        let tag_len = raw
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(raw.len());
        if tag_len > 0 {
            selector.tag = Some(raw[..tag_len].to_ascii_lowercase());
            while chars.peek().is_some_and(|&(i, _)| i < tag_len) {
                chars.next();
            }
        }

        while let Some((i, c)) = chars.next() {
            match c {
                '#' | '.' => {
                    let from = i + 1;
                    let len = raw[from..]
                        .find(|c: char| !is_ident_char(c))
                        .unwrap_or(raw.len() - from);
                    if len == 0 {
                        return Err(Error::selector(raw, format!("expected a name after '{c}'")));
                    }
                    let name = raw[from..from + len].to_string();
                    if c == '#' {
                        if selector.id.is_some() {
                            return Err(Error::selector(raw, "more than one #id"));
                        }
                        selector.id = Some(name);
                    } else {
                        selector.classes.push(name);
                    }
                    while chars.peek().is_some_and(|&(j, _)| j < from + len) {
                        chars.next();
                    }
                }
                '[' => {
                    let close = find_closing_bracket(&raw[i + 1..])
                        .ok_or_else(|| Error::selector(raw, "unterminated '['"))?;
                    let body = &raw[i + 1..i + 1 + close];
                    selector.attrs.push(parse_attr_condition(raw, body)?);
                    let end = i + 1 + close + 1;
                    while chars.peek().is_some_and(|&(j, _)| j < end) {
                        chars.next();
                    }
                }
                other => {
                    return Err(Error::selector(
                        raw,
                        format!("unexpected character '{other}'"),
                    ));
                }
            }
        }

        Ok(selector)
    }

    /// The selector as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if `tag` satisfies every condition.
    pub fn matches(&self, tag: &Tag) -> bool {
        if let Some(name) = &self.tag
            && tag.name != *name
        {
            return false;
        }
        if let Some(id) = &self.id
            && tag.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let have: Vec<&str> = tag.attr("class").unwrap_or_default().split_whitespace().collect();
            if !self.classes.iter().all(|want| have.contains(&want.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|cond| match (&cond.value, tag.attr(&cond.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(want), Some(got)) => got == want,
        })
    }
}

/// Whitespace (or `>`, `+`, `~`) outside of brackets means a combinator.
fn has_combinator(raw: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in raw.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') if depth > 0 => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                return true;
            }
            _ => {}
        }
    }
    false
}

fn find_closing_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attr_condition(raw: &str, body: &str) -> Result<AttrCondition> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (body.trim(), None),
    };
    if name.is_empty() || !name.chars().all(|c| is_ident_char(c) || c == ':') {
        return Err(Error::selector(raw, format!("invalid attribute name '{name}'")));
    }
    let value = match value {
        None => None,
        Some(v) => {
            let unquoted = v
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(v);
            if unquoted.starts_with(['"', '\'']) || unquoted.ends_with(['"', '\'']) {
                return Err(Error::selector(raw, "mismatched quotes in attribute value"));
            }
            Some(unquoted.to_string())
        }
    };
    Ok(AttrCondition {
        name: name.to_ascii_lowercase(),
        value,
    })
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::html::tags;

    fn first_tag(html: &str) -> Tag {
        tags(html).next().unwrap()
    }

    #[test]
    fn test_parse_forms() {
        let s = Selector::parse("#availability").unwrap();
        assert_eq!(s.id.as_deref(), Some("availability"));
        assert!(s.tag.is_none());

        let s = Selector::parse("P.stock.in-stock").unwrap();
        assert_eq!(s.tag.as_deref(), Some("p"));
        assert_eq!(s.classes, vec!["stock", "in-stock"]);

        let s = Selector::parse(r#"link[itemprop="availability"][href]"#).unwrap();
        assert_eq!(s.tag.as_deref(), Some("link"));
        assert_eq!(
            s.attrs,
            vec![
                AttrCondition {
                    name: "itemprop".to_string(),
                    value: Some("availability".to_string()),
                },
                AttrCondition {
                    name: "href".to_string(),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_quoted_value_with_space() {
        let s = Selector::parse("[data-label='In stock']").unwrap();
        assert_eq!(s.attrs[0].value.as_deref(), Some("In stock"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("   ").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("div[").is_err());
        assert!(Selector::parse("div > span").is_err());
        assert!(Selector::parse("div span").is_err());
        assert!(Selector::parse("#a#b").is_err());
        assert!(Selector::parse("[=x]").is_err());
        assert!(Selector::parse("div*").is_err());
    }

    #[test]
    fn test_parse_error_mentions_selector() {
        let err = Selector::parse("div > span").unwrap_err();
        assert!(err.to_string().contains("div > span"));
    }

    #[test]
    fn test_matches_id_and_class() {
        let tag = first_tag(r#"<span id="stock" class="badge  in-stock green">"#);
        assert!(Selector::parse("#stock").unwrap().matches(&tag));
        assert!(Selector::parse("span#stock.in-stock").unwrap().matches(&tag));
        assert!(Selector::parse(".green.badge").unwrap().matches(&tag));
        assert!(!Selector::parse("div#stock").unwrap().matches(&tag));
        assert!(!Selector::parse(".out-of-stock").unwrap().matches(&tag));
        assert!(!Selector::parse("#Stock").unwrap().matches(&tag));
    }

    #[test]
    fn test_matches_attributes() {
        let tag = first_tag(r#"<meta itemprop="availability" content="https://schema.org/InStock">"#);
        assert!(Selector::parse("[itemprop=availability]").unwrap().matches(&tag));
        assert!(Selector::parse("meta[content]").unwrap().matches(&tag));
        assert!(!Selector::parse("[itemprop=price]").unwrap().matches(&tag));
        assert!(!Selector::parse("[data-x]").unwrap().matches(&tag));
    }

    #[test]
    fn test_from_str_and_display() {
        let s: Selector = " .stock ".parse().unwrap();
        assert_eq!(s.to_string(), ".stock");
        assert_eq!(s.as_str(), ".stock");
    }
}
