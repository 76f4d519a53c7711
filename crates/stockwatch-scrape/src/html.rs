//! Minimal HTML tag scanner.
//!
//! Product pages only need one element found and its text read, so this is a
//! forward-only tokenizer rather than a DOM: it yields opening, closing and
//! self-closing tags with byte offsets into the source. Comments, doctypes
//! and processing instructions are skipped, and the bodies of `<script>` and
//! `<style>` are never tokenized.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`][^\s>]*)))?"#).unwrap()
});

/// Elements whose contents are raw text, not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements that imply a word break in rendered text.
const BREAKING_ELEMENTS: &[&str] = &[
    "br", "p", "div", "li", "td", "th", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "option",
];

/// Kind of tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<div ...>`
    Open,
    /// `</div>`
    Close,
    /// `<br/>` or a void element such as `<meta ...>`
    SelfClosing,
}

/// One tag found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercased tag name
    pub name: String,
    /// Attributes in document order; names lowercased, values entity-decoded
    pub attrs: Vec<(String, String)>,
    /// Kind of tag
    pub kind: TagKind,
    /// Byte offset of `<`
    pub start: usize,
    /// Byte offset just past `>`
    pub end: usize,
}

impl Tag {
    /// Value of the named attribute (name matched case-insensitively).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Iterator over the tags of an HTML document.
pub struct Tags<'a> {
    html: &'a str,
    lower: String,
    pos: usize,
}

/// Tokenize `html` into tags.
pub fn tags(html: &str) -> Tags<'_> {
    Tags {
        html,
        // ASCII lowercasing keeps byte offsets aligned with `html`.
        lower: html.to_ascii_lowercase(),
        pos: 0,
    }
}

impl Tags<'_> {
    /// Byte offset of the `>` closing the tag opened at `from`.
    ///
    /// A quote only opens a quoted value when it is the first non-space
    /// character after `=`; elsewhere (e.g. `alt=Men's`) it is literal.
    fn tag_end(&self, from: usize) -> Option<usize> {
        let mut quote: Option<u8> = None;
        let mut after_eq = false;
        for (i, &b) in self.html.as_bytes()[from..].iter().enumerate() {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                continue;
            }
            match b {
                b'"' | b'\'' if after_eq => quote = Some(b),
                b'>' => return Some(from + i),
                b'=' => {
                    after_eq = true;
                    continue;
                }
                c if c.is_ascii_whitespace() => continue,
                _ => {}
            }
            after_eq = false;
        }
        None
    }
}

impl Iterator for Tags<'_> {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        loop {
            let start = self.html.get(self.pos..)?.find('<')? + self.pos;
            let rest = &self.lower[start..];

            if rest.starts_with("<!--") {
                self.pos = match rest.find("-->") {
                    Some(i) => start + i + 3,
                    None => self.html.len(),
                };
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos = match rest.find('>') {
                    Some(i) => start + i + 1,
                    None => self.html.len(),
                };
                continue;
            }

            let closing = rest.starts_with("</");
            let name_from = start + if closing { 2 } else { 1 };
            let name_len = self.lower[name_from..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_'))
                .unwrap_or(self.lower.len() - name_from);
            if name_len == 0 {
                // A stray `<` in text, e.g. "price < 10".
                self.pos = start + 1;
                continue;
            }
            let name = self.lower[name_from..name_from + name_len].to_string();

            let Some(gt) = self.tag_end(name_from + name_len) else {
                self.pos = self.html.len();
                return None;
            };
            let end = gt + 1;
            self.pos = end;

            if closing {
                return Some(Tag {
                    name,
                    attrs: Vec::new(),
                    kind: TagKind::Close,
                    start,
                    end,
                });
            }

            let body = &self.html[name_from + name_len..gt];
            let self_closing =
                body.trim_end().ends_with('/') || VOID_ELEMENTS.contains(&name.as_str());
            let attrs = parse_attrs(body.trim_end().trim_end_matches('/'));

            if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                let close = format!("</{name}");
                self.pos = match self.lower[end..].find(&close) {
                    Some(i) => end + i,
                    None => self.html.len(),
                };
            }

            return Some(Tag {
                name,
                attrs,
                kind: if self_closing {
                    TagKind::SelfClosing
                } else {
                    TagKind::Open
                },
                start,
                end,
            });
        }
    }
}

fn parse_attrs(body: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// Rendered text of an HTML fragment: tags removed, raw-text element bodies
/// dropped, entities decoded, whitespace collapsed.
pub fn text_content(fragment: &str) -> String {
    let fragment = strip_comments(fragment);
    let fragment = fragment.as_str();
    let mut out = String::with_capacity(fragment.len());
    let mut cursor = 0;
    let mut skip_next_text = false;

    for tag in tags(fragment) {
        if !skip_next_text {
            out.push_str(&fragment[cursor..tag.start]);
        }
        if BREAKING_ELEMENTS.contains(&tag.name.as_str()) {
            out.push(' ');
        }
        skip_next_text =
            tag.kind == TagKind::Open && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
        cursor = tag.end;
    }
    if !skip_next_text && cursor < fragment.len() {
        out.push_str(&fragment[cursor..]);
    }

    normalize_ws(&decode_entities(&out))
}

fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        rest = match rest[open + 4..].find("-->") {
            Some(close) => &rest[open + 4 + close + 3..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

/// Decode the named entities product pages actually use plus numeric ones.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &after[..semi];
            decode_entity(entity).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "rsquo" => '\u{2019}',
        "lsquo" => '\u{2018}',
        _ => return None,
    })
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
