//! Stock status extraction from a fetched page.

use stockwatch_core::{Error, Result, StockStatus};

use crate::html::{self, Tag, TagKind};
use crate::selector::Selector;

/// Attributes consulted, in order, when the matched element has no text.
///
/// Covers schema.org markup such as
/// `<link itemprop="availability" href="https://schema.org/InStock">` and
/// `<meta itemprop="availability" content="OutOfStock">`.
const FALLBACK_ATTRIBUTES: &[&str] = &["content", "href", "value"];

/// First element matching a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    /// The element's opening tag
    pub tag: Tag,
    /// Markup between the opening and closing tag (empty for void elements)
    pub inner_html: &'a str,
}

impl Element<'_> {
    /// Rendered text of the element.
    pub fn text(&self) -> String {
        html::text_content(self.inner_html)
    }
}

/// Find the first element in `page` matching `selector`.
pub fn find_element<'a>(page: &'a str, selector: &Selector) -> Option<Element<'a>> {
    let mut all = html::tags(page);
    let open = all.by_ref().find(|t| t.kind != TagKind::Close && selector.matches(t))?;

    if open.kind == TagKind::SelfClosing {
        return Some(Element {
            tag: open,
            inner_html: "",
        });
    }

    let mut depth = 1usize;
    let mut next_tag_start = None;
    for tag in all {
        if next_tag_start.is_none() {
            next_tag_start = Some(tag.start);
        }
        if tag.name != open.name {
            continue;
        }
        match tag.kind {
            TagKind::Open => depth += 1,
            TagKind::Close => {
                depth -= 1;
                if depth == 0 {
                    let inner_html = &page[open.end..tag.start];
                    return Some(Element {
                        tag: open,
                        inner_html,
                    });
                }
            }
            TagKind::SelfClosing => {}
        }
    }

    // Unclosed element (legal for `<p>`, `<li>`, ...): take text up to the next tag.
    let until = next_tag_start.unwrap_or(page.len());
    let inner_html = &page[open.end..until];
    Some(Element {
        tag: open,
        inner_html,
    })
}

/// Extract the stock status from `page`.
///
/// Uses the matched element's text, falling back to its `content`, `href`
/// or `value` attribute when the text is empty.
pub fn extract_status(page: &str, selector: &Selector) -> Result<StockStatus> {
    let element =
        find_element(page, selector).ok_or_else(|| Error::status_not_found(selector.as_str()))?;

    if let Some(status) = StockStatus::parse(&element.text()) {
        return Ok(status);
    }

    FALLBACK_ATTRIBUTES
        .iter()
        .filter_map(|name| element.tag.attr(name))
        .find_map(StockStatus::parse)
        .ok_or_else(|| Error::status_not_found(selector.as_str()))
}

/// Selector-bound extractor used by the watcher.
#[derive(Debug, Clone)]
pub struct Extractor {
    selector: Selector,
}

impl Extractor {
    /// Create an extractor for `selector`.
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }

    /// Parse `selector` and create an extractor for it.
    pub fn from_selector_str(selector: &str) -> Result<Self> {
        Ok(Self::new(Selector::parse(selector)?))
    }

    /// The selector in use.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Extract the stock status from `page`.
    pub fn extract(&self, page: &str) -> Result<StockStatus> {
        extract_status(page, &self.selector)
    }
}
