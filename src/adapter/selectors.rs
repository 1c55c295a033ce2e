//! Small helpers over `scraper` shared by the site adapters
//!
//! Every lookup returns `None` when nothing matches or the match is blank,
//! so adapters can feed the result straight into
//! [`EventRecord::set_field`](crate::record::EventRecord::set_field).

use super::error::ExtractionError;
use scraper::{ElementRef, Html, Selector};

/// Parse a CSS selector
pub fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Trimmed text content of an element and all its descendants
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_blank(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Text of the first element matching `css`
pub fn first_text(document: &Html, css: &str) -> Result<Option<String>, ExtractionError> {
    nth_text(document, css, 0)
}

/// Text of the `n`-th (0-based) element matching `css`
pub fn nth_text(document: &Html, css: &str, n: usize) -> Result<Option<String>, ExtractionError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .nth(n)
        .map(element_text)
        .and_then(non_blank))
}

/// Trimmed attribute value of the first element matching `css`
pub fn first_attr(
    document: &Html,
    css: &str,
    attr: &str,
) -> Result<Option<String>, ExtractionError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .and_then(non_blank))
}

/// `href` of every anchor matching `css`, in document order
pub fn hrefs(document: &Html, css: &str) -> Result<Vec<String>, ExtractionError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect())
}

/// First following sibling element with the given tag name
pub fn next_sibling_element<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == tag)
}
