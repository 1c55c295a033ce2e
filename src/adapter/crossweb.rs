//! Adapter for crossweb.pl, a listing of Polish IT meetups and conferences
//!
//! The whole listing is served on one page. Detail pages present most fields
//! as `div.event-label` / value `div` sibling pairs.

use super::error::ExtractionError;
use super::selectors::{
    element_text, first_attr, first_text, hrefs, next_sibling_element, selector,
};
use super::{ListingPage, PaginationStrategy, SourceAdapter, SourceDescriptor, SourceKind};
use crate::record::{EventRecord, NOT_AVAILABLE};
use scraper::Html;
use std::collections::HashMap;
use url::Url;

const BASE_URL: &str = "https://crossweb.pl";

/// Label text on the page and the record field it fills
const LABELED_FIELDS: [(&str, &str); 10] = [
    ("Typ wydarzenia:", "type"),
    ("Kategoria:", "category"),
    ("Tematyka:", "subject"),
    ("Data:", "date"),
    ("Godzina:", "time"),
    ("Język:", "language"),
    ("Wstęp:", "fee"),
    ("Miasto:", "city"),
    ("Miejsce:", "location"),
    ("Adres:", "address"),
];

const REGISTRATION_LINK: &str = "a.eventDetailLink.apply-link-js";

#[derive(Debug, Clone)]
pub struct CrosswebAdapter {
    descriptor: SourceDescriptor,
}

impl CrosswebAdapter {
    pub fn new() -> Self {
        Self::with_base_url(Url::parse(BASE_URL).expect("static base URL is valid"))
    }

    /// Adapter resolving relative anchors against `base_url`
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            descriptor: SourceDescriptor {
                kind: SourceKind::Crossweb,
                base_url,
                pagination: PaginationStrategy::None,
            },
        }
    }
}

impl Default for CrosswebAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Values of every labeled field on the page, keyed by label text
fn labeled_values(document: &Html) -> Result<HashMap<String, String>, ExtractionError> {
    let label_selector = selector("div.event-label")?;
    let mut values = HashMap::new();

    for label in document.select(&label_selector) {
        let Some(value) = next_sibling_element(label, "div") else {
            continue;
        };
        // first occurrence of a label wins
        values
            .entry(element_text(label))
            .or_insert_with(|| element_text(value));
    }

    Ok(values)
}

/// Speaker names taken from profile links such as `/prelegenci/jan-kowalski/`
fn speakers(document: &Html) -> Result<Option<String>, ExtractionError> {
    let box_selector = selector("div.speaker-box")?;
    let link_selector = selector("div a")?;

    let names: Vec<String> = document
        .select(&box_selector)
        .filter_map(|speaker| {
            let href = speaker.select(&link_selector).next()?.value().attr("href")?;
            let slug = href.split('/').nth(2)?;
            let name = slug.replace('-', " ").trim().to_string();
            (!name.is_empty()).then_some(name)
        })
        .collect();

    Ok((!names.is_empty()).then(|| names.join(", ")))
}

impl SourceAdapter for CrosswebAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn page_url(&self, listing_url: &str, _page: usize) -> Result<String, ExtractionError> {
        Ok(listing_url.to_string())
    }

    fn parse_listing(&self, html: &str) -> Result<ListingPage, ExtractionError> {
        let document = Html::parse_document(html);
        Ok(ListingPage {
            links: hrefs(&document, "a.clearfix")?,
            has_next: false,
        })
    }

    fn parse_detail(&self, url: &str, html: &str) -> Result<EventRecord, ExtractionError> {
        let document = Html::parse_document(html);
        let mut record = EventRecord::new(url);

        record.title = first_text(&document, r#"div.event-var.fw-bold[itemprop="name"]"#)?
            .ok_or_else(|| ExtractionError::MissingTitle(url.to_string()))?;

        let mut labeled = labeled_values(&document)?;
        for (label, name) in LABELED_FIELDS {
            record.set_field(name, labeled.remove(label));
        }

        record.set_field(
            "registration_link",
            first_attr(&document, REGISTRATION_LINK, "href")?,
        );
        record.set_field(
            "webpage",
            first_attr(&document, r#"a.eventDetailLink.apply-link-js[target="_blank"]"#, "href")?,
        );
        record.set_field("speakers", speakers(&document)?);

        let detail_selector = selector("div.event-detail.description")?;
        let details: Vec<_> = document.select(&detail_selector).collect();
        let (agenda, description) = match details.as_slice() {
            [agenda, description] => (Some(element_text(*agenda)), Some(element_text(*description))),
            [only] => {
                let editor = selector("div.event-var.ql-editor")?;
                (None, only.select(&editor).next().map(element_text))
            }
            _ => (None, None),
        };

        record.set_field("agenda", agenda);
        record.description = description
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://crossweb.pl/wydarzenia/rust-krakow-meetup-12/";

    fn detail_page(fee: bool, descriptions: &str) -> String {
        let fee_row = if fee {
            r#"<div class="event-label">Wstęp:</div><div class="event-var">bezpłatny</div>"#
        } else {
            ""
        };
        format!(
            r#"<html><body>
            <div class="event-var fw-bold" itemprop="name"> Rust Kraków Meetup #12 </div>
            <div class="row"><div class="event-label">Typ wydarzenia:</div><div class="event-var">Meetup</div></div>
            <div class="row"><div class="event-label">Kategoria:</div><div class="event-var">Programowanie</div></div>
            <div class="row"><div class="event-label">Data:</div><div class="event-var">12.06.2025</div></div>
            <div class="row"><div class="event-label">Godzina:</div><div class="event-var">18:00</div></div>
            <div class="row"><div class="event-label">Język:</div><div class="event-var">polski</div></div>
            <div class="row">{fee_row}</div>
            <div class="row"><div class="event-label">Miasto:</div><div class="event-var">Kraków</div></div>
            <a class="eventDetailLink apply-link-js" href="https://crossweb.pl/rejestracja/12/">Zapisz się</a>
            <a class="eventDetailLink apply-link-js" target="_blank" href="https://rust.krakow.pl">Strona</a>
            <div class="speaker-box"><div><a href="/prelegenci/jan-kowalski/">Jan</a></div></div>
            <div class="speaker-box"><div><a href="/prelegenci/anna-nowak/">Anna</a></div></div>
            {descriptions}
            </body></html>"#
        )
    }

    #[test]
    fn test_parse_listing() {
        let html = r#"<ul>
            <li><a class="clearfix" href="/wydarzenia/a/">A</a></li>
            <li><a class="clearfix" href="/wydarzenia/b/">B</a></li>
            <li><a class="other" href="/reklama/">Ad</a></li></ul>"#;
        let page = CrosswebAdapter::new().parse_listing(html).unwrap();
        assert_eq!(page.links, vec!["/wydarzenia/a/", "/wydarzenia/b/"]);
        assert!(!page.has_next);
    }

    #[test]
    fn test_parse_detail_with_agenda() {
        let html = detail_page(
            true,
            r#"<div class="event-detail description">18:00 intro, 18:30 talk</div>
               <div class="event-detail description">Spotkanie społeczności Rusta.</div>"#,
        );
        let record = CrosswebAdapter::new().parse_detail(URL, &html).unwrap();

        assert_eq!(record.title, "Rust Kraków Meetup #12");
        assert_eq!(record.field("type"), Some("Meetup"));
        assert_eq!(record.field("category"), Some("Programowanie"));
        assert_eq!(record.field("date"), Some("12.06.2025"));
        assert_eq!(record.field("time"), Some("18:00"));
        assert_eq!(record.field("language"), Some("polski"));
        assert_eq!(record.field("fee"), Some("bezpłatny"));
        assert_eq!(record.field("city"), Some("Kraków"));
        assert_eq!(record.field("subject"), Some(NOT_AVAILABLE));
        assert_eq!(
            record.field("registration_link"),
            Some("https://crossweb.pl/rejestracja/12/")
        );
        assert_eq!(record.field("webpage"), Some("https://rust.krakow.pl"));
        assert_eq!(record.field("speakers"), Some("jan kowalski, anna nowak"));
        assert_eq!(record.field("agenda"), Some("18:00 intro, 18:30 talk"));
        assert_eq!(record.description, "Spotkanie społeczności Rusta.");
    }

    #[test]
    fn test_parse_detail_single_description_block() {
        let html = detail_page(
            true,
            r#"<div class="event-detail description"><h3>Opis</h3>
               <div class="event-var ql-editor">Wieczór z Rustem.</div></div>"#,
        );
        let record = CrosswebAdapter::new().parse_detail(URL, &html).unwrap();

        assert_eq!(record.field("agenda"), Some(NOT_AVAILABLE));
        assert_eq!(record.description, "Wieczór z Rustem.");
    }

    #[test]
    fn test_missing_fee_is_partial_success() {
        let record = CrosswebAdapter::new()
            .parse_detail(URL, &detail_page(false, ""))
            .unwrap();

        assert_eq!(record.field("fee"), Some(NOT_AVAILABLE));
        assert_eq!(record.field("date"), Some("12.06.2025"));
        assert_eq!(record.field("city"), Some("Kraków"));
        assert_eq!(record.field("agenda"), Some(NOT_AVAILABLE));
        assert_eq!(record.description, NOT_AVAILABLE);
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let err = CrosswebAdapter::new()
            .parse_detail(URL, "<html><body><div class=\"event-label\">Data:</div></body></html>")
            .unwrap_err();
        assert_eq!(err, ExtractionError::MissingTitle(URL.to_string()));
    }
}
