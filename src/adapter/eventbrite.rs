//! Adapter for eventbrite.com search listings
//!
//! Listing pages take a `page` query parameter. Pagination continues while the
//! page carries an enabled "Next Page" control.

use super::error::ExtractionError;
use super::selectors::{element_text, first_text, hrefs, selector};
use super::{ListingPage, PaginationStrategy, SourceAdapter, SourceDescriptor, SourceKind};
use crate::record::EventRecord;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

const BASE_URL: &str = "https://www.eventbrite.com";

const NEXT_PAGE: &str = r#"[aria-label="Next Page"], [data-spec="page-next"]"#;

/// Single-value fields; each entry lists selectors tried in order
const DETAIL_FIELDS: [(&str, &[&str]); 5] = [
    ("date", &["time.start-date", "span.date-info__full-datetime"]),
    ("location", &["p.location-info__address-text"]),
    ("address", &["div.location-info__address"]),
    ("fee", &["div.conversion-bar__panel-info"]),
    ("organizer", &["strong.organizer-listing-info-variant-b__name-link"]),
];

#[derive(Debug, Clone)]
pub struct EventbriteAdapter {
    descriptor: SourceDescriptor,
}

impl EventbriteAdapter {
    pub fn new() -> Self {
        Self::with_base_url(Url::parse(BASE_URL).expect("static base URL is valid"))
    }

    /// Adapter resolving relative anchors against `base_url`
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            descriptor: SourceDescriptor {
                kind: SourceKind::Eventbrite,
                base_url,
                pagination: PaginationStrategy::CursorButton,
            },
        }
    }
}

impl Default for EventbriteAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn first_of(document: &Html, candidates: &[&str]) -> Result<Option<String>, ExtractionError> {
    for css in candidates {
        if let Some(text) = first_text(document, css)? {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

impl SourceAdapter for EventbriteAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn page_url(&self, listing_url: &str, page: usize) -> Result<String, ExtractionError> {
        let mut url = Url::parse(listing_url)?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    fn parse_listing(&self, html: &str) -> Result<ListingPage, ExtractionError> {
        let document = Html::parse_document(html);

        // the same card is often linked twice (image and title)
        let mut seen = HashSet::new();
        let links = hrefs(&document, "a.event-card-link")?
            .into_iter()
            .filter(|href| seen.insert(href.clone()))
            .collect();

        let next_selector = selector(NEXT_PAGE)?;
        let has_next = document.select(&next_selector).next().is_some_and(|next| {
            let element = next.value();
            element.attr("disabled").is_none() && element.attr("aria-disabled") != Some("true")
        });

        Ok(ListingPage { links, has_next })
    }

    fn parse_detail(&self, url: &str, html: &str) -> Result<EventRecord, ExtractionError> {
        let document = Html::parse_document(html);
        let mut record = EventRecord::new(url);

        record.title = first_text(&document, "h1.event-title")?
            .ok_or_else(|| ExtractionError::MissingTitle(url.to_string()))?;

        for (name, candidates) in DETAIL_FIELDS {
            record.set_field(name, first_of(&document, candidates)?);
        }

        let tag_selector = selector("ul.tags-list a")?;
        let tags: Vec<String> = document
            .select(&tag_selector)
            .map(element_text)
            .filter(|tag| !tag.is_empty())
            .collect();
        record.set_field("category", Some(tags.join(", ")));

        if let Some(description) = first_text(&document, "div.event-description__content")? {
            record.description = description;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::discover;
    use crate::record::NOT_AVAILABLE;
    use crate::transport::stub::StubTransport;

    const LISTING: &str = "https://www.eventbrite.com/d/poland--warsaw/science-and-tech--events/";

    fn listing_page(ids: &[u32], next: Option<&str>) -> String {
        let mut html = String::from("<html><body><section>");
        for id in ids {
            let href = format!("https://www.eventbrite.com/e/event-{id}?aff=ebdssbdestsearch");
            html.push_str(&format!(
                r#"<div class="card"><a class="event-card-link" href="{href}"><img/></a>
                   <a class="event-card-link" href="{href}"><h3>Event {id}</h3></a></div>"#
            ));
        }
        html.push_str("</section><nav>");
        if let Some(attrs) = next {
            html.push_str(&format!(r#"<button aria-label="Next Page" {attrs}>›</button>"#));
        }
        html.push_str("</nav></body></html>");
        html
    }

    #[test]
    fn test_page_url_sets_page_parameter() {
        let adapter = EventbriteAdapter::new();
        assert_eq!(adapter.page_url(LISTING, 2).unwrap(), format!("{LISTING}?page=2"));
        assert_eq!(
            adapter
                .page_url("https://www.eventbrite.com/d/online/?page=7&lang=pl", 3)
                .unwrap(),
            "https://www.eventbrite.com/d/online/?lang=pl&page=3"
        );
    }

    #[test]
    fn test_parse_listing_dedups_cards() {
        let page = EventbriteAdapter::new()
            .parse_listing(&listing_page(&[1, 2], Some("")))
            .unwrap();
        assert_eq!(page.links.len(), 2);
        assert!(page.links[0].contains("event-1"));
        assert!(page.links[1].contains("event-2"));
        assert!(page.has_next);
    }

    #[test]
    fn test_disabled_next_button_ends_pagination() {
        let adapter = EventbriteAdapter::new();
        assert!(!adapter.parse_listing(&listing_page(&[1], Some("disabled"))).unwrap().has_next);
        assert!(
            !adapter
                .parse_listing(&listing_page(&[1], Some(r#"aria-disabled="true""#)))
                .unwrap()
                .has_next
        );
        assert!(!adapter.parse_listing(&listing_page(&[1], None)).unwrap().has_next);
    }

    #[tokio::test]
    async fn test_discovery_follows_next_button() {
        let stub = StubTransport::new()
            .page(&format!("{LISTING}?page=1"), &listing_page(&[1, 2], Some("")))
            .page(&format!("{LISTING}?page=2"), &listing_page(&[3], Some("disabled")));

        let links = discover(&EventbriteAdapter::new(), &stub, LISTING, 500)
            .await
            .unwrap();
        assert_eq!(links.len(), 3);
        assert_eq!(stub.requests().len(), 2);
    }

    #[test]
    fn test_parse_detail() {
        let html = r#"<html><body>
            <h1 class="event-title">Warsaw AI Night</h1>
            <span class="date-info__full-datetime">Thursday, June 5 · 6 - 9pm CEST</span>
            <div class="location-info__address">
                <p class="location-info__address-text">Google for Startups Campus</p>
                Plac Konesera 10, Warszawa
            </div>
            <div class="conversion-bar__panel-info">Free</div>
            <strong class="organizer-listing-info-variant-b__name-link">AI Warsaw</strong>
            <ul class="tags-list"><li><a href="/t/ai">AI</a></li><li><a href="/t/ml">Machine Learning</a></li></ul>
            <div class="event-description__content"><p>Talks and networking.</p></div>
        </body></html>"#;
        let url = "https://www.eventbrite.com/e/event-1";
        let record = EventbriteAdapter::new().parse_detail(url, html).unwrap();

        assert_eq!(record.title, "Warsaw AI Night");
        assert_eq!(record.field("date"), Some("Thursday, June 5 · 6 - 9pm CEST"));
        assert_eq!(record.field("location"), Some("Google for Startups Campus"));
        assert!(record.field("address").unwrap().contains("Plac Konesera 10"));
        assert_eq!(record.field("fee"), Some("Free"));
        assert_eq!(record.field("organizer"), Some("AI Warsaw"));
        assert_eq!(record.field("category"), Some("AI, Machine Learning"));
        assert_eq!(record.description, "Talks and networking.");
    }

    #[test]
    fn test_parse_detail_missing_fee() {
        let html = r#"<h1 class="event-title">Rust Warsaw</h1>
            <time class="start-date">2025-06-05</time>"#;
        let record = EventbriteAdapter::new()
            .parse_detail("https://www.eventbrite.com/e/2", html)
            .unwrap();

        assert_eq!(record.field("date"), Some("2025-06-05"));
        assert_eq!(record.field("fee"), Some(NOT_AVAILABLE));
        assert_eq!(record.field("category"), Some(NOT_AVAILABLE));
    }
}
