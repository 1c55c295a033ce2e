//! Adapter for unikonferencje.pl, a catalogue of academic conferences
//!
//! Listing pages are addressed as `{listing},s{page}`. The last page is the
//! one whose only navigation anchor points back ("Poprzednie").

use super::error::ExtractionError;
use super::selectors::{element_text, first_text, hrefs, nth_text, selector};
use super::{ListingPage, PaginationStrategy, SourceAdapter, SourceDescriptor, SourceKind};
use crate::record::EventRecord;
use scraper::Html;
use url::Url;

const BASE_URL: &str = "https://unikonferencje.pl";

/// Fields of the right-hand info column, in page order
const INFO_COLUMN_FIELDS: [&str; 4] = ["fee", "organizer", "disciplines", "keywords"];

#[derive(Debug, Clone)]
pub struct UnikonferencjeAdapter {
    descriptor: SourceDescriptor,
}

impl UnikonferencjeAdapter {
    pub fn new() -> Self {
        Self::with_base_url(Url::parse(BASE_URL).expect("static base URL is valid"))
    }

    /// Adapter resolving relative anchors against `base_url`
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            descriptor: SourceDescriptor {
                kind: SourceKind::Unikonferencje,
                base_url,
                pagination: PaginationStrategy::OffsetPage,
            },
        }
    }
}

impl Default for UnikonferencjeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for UnikonferencjeAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn page_url(&self, listing_url: &str, page: usize) -> Result<String, ExtractionError> {
        Ok(format!("{},s{}", listing_url, page))
    }

    fn parse_listing(&self, html: &str) -> Result<ListingPage, ExtractionError> {
        let document = Html::parse_document(html);
        let links = hrefs(&document, r#"a[property="url"]"#)?;

        let nav_selector = selector("a.n-p")?;
        let nav: Vec<String> = document.select(&nav_selector).map(element_text).collect();
        let last_page = nav.len() == 1 && nav[0].contains("Poprzednie");

        Ok(ListingPage {
            links,
            has_next: !last_page,
        })
    }

    fn parse_detail(&self, url: &str, html: &str) -> Result<EventRecord, ExtractionError> {
        let document = Html::parse_document(html);
        let mut record = EventRecord::new(url);

        record.title = first_text(&document, r#"h2[property="name"]"#)?
            .ok_or_else(|| ExtractionError::MissingTitle(url.to_string()))?;

        record.set_field("time", nth_text(&document, "div.content-details-box", 0)?);
        record.set_field("location", nth_text(&document, "div.content-details-box", 1)?);

        if let Some(description) = first_text(&document, "div.content-details-description")? {
            record.description = description;
        }

        for (i, name) in INFO_COLUMN_FIELDS.iter().enumerate() {
            let value = nth_text(&document, "div.content-info-column.conference div", i)?;
            record.set_field(name, value);
        }

        Ok(record)
    }
}
