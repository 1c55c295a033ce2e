//! # Source Adapter Module
//!
//! One adapter per supported event site. Each adapter knows two things about
//! its site: how listing pages paginate and which elements of a detail page
//! carry which record field.
//!
//! ## Key Components
//!
//! - `SourceKind`: the supported sites, recognized from a listing URL
//! - `SourceDescriptor`: static per-site configuration (base URL, pagination)
//! - `SourceAdapter`: synchronous parsing of listing and detail pages
//! - `AdapterRegistry`: maps each kind to its adapter
//! - `discover` / `extract`: async drivers shared by every adapter
//!
//! Adapters only ever see decoded HTML strings. Documents are parsed and
//! dropped inside the synchronous trait methods, so no parsed tree lives
//! across an await point.

mod crossweb;
mod error;
mod eventbrite;
pub(crate) mod selectors;
mod unikonferencje;

pub use crossweb::CrosswebAdapter;
pub use error::ExtractionError;
pub use eventbrite::EventbriteAdapter;
pub use unikonferencje::UnikonferencjeAdapter;

use crate::harvest::HarvestError;
use crate::record::EventRecord;
use crate::transport::{Transport, fetch_text};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// The supported event sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Unikonferencje,
    Eventbrite,
    Crossweb,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Unikonferencje,
        SourceKind::Eventbrite,
        SourceKind::Crossweb,
    ];

    /// Marker looked for in the host of a listing URL
    pub fn host_marker(self) -> &'static str {
        match self {
            SourceKind::Unikonferencje => "unikonferencje",
            SourceKind::Eventbrite => "eventbrite",
            SourceKind::Crossweb => "crossweb",
        }
    }

    /// Recognize the site a listing URL belongs to
    pub fn classify(url: &str) -> Option<SourceKind> {
        let parsed = Url::parse(url.trim()).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| host.contains(kind.host_marker()))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_marker())
    }
}

/// How a site splits its event listing over pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Numbered pages; the page itself signals when it is the last one
    OffsetPage,
    /// A "next page" control that disappears or is disabled on the last page
    CursorButton,
    /// The whole listing is a single page
    None,
}

/// Static configuration of one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,

    /// Base for resolving relative anchors found on the site
    pub base_url: Url,

    pub pagination: PaginationStrategy,
}

impl SourceDescriptor {
    /// Resolve an anchor found on one of this site's pages
    pub fn resolve(&self, href: &str) -> Result<String, ExtractionError> {
        Ok(self.base_url.join(href)?.to_string())
    }
}

/// What a single listing page yields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Raw `href` values of detail page anchors, in page order
    pub links: Vec<String>,

    /// Whether another listing page follows this one
    pub has_next: bool,
}

/// Per-site discovery and extraction strategy
pub trait SourceAdapter: Send + Sync {
    /// Static configuration for this site
    fn descriptor(&self) -> &SourceDescriptor;

    /// URL of the `page`-th (1-based) listing page
    fn page_url(&self, listing_url: &str, page: usize) -> Result<String, ExtractionError>;

    /// Detail anchors on a listing page and whether pagination continues
    fn parse_listing(&self, html: &str) -> Result<ListingPage, ExtractionError>;

    /// Turn a detail page into a record
    ///
    /// Missing fields become `"N/A"`; only a missing title is an error.
    fn parse_detail(&self, url: &str, html: &str) -> Result<EventRecord, ExtractionError>;
}

/// Adapters keyed by the site they handle
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(UnikonferencjeAdapter::new());
        registry.register(EventbriteAdapter::new());
        registry.register(CrosswebAdapter::new());
        registry
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.adapters.keys().collect();
        kinds.sort();
        f.debug_struct("AdapterRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl AdapterRegistry {
    /// A registry with no adapters
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter, replacing any previous one for the same kind
    pub fn register(&mut self, adapter: impl SourceAdapter + 'static) {
        let kind = adapter.descriptor().kind;
        self.adapters.insert(kind, Arc::new(adapter));
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// Adapter for a listing URL, if the URL belongs to a supported site
    pub fn for_url(&self, url: &str) -> Option<Arc<dyn SourceAdapter>> {
        SourceKind::classify(url).and_then(|kind| self.get(kind))
    }
}

/// Enumerate every detail URL reachable from `listing_url`
///
/// Follows the adapter's pagination strategy, resolves anchors against the
/// site's base URL and keeps discovery order. Any listing page that cannot
/// be fetched fails the whole discovery. `max_pages` caps runaway pagination.
#[instrument(skip(adapter, transport), fields(kind = %adapter.descriptor().kind))]
pub async fn discover<A, T>(
    adapter: &A,
    transport: &T,
    listing_url: &str,
    max_pages: usize,
) -> Result<Vec<String>, HarvestError>
where
    A: SourceAdapter + ?Sized,
    T: Transport,
{
    let descriptor = adapter.descriptor();
    let mut links = Vec::new();
    let mut page = 1;

    loop {
        let page_url = adapter.page_url(listing_url, page)?;
        let html = fetch_text(transport, &page_url).await?;
        let listing = adapter.parse_listing(&html)?;
        debug!("Page {} of {} has {} links", page, listing_url, listing.links.len());

        for href in &listing.links {
            match descriptor.resolve(href) {
                Ok(url) => links.push(url),
                Err(e) => warn!("Skipping anchor '{}' on {}: {}", href, page_url, e),
            }
        }

        if descriptor.pagination == PaginationStrategy::None || !listing.has_next {
            break;
        }
        if page >= max_pages {
            warn!(
                "Stopping discovery of {} after {} pages; pagination did not terminate",
                listing_url, max_pages
            );
            break;
        }
        page += 1;
    }

    Ok(links)
}

/// Fetch one detail page and extract its record
#[instrument(skip(adapter, transport))]
pub async fn extract<A, T>(
    adapter: &A,
    transport: &T,
    detail_url: &str,
) -> Result<EventRecord, HarvestError>
where
    A: SourceAdapter + ?Sized,
    T: Transport,
{
    let html = fetch_text(transport, detail_url).await?;
    Ok(adapter.parse_detail(detail_url, &html)?)
}
