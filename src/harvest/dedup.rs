//! Run-scoped set of visited detail URLs

use std::collections::HashSet;
use tokio::sync::Mutex;

/// Detail URLs already claimed during the current run
///
/// Shared by every source of a run so a URL listed by two sources, or twice
/// by one, is extracted once.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seen(&self, url: &str) -> bool {
        self.urls.lock().await.contains(url)
    }

    pub async fn mark(&self, url: &str) {
        self.urls.lock().await.insert(url.to_string());
    }

    /// Mark `url` as visited; true if it had not been visited before
    pub async fn check_and_mark(&self, url: &str) -> bool {
        self.urls.lock().await.insert(url.to_string())
    }

    pub async fn len(&self) -> usize {
        self.urls.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.urls.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.urls.lock().await.clear();
    }
}
