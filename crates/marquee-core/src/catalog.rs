//! Catalog data access
//!
//! The catalog is supplied by a [`CatalogSource`]. [`StaticCatalog`] serves an
//! injected, read-only list, optionally after a simulated network latency.

use crate::{Catalog, Error, MediaRecord, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Trait for catalog providers
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full catalog
    async fn fetch_catalog(&self) -> Result<Catalog>;
}

/// In-memory catalog source
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    catalog: Catalog,
    latency: Duration,
}

impl StaticCatalog {
    /// Create a source serving `catalog` without delay
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            latency: Duration::ZERO,
        }
    }

    /// Source serving the built-in demo titles
    pub fn demo() -> Self {
        Self::new(demo_catalog())
    }

    /// Load a catalog from a JSON file shaped like `{"items": [...]}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        validate_catalog(&catalog)?;
        debug!(path = %path.as_ref().display(), items = catalog.len(), "Catalog file loaded");
        Ok(Self::new(catalog))
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// In-memory lookup; never fails
    pub fn get_by_id<'a>(&self, id: impl Into<Option<&'a str>>) -> Option<&MediaRecord> {
        self.catalog.get_by_id(id)
    }

    /// Get the served catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::demo()
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Catalog> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(items = self.catalog.len(), "Catalog served");
        Ok(self.catalog.clone())
    }
}

/// Check the invariants every catalog record must satisfy
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let mut seen = std::collections::HashSet::new();

    for item in &catalog.items {
        if item.id.is_empty() {
            return Err(Error::InvalidCatalog("record with empty id".into()));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(Error::InvalidCatalog(format!("duplicate id '{}'", item.id)));
        }
        if !(item.duration.is_finite() && item.duration > 0.0) {
            return Err(Error::InvalidCatalog(format!(
                "'{}' has a non-positive duration",
                item.id
            )));
        }
    }

    Ok(())
}

/// Format a runtime as `M:SS`.
///
/// Minutes are unbounded. Anything that is not a finite, non-negative number
/// formats as `0:00`.
pub fn format_duration(seconds: impl Into<Option<f64>>) -> String {
    match seconds.into() {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let minutes = (s / 60.0).floor() as u64;
            let remaining = (s % 60.0).floor() as u64;
            format!("{}:{:02}", minutes, remaining)
        }
        _ => "0:00".to_string(),
    }
}

fn demo_record(
    id: &str,
    title: &str,
    description: &str,
    thumbnail: &str,
    stream_url: &str,
    duration: f64,
) -> MediaRecord {
    MediaRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        thumbnail: thumbnail.to_string(),
        stream_url: stream_url.to_string(),
        duration,
    }
}

/// Built-in demo titles (open movies on public test CDNs)
pub fn demo_catalog() -> Catalog {
    Catalog::new(vec![
        demo_record(
            "bbb-hls",
            "Big Buck Bunny (HLS)",
            "Short animated film used as a demo stream.",
            "https://peach.blender.org/wp-content/uploads/title_anouncement.jpg",
            "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
            596.0,
        ),
        demo_record(
            "sintel-mp4",
            "Sintel (MP4)",
            "Open movie, MP4 fallback.",
            "https://durian.blender.org/wp-content/uploads/2010/06/05.8b_comp_000272.jpg",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/Sintel.mp4",
            888.0,
        ),
        demo_record(
            "tears-hls",
            "Tears of Steel (HLS)",
            "Open movie, HLS stream.",
            "https://mango.blender.org/wp-content/uploads/2013/05/01_thom_celia_bridge.jpg",
            "https://test-streams.mux.dev/tears-of-steel/playlist.m3u8",
            734.0,
        ),
        demo_record(
            "elephants-mp4",
            "Elephant Dream (MP4)",
            "Open movie, MP4 demo.",
            "https://upload.wikimedia.org/wikipedia/commons/0/0c/ElephantsDreamPoster.jpg",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
            653.0,
        ),
        demo_record(
            "bbb-mp4",
            "Big Buck Bunny (MP4)",
            "MP4 fallback of BBB.",
            "https://peach.blender.org/wp-content/uploads/title_anouncement.jpg",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
            596.0,
        ),
        demo_record(
            "for-bigger-joyrides",
            "For Bigger Joyrides (MP4)",
            "Short demo clip.",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/images/ForBiggerJoyrides.jpg",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerJoyrides.mp4",
            75.0,
        ),
    ])
}
