//! Core types for Marquee

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Unique identifier for a mounted playback view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable title in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// Unique identifier
    pub id: String,
    pub title: String,
    pub description: String,
    /// Poster image URL
    pub thumbnail: String,
    /// HLS playlist or progressive MP4 URL
    pub stream_url: String,
    /// Runtime in seconds
    pub duration: f64,
}

impl MediaRecord {
    /// Delivery format of the stream
    pub fn stream_format(&self) -> StreamFormat {
        StreamFormat::detect(&self.stream_url)
    }

    /// Whole minutes of runtime
    pub fn minutes(&self) -> u64 {
        if self.duration.is_finite() && self.duration > 0.0 {
            (self.duration / 60.0).floor() as u64
        } else {
            0
        }
    }
}

/// Catalog payload returned by a catalog source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub items: Vec<MediaRecord>,
}

impl Catalog {
    /// Create a catalog from its records
    pub fn new(items: Vec<MediaRecord>) -> Self {
        Self { items }
    }

    /// Look up a record by id.
    ///
    /// Empty and missing ids never match.
    pub fn get_by_id<'a>(&self, id: impl Into<Option<&'a str>>) -> Option<&MediaRecord> {
        let id = id.into().filter(|id| !id.is_empty())?;
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the catalog has no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stream delivery formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamFormat {
    Hls,
    Mp4,
    Unknown,
}

/// Extensions accepted by [`is_valid_stream_url`]
const VIDEO_EXTENSIONS: [&str; 5] = [".mp4", ".m3u8", ".mov", ".avi", ".mkv"];

impl StreamFormat {
    /// Detect the format from a stream URL
    pub fn detect(stream_url: &str) -> Self {
        // Check the URL path first, then the raw string for unparseable input
        let haystack = match Url::parse(stream_url) {
            Ok(url) => url.path().to_lowercase(),
            Err(_) => stream_url.to_lowercase(),
        };

        if haystack.contains(".m3u8") {
            StreamFormat::Hls
        } else if haystack.contains(".mp4") {
            StreamFormat::Mp4
        } else {
            StreamFormat::Unknown
        }
    }

    /// Short badge label
    pub fn badge(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "HLS",
            StreamFormat::Mp4 => "MP4",
            StreamFormat::Unknown => "Unknown",
        }
    }

    /// How the content is delivered
    pub fn delivery(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "Streaming",
            _ => "Download",
        }
    }

    /// Long description for the detail view
    pub fn description(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "HLS Stream",
            StreamFormat::Mp4 => "MP4 Video",
            StreamFormat::Unknown => "Unknown format",
        }
    }
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.badge())
    }
}

/// Returns true for http(s) URLs that point at a known video container
pub fn is_valid_stream_url(stream_url: &str) -> bool {
    let Ok(url) = Url::parse(stream_url) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let lower = stream_url.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

/// Payload of the media component's load event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadInfo {
    pub duration: f64,
    pub current_time: f64,
}

impl LoadInfo {
    /// Load event for media of the given duration
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            current_time: 0.0,
        }
    }
}

/// Payload of the media component's progress event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressInfo {
    pub current_time: f64,
}

impl ProgressInfo {
    /// Progress event at the given position
    pub fn new(current_time: f64) -> Self {
        Self { current_time }
    }
}

/// Playback view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub paused: bool,
    pub loading: bool,
    /// Content duration in seconds
    pub duration: f64,
    /// Playback position in seconds
    pub current_time: f64,
    /// Display message of the last playback failure
    pub error: Option<String>,
    pub muted: bool,
    /// Volume in `[0, 1]`
    pub volume: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            paused: false,
            loading: true,
            duration: 0.0,
            current_time: 0.0,
            error: None,
            muted: false,
            volume: 1.0,
        }
    }
}

/// Coarse player phase reported to the surrounding view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPhase {
    Loading,
    Playing,
    Paused,
    Error,
    Ended,
}

impl std::fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerPhase::Loading => write!(f, "loading"),
            PlayerPhase::Playing => write!(f, "playing"),
            PlayerPhase::Paused => write!(f, "paused"),
            PlayerPhase::Error => write!(f, "error"),
            PlayerPhase::Ended => write!(f, "ended"),
        }
    }
}
