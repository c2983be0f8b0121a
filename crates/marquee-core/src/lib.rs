//! Marquee Core - OTT Playback Library
//!
//! This crate provides the view-independent logic of the Marquee player:
//! - Catalog data access behind an injectable source
//! - Single-fetch catalog load state for a mounted view
//! - Playback state machine bound to a platform media component
//! - Auto-hiding control overlay timing
//! - Screen navigation stack
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Marquee Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Catalog    │  │   Catalog    │  │  Navigator   │           │
//! │  │   Source     │─▶│   Loader     │  │  (routes)    │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │    Media     │◀─│   Playback   │─▶│   Controls   │           │
//! │  │   Surface    │─▶│   Machine    │  │  Visibility  │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! │     events/seek      watch channel     timer + fade             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod catalog;
pub mod loader;
pub mod playback;
pub mod controls;
pub mod navigation;
pub mod config;

pub use error::{Error, Result};
pub use types::*;
pub use catalog::{demo_catalog, format_duration, validate_catalog, CatalogSource, StaticCatalog};
pub use loader::{CatalogLoadState, CatalogLoader, CATALOG_FALLBACK_ERROR};
pub use playback::{
    format_clock, format_time, normalize_error, progress_percentage, seek_step, time_remaining,
    ErrorCallback, MediaSurface, PlaybackMachine, PLAYBACK_FALLBACK_ERROR,
};
pub use controls::{ControlsOptions, ControlsVisibility};
pub use navigation::{Navigator, Route};
pub use config::MarqueeConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Marquee Core initialized");
}
