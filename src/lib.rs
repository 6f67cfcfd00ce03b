//! # geopreview - Geo-Image Preview Pipeline
//!
//! Client core for a geo-image upload/preview service: fetch stored
//! assets from a backend, decode scientific rasters in memory, resample
//! them to a bounded RGBA buffer, and extract their geographic footprint
//! for map overlay.
//!
//! ## Features
//!
//! - **In-memory GeoTIFF decoding**: strips and tiles, LZW/Deflate/Zstd/
//!   JPEG compression, chunky and planar layouts, no GDAL
//! - **Adaptive rendering**: nearest-neighbor downsampling under a
//!   configurable dimension ceiling (default 1200), opaque RGBA output
//! - **Map overlay extraction**: pixel-to-world transform applied to the
//!   corner pixels, projected-CRS footprints suppressed
//! - **Live gallery state**: interval polling merged with WebSocket
//!   status notifications, keyed by asset id
//! - **Cancellation-aware pipeline**: stale selections never overwrite
//!   the displayed buffer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geopreview::{ApiClient, CancelToken, Config, load_preview};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(Config::from_env())?;
//!
//!     let token = CancelToken::new();
//!     let preview = load_preview(&client, 42, 1200, &token).await?;
//!     if let Some(target) = preview.render_target() {
//!         println!("rendered {}x{}", target.width, target.height);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`tiff_decode`]: GeoTIFF subset parsing from a byte buffer
//! - [`raster`]: decoded-raster model and per-pixel band resolution
//! - [`render`]: adaptive resampler and direct-image rendering
//! - [`overlay`]: bounding box to map-frame translation
//! - [`client`]: backend HTTP client ([`AssetSource`] seam)
//! - [`notify`]: lossy WebSocket status channel
//! - [`gallery`]: merged list state from polling and notifications
//! - [`viewer`]: per-selection pipeline with cancellation
//! - [`preview_cache`]: byte-bounded LRU of finished renders

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod gallery;
pub mod geometry;
pub mod notify;
pub mod overlay;
pub mod preview_cache;
pub mod raster;
pub mod render;
pub mod tiff_decode;
pub mod viewer;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{Config, DEFAULT_MAX_DIM, DEFAULT_PING_INTERVAL, DEFAULT_POLL_INTERVAL};

// ============================================================================
// Backend Client
// ============================================================================

pub use client::{ApiClient, AssetSource, ImageMeta, ImageRecord, ImageStatus, UploadReceipt};

// ============================================================================
// Format Classification
// ============================================================================

pub use format::{classify, PreviewKind};

// ============================================================================
// Raster Decoding
// ============================================================================

pub use raster::{BandResolver, DecodedRaster, RasterSamples, SampleLayout};
pub use tiff_decode::{decode, decode_with_layout, GeoTransform};

// ============================================================================
// Rendering
// ============================================================================

pub use render::{render_direct, resample, RenderTarget, ResamplePlan};

// ============================================================================
// Geometry & Overlay
// ============================================================================

pub use geometry::{GeoBounds, Point};
pub use overlay::{frame as overlay_frame, marker_style, MarkerStyle, OverlayFrame};

// ============================================================================
// Gallery & Notifications
// ============================================================================

pub use gallery::ImageIndex;
pub use notify::{NotificationChannel, StatusUpdate};

// ============================================================================
// Viewer Pipeline
// ============================================================================

pub use cancel::CancelToken;
pub use viewer::{load_preview, Preview, Viewer};

// ============================================================================
// Errors
// ============================================================================

pub use error::{ChannelError, DecodeError, FetchError, PreviewError};
