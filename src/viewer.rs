//! Per-selection preview pipeline and viewer state.
//!
//! [`load_preview`] runs one asset through detail fetch, classification,
//! byte fetch, decode/resample on a blocking thread, and overlay
//! derivation. The cancellation token is checked at every suspension
//! point and again before the result is handed back, so a cancelled
//! pipeline never publishes.
//!
//! [`Viewer`] owns what is currently displayed. Results are keyed by the
//! asset id captured at request time; a late-arriving result for a stale
//! selection is dropped instead of overwriting the buffer now on screen.

use std::sync::Arc;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::client::AssetSource;
use crate::error::PreviewError;
use crate::format::{self, PreviewKind};
use crate::overlay::{self, OverlayFrame};
use crate::preview_cache;
use crate::render::{self, RenderTarget};
use crate::tiff_decode;

/// A finished preview for one asset.
#[derive(Debug, Clone)]
pub enum Preview {
    /// Decoded scientific raster with its map placement, when known.
    Raster {
        target: Arc<RenderTarget>,
        overlay: Option<OverlayFrame>,
    },
    /// Conventional photographic image.
    Direct { target: Arc<RenderTarget> },
    /// No preview strategy for this format; offer the download instead.
    DownloadOnly,
}

impl Preview {
    #[must_use]
    pub fn render_target(&self) -> Option<&Arc<RenderTarget>> {
        match self {
            Preview::Raster { target, .. } | Preview::Direct { target } => Some(target),
            Preview::DownloadOnly => None,
        }
    }

    #[must_use]
    pub fn overlay(&self) -> Option<&OverlayFrame> {
        match self {
            Preview::Raster { overlay, .. } => overlay.as_ref(),
            _ => None,
        }
    }
}

fn ensure_live(token: &CancelToken) -> Result<(), PreviewError> {
    if token.is_cancelled() {
        Err(PreviewError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run the full preview pipeline for one asset.
///
/// Classification is by the asset's declared name; unsupported formats
/// return [`Preview::DownloadOnly`] without fetching the payload. Decode
/// and resample run on the blocking thread pool. Any failure surfaces as
/// a single [`PreviewError`]; no partial render target is ever returned.
pub async fn load_preview<S: AssetSource>(
    source: &S,
    asset_id: i64,
    max_dim: usize,
    token: &CancelToken,
) -> Result<Preview, PreviewError> {
    ensure_live(token)?;
    let detail = source.detail(asset_id).await?;
    ensure_live(token)?;

    let kind = format::classify(detail.display_name());
    let meta_bounds = detail.meta.as_ref().and_then(|m| m.bounds);

    match kind {
        PreviewKind::Unsupported => Ok(Preview::DownloadOnly),

        PreviewKind::DirectImage => {
            if let Some(target) = preview_cache::get(asset_id, max_dim) {
                debug!(asset_id, "direct preview served from cache");
                return Ok(Preview::Direct { target });
            }

            let bytes = source.bytes(asset_id).await?;
            ensure_live(token)?;

            let target = tokio::task::spawn_blocking(move || {
                render::render_direct(&bytes, max_dim)
            })
            .await
            .map_err(|e| PreviewError::Render(e.to_string()))??;

            let target = Arc::new(target);
            preview_cache::insert(asset_id, max_dim, Arc::clone(&target));
            ensure_live(token)?;
            Ok(Preview::Direct { target })
        }

        PreviewKind::ScientificRaster => {
            if let Some(target) = preview_cache::get(asset_id, max_dim) {
                debug!(asset_id, "raster preview served from cache");
                return Ok(Preview::Raster {
                    target,
                    overlay: overlay::frame(meta_bounds.as_ref()),
                });
            }

            let bytes = source.bytes(asset_id).await?;
            ensure_live(token)?;

            let (target, decoded_bounds) = tokio::task::spawn_blocking(move || {
                let raster = tiff_decode::decode(&bytes)?;
                let target = render::resample(&raster, max_dim);
                Ok::<_, PreviewError>((target, raster.bounds))
            })
            .await
            .map_err(|e| PreviewError::Render(e.to_string()))??;

            let target = Arc::new(target);
            preview_cache::insert(asset_id, max_dim, Arc::clone(&target));
            ensure_live(token)?;

            // The container's own tags win; the backend's extracted meta
            // is the fallback when the payload carried none.
            let bounds = decoded_bounds.or(meta_bounds);
            Ok(Preview::Raster {
                target,
                overlay: overlay::frame(bounds.as_ref()),
            })
        }
    }
}

/// What the viewer currently shows for its selected asset.
#[derive(Debug, Default)]
pub struct Viewer {
    selected: Option<i64>,
    token: CancelToken,
    shown: Option<(i64, Preview)>,
    error: Option<(i64, String)>,
}

impl Viewer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an asset, cancelling any in-flight pipeline for the
    /// previous selection. Returns the token to pass into
    /// [`load_preview`] for the new request.
    pub fn select(&mut self, asset_id: i64) -> CancelToken {
        self.token.cancel();
        self.token = CancelToken::new();
        self.selected = Some(asset_id);
        self.error = None;
        self.token.clone()
    }

    /// Drop the selection and cancel in-flight work (viewer unmount).
    pub fn clear(&mut self) {
        self.token.cancel();
        self.selected = None;
        self.shown = None;
        self.error = None;
    }

    /// Publish a pipeline result for the asset id captured when the
    /// request started. Returns whether the result was accepted.
    ///
    /// Stale results -- for an id that is no longer selected -- are
    /// dropped without touching the displayed state. A failure for the
    /// current selection replaces the preview with its error message;
    /// cancellations are silent.
    pub fn publish(&mut self, asset_id: i64, result: Result<Preview, PreviewError>) -> bool {
        if self.selected != Some(asset_id) {
            debug!(asset_id, "dropping stale preview result");
            return false;
        }
        match result {
            Ok(preview) => {
                self.shown = Some((asset_id, preview));
                self.error = None;
                true
            }
            Err(PreviewError::Cancelled) => false,
            Err(e) => {
                self.shown = None;
                self.error = Some((asset_id, e.user_message()));
                true
            }
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    /// The preview on display, with the asset it belongs to.
    #[must_use]
    pub fn preview(&self) -> Option<(i64, &Preview)> {
        self.shown.as_ref().map(|(id, p)| (*id, p))
    }

    /// The render-failure message for the current selection, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(_, msg)| msg.as_str())
    }
}
