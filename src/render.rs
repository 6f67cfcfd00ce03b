//! Adaptive resampling of a decoded raster into a bounded RGBA buffer.
//!
//! Output dimensions never exceed the configured ceiling on either axis.
//! Reduction is nearest-neighbor point sampling on a fixed stride: no
//! averaging, no filtering. That bounds both compute and memory for
//! rasters far larger than the display surface; softness at high
//! downscale ratios is the accepted trade.

use crate::config::DEFAULT_MAX_DIM;
use crate::error::DecodeError;
use crate::raster::{DecodedRaster, RasterSamples};

/// A finished RGBA pixel buffer, `width * height * 4` bytes, row-major.
///
/// Owned by the display layer and replaced wholesale on each render;
/// never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl RenderTarget {
    /// RGBA quadruple at `(x, y)`. Test and inspection helper.
    #[must_use]
    pub fn rgba_at(&self, x: usize, y: usize) -> [u8; 4] {
        let base = (y * self.width + x) * 4;
        [
            self.pixels[base],
            self.pixels[base + 1],
            self.pixels[base + 2],
            self.pixels[base + 3],
        ]
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Downsampling plan for a source size under a dimension ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResamplePlan {
    pub scale: f64,
    pub out_width: usize,
    pub out_height: usize,
    /// Source pixels advanced per output pixel on both axes.
    pub stride: usize,
}

impl ResamplePlan {
    /// `scale = 1` when the source already fits, else the axis-preserving
    /// reduction that brings both dimensions under `max_dim`.
    #[must_use]
    pub fn new(width: usize, height: usize, max_dim: usize) -> Self {
        let scale = if width <= max_dim && height <= max_dim {
            1.0
        } else {
            (max_dim as f64 / width as f64).min(max_dim as f64 / height as f64)
        };
        Self {
            scale,
            out_width: (width as f64 * scale).round() as usize,
            out_height: (height as f64 * scale).round() as usize,
            stride: ((1.0 / scale).round() as usize).max(1),
        }
    }
}

/// Resample a decoded raster to fit `max_dim`, resolving each sampled
/// pixel's RGB through the band resolver and writing opaque quadruples.
///
/// The stride-walk over the source is truncated to the precomputed output
/// dimensions; pixels the walk never reaches stay transparent background.
/// The buffer is only returned after the full loop completes, so a caller
/// never observes a partially written target.
#[must_use]
pub fn resample(raster: &DecodedRaster, max_dim: usize) -> RenderTarget {
    let plan = ResamplePlan::new(raster.width, raster.height, max_dim);
    let resolver = raster.resolver();

    let mut pixels = vec![0u8; plan.out_width * plan.out_height * 4];

    for (row, sy) in (0..raster.height)
        .step_by(plan.stride)
        .take(plan.out_height)
        .enumerate()
    {
        for (col, sx) in (0..raster.width)
            .step_by(plan.stride)
            .take(plan.out_width)
            .enumerate()
        {
            let (r, g, b) = resolver.rgb_at(sx, sy);
            let base = (row * plan.out_width + col) * 4;
            pixels[base] = r;
            pixels[base + 1] = g;
            pixels[base + 2] = b;
            pixels[base + 3] = 255;
        }
    }

    RenderTarget {
        width: plan.out_width,
        height: plan.out_height,
        pixels,
    }
}

/// Convenience wrapper using the default dimension ceiling.
#[must_use]
pub fn resample_default(raster: &DecodedRaster) -> RenderTarget {
    resample(raster, DEFAULT_MAX_DIM)
}

/// Render a conventional photographic payload (JPEG/PNG) through the same
/// bounded pipeline: decode, flatten to interleaved RGB, resample.
pub fn render_direct(bytes: &[u8], max_dim: usize) -> Result<RenderTarget, DecodeError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| DecodeError::Image(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let raster = DecodedRaster {
        width: width as usize,
        height: height as usize,
        samples: RasterSamples::Interleaved {
            data: rgb.into_raw(),
            band_count: 3,
        },
        bit_depth: 8,
        bounds: None,
    };

    Ok(resample(&raster, max_dim))
}
