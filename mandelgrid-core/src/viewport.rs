use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::complex::Complex;
use crate::error::CoreError;

/// Height / width ratio used when a request does not fix its pixel height.
pub const ASPECT_RATIO: f64 = 0.75;

/// Smallest pixel width for which a per-pixel increment exists.
pub const MIN_PIXEL_WIDTH: u32 = 2;

/// Supersampling lattice bounds (samples per pixel = dither²).
pub const MIN_DITHER: u32 = 1;
pub const MAX_DITHER: u32 = 5;

/// Zoom factor substituted for non-positive or non-finite input.
pub const DEFAULT_ZOOM_FACTOR: f64 = 2.0;

/// Pixel height implied by a pixel width at the fixed aspect ratio.
pub fn height_for_width(pixel_width: u32) -> u32 {
    (pixel_width as f64 * ASPECT_RATIO).round() as u32
}

/// A render request: the lower-left corner of a window into the complex
/// plane, its real-axis width, and the sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRequest {
    /// Real part of the left edge.
    pub x_min: f64,
    /// Imaginary part of the bottom edge.
    pub y_min: f64,
    /// Extent along the real axis.
    pub real_width: f64,
    /// Iteration limit.
    pub limit: u32,
    pub pixel_width: u32,
    /// Explicit pixel height. `None` derives it from the aspect ratio.
    #[serde(default)]
    pub pixel_height: Option<u32>,
    /// Sub-samples per pixel along each axis.
    pub dither: u32,
}

impl ViewportRequest {
    pub fn new(
        x_min: f64,
        y_min: f64,
        real_width: f64,
        limit: u32,
        pixel_width: u32,
        dither: u32,
    ) -> Self {
        Self {
            x_min,
            y_min,
            real_width,
            limit,
            pixel_width,
            pixel_height: None,
            dither,
        }
    }

    /// Build a request whose derived viewport is centred on `center`.
    ///
    /// The vertical extent follows from the pixel grid: `(height − 1)`
    /// increments of `real_width / (pixel_width − 1)`.
    pub fn centered(
        center: Complex,
        real_width: f64,
        limit: u32,
        pixel_width: u32,
        pixel_height: Option<u32>,
        dither: u32,
    ) -> Self {
        let height = pixel_height.unwrap_or_else(|| height_for_width(pixel_width));
        let incr = real_width / pixel_width.saturating_sub(1).max(1) as f64;
        Self {
            x_min: center.re - real_width / 2.0,
            y_min: center.im - height.saturating_sub(1) as f64 * incr / 2.0,
            real_width,
            limit,
            pixel_width,
            pixel_height,
            dither,
        }
    }

    /// Return a copy with a fixed pixel height.
    pub fn with_pixel_height(self, pixel_height: u32) -> Self {
        Self {
            pixel_height: Some(pixel_height),
            ..self
        }
    }

    /// Return a copy sampled at a different pixel width (height re-derived
    /// unless it was fixed).
    pub fn with_pixel_width(self, pixel_width: u32) -> Self {
        Self {
            pixel_width,
            ..self
        }
    }

    /// The pixel height this request renders at.
    pub fn resolved_height(&self) -> u32 {
        self.pixel_height
            .unwrap_or_else(|| height_for_width(self.pixel_width))
    }
}

/// Geometry computed from a validated [`ViewportRequest`].
///
/// Immutable once derived; every grid sample position is a function of
/// these fields only, which is what makes re-rendering a stored request
/// reproduce the same pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedViewport {
    pub request: ViewportRequest,
    pub pixel_height: u32,
    pub x_max: f64,
    pub y_max: f64,
    /// Complex-plane distance between adjacent pixel centres.
    pub incr_per_pixel: f64,
    pub x_center: f64,
    pub y_center: f64,
    /// Distance between adjacent sub-samples inside a pixel.
    pub sub_increment: f64,
    /// Offset of the first sub-sample, centring the lattice on the pixel.
    pub sub_increment_base: f64,
}

impl DerivedViewport {
    /// Validate `request` and compute its geometry.
    pub fn derive(request: &ViewportRequest) -> crate::Result<Self> {
        if request.pixel_width < MIN_PIXEL_WIDTH {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "pixel width must be >= {MIN_PIXEL_WIDTH}, got {}",
                    request.pixel_width
                ),
            });
        }
        if request.real_width <= 0.0 || !request.real_width.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "real width must be positive and finite, got {}",
                    request.real_width
                ),
            });
        }
        if !request.x_min.is_finite() || !request.y_min.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "corner must be finite, got ({}, {})",
                    request.x_min, request.y_min
                ),
            });
        }
        let pixel_height = request.resolved_height();
        if pixel_height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: "pixel height must be > 0".to_string(),
            });
        }
        if request.limit < 1 {
            return Err(CoreError::InvalidLimit(request.limit));
        }
        if !(MIN_DITHER..=MAX_DITHER).contains(&request.dither) {
            return Err(CoreError::InvalidDither(request.dither));
        }

        let incr_per_pixel = request.real_width / (request.pixel_width - 1) as f64;
        let x_max = request.x_min + request.real_width;
        let y_max = request.y_min + (pixel_height - 1) as f64 * incr_per_pixel;
        let sub_increment = incr_per_pixel / request.dither as f64;
        let sub_increment_base = -sub_increment * (request.dither - 1) as f64 / 2.0;

        Ok(Self {
            request: *request,
            pixel_height,
            x_max,
            y_max,
            incr_per_pixel,
            x_center: (request.x_min + x_max) / 2.0,
            y_center: (request.y_min + y_max) / 2.0,
            sub_increment,
            sub_increment_base,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.request.pixel_width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixel_height
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.request.limit
    }

    #[inline]
    pub fn dither(&self) -> u32 {
        self.request.dither
    }

    pub fn center(&self) -> Complex {
        Complex::new(self.x_center, self.y_center)
    }

    /// Map a pixel coordinate to a point on the complex plane.
    ///
    /// `(0, 0)` is the top-left pixel, so row 0 sits at `y_max` and
    /// increasing `j` moves toward `y_min`.
    #[inline]
    pub fn pixel_to_complex(&self, i: u32, j: u32) -> Complex {
        Complex::new(
            self.request.x_min + self.incr_per_pixel * i as f64,
            self.y_max - self.incr_per_pixel * j as f64,
        )
    }

    /// Position of sub-sample `(ii, jj)` of pixel `(i, j)`.
    ///
    /// Both axes step upward from `sub_increment_base`, so the lattice is
    /// centred on the pixel point for any dither factor.
    #[inline]
    pub fn sample_point(&self, i: u32, j: u32, ii: u32, jj: u32) -> Complex {
        let p = self.pixel_to_complex(i, j);
        Complex::new(
            p.re + self.sub_increment_base + ii as f64 * self.sub_increment,
            p.im + self.sub_increment_base + jj as f64 * self.sub_increment,
        )
    }

    /// Recentre on pixel `(i, j)` and shrink the real width by `zoom_factor`.
    ///
    /// Pixel dimensions, dither and limit carry over, so the aspect ratio of
    /// the window is preserved. A non-positive or non-finite factor is
    /// replaced by [`DEFAULT_ZOOM_FACTOR`].
    pub fn zoom_at(&self, i: u32, j: u32, zoom_factor: f64) -> ViewportRequest {
        let factor = if zoom_factor > 0.0 && zoom_factor.is_finite() {
            zoom_factor
        } else {
            warn!(zoom_factor, "invalid zoom factor, using {DEFAULT_ZOOM_FACTOR}");
            DEFAULT_ZOOM_FACTOR
        };
        let center = self.pixel_to_complex(i, j);
        ViewportRequest::centered(
            center,
            self.request.real_width / factor,
            self.request.limit,
            self.request.pixel_width,
            self.request.pixel_height,
            self.request.dither,
        )
    }
}
