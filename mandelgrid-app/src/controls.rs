use std::time::{Duration, Instant};

use tracing::warn;

use mandelgrid_core::viewport::{DEFAULT_ZOOM_FACTOR, MAX_DITHER, MIN_DITHER};
use mandelgrid_core::{DerivedViewport, HistoryWindow, ViewportRequest};
use mandelgrid_render::palette::{
    DEFAULT_PALETTE_SIZE, MAX_PALETTE_SIZE, MAX_PHASE_DEGREES, MIN_PALETTE_SIZE,
};
use mandelgrid_render::PaletteSettings;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub(crate) const DEFAULT_LIMIT: u32 = 70;
pub(crate) const DEFAULT_DITHER: u32 = 2;

/// Entered pixel widths must exceed this.
pub(crate) const PIXEL_WIDTH_FLOOR: u32 = 3;
pub(crate) const MIN_INITIAL_WIDTH: u32 = 120;
pub(crate) const MAX_INITIAL_WIDTH: u32 = 800;
const INITIAL_WIDTH_FRACTION: f32 = 0.8;

/// After a rejected width, the field shows the previous width again after
/// this long.
pub(crate) const RESTORE_DELAY: Duration = Duration::from_millis(1500);
/// The rejection warning stays up this long.
pub(crate) const WARNING_DURATION: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Values the app starts with and returns to on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AppDefaults {
    pub(crate) x_min: f64,
    pub(crate) y_min: f64,
    pub(crate) real_width: f64,
    pub(crate) limit: u32,
    pub(crate) dither: u32,
    pub(crate) zoom_factor: f64,
    pub(crate) history: HistoryWindow,
    pub(crate) palette: PaletteSettings,
}

impl Default for AppDefaults {
    fn default() -> Self {
        Self {
            x_min: -2.3,
            y_min: -1.2,
            real_width: 3.2,
            limit: DEFAULT_LIMIT,
            dither: DEFAULT_DITHER,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            history: HistoryWindow::Last,
            palette: PaletteSettings::default(),
        }
    }
}

impl AppDefaults {
    /// The whole-set view at `pixel_width`.
    pub(crate) fn initial_request(&self, pixel_width: u32) -> ViewportRequest {
        ViewportRequest::new(
            self.x_min,
            self.y_min,
            self.real_width,
            self.limit,
            pixel_width,
            self.dither,
        )
    }
}

/// Initial image width for `available` points of horizontal space.
pub(crate) fn width_from_available(available: f32) -> u32 {
    let width = (available.max(0.0) * INITIAL_WIDTH_FRACTION).round() as u32;
    width.clamp(MIN_INITIAL_WIDTH, MAX_INITIAL_WIDTH)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Positive integer; anything else keeps `previous`.
pub(crate) fn parse_limit(input: &str, previous: u32) -> u32 {
    match input.trim().parse::<u32>() {
        Ok(limit) if limit >= 1 => limit,
        _ => {
            warn!(input, previous, "invalid iteration limit, keeping previous");
            previous
        }
    }
}

pub(crate) fn parse_dither(input: &str) -> u32 {
    match input.trim().parse::<u32>() {
        Ok(d) if (MIN_DITHER..=MAX_DITHER).contains(&d) => d,
        _ => {
            warn!(input, "invalid dither, using {DEFAULT_DITHER}");
            DEFAULT_DITHER
        }
    }
}

pub(crate) fn parse_zoom_factor(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(f) if f > 0.0 && f.is_finite() => f,
        _ => {
            warn!(input, "invalid zoom factor, using {DEFAULT_ZOOM_FACTOR}");
            DEFAULT_ZOOM_FACTOR
        }
    }
}

/// Clamped into the supported range; unparsable input gives the default.
pub(crate) fn parse_palette_size(input: &str) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(size) => size.clamp(MIN_PALETTE_SIZE as i64, MAX_PALETTE_SIZE as i64) as u32,
        Err(_) => {
            warn!(input, "invalid palette size, using {DEFAULT_PALETTE_SIZE}");
            DEFAULT_PALETTE_SIZE
        }
    }
}

pub(crate) fn parse_palette_offset(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(deg) if deg.is_finite() => deg.clamp(-MAX_PHASE_DEGREES, MAX_PHASE_DEGREES),
        _ => {
            warn!(input, "invalid palette offset, using 0");
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Control values
// ---------------------------------------------------------------------------

/// Validated control state. Each field only ever holds a usable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ControlValues {
    pub(crate) limit: u32,
    pub(crate) dither: u32,
    pub(crate) zoom_factor: f64,
    pub(crate) palette: PaletteSettings,
    pub(crate) history: HistoryWindow,
}

impl ControlValues {
    pub(crate) fn from_defaults(defaults: &AppDefaults) -> Self {
        Self {
            limit: defaults.limit,
            dither: defaults.dither,
            zoom_factor: defaults.zoom_factor,
            palette: defaults.palette,
            history: defaults.history,
        }
    }

    pub(crate) fn set_limit(&mut self, input: &str) {
        self.limit = parse_limit(input, self.limit);
    }

    pub(crate) fn set_dither(&mut self, input: &str) {
        self.dither = parse_dither(input);
    }

    pub(crate) fn set_zoom_factor(&mut self, input: &str) {
        self.zoom_factor = parse_zoom_factor(input);
    }

    /// Re-read both palette inputs. Alternate shading follows the size's
    /// parity.
    pub(crate) fn set_palette(&mut self, size: &str, offset: &str) {
        self.palette = PaletteSettings::new(parse_palette_size(size), parse_palette_offset(offset));
    }

    /// Apply the current limit and dither to a request built elsewhere.
    pub(crate) fn apply(&self, request: ViewportRequest) -> ViewportRequest {
        ViewportRequest {
            limit: self.limit,
            dither: self.dither,
            ..request
        }
    }

    /// The request for a click at `(i, j)` of `view`, centred at the
    /// pixel width the controls currently ask for.
    pub(crate) fn zoom_request(
        &self,
        view: &DerivedViewport,
        i: u32,
        j: u32,
        pixel_width: u32,
    ) -> ViewportRequest {
        let zoomed = view.zoom_at(i, j, self.zoom_factor);
        ViewportRequest::centered(
            view.pixel_to_complex(i, j),
            zoomed.real_width,
            self.limit,
            pixel_width,
            zoomed.pixel_height,
            self.dither,
        )
    }
}

impl Default for ControlValues {
    fn default() -> Self {
        Self::from_defaults(&AppDefaults::default())
    }
}

/// Text buffers backing the control inputs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ControlText {
    pub(crate) limit: String,
    pub(crate) dither: String,
    pub(crate) zoom_factor: String,
    pub(crate) palette_size: String,
    pub(crate) palette_offset: String,
}

impl ControlText {
    /// Show `values` as the user would have typed them.
    pub(crate) fn from_values(values: &ControlValues) -> Self {
        Self {
            limit: values.limit.to_string(),
            dither: values.dither.to_string(),
            zoom_factor: format!("{:.1}", values.zoom_factor),
            palette_size: values.palette.size.to_string(),
            palette_offset: values.palette.offset_degrees.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pixel width field
// ---------------------------------------------------------------------------

/// The pixel-width input.
///
/// A rejected entry raises a warning; the field reverts to the last
/// accepted width after [`RESTORE_DELAY`] and the warning clears after
/// [`WARNING_DURATION`]. Both deadlines are driven by [`tick`](Self::tick).
#[derive(Debug, Clone)]
pub(crate) struct PixelWidthField {
    pub(crate) text: String,
    value: u32,
    rejected_at: Option<Instant>,
    warning: bool,
}

impl PixelWidthField {
    pub(crate) fn new(value: u32) -> Self {
        Self {
            text: value.to_string(),
            value,
            rejected_at: None,
            warning: false,
        }
    }

    pub(crate) fn value(&self) -> u32 {
        self.value
    }

    pub(crate) fn warning(&self) -> bool {
        self.warning
    }

    /// Whether a restore or warning deadline is still outstanding.
    pub(crate) fn is_pending(&self) -> bool {
        self.rejected_at.is_some()
    }

    /// Replace both the value and the text.
    pub(crate) fn set(&mut self, value: u32) {
        self.value = value;
        self.text = value.to_string();
    }

    /// Validate the text. Returns the new width when it was accepted and
    /// differs from the current one.
    pub(crate) fn commit(&mut self, now: Instant) -> Option<u32> {
        match self.text.trim().parse::<u32>() {
            Ok(width) if width > PIXEL_WIDTH_FLOOR => {
                self.text = width.to_string();
                self.rejected_at = None;
                self.warning = false;
                if width == self.value {
                    return None;
                }
                self.value = width;
                Some(width)
            }
            _ => {
                warn!(input = %self.text, "ignoring invalid pixel width");
                self.rejected_at = Some(now);
                self.warning = true;
                None
            }
        }
    }

    /// Advance the restore and warning deadlines to `now`.
    pub(crate) fn tick(&mut self, now: Instant) {
        let Some(rejected_at) = self.rejected_at else {
            return;
        };
        let elapsed = now.saturating_duration_since(rejected_at);
        if elapsed >= RESTORE_DELAY {
            self.text = self.value.to_string();
        }
        if elapsed >= WARNING_DURATION {
            self.warning = false;
            self.rejected_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_keeps_previous_on_bad_input() {
        assert_eq!(parse_limit("150", 70), 150);
        assert_eq!(parse_limit(" 90 ", 70), 90);
        assert_eq!(parse_limit("0", 70), 70);
        assert_eq!(parse_limit("-5", 70), 70);
        assert_eq!(parse_limit("abc", 200), 200);
    }

    #[test]
    fn dither_defaults_outside_range() {
        assert_eq!(parse_dither("3"), 3);
        assert_eq!(parse_dither("0"), 2);
        assert_eq!(parse_dither("6"), 2);
        assert_eq!(parse_dither(""), 2);
    }

    #[test]
    fn zoom_factor_must_be_positive() {
        assert_eq!(parse_zoom_factor("4"), 4.0);
        assert_eq!(parse_zoom_factor("0.5"), 0.5);
        assert_eq!(parse_zoom_factor("-3"), 2.0);
        assert_eq!(parse_zoom_factor("0"), 2.0);
        assert_eq!(parse_zoom_factor("inf"), 2.0);
        assert_eq!(parse_zoom_factor("x"), 2.0);
    }

    #[test]
    fn palette_inputs_clamp_or_default() {
        assert_eq!(parse_palette_size("1"), 2);
        assert_eq!(parse_palette_size("-40"), 2);
        assert_eq!(parse_palette_size("99999"), 32768);
        assert_eq!(parse_palette_size("many"), 256);
        assert_eq!(parse_palette_offset("400"), 360.0);
        assert_eq!(parse_palette_offset("-12.5"), -12.5);
        assert_eq!(parse_palette_offset("NaN"), 0.0);
        assert_eq!(parse_palette_offset(""), 0.0);
    }

    #[test]
    fn palette_toggle_follows_size_parity() {
        let mut values = ControlValues::default();
        values.set_palette("101", "0");
        assert!(!values.palette.alternate_shade);
        values.set_palette("100", "15");
        assert!(values.palette.alternate_shade);
        assert_eq!(values.palette.offset_degrees, 15.0);
    }

    #[test]
    fn zoom_request_uses_field_width() {
        let view = DerivedViewport::derive(&ViewportRequest::new(-2.3, -1.2, 3.2, 70, 200, 2))
            .unwrap();
        let mut values = ControlValues::default();
        values.set_limit("300");
        values.set_dither("3");

        let request = values.zoom_request(&view, 50, 40, 400);
        assert_eq!(request.pixel_width, 400);
        assert_eq!(request.real_width, 1.6);
        assert_eq!(request.limit, 300);
        assert_eq!(request.dither, 3);

        let zoomed = DerivedViewport::derive(&request).unwrap();
        assert_eq!(zoomed.width(), 400);
        let clicked = view.pixel_to_complex(50, 40);
        assert!((zoomed.center().re - clicked.re).abs() < 1e-12);
        assert!((zoomed.center().im - clicked.im).abs() < 1e-12);
    }

    #[test]
    fn history_option_parses() {
        assert_eq!(ControlValues::default().history, HistoryWindow::Last);
        assert_eq!("ten".parse::<HistoryWindow>(), Ok(HistoryWindow::Last10));
        assert_eq!(HistoryWindow::parse("bogus"), HistoryWindow::Last);
    }

    #[test]
    fn apply_overrides_limit_and_dither() {
        let mut values = ControlValues::default();
        values.set_limit("500");
        values.set_dither("4");
        let request = values.apply(AppDefaults::default().initial_request(200));
        assert_eq!(request.limit, 500);
        assert_eq!(request.dither, 4);
        assert_eq!(request.x_min, -2.3);
    }

    #[test]
    fn initial_width_is_clamped() {
        assert_eq!(width_from_available(100.0), 120);
        assert_eq!(width_from_available(500.0), 400);
        assert_eq!(width_from_available(2000.0), 800);
    }

    #[test]
    fn accepted_width_reports_change_once() {
        let now = Instant::now();
        let mut field = PixelWidthField::new(400);
        field.text = "4".into();
        assert_eq!(field.commit(now), Some(4));
        assert_eq!(field.commit(now), None);
        assert!(!field.warning());
    }

    #[test]
    fn rejected_width_restores_then_clears_warning() {
        let t0 = Instant::now();
        let mut field = PixelWidthField::new(400);
        field.text = "3".into();
        assert_eq!(field.commit(t0), None);
        assert!(field.warning());
        assert_eq!(field.value(), 400);

        field.tick(t0 + Duration::from_millis(1000));
        assert_eq!(field.text, "3");
        assert!(field.warning());

        field.tick(t0 + Duration::from_millis(1600));
        assert_eq!(field.text, "400");
        assert!(field.warning());
        assert!(field.is_pending());

        field.tick(t0 + Duration::from_millis(3100));
        assert!(!field.warning());
        assert!(!field.is_pending());
    }
}
