use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::viewport::{DerivedViewport, ViewportRequest};

/// How many of the most recent history entries to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryWindow {
    None,
    #[default]
    Last,
    Last10,
    All,
}

impl HistoryWindow {
    pub const ALL: [Self; 4] = [Self::None, Self::Last, Self::Last10, Self::All];

    /// Map a control value onto a window. Unrecognised values select
    /// [`HistoryWindow::Last`].
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "none" => Self::None,
            "last" => Self::Last,
            "ten" => Self::Last10,
            "all" => Self::All,
            other => {
                debug!(option = other, "unrecognised history option, showing last entry");
                Self::Last
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Last => "Last",
            Self::Last10 => "Last 10",
            Self::All => "All",
        }
    }
}

impl FromStr for HistoryWindow {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Immutable snapshot of one past render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Zero-based position in the log.
    pub index: usize,
    pub request: ViewportRequest,
    pub derived: DerivedViewport,
}

/// A history entry formatted for a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// One-based row number.
    pub number: usize,
    /// Centre point as `a ± bi`.
    pub center: String,
    pub width: String,
    pub limit: u32,
    /// `W x H`.
    pub pixel_dimensions: String,
    pub dither: u32,
}

impl HistoryEntry {
    /// Decimal places worth showing for this view: two beyond the
    /// magnitude of one pixel.
    pub fn display_precision(&self) -> i32 {
        let pixel_size = self.derived.request.real_width / self.derived.width() as f64;
        (-pixel_size.log10()).max(0.0).round() as i32 + 2
    }

    pub fn summary(&self) -> HistorySummary {
        let places = self.display_precision();
        let x = round_to(self.derived.x_center, places);
        let y = round_to(self.derived.y_center, places);
        let sign = if y < 0.0 { '-' } else { '+' };
        HistorySummary {
            number: self.index + 1,
            center: format!("{x} {sign} {}i", y.abs()),
            width: round_to(self.derived.request.real_width, places).to_string(),
            limit: self.derived.limit(),
            pixel_dimensions: format!("{} x {}", self.derived.width(), self.derived.height()),
            dither: self.derived.dither(),
        }
    }
}

/// Round half up (toward +∞) at `places` decimals, normalising `-0`.
fn round_to(value: f64, places: i32) -> f64 {
    let k = 10f64.powi(places);
    let rounded = (value * k + 0.5).floor() / k;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Append-only record of every render in the session.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed render and return its index.
    pub fn append(&mut self, request: ViewportRequest, derived: DerivedViewport) -> usize {
        let index = self.entries.len();
        self.entries.push(HistoryEntry {
            index,
            request,
            derived,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// The most recent entries selected by `window`, oldest first.
    pub fn window(&self, window: HistoryWindow) -> &[HistoryEntry] {
        let len = self.entries.len();
        let start = match window {
            HistoryWindow::None => len,
            HistoryWindow::Last => len.saturating_sub(1),
            HistoryWindow::Last10 => len.saturating_sub(10),
            HistoryWindow::All => 0,
        };
        &self.entries[start..]
    }

    /// The exact request that produced entry `index`.
    pub fn reissue(&self, index: usize) -> crate::Result<ViewportRequest> {
        self.entries
            .get(index)
            .map(|e| e.request)
            .ok_or(CoreError::HistoryIndex {
                index,
                len: self.entries.len(),
            })
    }

    /// Drop every entry. Only a full session reset does this.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(n: usize) -> HistoryLog {
        let mut log = HistoryLog::new();
        for k in 0..n {
            let req = ViewportRequest::new(-2.0 + k as f64 * 0.01, -1.0, 3.0, 70, 120, 2);
            let derived = DerivedViewport::derive(&req).unwrap();
            log.append(req, derived);
        }
        log
    }

    #[test]
    fn window_ten_returns_last_ten_in_order() {
        let log = log_of(25);
        let w = log.window(HistoryWindow::Last10);
        assert_eq!(w.len(), 10);
        let numbers: Vec<usize> = w.iter().map(|e| e.index + 1).collect();
        assert_eq!(numbers, (16..=25).collect::<Vec<_>>());
    }

    #[test]
    fn window_all_and_none() {
        let log = log_of(25);
        assert_eq!(log.window(HistoryWindow::All).len(), 25);
        assert!(log.window(HistoryWindow::None).is_empty());
        assert!(log_of(0).window(HistoryWindow::None).is_empty());
    }

    #[test]
    fn window_last_and_short_logs() {
        let log = log_of(3);
        let last = log.window(HistoryWindow::Last);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].index, 2);
        assert_eq!(log.window(HistoryWindow::Last10).len(), 3);
        assert!(log_of(0).window(HistoryWindow::Last).is_empty());
    }

    #[test]
    fn parse_defaults_to_last() {
        assert_eq!(HistoryWindow::parse("none"), HistoryWindow::None);
        assert_eq!(HistoryWindow::parse("ten"), HistoryWindow::Last10);
        assert_eq!(HistoryWindow::parse("all"), HistoryWindow::All);
        assert_eq!(HistoryWindow::parse("last"), HistoryWindow::Last);
        assert_eq!(HistoryWindow::parse("everything"), HistoryWindow::Last);
        assert_eq!(HistoryWindow::parse(""), HistoryWindow::Last);
        assert_eq!("ten".parse::<HistoryWindow>(), Ok(HistoryWindow::Last10));
    }

    #[test]
    fn reissue_returns_stored_request() {
        let log = log_of(5);
        let req = log.reissue(3).unwrap();
        assert_eq!(req, log.entries()[3].request);
        assert_eq!(
            log.reissue(5),
            Err(CoreError::HistoryIndex { index: 5, len: 5 })
        );
    }

    #[test]
    fn clear_empties_log() {
        let mut log = log_of(4);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn summary_rounds_to_pixel_precision() {
        let mut log = HistoryLog::new();
        let req = ViewportRequest::new(-2.3, -1.2, 3.2, 70, 400, 2);
        let derived = DerivedViewport::derive(&req).unwrap();
        log.append(req, derived);
        let entry = &log.entries()[0];
        // 3.2 / 400 = 0.008 → -log10 ≈ 2.1 → 2 + 2 places
        assert_eq!(entry.display_precision(), 4);
        let s = entry.summary();
        assert_eq!(s.number, 1);
        // y_center = (-1.2 + 1.19799…) / 2 ≈ -0.0010025
        assert_eq!(s.center, "-0.7 - 0.001i");
        assert_eq!(s.width, "3.2");
        assert_eq!(s.pixel_dimensions, "400 x 300");
        assert_eq!(s.limit, 70);
        assert_eq!(s.dither, 2);
    }

    #[test]
    fn summary_uses_minus_for_negative_imaginary() {
        let mut log = HistoryLog::new();
        let req = ViewportRequest::centered(
            crate::Complex::new(0.25, -0.5),
            0.5,
            100,
            201,
            None,
            1,
        );
        let derived = DerivedViewport::derive(&req).unwrap();
        log.append(req, derived);
        let s = log.entries()[0].summary();
        assert_eq!(s.center, "0.25 - 0.5i");
    }

    #[test]
    fn halves_round_toward_positive_infinity() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.12);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(-0.004, 2).to_string(), "0");
    }
}
