use tracing::error;

use mandelgrid_core::{DerivedViewport, EscapeEngine};

/// Escape counts for every sub-sample of a frame, plus their histogram.
///
/// This is the raw output of the sampling pass before coloring. Keeping it
/// separate from colored pixels is what lets a palette change repaint the
/// frame without touching the escape engine.
///
/// Counts are stored flat; `offsets[p]..offsets[p + 1]` is the slice for
/// pixel `p` (row-major, row 0 at the top). A pixel normally holds
/// `dither²` counts, fewer if out-of-range samples were discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    pub width: u32,
    pub height: u32,
    pub dither: u32,
    pub limit: u32,
    offsets: Vec<usize>,
    counts: Vec<u32>,
    histogram: Vec<u64>,
    discarded: usize,
}

/// Counts gathered for one pixel row.
#[derive(Debug, Default)]
pub(crate) struct RowSamples {
    /// Number of kept counts per pixel in the row.
    lens: Vec<u32>,
    counts: Vec<u32>,
    discarded: usize,
}

impl SampleGrid {
    /// Assemble rows (in order, top first) into a grid and tally the
    /// histogram.
    pub(crate) fn from_rows(viewport: &DerivedViewport, rows: Vec<RowSamples>) -> Self {
        let pixel_count = viewport.width() as usize * viewport.height() as usize;
        let total: usize = rows.iter().map(|r| r.counts.len()).sum();

        let mut offsets = Vec::with_capacity(pixel_count + 1);
        let mut counts = Vec::with_capacity(total);
        let mut histogram = vec![0u64; viewport.limit() as usize + 1];
        let mut discarded = 0;

        offsets.push(0);
        for row in rows {
            discarded += row.discarded;
            for len in row.lens {
                let last = offsets.last().copied().unwrap_or(0);
                offsets.push(last + len as usize);
            }
            for &count in &row.counts {
                histogram[count as usize] += 1;
            }
            counts.extend(row.counts);
        }

        Self {
            width: viewport.width(),
            height: viewport.height(),
            dither: viewport.dither(),
            limit: viewport.limit(),
            offsets,
            counts,
            histogram,
            discarded,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Counts for the pixel at flat index `idx`.
    pub fn pixel_counts(&self, idx: usize) -> &[u32] {
        &self.counts[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Counts for pixel `(x, y)`.
    pub fn counts(&self, x: u32, y: u32) -> &[u32] {
        self.pixel_counts(y as usize * self.width as usize + x as usize)
    }

    /// Occurrences of each count `0..=limit` across all stored samples.
    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    pub fn total_samples(&self) -> usize {
        self.counts.len()
    }

    /// Samples dropped because the engine returned a count above the limit.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

/// Sample every pixel of row `j` on the `dither × dither` lattice.
///
/// Counts above the limit are logged and dropped rather than stored.
pub(crate) fn sample_row<E: EscapeEngine>(
    engine: &E,
    viewport: &DerivedViewport,
    j: u32,
) -> RowSamples {
    let width = viewport.width();
    let dither = viewport.dither();
    let limit = viewport.limit();
    let per_pixel = (dither * dither) as usize;

    let mut row = RowSamples {
        lens: Vec::with_capacity(width as usize),
        counts: Vec::with_capacity(width as usize * per_pixel),
        discarded: 0,
    };

    for i in 0..width {
        let mut kept = 0u32;
        for ii in 0..dither {
            for jj in 0..dither {
                let c = viewport.sample_point(i, j, ii, jj);
                let count = engine.escape_count(c, limit);
                if count > limit {
                    error!(count, limit, i, j, "sample count outside of range, discarding");
                    row.discarded += 1;
                    continue;
                }
                row.counts.push(count);
                kept += 1;
            }
        }
        row.lens.push(kept);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandelgrid_core::{Complex, Mandelbrot, ViewportRequest};

    fn viewport(dither: u32) -> DerivedViewport {
        DerivedViewport::derive(&ViewportRequest::new(-2.3, -1.2, 3.2, 40, 16, dither)).unwrap()
    }

    fn build(engine: &impl EscapeEngine, vp: &DerivedViewport) -> SampleGrid {
        let rows = (0..vp.height()).map(|j| sample_row(engine, vp, j)).collect();
        SampleGrid::from_rows(vp, rows)
    }

    /// Returns `limit + 1` for every sample left of the imaginary axis.
    struct LeftHalfBroken;

    impl EscapeEngine for LeftHalfBroken {
        fn escape_count(&self, c: Complex, limit: u32) -> u32 {
            if c.re < 0.0 {
                limit + 1
            } else {
                0
            }
        }
    }

    #[test]
    fn every_pixel_holds_dither_squared_counts() {
        for dither in 1..=3 {
            let vp = viewport(dither);
            let grid = build(&Mandelbrot::default(), &vp);
            assert_eq!(grid.pixel_count(), (vp.width() * vp.height()) as usize);
            for idx in 0..grid.pixel_count() {
                assert_eq!(grid.pixel_counts(idx).len(), (dither * dither) as usize);
            }
        }
    }

    #[test]
    fn histogram_tallies_all_samples() {
        let vp = viewport(2);
        let grid = build(&Mandelbrot::default(), &vp);
        assert_eq!(grid.histogram().len(), 41);
        let tallied: u64 = grid.histogram().iter().sum();
        assert_eq!(tallied as usize, grid.total_samples());
        assert_eq!(grid.total_samples(), 16 * 12 * 4);
        assert!(grid.histogram()[40] > 0, "interior samples land in the limit bucket");
    }

    #[test]
    fn counts_match_direct_evaluation() {
        let vp = viewport(2);
        let engine = Mandelbrot::default();
        let grid = build(&engine, &vp);
        let (x, y) = (5, 7);
        let expected: Vec<u32> = (0..2)
            .flat_map(|ii| (0..2).map(move |jj| (ii, jj)))
            .map(|(ii, jj)| engine.escape_count(vp.sample_point(x, y, ii, jj), vp.limit()))
            .collect();
        assert_eq!(grid.counts(x, y), expected.as_slice());
    }

    #[test]
    fn out_of_range_samples_are_discarded() {
        let vp = viewport(2);
        let grid = build(&LeftHalfBroken, &vp);
        assert!(grid.discarded() > 0);
        assert_eq!(grid.discarded() + grid.total_samples(), 16 * 12 * 4);
        // Leftmost column is entirely negative real part.
        assert!(grid.counts(0, 0).is_empty());
        assert!(grid.pixel_counts(grid.pixel_count() - 1).iter().all(|&c| c == 0));
    }
}
