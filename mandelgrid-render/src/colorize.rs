use rayon::prelude::*;

use crate::buffer::RenderBuffer;
use crate::grid::SampleGrid;

const BLACK: [u8; 3] = [0, 0, 0];

/// Average the colors of one pixel's escape counts.
///
/// Counts at or above `limit` are interior and paint black; the rest index
/// `colors` cyclically. Channel sums are scaled by `1 / dither²` (not by the
/// number of counts, so a pixel that lost samples darkens rather than
/// brightens) and rounded. Alpha is always opaque.
pub fn color_pixel(counts: &[u32], limit: u32, dither: u32, colors: &[[u8; 3]]) -> [u8; 4] {
    let mut sum = [0u32; 3];
    for &count in counts {
        let color = if count >= limit || colors.is_empty() {
            BLACK
        } else {
            colors[count as usize % colors.len()]
        };
        for (acc, v) in sum.iter_mut().zip(color) {
            *acc += v as u32;
        }
    }
    let scale = 1.0 / (dither.max(1) * dither.max(1)) as f64;
    let avg = |v: u32| (v as f64 * scale).round().min(255.0) as u8;
    [avg(sum[0]), avg(sum[1]), avg(sum[2]), 255]
}

/// Colorize an entire sample grid into an RGBA pixel buffer.
///
/// Reads the grid only; repainting the same grid with the same colors
/// always yields the same buffer.
pub fn colorize(grid: &SampleGrid, colors: &[[u8; 3]]) -> RenderBuffer {
    let len = grid.pixel_count();
    let mut pixels = vec![0u8; len * 4];
    pixels
        .par_chunks_mut(4)
        .enumerate()
        .for_each(|(idx, pixel)| {
            let c = color_pixel(grid.pixel_counts(idx), grid.limit, grid.dither, colors);
            pixel.copy_from_slice(&c);
        });
    RenderBuffer {
        width: grid.width,
        height: grid.height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: [[u8; 3]; 2] = [[200, 100, 0], [0, 50, 250]];

    #[test]
    fn interior_is_black() {
        assert_eq!(color_pixel(&[70], 70, 1, &COLORS), [0, 0, 0, 255]);
        assert_eq!(color_pixel(&[71], 70, 1, &COLORS), [0, 0, 0, 255]);
    }

    #[test]
    fn counts_wrap_around_palette() {
        assert_eq!(color_pixel(&[0], 70, 1, &COLORS), [200, 100, 0, 255]);
        assert_eq!(color_pixel(&[3], 70, 1, &COLORS), [0, 50, 250, 255]);
    }

    #[test]
    fn samples_are_averaged_and_rounded() {
        // (200 + 0 + 0 + 0) / 4 = 50, (100 + 50 + 0 + 0) / 4 = 37.5 → 38,
        // (0 + 250 + 0 + 0) / 4 = 62.5 → 63
        let c = color_pixel(&[0, 1, 70, 70], 70, 2, &COLORS);
        assert_eq!(c, [50, 38, 63, 255]);
    }

    #[test]
    fn missing_samples_darken() {
        // One kept sample out of four.
        assert_eq!(color_pixel(&[0], 70, 2, &COLORS), [50, 25, 0, 255]);
    }
}
