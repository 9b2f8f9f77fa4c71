use crate::complex::Complex;
use crate::escape::{EscapeEngine, EscapeParams};

/// The Mandelbrot set: `z_{n+1} = z_n² + c`, starting from `z₀ = 0`.
///
/// The point `c` is the coordinate on the complex plane.
#[derive(Debug, Clone, Default)]
pub struct Mandelbrot {
    params: EscapeParams,
}

impl Mandelbrot {
    pub fn new(params: EscapeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EscapeParams {
        &self.params
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl EscapeEngine for Mandelbrot {
    fn escape_count(&self, c: Complex, limit: u32) -> u32 {
        let bound = self.params.divergence_bound;

        // Orbits of interior points stay within |z| <= 2, so with a bound of
        // at least 4 they can be answered without iterating.
        if bound >= EscapeParams::DEFAULT_DIVERGENCE_BOUND
            && (in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im))
        {
            return limit;
        }

        let mut z = Complex::ZERO;
        for n in 0..limit {
            z = z.square_add(c);
            if z.norm_sq() > bound {
                return n;
            }
        }
        limit
    }
}
