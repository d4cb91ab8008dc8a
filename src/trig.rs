//! Sine and inverse sine evaluation for the tone oscillators.
//!
//! The synthesizer only needs three operations: `sin` to compute a pulse
//! width, `asin` to re-phase the incoming oscillator on a tone change, and the
//! sign of the cosine to know whether the outgoing wave was rising or falling.
//! They are provided through the [`Trig`] strategy so targets can trade flash
//! for cycles:
//!
//! - [`LibmTrig`]: calls straight into `libm`
//! - [`SineTable`]: quarter-wave lookup table with linear interpolation

use core::f32::consts::{FRAC_PI_2, PI, TAU};

/// Trigonometric backend used by the waveform synthesizer.
pub trait Trig {
    /// `sin(x)` for any finite `x` in radians.
    fn sin(&self, x: f32) -> f32;

    /// `asin(y)` in `[-π/2, π/2]`. `y` outside `[-1, 1]` is clamped.
    fn asin(&self, y: f32) -> f32;

    /// Whether `cos(x) >= 0`, i.e. whether `sin` is rising at `x`.
    fn cos_is_non_negative(&self, x: f32) -> bool;
}

/// [`Trig`] backed by the `libm` single precision routines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibmTrig;

impl Trig for LibmTrig {
    fn sin(&self, x: f32) -> f32 {
        libm::sinf(x)
    }

    fn asin(&self, y: f32) -> f32 {
        libm::asinf(y.clamp(-1.0, 1.0))
    }

    fn cos_is_non_negative(&self, x: f32) -> bool {
        libm::cosf(x) >= 0.0
    }
}

/// Number of intervals in the quarter wave table.
pub const SINE_TABLE_QUARTER_LEN: usize = 64;

/// [`Trig`] backed by a quarter-wave sine table.
///
/// The table is filled once at construction; lookups only use multiplies,
/// adds and a short binary search.
#[derive(Debug, Clone)]
pub struct SineTable {
    quarter: [f32; SINE_TABLE_QUARTER_LEN + 1],
}

impl SineTable {
    /// Builds the table.
    pub fn new() -> Self {
        let mut quarter = [0.0; SINE_TABLE_QUARTER_LEN + 1];
        for (i, v) in quarter.iter_mut().enumerate() {
            *v = libm::sinf(FRAC_PI_2 * i as f32 / SINE_TABLE_QUARTER_LEN as f32);
        }
        // Exact end points keep asin(±1) == ±π/2
        quarter[0] = 0.0;
        quarter[SINE_TABLE_QUARTER_LEN] = 1.0;
        Self { quarter }
    }

    /// Reduces `x` into `[0, 2π)`.
    fn normalize(x: f32) -> f32 {
        let r = x - TAU * libm::floorf(x / TAU);
        if r >= TAU { 0.0 } else { r }
    }

    /// Interpolated `sin` for `a` in `[0, π/2]`.
    fn quarter_sin(&self, a: f32) -> f32 {
        let pos = a / FRAC_PI_2 * SINE_TABLE_QUARTER_LEN as f32;
        let idx = (pos as usize).min(SINE_TABLE_QUARTER_LEN - 1);
        let frac = pos - idx as f32;
        self.quarter[idx] + (self.quarter[idx + 1] - self.quarter[idx]) * frac
    }
}

impl Default for SineTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Trig for SineTable {
    fn sin(&self, x: f32) -> f32 {
        let a = Self::normalize(x);
        if a < FRAC_PI_2 {
            self.quarter_sin(a)
        } else if a < PI {
            self.quarter_sin(PI - a)
        } else if a < PI + FRAC_PI_2 {
            -self.quarter_sin(a - PI)
        } else {
            -self.quarter_sin(TAU - a)
        }
    }

    fn asin(&self, y: f32) -> f32 {
        let y = y.clamp(-1.0, 1.0);
        let magnitude = if y < 0.0 { -y } else { y };

        // Largest index whose value does not exceed `magnitude`
        let mut lo = 0;
        let mut hi = SINE_TABLE_QUARTER_LEN;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.quarter[mid] <= magnitude {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let span = self.quarter[hi] - self.quarter[lo];
        let frac = if span > 0.0 {
            ((magnitude - self.quarter[lo]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let angle = (lo as f32 + frac) * FRAC_PI_2 / SINE_TABLE_QUARTER_LEN as f32;
        if y < 0.0 { -angle } else { angle }
    }

    fn cos_is_non_negative(&self, x: f32) -> bool {
        let a = Self::normalize(x);
        a <= FRAC_PI_2 || a >= PI + FRAC_PI_2
    }
}
