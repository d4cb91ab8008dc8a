//! Timer and tick-loop utilities for the AFSK driver.
//!
//! The driver needs one [`tick()`](crate::driver::AprsDriver::tick) per PWM
//! period, so the PWM timer itself is the natural tick source: its update
//! interrupt fires at `1200 * ticks_per_symbol` Hz. This employs two
//! approaches: an interrupt service routine using `critical_section::with`
//! (`timer-isr` feature), or a busy-loop delay timer (`delay-loop` feature).
//!
//! Contains helpers for polling- and ISR-based scheduling, including:
//! - `compute_pwm_period`: runtime PWM period calculator
//! - `const_pwm_period`: compile-time PWM period calculator
//! - `run_aprs_tick_loop`: blocking driver loop for `DelayNs` (feature `delay-loop`)
//! - `global_aprs_timer_tick` and `tick_aprs_timer!()`: interrupt-based tick callback wrapper
//!   (feature `timer-isr`)
//!
//! Common timer clocks: (For use with `compute_pwm_period` and `const_pwm_period`)
//!
//! | TIMER CLOCK | TICKS / SYMBOL | PWM PERIOD | Tick rate  |
//! |-------------|----------------|------------|------------|
//! |      40 MHz |             32 |       1041 | 38.4 kHz   |
//! |      16 MHz |             16 |        833 | 19.2 kHz   |
//! |      48 MHz |             32 |       1250 | 38.4 kHz   |
//! |      72 MHz |             64 |        937 | 76.8 kHz   |

use libm::round;

use crate::consts::AFSK_BAUD;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use macros::*;

/// 1,000,000,000 nanoseconds = 1 second
pub const NANOSECONDS_PER_SECOND: u32 = 1_000_000_000;

/// Tick rate needed for `ticks_per_symbol` ticks per AFSK symbol.
///
/// # Arguments
/// - `ticks_per_symbol`: PWM periods per symbol (e.g., 32)
///
/// # Returns
/// - Tick (PWM update interrupt) frequency in Hz
pub const fn tick_rate_hz(ticks_per_symbol: u8) -> u32 {
    AFSK_BAUD * ticks_per_symbol as u32
}

/// Duration of one tick.
///
/// # Arguments
/// - `ticks_per_symbol`: PWM periods per symbol (e.g., 32)
///
/// # Returns
/// - Tick interval in nanoseconds, truncated (for `run_aprs_tick_loop`)
pub const fn tick_period_ns(ticks_per_symbol: u8) -> u32 {
    let rate = tick_rate_hz(ticks_per_symbol);
    if rate == 0 {
        return 0;
    }
    NANOSECONDS_PER_SECOND / rate
}

/// Computes the PWM period (auto-reload value) for the AFSK tick
///
/// # Arguments
/// - `f_timer`: timer input clock in Hz, after the prescaler
/// - `ticks_per_symbol`: PWM periods per symbol (e.g., 32)
///
/// # Returns
/// - PWM period in timer counts (rounds to nearest integer, saturates at `u16::MAX`)
pub fn compute_pwm_period(f_timer: u32, ticks_per_symbol: u8) -> u16 {
    let rate = tick_rate_hz(ticks_per_symbol);
    if rate == 0 {
        return 0;
    }
    let period = round(f64::from(f_timer) / f64::from(rate));
    if period >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        period as u16
    }
}

/// Compile-time PWM period calculator
///
/// # Arguments
/// - `f_timer`: timer input clock in Hz, after the prescaler
/// - `ticks_per_symbol`: PWM periods per symbol (e.g., 32)
///
/// # Returns
/// - PWM period in timer counts (truncated, saturates at `u16::MAX`)
pub const fn const_pwm_period(f_timer: u32, ticks_per_symbol: u8) -> u16 {
    let rate = tick_rate_hz(ticks_per_symbol);
    if rate == 0 {
        return 0;
    }
    let period = f_timer / rate;
    if period > u16::MAX as u32 {
        u16::MAX
    } else {
        period as u16
    }
}
