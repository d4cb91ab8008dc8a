//! # aprs-afsk
//!
//! A portable, no_std Rust APRS beacon for balloon telemetry transmitters: an AX.25
//! packet encoder plus an interrupt driven 1200/2200 Hz AFSK synthesizer that
//! drives a PWM output one pulse at a time.
//!
//! This crate implements a software Bell 202 modem using:
//! - `embedded-hal` traits for the PTT pin and the audio PWM channel
//! - NRZI line coding, HDLC bit-stuffing and a CRC-16/X.25 frame check sequence
//! - phase continuous tone switching, so the audio never jumps at a symbol edge
//! - interrupt-safe driver access with `critical-section`
//! - optional tick sources using either timer interrupts or blocking delay
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support |
//! | `delay-loop`          | Uses `embedded_hal::delay::DelayNs` for tick timing |
//! | `timer-isr` (default) | Uses `critical_section::with` for tick timing |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Software Features
//!
//! - **APRS position and telemetry reports** rendered without allocation
//! - **AX.25 UI-frames** with configurable destination, path and flag counts
//! - Packets decode with any standard 1200 Bd APRS receiver
//! - Pluggable sine backend: `libm` or a quarter-wave lookup table
//! - A beacon scheduler alternating between two GPS receivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aprs_afsk::driver::{AfskConfig, AprsDriver};
//! use aprs_afsk::trig::SineTable;
//!
//! let mut driver = AprsDriver::new(board, SineTable::new(), AfskConfig::default())?;
//! driver.send_aprs_message(GpsDataSource::PRIMARY, &gps, &telemetry)?;
//! // In the PWM update interrupt, 38.4 kHz with the default configuration:
//! driver.tick();
//! ```
//!
//! Or, use `run_aprs_tick_loop()` with a `DelayNs` implementation:
//!
//! ```rust,ignore
//! use aprs_afsk::timer::{run_aprs_tick_loop, tick_period_ns};
//!
//! run_aprs_tick_loop(&mut driver, &mut delay, tick_period_ns(32));
//! ```
//!
//! ## Integration Notes
//!
//! - The tick must run at `1200 * ticks_per_symbol` Hz; the PWM period sets it
//! - Timing precision is critical; hardware timer configuration is recommended for reliability
//! - Only one driver instance should be active at a time in interrupt-driven mode
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

pub mod ax25;
pub mod consts;
pub(crate) mod crc;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod payload;
pub mod schedule;
pub mod timer;
pub mod transmitter;
pub mod trig;

pub use driver::{AfskConfig, AfskMode, AprsDriver};
pub use error::AprsError;
