//! Logging shims.
//!
//! Forward to `defmt` (feature `defmt-0-3`) or `log` (feature `log`) and expand
//! to nothing when neither is enabled, so call sites never need `#[cfg]`.

#![allow(unused_macros)]

#[cfg(feature = "defmt-0-3")]
macro_rules! trace {
    ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
}
#[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
macro_rules! trace {
    ($($arg:tt)*) => { ::log::trace!($($arg)*) };
}
#[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x,)*);
    }};
}

#[cfg(feature = "defmt-0-3")]
macro_rules! debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}
#[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
macro_rules! debug {
    ($($arg:tt)*) => { ::log::debug!($($arg)*) };
}
#[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x,)*);
    }};
}

#[cfg(feature = "defmt-0-3")]
macro_rules! info {
    ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
}
#[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
macro_rules! info {
    ($($arg:tt)*) => { ::log::info!($($arg)*) };
}
#[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x,)*);
    }};
}

#[cfg(feature = "defmt-0-3")]
macro_rules! warn {
    ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
}
#[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
macro_rules! warn {
    ($($arg:tt)*) => { ::log::warn!($($arg)*) };
}
#[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x,)*);
    }};
}
