//! Error type shared by the encoder, the payload formatter and the driver.
//!
//! Every fallible operation in this crate returns `Result<_, AprsError>`.
//! A failure always means "nothing was transmitted": the transmitter is only
//! keyed after a frame has been built completely.

use thiserror::Error;

/// Reasons an APRS frame could not be built or sent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AprsError {
    /// The packed bitstream buffer ran out of room while encoding the frame.
    #[error("bitstream buffer capacity exceeded")]
    CapacityExceeded,

    /// The information field buffer is too small for the next field's worst case width.
    #[error("APRS payload buffer too small")]
    PayloadOverflow,

    /// A configuration or input value is unusable (e.g. zero ticks per symbol).
    #[error("invalid input")]
    InvalidInput,

    /// A transmission is already in progress; the request was rejected, not queued.
    #[error("transmitter busy")]
    Busy,
}
