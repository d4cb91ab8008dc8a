//! Constants used across the APRS/AX.25 and AFSK implementation.
//!
//! This module defines protocol-wide constants used for buffer sizing,
//! frame layout, frame check sequence computation and PWM waveform geometry.
//!
//! ## Key Concepts
//!
//! - **Flags**: `0x7E` bytes sent unstuffed before and after every frame.
//! - **Addresses**: three 7-byte AX.25 address fields (destination, source, path).
//! - **FCS**: CRC-16/X.25 computed LSB first and sent complemented, low byte first.
//! - **Buffer Sizing**: derived from the worst case frame length after bit-stuffing.
//! - **PWM geometry**: default tick rate, pulse widths and amplitude of the synthesized tones.
//!
//! These values should be used wherever framing or buffer logic is implemented to ensure
//! consistent message boundaries and timing alignment.

/// The HDLC flag byte delimiting AX.25 frames.
pub const AX25_FLAG: u8 = 0x7e;

/// AX.25 control field of an Unnumbered Information (UI) frame.
pub const AX25_CONTROL_UI: u8 = 0x03;

/// AX.25 protocol identifier meaning "no layer 3 protocol".
pub const AX25_PID_NO_LAYER3: u8 = 0xf0;

/// Length (in bytes) of a callsign inside an address field, space padded.
pub const AX25_CALLSIGN_LEN: usize = 6;

/// Length (in bytes) of one full address field (callsign plus SSID byte).
pub const AX25_ADDRESS_LEN: usize = AX25_CALLSIGN_LEN + 1;

/// Number of address fields in every frame built by this crate.
pub const AX25_ADDRESS_COUNT: usize = 3;

/// Reversed CCITT polynomial used by CRC-16/X.25 when processing bits LSB first.
pub const FCS_POLYNOMIAL: u16 = 0x8408;

/// Initial value of the frame check sequence accumulator.
pub const FCS_INITIAL_VALUE: u16 = 0xffff;

/// Value XORed into the accumulator before the FCS is appended.
pub const FCS_POST_PROCESSING_XOR_VALUE: u16 = 0xffff;

/// Remainder left by a CRC-16/X.25 run over a frame including its own FCS.
pub const FCS_GOOD_RESIDUE: u16 = 0xf0b8;

/// Default number of flags sent ahead of the frame (receiver TX delay).
pub const PREFIX_FLAGS_COUNT: u8 = 32;

/// Default number of flags sent after the frame.
pub const SUFFIX_FLAGS_COUNT: u8 = 3;

/// Telemetry sequence numbers wrap at this value (three digits).
pub const MESSAGE_ID_MODULUS: u16 = 1_000;

/// Maximum length (in bytes) of the APRS information field.
///
/// Worst case: timestamp (8) + position (19) + course/speed (8) + telemetry (42) = 77.
pub const APRS_PAYLOAD_LEN: usize = 80;

/// Number of bytes covered by the FCS besides the information field.
pub const AX25_HEADER_LEN: usize = AX25_ADDRESS_LEN * AX25_ADDRESS_COUNT + 2;

/// Maximum size (in bytes) of the packed, bit-stuffed bitstream.
///
/// Flags are never stuffed; everything between them can grow by one bit
/// for every five, hence the `6 / 5` factor (rounded up).
pub const APRS_BITSTREAM_MAX_LEN: usize = (PREFIX_FLAGS_COUNT as usize)
    + (SUFFIX_FLAGS_COUNT as usize)
    + ((AX25_HEADER_LEN + APRS_PAYLOAD_LEN + 2) * 6).div_ceil(5)
    + 1;

/// AFSK symbol rate (Bell 202).
pub const AFSK_BAUD: u32 = 1_200;

/// Mark tone, sent for a physical `1`.
pub const MARK_FREQUENCY_HZ: u32 = 1_200;

/// Space tone, sent for a physical `0`.
pub const SPACE_FREQUENCY_HZ: u32 = 2_200;

/// Default number of PWM periods (ticks) per AFSK symbol.
pub const PWM_PULSES_PER_SYMBOL: u8 = 32;

/// Default PWM period in timer counts (40 MHz / (1200 * 32)).
pub const PWM_PERIOD: u16 = 1_041;

/// Smallest pulse width ever written to the PWM peripheral.
pub const PWM_MIN_PULSE_WIDTH: u16 = 1;

/// Largest pulse width ever written to the PWM peripheral.
pub const PWM_MAX_PULSE_WIDTH: u16 = PWM_PERIOD - 1;

/// Phase advance per tick, in ticks.
pub const PWM_STEP_SIZE: f32 = 1.0;

/// Default number of minimum-width pulses used to let the transmitter stage settle (~50 ms).
pub const LEADING_WARMUP_AMPLITUDE_DC_PULSES_COUNT: u16 = 1_920;

/// Default number of mark symbols sent to flush any partially received packet.
pub const LEADING_ONES_COUNT_TO_CANCEL_PREVIOUS_PACKET: u16 = 32;
