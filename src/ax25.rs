//! AX.25 UI-frame assembly.
//!
//! Builds one complete APRS packet, already NRZI encoded and bit-stuffed,
//! into a packed buffer ready for the AFSK synthesizer:
//!
//! | Segment             | Stuffed | FCS | Shifted |
//! |---------------------|---------|-----|---------|
//! | prefix flags `0x7E` | no      | no  | no      |
//! | destination address | yes     | yes | yes     |
//! | source address      | yes     | yes | yes     |
//! | path address        | yes     | yes | yes     |
//! | control, PID        | yes     | yes | no      |
//! | information field   | yes     | yes | no      |
//! | FCS low, FCS high   | yes     | no  | no      |
//! | suffix flags `0x7E` | no      | no  | no      |
//!
//! Only the six callsign bytes of an address are shifted; the SSID byte is
//! stored already in its on-air form (see [`Callsign`]).

use heapless::String;

use crate::consts::{
    AX25_CALLSIGN_LEN, AX25_CONTROL_UI, AX25_FLAG, AX25_PID_NO_LAYER3,
    FCS_POST_PROCESSING_XOR_VALUE, MESSAGE_ID_MODULUS, PREFIX_FLAGS_COUNT, SUFFIX_FLAGS_COUNT,
};
use crate::encoding::{BitstreamPos, EncodingState, Fcs, Shift, Stuffing, encode_and_append_bits};
use crate::error::AprsError;
use crate::payload::{PositionReport, create_packet_payload};

/// An AX.25 address: a space padded callsign and its SSID byte.
///
/// The SSID byte is kept in on-air form, `0b111S_SSSL`:
/// - bits 7..5: reserved and command/response bits, all set
/// - bits 4..1: the SSID
/// - bit 0: set on the last address of the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Callsign {
    /// Callsign, upper case, padded with spaces.
    pub callsign: [u8; AX25_CALLSIGN_LEN],
    /// SSID byte in on-air form.
    pub ssid: u8,
}

impl Callsign {
    /// Builds an address from a padded callsign, an SSID `0..=15` and the last-address bit.
    pub const fn new(callsign: [u8; AX25_CALLSIGN_LEN], ssid: u8, last: bool) -> Self {
        Self {
            callsign,
            ssid: 0xe0 | ((ssid & 0x0f) << 1) | last as u8,
        }
    }

    /// Builds an address from a padded callsign and a raw SSID byte.
    pub const fn from_raw(callsign: [u8; AX25_CALLSIGN_LEN], ssid: u8) -> Self {
        Self { callsign, ssid }
    }

    /// Parses a callsign such as `"N0CALL"` (1 to 6 ASCII letters or digits).
    ///
    /// # Returns
    /// `Err(AprsError::InvalidInput)` for empty, too long or non alphanumeric
    /// callsigns, or an SSID above 15.
    pub fn parse(callsign: &str, ssid: u8) -> Result<Self, AprsError> {
        let bytes = callsign.as_bytes();
        if bytes.is_empty() || bytes.len() > AX25_CALLSIGN_LEN || ssid > 15 {
            return Err(AprsError::InvalidInput);
        }
        let mut padded = [b' '; AX25_CALLSIGN_LEN];
        for (dst, &src) in padded.iter_mut().zip(bytes) {
            if !src.is_ascii_alphanumeric() {
                return Err(AprsError::InvalidInput);
            }
            *dst = src.to_ascii_uppercase();
        }
        Ok(Self::new(padded, ssid, false))
    }

    /// The SSID number.
    pub const fn ssid_number(&self) -> u8 {
        (self.ssid >> 1) & 0x0f
    }

    /// Whether this is the last address of the header.
    pub const fn is_last(&self) -> bool {
        self.ssid & 0x01 != 0
    }

    /// Copy with the last-address bit set or cleared.
    pub const fn with_last(self, last: bool) -> Self {
        Self {
            callsign: self.callsign,
            ssid: (self.ssid & !0x01) | last as u8,
        }
    }
}

/// Balloon callsign, `HABHAB-11`.
pub const CALLSIGN_SOURCE: Callsign = Callsign::new(*b"HABHAB", 11, false);

/// Destination used for generic APRS traffic, `WIDE1-1`.
pub const CALLSIGN_DESTINATION: Callsign = Callsign::new(*b"WIDE1 ", 1, false);

/// Digipeater path, `WIDE2-2`, closing the address header.
pub const CALLSIGN_PATH: Callsign = Callsign::new(*b"WIDE2 ", 2, true);

/// Frame layout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// First address of the header.
    pub destination: Callsign,
    /// Third address of the header; always sent with the last-address bit.
    pub path: Callsign,
    /// Flags sent before the frame.
    pub prefix_flags: u8,
    /// Flags sent after the frame.
    pub suffix_flags: u8,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            destination: CALLSIGN_DESTINATION,
            path: CALLSIGN_PATH,
            prefix_flags: PREFIX_FLAGS_COUNT,
            suffix_flags: SUFFIX_FLAGS_COUNT,
        }
    }
}

fn append_flags(buf: &mut [u8], state: &mut EncodingState, count: u8) -> Result<(), AprsError> {
    for _ in 0..count {
        encode_and_append_bits(
            buf,
            state,
            &[AX25_FLAG],
            Stuffing::None,
            Fcs::None,
            Shift::None,
        )?;
    }
    Ok(())
}

fn append_address(
    buf: &mut [u8],
    state: &mut EncodingState,
    address: &Callsign,
) -> Result<(), AprsError> {
    encode_and_append_bits(
        buf,
        state,
        &address.callsign,
        Stuffing::Perform,
        Fcs::Calculate,
        Shift::OneLeft,
    )?;
    encode_and_append_bits(
        buf,
        state,
        &[address.ssid],
        Stuffing::Perform,
        Fcs::Calculate,
        Shift::None,
    )
}

/// Builds a complete, encoded APRS UI-frame into `buf`.
///
/// # Arguments
/// - `frame`: Destination, path and flag counts
/// - `source`: This station's address
/// - `report`: Data rendered into the information field
/// - `message_id`: Telemetry sequence number; advanced (modulo 1000) as soon
///   as the information field has been rendered
/// - `payload`: Scratch buffer for the information field
/// - `buf`: Packed destination bitstream
///
/// # Returns
/// The fill size of `buf` on success. Any error means `buf` holds garbage.
///
/// # Notes
/// A failure while encoding the flags or the address header leaves
/// `message_id` untouched. Once the information field is rendered the number
/// is used up, even if the rest of the frame then fails to fit.
pub fn generate_message<const P: usize>(
    frame: &FrameConfig,
    source: &Callsign,
    report: &PositionReport<'_>,
    message_id: &mut u16,
    payload: &mut String<P>,
    buf: &mut [u8],
) -> Result<BitstreamPos, AprsError> {
    let mut state = EncodingState::new();

    append_flags(buf, &mut state, frame.prefix_flags)?;

    append_address(buf, &mut state, &frame.destination.with_last(false))?;
    append_address(buf, &mut state, &source.with_last(false))?;
    append_address(buf, &mut state, &frame.path.with_last(true))?;

    encode_and_append_bits(
        buf,
        &mut state,
        &[AX25_CONTROL_UI, AX25_PID_NO_LAYER3],
        Stuffing::Perform,
        Fcs::Calculate,
        Shift::None,
    )?;

    let _ = create_packet_payload(report, *message_id, payload)?;
    *message_id = (*message_id % MESSAGE_ID_MODULUS + 1) % MESSAGE_ID_MODULUS;

    encode_and_append_bits(
        buf,
        &mut state,
        payload.as_bytes(),
        Stuffing::Perform,
        Fcs::Calculate,
        Shift::None,
    )?;

    // Complemented FCS, low byte first
    let fcs = state.fcs ^ FCS_POST_PROCESSING_XOR_VALUE;
    encode_and_append_bits(
        buf,
        &mut state,
        &fcs.to_le_bytes(),
        Stuffing::Perform,
        Fcs::None,
        Shift::None,
    )?;

    append_flags(buf, &mut state, frame.suffix_flags)?;

    Ok(state.position)
}
