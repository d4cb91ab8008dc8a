//! NRZI line coding, HDLC bit-stuffing and packed bitstream storage.
//!
//! This module turns bytes into the exact bit sequence that is keyed onto the
//! AFSK tones. Bits are packed LSB first into a byte buffer; every byte of the
//! source is emitted bit 0 through bit 7.
//!
//! ## Line coding
//!
//! AX.25 uses NRZI: a logical `0` toggles the physical level, a logical `1`
//! keeps it. The physical level is what ends up in the buffer, so the
//! synthesizer only has to map `1` to the mark tone and `0` to the space tone.
//!
//! ## Bit-stuffing
//!
//! After five consecutive logical ones an extra logical zero (one more toggle)
//! is inserted so that frame contents can never imitate the `0x7E` flag.
//! Flags themselves are sent with stuffing disabled.
//!
//! ## Functions
//!
//! - [`encode_and_append_bits`]: encodes a byte slice into a packed buffer
//!
//! ## Limitations
//!
//! - A failed call may leave partially written bits behind; the whole buffer
//!   must be treated as unusable after any error.

use crate::consts::FCS_INITIAL_VALUE;
use crate::crc::crc_x25_update_bit;
use crate::error::AprsError;

/// A bit offset into a packed buffer.
///
/// Ordered by `(byte, bit)`, so comparing a cursor against a fill size
/// answers "has the whole stream been consumed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct BitstreamPos {
    /// Index of the byte holding the bit.
    pub byte: usize,
    /// Bit index inside the byte, `0..=7`, LSB first.
    pub bit: u8,
}

impl BitstreamPos {
    /// Position of the first bit of a buffer.
    pub const START: Self = Self { byte: 0, bit: 0 };

    /// Creates a position from a byte index and a bit index.
    pub const fn new(byte: usize, bit: u8) -> Self {
        Self { byte, bit }
    }

    /// Moves the position forward by one bit.
    pub fn advance(&mut self) {
        if self.bit >= 7 {
            self.byte += 1;
            self.bit = 0;
        } else {
            self.bit += 1;
        }
    }

    /// Number of bits preceding this position.
    pub const fn bit_len(&self) -> usize {
        self.byte * 8 + self.bit as usize
    }
}

/// Fixed capacity packed bit storage together with its fill size.
///
/// The fill size never exceeds the capacity. Bits past the fill size are stale
/// leftovers of earlier encodes.
#[derive(Debug, Clone)]
pub struct BitBuffer<const N: usize> {
    buf: [u8; N],
    size: BitstreamPos,
}

impl<const N: usize> BitBuffer<N> {
    /// Creates an empty, zeroed buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            size: BitstreamPos::START,
        }
    }

    /// Capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The position one past the last valid bit.
    pub fn size(&self) -> BitstreamPos {
        self.size
    }

    /// Number of valid bits.
    pub fn bit_len(&self) -> usize {
        self.size.bit_len()
    }

    /// Raw storage, including any stale bits past the fill size.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Marks the buffer empty. Storage is left as is.
    pub fn clear(&mut self) {
        self.size = BitstreamPos::START;
    }

    /// Sets the fill size.
    ///
    /// # Returns
    /// `Err(AprsError::CapacityExceeded)` if `size` lies beyond the storage.
    pub fn set_size(&mut self, size: BitstreamPos) -> Result<(), AprsError> {
        if size.byte > N || (size.byte == N && size.bit != 0) || size.bit > 7 {
            return Err(AprsError::CapacityExceeded);
        }
        self.size = size;
        Ok(())
    }

    /// Storage to encode into.
    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Reads the bit at `pos`, or `None` past the fill size.
    pub fn bit(&self, pos: BitstreamPos) -> Option<bool> {
        if pos >= self.size {
            return None;
        }
        Some(self.buf[pos.byte] & (1 << pos.bit) != 0)
    }

    /// Iterates over the valid bits in transmission order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_len()).map(move |i| self.buf[i / 8] & (1 << (i % 8)) != 0)
    }
}

impl<const N: usize> Default for BitBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether five consecutive ones are followed by an inserted zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Stuffing {
    /// Send the bits as they are (flags).
    None,
    /// Insert a zero after every run of five ones.
    Perform,
}

/// Whether the bits feed the frame check sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Fcs {
    /// Leave the accumulator untouched (flags and the FCS bytes themselves).
    None,
    /// Update the accumulator with every transmitted data bit.
    Calculate,
}

/// Whether each byte is shifted left by one before encoding (AX.25 address convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Shift {
    /// Encode the byte as is.
    None,
    /// Encode `byte << 1`.
    OneLeft,
}

/// State threaded through consecutive [`encode_and_append_bits`] calls while building one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingState {
    /// Next bit to be written.
    pub position: BitstreamPos,
    /// Last physical level written.
    pub last_bit: bool,
    /// Consecutive logical ones seen in the current stuffed run.
    pub ones: u8,
    /// Running CRC-16/X.25 accumulator.
    pub fcs: u16,
}

impl EncodingState {
    /// State for the first bit of a new frame.
    pub const fn new() -> Self {
        Self {
            position: BitstreamPos::START,
            last_bit: true,
            ones: 0,
            fcs: FCS_INITIAL_VALUE,
        }
    }

    fn emit(&mut self, buf: &mut [u8], level: bool) -> Result<(), AprsError> {
        let Some(byte) = buf.get_mut(self.position.byte) else {
            return Err(AprsError::CapacityExceeded);
        };
        if level {
            *byte |= 1 << self.position.bit;
        } else {
            *byte &= !(1 << self.position.bit);
        }
        self.position.advance();
        Ok(())
    }

    fn emit_toggle(&mut self, buf: &mut [u8]) -> Result<(), AprsError> {
        self.last_bit = !self.last_bit;
        self.emit(buf, self.last_bit)
    }
}

impl Default for EncodingState {
    fn default() -> Self {
        Self::new()
    }
}

/// NRZI encodes `data` and appends the physical bits to `buf` at `state.position`.
///
/// # Arguments
/// - `buf`: Packed destination buffer
/// - `state`: Position, NRZI level, stuffing run and FCS carried between calls
/// - `data`: Bytes to encode, each sent bit 0 first
/// - `stuffing`: Insert a zero after five ones
/// - `fcs`: Feed the transmitted data bits into `state.fcs`
/// - `shift`: Shift every byte left by one first
///
/// # Returns
/// `Err(AprsError::CapacityExceeded)` if `buf` is shorter than `data` or fills
/// up mid-way. Bits written before the failure stay in `buf`.
pub fn encode_and_append_bits(
    buf: &mut [u8],
    state: &mut EncodingState,
    data: &[u8],
    stuffing: Stuffing,
    fcs: Fcs,
    shift: Shift,
) -> Result<(), AprsError> {
    if buf.len() < data.len() {
        return Err(AprsError::CapacityExceeded);
    }

    for &byte in data {
        let byte = match shift {
            Shift::OneLeft => byte << 1,
            Shift::None => byte,
        };

        for i in 0..8 {
            let bit = (byte >> i) & 0x01 != 0;

            if fcs == Fcs::Calculate {
                state.fcs = crc_x25_update_bit(state.fcs, bit);
            }

            if bit {
                // A one keeps the current level
                state.emit(buf, state.last_bit)?;

                if stuffing == Stuffing::Perform {
                    state.ones += 1;
                    if state.ones == 5 {
                        state.emit_toggle(buf)?;
                        state.ones = 0;
                    }
                }
            } else {
                state.emit_toggle(buf)?;
                if stuffing == Stuffing::Perform {
                    state.ones = 0;
                }
            }
        }
    }

    if stuffing == Stuffing::None {
        state.ones = 0;
    }

    Ok(())
}

/// Test-only reverse of [`encode_and_append_bits`]: NRZI decode then destuff.
#[cfg(test)]
pub(crate) fn decode_stuffed<const M: usize>(
    physical: impl Iterator<Item = bool>,
    initial_level: bool,
) -> heapless::Vec<bool, M> {
    let mut out = heapless::Vec::new();
    let mut last = initial_level;
    let mut ones = 0;
    for level in physical {
        let bit = level == last;
        last = level;
        if ones == 5 {
            // Stuffed zero
            assert!(!bit, "stuffed bit must be a zero");
            ones = 0;
            continue;
        }
        if bit {
            ones += 1;
        } else {
            ones = 0;
        }
        out.push(bit).unwrap();
    }
    out
}
