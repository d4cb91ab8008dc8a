//! Interrupt driven AFSK modulator for APRS packets.
//!
//! This module provides the [`AprsDriver`] struct, which turns a GPS fix and a
//! telemetry snapshot into an AX.25 frame and then plays it out as Bell 202
//! audio (1200 Hz mark, 2200 Hz space) through a PWM channel, one pulse width
//! per [`tick()`](AprsDriver::tick).
//!
//! The driver is independent of the platform's clocks, provided that `tick()`
//! is called once per PWM period and the PWM period matches
//! [`AfskConfig::ticks_per_symbol`] ticks per 1/1200 s.
//!
//! ## Transmission phases
//!
//! | Mode                         | Output                                           |
//! |------------------------------|--------------------------------------------------|
//! | [`Idle`](AfskMode::Idle)     | nothing, tick source disabled                    |
//! | [`WarmingUp`](AfskMode::WarmingUp) | minimum pulse width, lets the PA settle    |
//! | [`CancelPrefix`](AfskMode::CancelPrefix) | mark tone, flushes receivers        |
//! | [`Streaming`](AfskMode::Streaming) | the encoded bitstream                      |
//!
//! Tone changes are phase continuous: when the tone switches, the incoming
//! oscillator is re-phased so that it continues at the same amplitude and with
//! the same slope direction as the outgoing one.
//!
//! ## Example
//!
//! ```rust
//! use aprs_afsk::driver::{AfskConfig, AprsDriver};
//! use aprs_afsk::payload::{GpsData, GpsDataSource, Telemetry};
//! use aprs_afsk::transmitter::TransmitterControl;
//! use aprs_afsk::trig::LibmTrig;
//!
//! struct Board;
//!
//! impl TransmitterControl for Board {
//!     fn enable_power(&mut self) {}
//!     fn disable_power(&mut self) {}
//!     fn enable_tick(&mut self) {}
//!     fn disable_tick(&mut self) {}
//!     fn set_pulse_width(&mut self, _width: u16) {}
//!     fn clear_interrupt(&mut self) {}
//! }
//!
//! let mut driver = AprsDriver::new(Board, LibmTrig, AfskConfig::default()).unwrap();
//! driver
//!     .send_aprs_message(GpsDataSource::PRIMARY, &GpsData::default(), &Telemetry::default())
//!     .unwrap();
//! while driver.is_sending() {
//!     driver.tick(); // Normally the PWM timer interrupt
//! }
//! assert_eq!(driver.transmissions_completed, 1);
//! ```
//!
//! For timer and tick scheduling helpers, see [`crate::timer`].

use core::convert::Infallible;
use core::f32::consts::TAU;

use heapless::String;

use crate::ax25::{CALLSIGN_SOURCE, Callsign, FrameConfig, generate_message};
use crate::consts::{
    AFSK_BAUD, APRS_BITSTREAM_MAX_LEN, APRS_PAYLOAD_LEN,
    LEADING_ONES_COUNT_TO_CANCEL_PREVIOUS_PACKET, LEADING_WARMUP_AMPLITUDE_DC_PULSES_COUNT,
    MARK_FREQUENCY_HZ, PWM_MIN_PULSE_WIDTH, PWM_PERIOD, PWM_PULSES_PER_SYMBOL, PWM_STEP_SIZE,
    SPACE_FREQUENCY_HZ,
};
use crate::encoding::{BitBuffer, BitstreamPos};
use crate::error::AprsError;
use crate::payload::{GpsData, GpsDataSource, PositionReport, Telemetry};
use crate::transmitter::TransmitterControl;
use crate::trig::Trig;

/// Warm-up duration, in symbols, used by [`AfskConfig::for_pwm_period`] (50 ms at 1200 Bd).
const WARMUP_SYMBOLS: u16 = 60;

/// Operational mode of the [`AprsDriver`].
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AfskMode {
    /// Nothing to send. The tick source and transmitter power are off.
    #[default]
    Idle,
    /// Transmitter powered, emitting the minimum pulse width.
    WarmingUp,
    /// Emitting mark symbols ahead of the frame.
    CancelPrefix,
    /// Emitting the bitstream.
    Streaming,
}

/// The two Bell 202 tones.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Tone {
    /// 1200 Hz, sent for a physical `1`.
    Mark,
    /// 2200 Hz, sent for a physical `0`.
    Space,
}

impl Tone {
    /// Tone frequency in Hz.
    pub const fn frequency_hz(self) -> u32 {
        match self {
            Tone::Mark => MARK_FREQUENCY_HZ,
            Tone::Space => SPACE_FREQUENCY_HZ,
        }
    }

    fn for_level(level: bool) -> Self {
        if level { Tone::Mark } else { Tone::Space }
    }
}

/// Runtime waveform and framing parameters of an [`AprsDriver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfskConfig {
    /// `tick()` calls per symbol, i.e. PWM periods per 1/1200 s.
    pub ticks_per_symbol: u8,
    /// Smallest pulse width written, in timer counts.
    pub min_pulse_width: u16,
    /// Largest pulse width written, in timer counts.
    pub max_pulse_width: u16,
    /// Pulse width at zero amplitude.
    pub amplitude_shift: f32,
    /// Pulse width swing at full amplitude.
    pub amplitude_scale: f32,
    /// Minimum width pulses sent after power up.
    pub warmup_ticks: u16,
    /// Mark symbols sent before the first flag.
    pub cancel_symbols: u16,
    /// Addresses and flag counts of the generated frames.
    pub frame: FrameConfig,
}

impl AfskConfig {
    /// Derives a configuration from a PWM period.
    ///
    /// The sine wave spans `1..period - 1` counts, centered in the period.
    ///
    /// # Arguments
    /// - `period`: PWM period in timer counts
    /// - `ticks_per_symbol`: PWM periods per AFSK symbol
    pub fn for_pwm_period(period: u16, ticks_per_symbol: u8) -> Self {
        let min_pulse_width = PWM_MIN_PULSE_WIDTH;
        let max_pulse_width = period.saturating_sub(1);
        Self {
            ticks_per_symbol,
            min_pulse_width,
            max_pulse_width,
            amplitude_shift: (f32::from(min_pulse_width) + f32::from(max_pulse_width)) / 2.0,
            amplitude_scale: (f32::from(max_pulse_width) - f32::from(min_pulse_width)) / 2.0,
            warmup_ticks: WARMUP_SYMBOLS.saturating_mul(u16::from(ticks_per_symbol)),
            cancel_symbols: LEADING_ONES_COUNT_TO_CANCEL_PREVIOUS_PACKET,
            frame: FrameConfig::default(),
        }
    }

    /// Checks the parameters for consistency.
    ///
    /// # Returns
    /// `Err(AprsError::InvalidInput)` when there are fewer than two ticks per
    /// symbol, the pulse width range is empty, or the amplitude is not a
    /// positive finite swing.
    pub fn validate(&self) -> Result<(), AprsError> {
        if self.ticks_per_symbol < 2
            || self.min_pulse_width >= self.max_pulse_width
            || !self.amplitude_shift.is_finite()
            || !self.amplitude_scale.is_finite()
            || self.amplitude_scale <= 0.0
        {
            return Err(AprsError::InvalidInput);
        }
        Ok(())
    }

    /// Length of one period of `tone`, in ticks.
    pub fn tone_period(&self, tone: Tone) -> f32 {
        f32::from(self.ticks_per_symbol) * AFSK_BAUD as f32 / tone.frequency_hz() as f32
    }

    fn pulse_width(&self, sine: f32) -> f32 {
        (self.amplitude_shift + self.amplitude_scale * sine)
            .clamp(f32::from(self.min_pulse_width), f32::from(self.max_pulse_width))
    }
}

impl Default for AfskConfig {
    fn default() -> Self {
        Self {
            warmup_ticks: LEADING_WARMUP_AMPLITUDE_DC_PULSES_COUNT,
            ..Self::for_pwm_period(PWM_PERIOD, PWM_PULSES_PER_SYMBOL)
        }
    }
}

/// Phase accumulator of one tone, measured in ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Oscillator {
    period: f32,
    omega: f32,
    phase: f32,
}

impl Oscillator {
    fn new(period: f32) -> Self {
        Self {
            period,
            omega: TAU / period,
            phase: 0.0,
        }
    }

    fn angle(&self) -> f32 {
        self.omega * self.phase
    }

    fn advance(&mut self, step: f32) {
        self.phase += step;
        if self.phase >= self.period {
            self.phase -= self.period;
        }
    }
}

/// Phase for `to` that continues the waveform of `from` at the same amplitude
/// and slope direction.
fn rephase<TR: Trig>(trig: &TR, config: &AfskConfig, from: &Oscillator, to: &Oscillator) -> f32 {
    let angle = from.angle();
    let width = config.pulse_width(trig.sin(angle));
    let s = trig.asin((width - config.amplitude_shift) / config.amplitude_scale);
    let phase = if trig.cos_is_non_negative(angle) {
        s / to.omega
    } else {
        to.period / 2.0 - s / to.omega
    };
    if phase < 0.0 { phase + to.period } else { phase }
}

/// A software AFSK modem transmitting APRS position reports.
///
/// `AprsDriver` owns everything a transmission needs: the encoded bitstream,
/// the payload scratch buffer and the oscillator state. The foreground starts
/// a transmission with [`send_aprs_message()`](AprsDriver::send_aprs_message);
/// from then on only [`tick()`](AprsDriver::tick) mutates the driver, until the
/// bitstream is exhausted and the driver returns itself to
/// [`AfskMode::Idle`].
///
/// ## Type Parameters
///
/// - `TX`: A type implementing [`TransmitterControl`] (power, tick source, PWM)
/// - `TR`: A [`Trig`] backend for the sine evaluation
///
/// ## Notes
///
/// - Only one `AprsDriver` instance should be active if you're using interrupts.
/// - A second `send_aprs_message()` while sending is rejected with
///   [`AprsError::Busy`]; poll [`wait_transmission_done()`](AprsDriver::wait_transmission_done)
///   first.
#[derive(Debug)]
pub struct AprsDriver<TX, TR>
where
    TX: TransmitterControl,
    TR: Trig,
{
    /// Transmitter hardware
    pub tx: TX,
    trig: TR,
    config: AfskConfig,
    source: Callsign,
    mode: AfskMode,
    bitstream: BitBuffer<APRS_BITSTREAM_MAX_LEN>,
    payload: String<APRS_PAYLOAD_LEN>,
    cursor: BitstreamPos,
    warmup_left: u16,
    cancel_left: u16,
    symbol_ticks: u8,
    tone: Tone,
    mark: Oscillator,
    space: Oscillator,
    message_id: u16,

    /// Counter of completed transmissions.
    /// Incremented when the bitstream has been sent in full and the driver returns to idle.
    pub transmissions_completed: u16,
}

impl<TX, TR> AprsDriver<TX, TR>
where
    TX: TransmitterControl,
    TR: Trig,
{
    /// Creates a new, idle `AprsDriver`.
    ///
    /// # Arguments
    /// - `tx`: The transmitter hardware
    /// - `trig`: The sine backend
    /// - `config`: Waveform and framing parameters
    ///
    /// # Returns
    /// `Err(AprsError::InvalidInput)` if `config` fails [`AfskConfig::validate`].
    ///
    /// # Notes
    /// Transmitter power is switched off and the minimum pulse width is written.
    pub fn new(tx: TX, trig: TR, config: AfskConfig) -> Result<Self, AprsError> {
        config.validate()?;
        let mut cls = Self {
            tx,
            trig,
            source: CALLSIGN_SOURCE,
            mode: AfskMode::Idle,
            bitstream: BitBuffer::new(),
            payload: String::new(),
            cursor: BitstreamPos::START,
            warmup_left: 0,
            cancel_left: 0,
            symbol_ticks: 0,
            tone: Tone::Mark,
            mark: Oscillator::new(config.tone_period(Tone::Mark)),
            space: Oscillator::new(config.tone_period(Tone::Space)),
            message_id: 0,
            transmissions_completed: 0,
            config,
        };
        cls.tx.disable_power();
        cls.tx.set_pulse_width(cls.config.min_pulse_width);
        Ok(cls)
    }

    /// Sets the callsign sent as packet source. Defaults to `HABHAB-11`.
    pub fn set_source(&mut self, source: Callsign) {
        self.source = source;
    }

    /// The callsign sent as packet source.
    pub fn source(&self) -> &Callsign {
        &self.source
    }

    /// The active configuration.
    pub fn config(&self) -> &AfskConfig {
        &self.config
    }

    /// The current mode.
    pub fn mode(&self) -> AfskMode {
        self.mode
    }

    /// Whether a transmission is in progress.
    pub fn is_sending(&self) -> bool {
        self.mode != AfskMode::Idle
    }

    /// Telemetry sequence number the next message will carry.
    pub fn next_message_id(&self) -> u16 {
        self.message_id
    }

    /// The most recently built bitstream.
    pub fn bitstream(&self) -> &BitBuffer<APRS_BITSTREAM_MAX_LEN> {
        &self.bitstream
    }

    /// Non-blocking completion check, for use with `nb::block!`.
    pub fn wait_transmission_done(&self) -> nb::Result<(), Infallible> {
        if self.is_sending() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Builds an APRS packet and starts transmitting it.
    ///
    /// # Arguments
    /// - `gps_source`: Receiver that produced `gps`, sent in the telemetry
    /// - `gps`: Fix and motion data
    /// - `telemetry`: Board telemetry
    ///
    /// # Returns
    /// - `Err(AprsError::Busy)` while a transmission is in progress; nothing changes
    /// - Any error of [`generate_message`]; the driver stays idle
    ///
    /// # Notes
    /// The message id advances once the information field has been rendered,
    /// so a frame that fails after that point still uses up its number. See
    /// [`generate_message`].
    pub fn send_aprs_message(
        &mut self,
        gps_source: GpsDataSource,
        gps: &GpsData,
        telemetry: &Telemetry,
    ) -> Result<(), AprsError> {
        if self.is_sending() {
            warn!("aprs: transmitter busy, message dropped");
            return Err(AprsError::Busy);
        }

        self.reset();

        let message_idx = self.message_id;
        let report = PositionReport {
            source: gps_source,
            gps,
            telemetry,
        };
        let size = generate_message(
            &self.config.frame,
            &self.source,
            &report,
            &mut self.message_id,
            &mut self.payload,
            self.bitstream.storage_mut(),
        )
        .inspect_err(|e| warn!("aprs: message {} not built: {}", message_idx, e))?;
        self.bitstream.set_size(size)?;
        debug!(
            "aprs: message {} built, {} bits, payload {}",
            message_idx,
            size.bit_len(),
            self.payload.as_str()
        );

        if self.warmup_left == 0 {
            self.enter_cancel_prefix();
        } else {
            self.mode = AfskMode::WarmingUp;
        }
        self.tx.enable_power();
        self.tx.enable_tick();
        Ok(())
    }

    /// Advances the modulator by one PWM period.
    ///
    /// Must be called once per PWM period from the timer interrupt while
    /// [`is_sending()`](AprsDriver::is_sending). Calls while idle only
    /// acknowledge the interrupt.
    pub fn tick(&mut self) {
        self.tx.clear_interrupt();
        match self.mode {
            AfskMode::Idle => {}
            AfskMode::WarmingUp => {
                self.tx.set_pulse_width(self.config.min_pulse_width);
                self.warmup_left = self.warmup_left.saturating_sub(1);
                if self.warmup_left == 0 {
                    self.enter_cancel_prefix();
                }
            }
            AfskMode::CancelPrefix | AfskMode::Streaming => {
                if self.symbol_ticks >= self.config.ticks_per_symbol {
                    self.symbol_ticks = 0;
                    if !self.next_symbol() {
                        self.finish();
                        return;
                    }
                }
                self.emit_pulse();
                self.symbol_ticks += 1;
            }
        }
    }

    fn reset(&mut self) {
        self.bitstream.clear();
        self.payload.clear();
        self.cursor = BitstreamPos::START;
        self.warmup_left = self.config.warmup_ticks;
        self.cancel_left = self.config.cancel_symbols;
        self.symbol_ticks = 0;
        self.tone = Tone::Mark;
        self.mark.phase = 0.0;
        self.space.phase = 0.0;
    }

    fn enter_cancel_prefix(&mut self) {
        // Next tick starts a symbol
        self.symbol_ticks = self.config.ticks_per_symbol;
        self.mode = AfskMode::CancelPrefix;
        trace!("afsk: cancel prefix");
    }

    /// Selects the tone of the next symbol. `false` once the bitstream is exhausted.
    fn next_symbol(&mut self) -> bool {
        if self.cursor >= self.bitstream.size() {
            return false;
        }
        if self.cancel_left > 0 {
            self.cancel_left -= 1;
            self.switch_tone(Tone::Mark);
            return true;
        }
        if self.mode != AfskMode::Streaming {
            self.mode = AfskMode::Streaming;
            trace!("afsk: streaming");
        }
        let Some(level) = self.bitstream.bit(self.cursor) else {
            return false;
        };
        self.switch_tone(Tone::for_level(level));
        self.cursor.advance();
        true
    }

    fn switch_tone(&mut self, tone: Tone) {
        if tone == self.tone {
            return;
        }
        match tone {
            Tone::Mark => {
                self.mark.phase = rephase(&self.trig, &self.config, &self.space, &self.mark);
            }
            Tone::Space => {
                self.space.phase = rephase(&self.trig, &self.config, &self.mark, &self.space);
            }
        }
        self.tone = tone;
    }

    fn emit_pulse(&mut self) {
        let oscillator = match self.tone {
            Tone::Mark => &mut self.mark,
            Tone::Space => &mut self.space,
        };
        let width = self.config.pulse_width(self.trig.sin(oscillator.angle()));
        oscillator.advance(PWM_STEP_SIZE);
        self.tx.set_pulse_width(width as u16);
    }

    fn finish(&mut self) {
        self.tx.disable_power();
        self.tx.set_pulse_width(self.config.min_pulse_width);
        self.transmissions_completed = self.transmissions_completed.wrapping_add(1);
        self.tx.disable_tick();
        self.mode = AfskMode::Idle;
        trace!("afsk: idle");
    }
}
