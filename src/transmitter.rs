//! Hardware seam between the AFSK synthesizer and the board.
//!
//! The synthesizer never touches registers. Everything it needs from the
//! platform goes through [`TransmitterControl`]:
//!
//! - power (PTT / radio enable) on and off
//! - the periodic tick interrupt on and off, and acknowledging it
//! - the PWM pulse width of the next carrier period
//!
//! [`HalTransmitter`] implements it on top of `embedded-hal` 1.0 traits: an
//! [`OutputPin`] for PTT, a [`SetDutyCycle`] channel for the audio PWM and a
//! [`TickSource`] for whatever timer drives [`AprsDriver::tick`](crate::driver::AprsDriver::tick).

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// Platform actions required by the synthesizer.
///
/// `set_pulse_width` and `clear_interrupt` are called from the tick interrupt
/// and must not block.
pub trait TransmitterControl {
    /// Powers up the radio (PTT on).
    fn enable_power(&mut self);
    /// Powers down the radio (PTT off).
    fn disable_power(&mut self);
    /// Starts the periodic tick.
    fn enable_tick(&mut self);
    /// Stops the periodic tick.
    fn disable_tick(&mut self);
    /// Sets the pulse width, in timer counts, of the next PWM period.
    fn set_pulse_width(&mut self, width: u16);
    /// Acknowledges the pending tick interrupt.
    fn clear_interrupt(&mut self);
}

/// A periodic interrupt source, typically the PWM timer's update interrupt.
pub trait TickSource {
    /// Unmasks the interrupt.
    fn enable(&mut self);
    /// Masks the interrupt.
    fn disable(&mut self);
    /// Clears the pending flag.
    fn clear_pending(&mut self);
}

/// [`TransmitterControl`] built from `embedded-hal` peripherals.
///
/// ## Type Parameters
///
/// - `PTT`: Push to talk / radio enable output
/// - `PWM`: Audio PWM channel; its period is the tick period
/// - `T`: Interrupt source ticking the driver
#[derive(Debug)]
pub struct HalTransmitter<PTT, PWM, T>
where
    PTT: OutputPin,
    PWM: SetDutyCycle,
    T: TickSource,
{
    /// Push To Talk (PTT) pin
    pub ptt: PTT,
    /// Audio PWM channel
    pub pwm: PWM,
    /// Tick interrupt source
    pub tick: T,
    ptt_inverted: bool,
}

impl<PTT, PWM, T> HalTransmitter<PTT, PWM, T>
where
    PTT: OutputPin,
    PWM: SetDutyCycle,
    T: TickSource,
{
    /// Wraps the peripherals and switches PTT off.
    ///
    /// # Arguments
    /// - `ptt`: The push to talk output
    /// - `pwm`: The audio PWM channel
    /// - `tick`: The tick interrupt source
    /// - `ptt_inverted`: Whether PTT is active low (On = LOW, Off = HIGH)
    pub fn new(ptt: PTT, pwm: PWM, tick: T, ptt_inverted: Option<bool>) -> Self {
        let mut cls = Self {
            ptt,
            pwm,
            tick,
            ptt_inverted: ptt_inverted.unwrap_or(false),
        };
        cls.write_ptt(false);
        cls
    }

    fn write_ptt(&mut self, on: bool) {
        let state = if self.ptt_inverted { !on } else { on };
        if state {
            let _ = self.ptt.set_high();
        } else {
            let _ = self.ptt.set_low();
        }
    }
}

impl<PTT, PWM, T> TransmitterControl for HalTransmitter<PTT, PWM, T>
where
    PTT: OutputPin,
    PWM: SetDutyCycle,
    T: TickSource,
{
    fn enable_power(&mut self) {
        self.write_ptt(true);
    }

    fn disable_power(&mut self) {
        self.write_ptt(false);
    }

    fn enable_tick(&mut self) {
        self.tick.enable();
    }

    fn disable_tick(&mut self) {
        self.tick.disable();
    }

    fn set_pulse_width(&mut self, width: u16) {
        let max = self.pwm.max_duty_cycle();
        let _ = self.pwm.set_duty_cycle(width.min(max));
    }

    fn clear_interrupt(&mut self) {
        self.tick.clear_pending();
    }
}

/// In-memory [`TransmitterControl`] used by the unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::TransmitterControl;
    use heapless::HistoryBuffer;

    /// One call made on the transmitter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TxEvent {
        PowerOn,
        PowerOff,
        TickOn,
        TickOff,
        Pulse(u16),
    }

    #[derive(Debug, Default)]
    pub struct RecordingTransmitter {
        /// Most recent calls, oldest first via `oldest_ordered`.
        pub events: HistoryBuffer<TxEvent, 16>,
        pub pulses: usize,
        pub min_pulse: Option<u16>,
        pub max_pulse: Option<u16>,
        pub last_pulse: Option<u16>,
        pub powered: bool,
        pub ticking: bool,
        pub power_cycles: usize,
        pub interrupts_cleared: usize,
    }

    impl RecordingTransmitter {
        pub fn new() -> Self {
            Self::default()
        }

        /// The last `N` recorded events, oldest first.
        pub fn tail<const N: usize>(&self) -> heapless::Vec<TxEvent, N> {
            let skip = self.events.len().saturating_sub(N);
            self.events.oldest_ordered().skip(skip).copied().collect()
        }
    }

    impl TransmitterControl for RecordingTransmitter {
        fn enable_power(&mut self) {
            self.powered = true;
            self.power_cycles += 1;
            self.events.write(TxEvent::PowerOn);
        }

        fn disable_power(&mut self) {
            self.powered = false;
            self.events.write(TxEvent::PowerOff);
        }

        fn enable_tick(&mut self) {
            self.ticking = true;
            self.events.write(TxEvent::TickOn);
        }

        fn disable_tick(&mut self) {
            self.ticking = false;
            self.events.write(TxEvent::TickOff);
        }

        fn set_pulse_width(&mut self, width: u16) {
            self.pulses += 1;
            self.last_pulse = Some(width);
            self.min_pulse = Some(self.min_pulse.map_or(width, |m| m.min(width)));
            self.max_pulse = Some(self.max_pulse.map_or(width, |m| m.max(width)));
            self.events.write(TxEvent::Pulse(width));
        }

        fn clear_interrupt(&mut self) {
            self.interrupts_cleared += 1;
        }
    }
}
