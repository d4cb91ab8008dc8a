//! Beacon timing policy for the foreground loop.
//!
//! [`BeaconScheduler`] decides when the next APRS packet goes out and which of
//! the two GPS receivers it reports:
//!
//! - the first packet is sent [`FIRST_SEND_S`] seconds after start
//! - the receivers alternate; the primary one is skipped when it has no
//!   latitude/longitude fix
//! - near the ground (`0 < altitude < low_altitude_m`) packets are sent at the
//!   fast interval, otherwise at the normal one
//! - a small, cycling dither is added so that several balloons sharing a
//!   channel drift apart
//!
//! The scheduler only works with a seconds counter supplied by the caller and
//! never blocks.

use crate::driver::AprsDriver;
use crate::error::AprsError;
use crate::payload::{GpsData, GpsDataSource, Telemetry};
use crate::transmitter::TransmitterControl;
use crate::trig::Trig;

/// Seconds after start at which the first packet is due.
pub const FIRST_SEND_S: u32 = 5;

/// Beacon intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconConfig {
    /// Interval at altitude, in seconds.
    pub sending_interval_s: u32,
    /// Interval near the ground, in seconds.
    pub fast_interval_s: u32,
    /// Altitude below which the fast interval applies, in meters.
    pub low_altitude_m: i32,
    /// Dither cycle length; `0` disables dithering.
    pub dither: u32,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            sending_interval_s: 60,
            fast_interval_s: 20,
            low_altitude_m: 2_000,
            dither: 10,
        }
    }
}

/// Result of one [`BeaconScheduler::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BeaconOutcome {
    /// Nothing was due.
    NotDue,
    /// A packet with data from this receiver is on its way.
    Sent(GpsDataSource),
    /// A packet was due but the driver refused it. The schedule advanced anyway.
    Rejected(GpsDataSource, AprsError),
}

/// Foreground beacon scheduler.
#[derive(Debug, Clone)]
pub struct BeaconScheduler {
    config: BeaconConfig,
    next_send_s: u32,
    prefer_primary: bool,
    dither_count: u32,
}

impl BeaconScheduler {
    /// Creates a scheduler whose first packet is due at [`FIRST_SEND_S`].
    pub fn new(config: BeaconConfig) -> Self {
        Self {
            config,
            next_send_s: FIRST_SEND_S,
            prefer_primary: true,
            dither_count: 0,
        }
    }

    /// Time, in seconds since start, of the next packet.
    pub fn next_send_s(&self) -> u32 {
        self.next_send_s
    }

    /// Moves the next packet to one second from `now_s` (user button).
    pub fn request_immediate(&mut self, now_s: u32) {
        self.next_send_s = now_s.saturating_add(1);
        debug!("beacon: immediate send requested for {} s", self.next_send_s);
    }

    /// Sends a packet through `driver` if one is due.
    ///
    /// # Arguments
    /// - `now_s`: Seconds since start
    /// - `primary`: Latest data of the preferred receiver
    /// - `fallback`: Latest data of the backup receiver
    /// - `telemetry`: Board telemetry
    /// - `driver`: The modulator
    pub fn poll<TX, TR>(
        &mut self,
        now_s: u32,
        primary: &GpsData,
        fallback: &GpsData,
        telemetry: &Telemetry,
        driver: &mut AprsDriver<TX, TR>,
    ) -> BeaconOutcome
    where
        TX: TransmitterControl,
        TR: Trig,
    {
        self.poll_with(now_s, primary, fallback, |source, gps| {
            driver.send_aprs_message(source, gps, telemetry)
        })
    }

    /// Like [`poll`](BeaconScheduler::poll), with the send step supplied by the caller,
    /// e.g. [`global_aprs_send`](crate::timer) on an interrupt-shared driver.
    pub fn poll_with<F>(
        &mut self,
        now_s: u32,
        primary: &GpsData,
        fallback: &GpsData,
        send: F,
    ) -> BeaconOutcome
    where
        F: FnOnce(GpsDataSource, &GpsData) -> Result<(), AprsError>,
    {
        if now_s < self.next_send_s {
            return BeaconOutcome::NotDue;
        }

        let (source, gps) = if self.prefer_primary && primary.has_position() {
            (GpsDataSource::PRIMARY, primary)
        } else {
            (GpsDataSource::FALLBACK, fallback)
        };
        self.prefer_primary = !self.prefer_primary;

        let outcome = match send(source, gps) {
            Ok(()) => BeaconOutcome::Sent(source),
            Err(e) => {
                warn!("beacon: send via receiver {} failed: {}", source.0, e);
                BeaconOutcome::Rejected(source, e)
            }
        };

        self.next_send_s = now_s.saturating_add(self.interval_s(gps.altitude_msl_meters));
        info!("beacon: receiver {}, next packet at {} s", source.0, self.next_send_s);
        outcome
    }

    fn interval_s(&mut self, altitude_m: i32) -> u32 {
        let dither = if self.config.dither > 0 {
            let dither = self.dither_count % self.config.dither;
            self.dither_count = self.dither_count.wrapping_add(1);
            dither
        } else {
            0
        };
        let base = if altitude_m > 0 && altitude_m < self.config.low_altitude_m {
            self.config.fast_interval_s
        } else {
            self.config.sending_interval_s
        };
        dither.saturating_add(base)
    }
}

impl Default for BeaconScheduler {
    fn default() -> Self {
        Self::new(BeaconConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::AfskConfig;
    use crate::payload::Coordinate;
    use crate::transmitter::testing::RecordingTransmitter;
    use crate::trig::LibmTrig;

    fn fix(altitude_msl_meters: i32) -> GpsData {
        GpsData {
            latitude: Coordinate::latitude(47.6).unwrap(),
            longitude: Coordinate::longitude(-122.3).unwrap(),
            altitude_msl_meters,
            ..GpsData::default()
        }
    }

    fn no_dither() -> BeaconConfig {
        BeaconConfig {
            dither: 0,
            ..BeaconConfig::default()
        }
    }

    fn ok(_: GpsDataSource, _: &GpsData) -> Result<(), AprsError> {
        Ok(())
    }

    #[test]
    fn test_first_send_after_five_seconds() {
        let mut scheduler = BeaconScheduler::new(no_dither());
        let gps = fix(10_000);
        for now in 0..FIRST_SEND_S {
            assert_eq!(scheduler.poll_with(now, &gps, &gps, ok), BeaconOutcome::NotDue);
        }
        assert_eq!(
            scheduler.poll_with(FIRST_SEND_S, &gps, &gps, ok),
            BeaconOutcome::Sent(GpsDataSource::PRIMARY)
        );
        assert_eq!(scheduler.next_send_s(), FIRST_SEND_S + 60);
    }

    #[test]
    fn test_receivers_alternate() {
        let mut scheduler = BeaconScheduler::new(no_dither());
        let gps = fix(10_000);
        let mut now = FIRST_SEND_S;
        let mut sources = [GpsDataSource::default(); 4];
        for slot in sources.iter_mut() {
            match scheduler.poll_with(now, &gps, &gps, ok) {
                BeaconOutcome::Sent(source) => *slot = source,
                other => panic!("unexpected {:?}", other),
            }
            now = scheduler.next_send_s();
        }
        assert_eq!(
            sources,
            [
                GpsDataSource::PRIMARY,
                GpsDataSource::FALLBACK,
                GpsDataSource::PRIMARY,
                GpsDataSource::FALLBACK
            ]
        );
    }

    #[test]
    fn test_primary_without_fix_uses_fallback() {
        let mut scheduler = BeaconScheduler::new(no_dither());
        let mut primary = fix(500);
        primary.latitude.is_valid = false;
        let fallback = fix(15_000);
        let mut used_altitude = 0;
        let outcome = scheduler.poll_with(FIRST_SEND_S, &primary, &fallback, |source, gps| {
            used_altitude = gps.altitude_msl_meters;
            assert_eq!(source, GpsDataSource::FALLBACK);
            Ok(())
        });
        assert_eq!(outcome, BeaconOutcome::Sent(GpsDataSource::FALLBACK));
        assert_eq!(used_altitude, 15_000);
        // The fallback's altitude drives the interval
        assert_eq!(scheduler.next_send_s(), FIRST_SEND_S + 60);
    }

    #[test]
    fn test_fast_interval_near_ground() {
        let mut scheduler = BeaconScheduler::new(no_dither());
        let _ = scheduler.poll_with(10, &fix(1_500), &fix(1_500), ok);
        assert_eq!(scheduler.next_send_s(), 30);

        // Zero and negative altitudes mean no usable altitude
        let mut scheduler = BeaconScheduler::new(no_dither());
        let _ = scheduler.poll_with(10, &fix(0), &fix(0), ok);
        assert_eq!(scheduler.next_send_s(), 70);
        let mut scheduler = BeaconScheduler::new(no_dither());
        let _ = scheduler.poll_with(10, &fix(-30), &fix(-30), ok);
        assert_eq!(scheduler.next_send_s(), 70);
    }

    #[test]
    fn test_dither_cycles() {
        let mut scheduler = BeaconScheduler::new(BeaconConfig {
            dither: 3,
            ..BeaconConfig::default()
        });
        let gps = fix(10_000);
        let mut offsets = [0u32; 5];
        let mut now = FIRST_SEND_S;
        for slot in offsets.iter_mut() {
            let _ = scheduler.poll_with(now, &gps, &gps, ok);
            *slot = scheduler.next_send_s() - now - 60;
            now = scheduler.next_send_s();
        }
        assert_eq!(offsets, [0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_request_immediate() {
        let mut scheduler = BeaconScheduler::new(no_dither());
        let gps = fix(10_000);
        let _ = scheduler.poll_with(5, &gps, &gps, ok);
        scheduler.request_immediate(20);
        assert_eq!(scheduler.next_send_s(), 21);
        assert_eq!(scheduler.poll_with(20, &gps, &gps, ok), BeaconOutcome::NotDue);
        assert_eq!(
            scheduler.poll_with(21, &gps, &gps, ok),
            BeaconOutcome::Sent(GpsDataSource::FALLBACK)
        );
    }

    #[test]
    fn test_poll_drives_the_driver() {
        let mut driver =
            AprsDriver::new(RecordingTransmitter::new(), LibmTrig, AfskConfig::default()).unwrap();
        let mut scheduler = BeaconScheduler::new(no_dither());
        let telemetry = Telemetry::default();
        let gps = fix(10_000);

        assert_eq!(
            scheduler.poll(5, &gps, &gps, &telemetry, &mut driver),
            BeaconOutcome::Sent(GpsDataSource::PRIMARY)
        );
        assert!(driver.is_sending());

        // Still on air when the next packet is due
        scheduler.request_immediate(5);
        assert_eq!(
            scheduler.poll(6, &gps, &gps, &telemetry, &mut driver),
            BeaconOutcome::Rejected(GpsDataSource::FALLBACK, AprsError::Busy)
        );
        assert_eq!(scheduler.next_send_s(), 66);
        assert_eq!(driver.tx.power_cycles, 1);
    }
}
