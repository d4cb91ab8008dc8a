//! APRS information field formatting.
//!
//! Renders a GPS fix and a telemetry snapshot into the ASCII information field
//! of an APRS packet:
//!
//! ```text
//! !3746.49N/12225.16W>018/005T#007,001,025,033,000,000,00000000 a=00010
//! ^ position (only with a valid fix)  ^ telemetry (always)
//! ```
//!
//! The GPS structures here are snapshots owned by whatever parses the NMEA
//! sentences; this crate only reads them.

use core::fmt::Write;

use heapless::String;

use crate::error::AprsError;

/// Worst case width of `@HHMMSSz`.
const TIMESTAMP_WIDTH: usize = 8;
/// Width of the `!` marker.
const NO_TIMESTAMP_WIDTH: usize = 1;
/// Worst case width of `DDMM.mmH/DDDMM.mmH`.
const POSITION_WIDTH: usize = 19;
/// Width of `>CCC/SSS`.
const COURSE_SPEED_WIDTH: usize = 8;
/// Width of `T#iii,ggg,ttt,vvv,000,000,00000000 a=aaaaa`.
const TELEMETRY_WIDTH: usize = 42;

/// Identifies which GPS receiver produced a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct GpsDataSource(pub u8);

impl GpsDataSource {
    /// The preferred receiver.
    pub const PRIMARY: Self = Self(0);
    /// The receiver used when the primary one has no fix.
    pub const FALLBACK: Self = Self(1);
}

/// One axis of a position fix, in degrees and fixed point minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coordinate {
    /// Whole degrees.
    pub degrees: u16,
    /// Minutes multiplied by 1 000 000.
    pub minutes_millionths: u32,
    /// `N`/`S` for latitude, `E`/`W` for longitude.
    pub hemisphere: u8,
    /// Whether the receiver reported this axis.
    pub is_valid: bool,
}

impl Coordinate {
    /// A valid latitude from signed decimal degrees (north positive).
    ///
    /// # Returns
    /// `Err(AprsError::InvalidInput)` unless `-90.0 <= decimal_degrees <= 90.0`.
    pub fn latitude(decimal_degrees: f64) -> Result<Self, AprsError> {
        Self::from_decimal(decimal_degrees, 90.0, b'N', b'S')
    }

    /// A valid longitude from signed decimal degrees (east positive).
    ///
    /// # Returns
    /// `Err(AprsError::InvalidInput)` unless `-180.0 <= decimal_degrees <= 180.0`.
    pub fn longitude(decimal_degrees: f64) -> Result<Self, AprsError> {
        Self::from_decimal(decimal_degrees, 180.0, b'E', b'W')
    }

    fn from_decimal(value: f64, limit: f64, positive: u8, negative: u8) -> Result<Self, AprsError> {
        // NaN fails the range check too
        if !(-limit..=limit).contains(&value) {
            return Err(AprsError::InvalidInput);
        }
        let hemisphere = if value < 0.0 { negative } else { positive };
        let value = libm::fabs(value);
        let degrees = libm::floor(value);
        let mut minutes_millionths = libm::round((value - degrees) * 60.0 * 1_000_000.0) as u32;
        let mut degrees = degrees as u16;
        if minutes_millionths >= 60_000_000 {
            minutes_millionths -= 60_000_000;
            degrees = degrees.checked_add(1).ok_or(AprsError::InvalidInput)?;
        }
        Ok(Self {
            degrees,
            minutes_millionths,
            hemisphere,
            is_valid: true,
        })
    }

    /// The hemisphere letter, if it is one of `N`, `S`, `E` or `W`.
    fn hemisphere_char(&self) -> Result<char, AprsError> {
        match self.hemisphere {
            b'N' | b'S' | b'E' | b'W' => Ok(char::from(self.hemisphere)),
            _ => Err(AprsError::InvalidInput),
        }
    }

    fn whole_minutes(&self) -> u32 {
        self.minutes_millionths / 1_000_000
    }

    fn hundredths_of_minute(&self) -> u32 {
        (self.minutes_millionths % 1_000_000) / 10_000
    }
}

/// UTC time of the fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    /// Hours, `0..24`.
    pub hours: u8,
    /// Minutes, `0..60`.
    pub minutes: u8,
    /// Seconds multiplied by 100.
    pub seconds_hundredths: u16,
    /// Whether the receiver reported a time.
    pub is_valid: bool,
}

/// Snapshot of the fix and motion data of one receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpsData {
    /// Latitude.
    pub latitude: Coordinate,
    /// Longitude.
    pub longitude: Coordinate,
    /// UTC time of the fix.
    pub utc_time: UtcTime,
    /// Altitude above mean sea level in meters.
    pub altitude_msl_meters: i32,
    /// Ground speed in tenths of km/h.
    pub speed_deci_kph: u32,
    /// True course in tenths of a degree.
    pub true_course_deci_degrees: u32,
    /// Satellites used for the fix.
    pub satellites: u8,
}

impl GpsData {
    /// Whether both latitude and longitude are usable.
    pub fn has_position(&self) -> bool {
        self.latitude.is_valid && self.longitude.is_valid
    }
}

/// Board telemetry snapshot, in the caller's fixed point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Telemetry {
    /// CPU temperature.
    pub cpu_temperature: u32,
    /// Supply voltage.
    pub voltage: u32,
}

/// Everything that goes into one APRS information field.
#[derive(Debug, Clone, Copy)]
pub struct PositionReport<'a> {
    /// Receiver that produced `gps`.
    pub source: GpsDataSource,
    /// Fix and motion data.
    pub gps: &'a GpsData,
    /// Board telemetry.
    pub telemetry: &'a Telemetry,
}

fn ensure_room<const N: usize>(out: &String<N>, width: usize) -> Result<(), AprsError> {
    if out.len() + width > N {
        return Err(AprsError::PayloadOverflow);
    }
    Ok(())
}

/// Renders the APRS information field for `report` into `out`.
///
/// `out` is cleared first. Before every field the remaining capacity is
/// checked against that field's worst case width, so a too small buffer fails
/// as a whole rather than yielding a truncated packet.
///
/// # Arguments
/// - `report`: Fix, receiver id and telemetry
/// - `message_idx`: Sequence number; only the value modulo 1000 is sent
/// - `out`: Destination buffer
///
/// # Returns
/// - The number of bytes written
/// - `Err(AprsError::PayloadOverflow)` if `out` is too small
/// - `Err(AprsError::InvalidInput)` if a hemisphere is not one of `N`, `S`, `E`, `W`
pub fn create_packet_payload<const N: usize>(
    report: &PositionReport<'_>,
    message_idx: u16,
    out: &mut String<N>,
) -> Result<usize, AprsError> {
    out.clear();
    let gps = report.gps;

    if gps.has_position() {
        let lat = &gps.latitude;
        let lon = &gps.longitude;
        let (lat_hemisphere, lon_hemisphere) = (lat.hemisphere_char()?, lon.hemisphere_char()?);

        if gps.utc_time.is_valid {
            ensure_room(out, TIMESTAMP_WIDTH)?;
            write!(
                out,
                "@{:02}{:02}{:02}z",
                gps.utc_time.hours,
                gps.utc_time.minutes,
                gps.utc_time.seconds_hundredths / 100
            )
            .map_err(|_| AprsError::PayloadOverflow)?;
        } else {
            ensure_room(out, NO_TIMESTAMP_WIDTH)?;
            out.push('!').map_err(|_| AprsError::PayloadOverflow)?;
        }

        ensure_room(out, POSITION_WIDTH)?;
        write!(
            out,
            "{:02}{:02}.{:02}{}/{:03}{:02}.{:02}{}",
            lat.degrees,
            lat.whole_minutes(),
            lat.hundredths_of_minute(),
            lat_hemisphere,
            lon.degrees,
            lon.whole_minutes(),
            lon.hundredths_of_minute(),
            lon_hemisphere,
        )
        .map_err(|_| AprsError::PayloadOverflow)?;

        ensure_room(out, COURSE_SPEED_WIDTH)?;
        write!(
            out,
            ">{:03}/{:03}",
            gps.true_course_deci_degrees / 10,
            gps.speed_deci_kph / 10
        )
        .map_err(|_| AprsError::PayloadOverflow)?;
    }

    ensure_room(out, TELEMETRY_WIDTH)?;
    write!(
        out,
        "T#{:03},{:03},{:03},{:03},000,000,00000000 a={:05}",
        message_idx % 1000,
        report.source.0,
        report.telemetry.cpu_temperature / 10,
        report.telemetry.voltage / 10,
        gps.altitude_msl_meters.max(0) / 10,
    )
    .map_err(|_| AprsError::PayloadOverflow)?;

    Ok(out.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::APRS_PAYLOAD_LEN;

    fn fix() -> GpsData {
        GpsData {
            latitude: Coordinate::latitude(37.7749).unwrap(),
            longitude: Coordinate::longitude(-122.4194).unwrap(),
            altitude_msl_meters: 100,
            true_course_deci_degrees: 180,
            speed_deci_kph: 50,
            satellites: 7,
            ..GpsData::default()
        }
    }

    fn telemetry() -> Telemetry {
        Telemetry {
            cpu_temperature: 250,
            voltage: 330,
        }
    }

    #[test]
    fn test_decimal_degrees_conversion() {
        let lat = Coordinate::latitude(37.7749).unwrap();
        assert_eq!(lat.degrees, 37);
        assert_eq!(lat.minutes_millionths, 46_494_000);
        assert_eq!(lat.hemisphere, b'N');
        let lon = Coordinate::longitude(-122.4194).unwrap();
        assert_eq!(lon.degrees, 122);
        assert_eq!(lon.minutes_millionths, 25_164_000);
        assert_eq!(lon.hemisphere, b'W');
    }

    #[test]
    fn test_untimestamped_position_and_telemetry() {
        let gps = fix();
        let telemetry = telemetry();
        let report = PositionReport {
            source: GpsDataSource(1),
            gps: &gps,
            telemetry: &telemetry,
        };
        let mut out: String<APRS_PAYLOAD_LEN> = String::new();
        let len = create_packet_payload(&report, 7, &mut out).unwrap();
        assert_eq!(
            out.as_str(),
            "!3746.49N/12225.16W>018/005T#007,001,025,033,000,000,00000000 a=00010"
        );
        assert_eq!(len, out.len());
    }

    #[test]
    fn test_timestamped_position() {
        let mut gps = fix();
        gps.utc_time = UtcTime {
            hours: 9,
            minutes: 5,
            seconds_hundredths: 4_250,
            is_valid: true,
        };
        let telemetry = telemetry();
        let report = PositionReport {
            source: GpsDataSource::PRIMARY,
            gps: &gps,
            telemetry: &telemetry,
        };
        let mut out: String<APRS_PAYLOAD_LEN> = String::new();
        let _ = create_packet_payload(&report, 1_234, &mut out).unwrap();
        assert!(out.starts_with("@090542z3746.49N/12225.16W>018/005"));
        assert!(out.ends_with("T#234,000,025,033,000,000,00000000 a=00010"));
    }

    #[test]
    fn test_no_fix_sends_telemetry_only() {
        let mut gps = fix();
        gps.longitude.is_valid = false;
        gps.altitude_msl_meters = -20;
        let telemetry = telemetry();
        let report = PositionReport {
            source: GpsDataSource::FALLBACK,
            gps: &gps,
            telemetry: &telemetry,
        };
        let mut out: String<42> = String::new();
        assert_eq!(create_packet_payload(&report, 999, &mut out), Ok(42));
        assert_eq!(out.as_str(), "T#999,001,025,033,000,000,00000000 a=00000");
    }

    #[test]
    fn test_small_buffer_fails_without_partial_success() {
        let gps = fix();
        let telemetry = telemetry();
        let report = PositionReport {
            source: GpsDataSource::PRIMARY,
            gps: &gps,
            telemetry: &telemetry,
        };
        // Room for the position but not for the telemetry
        let mut out: String<60> = String::new();
        assert_eq!(
            create_packet_payload(&report, 0, &mut out),
            Err(AprsError::PayloadOverflow)
        );
        let mut tiny: String<4> = String::new();
        assert_eq!(
            create_packet_payload(&report, 0, &mut tiny),
            Err(AprsError::PayloadOverflow)
        );
    }

    #[test]
    fn test_coordinate_range_is_checked() {
        for bad in [f64::NAN, f64::NEG_INFINITY, 90.5, -90.000_1, 65_535.999_999_999_9] {
            assert_eq!(Coordinate::latitude(bad), Err(AprsError::InvalidInput), "{}", bad);
        }
        for bad in [f64::NAN, f64::INFINITY, 180.5, -180.000_1] {
            assert_eq!(Coordinate::longitude(bad), Err(AprsError::InvalidInput), "{}", bad);
        }

        let pole = Coordinate::latitude(-90.0).unwrap();
        assert_eq!(pole.degrees, 90);
        assert_eq!(pole.minutes_millionths, 0);
        assert_eq!(pole.hemisphere, b'S');
        // Minutes rounding up to 60 carry into the degrees
        let edge = Coordinate::longitude(179.999_999_999_9).unwrap();
        assert_eq!((edge.degrees, edge.minutes_millionths), (180, 0));
    }

    #[test]
    fn test_unknown_hemisphere_is_rejected() {
        let mut gps = fix();
        gps.latitude.hemisphere = 0xC4;
        let telemetry = telemetry();
        let report = PositionReport {
            source: GpsDataSource::PRIMARY,
            gps: &gps,
            telemetry: &telemetry,
        };
        let mut out: String<128> = String::new();
        assert_eq!(
            create_packet_payload(&report, 0, &mut out),
            Err(AprsError::InvalidInput)
        );

        gps.latitude.hemisphere = b'x';
        let report = PositionReport {
            source: GpsDataSource::PRIMARY,
            gps: &gps,
            telemetry: &telemetry,
        };
        assert_eq!(
            create_packet_payload(&report, 0, &mut out),
            Err(AprsError::InvalidInput)
        );
    }
}
