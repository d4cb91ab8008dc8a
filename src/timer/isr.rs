use crate::driver::{AfskConfig, AprsDriver};
use crate::error::AprsError;
use crate::payload::{GpsData, GpsDataSource, Telemetry};
use crate::transmitter::TransmitterControl;
use crate::trig::Trig;
use core::cell::RefCell;
use critical_section::Mutex;

/// A driver shared between the foreground and the tick interrupt.
pub type GlobalAprsDriver<TX, TR> = Mutex<RefCell<Option<AprsDriver<TX, TR>>>>;

/// Used to initialize the global static `AprsDriver` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use aprs_afsk::timer::{GlobalAprsDriver, global_aprs_driver_init};
/// use aprs_afsk::trig::SineTable;
///
/// static APRS_DRIVER: GlobalAprsDriver<MyBoard, SineTable> = global_aprs_driver_init();
/// ```
pub const fn global_aprs_driver_init<TX: TransmitterControl, TR: Trig>()
-> GlobalAprsDriver<TX, TR> {
    Mutex::new(RefCell::new(None))
}

/// Sets up the global driver.
///
/// # Arguments
/// * The global static `AprsDriver`
/// * The transmitter hardware
/// * The sine backend
/// * The waveform configuration, whose `ticks_per_symbol` must match the tick rate:
///     `tick frequency / ticks per symbol = 1200 symbols per second`
///
/// # Returns
/// * `Err(AprsError::InvalidInput)` if the configuration is rejected; the global is left untouched
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let config = AfskConfig::default();
///     global_aprs_driver_setup(&APRS_DRIVER, board, SineTable::new(), config).unwrap();
/// }
/// ```
pub fn global_aprs_driver_setup<TX: TransmitterControl, TR: Trig>(
    global_driver: &'static GlobalAprsDriver<TX, TR>,
    tx: TX,
    trig: TR,
    config: AfskConfig,
) -> Result<(), AprsError> {
    let driver = AprsDriver::new(tx, trig, config)?;
    critical_section::with(|cs| {
        let _ = global_driver.borrow(cs).replace(Some(driver));
    });
    Ok(())
}

/// Runs the tick at each interrupt
///
/// # Arguments
/// * The global static `AprsDriver`
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     global_aprs_timer_tick(&APRS_DRIVER);
/// }
/// ```
pub fn global_aprs_timer_tick<TX: TransmitterControl, TR: Trig>(
    global_driver: &'static GlobalAprsDriver<TX, TR>,
) {
    critical_section::with(|cs| {
        if let Some(driver) = global_driver.borrow(cs).borrow_mut().as_mut() {
            driver.tick();
        }
    });
}

/// Starts a transmission on the global driver from the foreground.
///
/// # Returns
/// * `Err(AprsError::InvalidInput)` if the driver was never set up
/// * Otherwise the result of [`AprsDriver::send_aprs_message`]
pub fn global_aprs_send<TX: TransmitterControl, TR: Trig>(
    global_driver: &'static GlobalAprsDriver<TX, TR>,
    gps_source: GpsDataSource,
    gps: &GpsData,
    telemetry: &Telemetry,
) -> Result<(), AprsError> {
    critical_section::with(|cs| match global_driver.borrow(cs).borrow_mut().as_mut() {
        Some(driver) => driver.send_aprs_message(gps_source, gps, telemetry),
        None => Err(AprsError::InvalidInput),
    })
}

/// Whether the global driver is transmitting. `false` before setup.
pub fn global_aprs_is_sending<TX: TransmitterControl, TR: Trig>(
    global_driver: &'static GlobalAprsDriver<TX, TR>,
) -> bool {
    critical_section::with(|cs| {
        global_driver
            .borrow(cs)
            .borrow()
            .as_ref()
            .is_some_and(|driver| driver.is_sending())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmitter::testing::RecordingTransmitter;
    use crate::trig::LibmTrig;

    static DRIVER: GlobalAprsDriver<RecordingTransmitter, LibmTrig> = global_aprs_driver_init();
    static UNSET: GlobalAprsDriver<RecordingTransmitter, LibmTrig> = global_aprs_driver_init();
    static REJECTED: GlobalAprsDriver<RecordingTransmitter, LibmTrig> = global_aprs_driver_init();

    #[test]
    fn test_global_driver_round_trip() {
        let tx = RecordingTransmitter::new();
        global_aprs_driver_setup(&DRIVER, tx, LibmTrig, AfskConfig::default()).unwrap();
        assert!(!global_aprs_is_sending(&DRIVER));

        let (gps, telemetry) = (GpsData::default(), Telemetry::default());
        global_aprs_send(&DRIVER, GpsDataSource::PRIMARY, &gps, &telemetry).unwrap();
        assert!(global_aprs_is_sending(&DRIVER));
        assert_eq!(
            global_aprs_send(&DRIVER, GpsDataSource::PRIMARY, &gps, &telemetry),
            Err(AprsError::Busy)
        );

        let mut ticks = 0;
        while global_aprs_is_sending(&DRIVER) {
            global_aprs_timer_tick(&DRIVER);
            ticks += 1;
            assert!(ticks < 100_000);
        }
        critical_section::with(|cs| {
            let driver = DRIVER.borrow(cs).borrow();
            let driver = driver.as_ref().unwrap();
            assert_eq!(driver.transmissions_completed, 1);
            assert_eq!(driver.tx.interrupts_cleared, ticks);
        });
    }

    #[test]
    fn test_unset_driver() {
        global_aprs_timer_tick(&UNSET);
        assert!(!global_aprs_is_sending(&UNSET));
        let (gps, telemetry) = (GpsData::default(), Telemetry::default());
        assert_eq!(
            global_aprs_send(&UNSET, GpsDataSource::PRIMARY, &gps, &telemetry),
            Err(AprsError::InvalidInput)
        );
    }

    #[test]
    fn test_invalid_config_leaves_global_empty() {
        let config = AfskConfig {
            ticks_per_symbol: 0,
            ..AfskConfig::default()
        };
        assert_eq!(
            global_aprs_driver_setup(&REJECTED, RecordingTransmitter::new(), LibmTrig, config),
            Err(AprsError::InvalidInput)
        );
        critical_section::with(|cs| assert!(REJECTED.borrow(cs).borrow().is_none()));
    }
}
