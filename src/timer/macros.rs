/// Declares a static global `APRS_DRIVER` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `APRS_DRIVER` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the shared driver state.
///
/// # Arguments
/// - `$tx`: The concrete transmitter type (must implement `TransmitterControl`)
/// - `$trig`: The concrete sine backend type (must implement `Trig`)
///
/// # Example
/// ```rust,ignore
/// init_aprs_driver!(MyBoard, aprs_afsk::trig::SineTable);
/// ```
#[macro_export]
macro_rules! init_aprs_driver {
    ( $tx:ty, $trig:ty ) => {
        pub static APRS_DRIVER: $crate::timer::GlobalAprsDriver<$tx, $trig> =
            $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Initializes the global `APRS_DRIVER` singleton with a new driver instance.
///
/// This macro wraps construction of the `AprsDriver` and stores it inside the
/// globally declared `APRS_DRIVER` created by `init_aprs_driver!`.
///
/// # Arguments
/// - `$tx`: The transmitter value
/// - `$trig`: The sine backend value
/// - `$config`: Optional `AfskConfig`; `AfskConfig::default()` when omitted
///
/// # Returns
/// The `Result` of `global_aprs_driver_setup`.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_aprs_driver!(board, SineTable::new()).unwrap();
/// }
/// ```
///
/// # Notes
/// - Must be called inside a critical section-aware context (safe in `main()`).
/// - Requires `init_aprs_driver!` to have been used earlier.
#[macro_export]
macro_rules! setup_aprs_driver {
    ( $tx:expr, $trig:expr ) => {
        $crate::timer::global_aprs_driver_setup(
            &APRS_DRIVER,
            $tx,
            $trig,
            $crate::driver::AfskConfig::default(),
        )
    };
    ( $tx:expr, $trig:expr, $config:expr ) => {
        $crate::timer::global_aprs_driver_setup(&APRS_DRIVER, $tx, $trig, $config)
    };
}

/// Calls `tick()` on the global `APRS_DRIVER`.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     tick_aprs_timer!();
/// }
/// ```
#[macro_export]
macro_rules! tick_aprs_timer {
    () => {
        $crate::timer::global_aprs_timer_tick(&APRS_DRIVER)
    };
}
