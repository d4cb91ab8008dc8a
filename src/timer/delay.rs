use crate::driver::AprsDriver;
use crate::transmitter::TransmitterControl;
use crate::trig::Trig;
use embedded_hal::delay::DelayNs;

/// Runs a blocking loop that calls `tick()` on the provided driver until the
/// current transmission has finished.
///
/// This is a simple timing loop for use in environments where interrupts are unavailable
/// or undesired. It drives the AFSK modem's timing using a delay provider implementing
/// `embedded_hal::delay::DelayNs`.
///
/// # Arguments
/// - `driver`: A mutable reference to an `AprsDriver` instance.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `tick_ns`: The delay between each tick call, in nanoseconds (see
///   [`tick_period_ns`](crate::timer::tick_period_ns)).
///
/// # Returns
/// The number of ticks issued. Returns immediately with `0` when nothing is being sent.
///
/// # Example
/// ```rust,ignore
/// use aprs_afsk::timer::{run_aprs_tick_loop, tick_period_ns};
///
/// driver.send_aprs_message(source, &gps, &telemetry)?;
/// run_aprs_tick_loop(&mut driver, &mut delay, tick_period_ns(32));
/// ```
///
/// # Notes
/// - The time spent in `tick()` adds to every period; subtract it from `tick_ns` on slow cores.
/// - For more efficient or concurrent applications, prefer interrupt-driven tick scheduling.
pub fn run_aprs_tick_loop<D: DelayNs, TX, TR>(
    driver: &mut AprsDriver<TX, TR>,
    delay: &mut D,
    tick_ns: u32,
) -> usize
where
    TX: TransmitterControl,
    TR: Trig,
{
    let mut ticks = 0;
    while driver.is_sending() {
        driver.tick();
        delay.delay_ns(tick_ns);
        ticks += 1;
    }
    ticks
}
