use embassy_time::{Duration, Timer};
use strike_core::scan::ScanLoop;

use crate::clock::FirmwareInstant;
use crate::events::{EventSender, QueueSink};
use crate::hw::{BoardSampler, EmbassyClock};
use crate::status;
use crate::telemetry::log_held;

#[embassy_executor::task]
pub async fn run(
    mut scan: ScanLoop<FirmwareInstant>,
    mut sampler: BoardSampler,
    sender: EventSender<'static>,
) -> ! {
    let mut sink = QueueSink::new(sender);
    let mut clock = EmbassyClock;
    let delay = scan.inter_cycle_delay();
    let delay = Duration::from_micros(u64::try_from(delay.as_micros()).unwrap_or(u64::MAX));

    defmt::info!(
        "scan: {} channels, cycle delay {}ms",
        scan.channels().count(),
        delay.as_millis()
    );

    loop {
        let report = scan.scan_cycle(&mut sampler, &mut sink, &mut clock);
        status::record_cycle(&report);
        if report.window_closed {
            scan.channel_status().for_each(|channel| log_held(&channel));
        }
        Timer::after(delay).await;
    }
}
