use crate::events::{EventReceiver, ScanEvent};
use crate::status;
use crate::telemetry::{log_peaks, log_stats, log_strike};

/// Windows between two stats lines.
const STATS_EVERY_WINDOWS: u32 = 10;

#[embassy_executor::task]
pub async fn run(receiver: EventReceiver<'static>) -> ! {
    let mut windows_seen: u32 = 0;

    loop {
        match receiver.receive().await {
            ScanEvent::Strike { event, at } => log_strike(&event, at),
            ScanEvent::PeakWindow { peaks, at } => {
                log_peaks(&peaks, at);
                windows_seen = windows_seen.wrapping_add(1);
                if windows_seen % STATS_EVERY_WINDOWS == 0 {
                    log_stats(&status::snapshot());
                }
            }
        }
    }
}
