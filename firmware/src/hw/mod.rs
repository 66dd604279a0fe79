//! Embassy adapters for the sampling capabilities of `strike-core`.
//!
//! GPIO outputs drive the multiplexer select lines, ADC1 converts both the
//! direct bank and the shared multiplexer pin, and the settle interval is a
//! busy-wait so a channel's addressing and read are never interleaved with
//! another task.

use core::time::Duration;

use embassy_stm32::adc::{Adc, AnyAdcChannel, Resolution, SampleTime};
use embassy_stm32::gpio::{Level, Output};
use embassy_stm32::peripherals::ADC1;
use embassy_time::{Duration as EmbassyDuration, Instant, block_for};
use strike_core::addressing::{ChannelAddressing, SelectLine};
use strike_core::channels::xylophone::DIRECT_BARS;
use strike_core::clock::Clock;
use strike_core::sampler::{AnalogInput, AnalogReader, Sampler, SettleDelay};

use crate::clock::FirmwareInstant;

/// Sampler wired to the board's ADC and multiplexer.
pub type BoardSampler = Sampler<ChannelAddressing<SelectPin>, AdcBank, BusyWait>;

/// Push-pull output driving one multiplexer select line.
pub struct SelectPin(Output<'static>);

impl SelectPin {
    pub fn new(output: Output<'static>) -> Self {
        Self(output)
    }
}

impl SelectLine for SelectPin {
    fn set_level(&mut self, high: bool) {
        self.0.set_level(Level::from(high));
    }
}

/// ADC1 plus every analog input the scan loop reads.
pub struct AdcBank {
    adc: Adc<'static, ADC1>,
    direct: [AnyAdcChannel<ADC1>; DIRECT_BARS],
    mux_signal: AnyAdcChannel<ADC1>,
}

impl AdcBank {
    /// Configures 10-bit conversions so readings land in `0..=1023`.
    pub fn new(
        mut adc: Adc<'static, ADC1>,
        direct: [AnyAdcChannel<ADC1>; DIRECT_BARS],
        mux_signal: AnyAdcChannel<ADC1>,
    ) -> Self {
        adc.set_resolution(Resolution::BITS10);
        adc.set_sample_time(SampleTime::CYCLES12_5);
        Self {
            adc,
            direct,
            mux_signal,
        }
    }
}

impl AnalogReader for AdcBank {
    fn read_raw(&mut self, input: AnalogInput) -> u16 {
        match input {
            AnalogInput::Pin(pin) => match self.direct.get_mut(pin.as_index()) {
                Some(channel) => self.adc.blocking_read(channel),
                // Pins past the bank read as silence.
                None => 0,
            },
            AnalogInput::MuxSignal => self.adc.blocking_read(&mut self.mux_signal),
        }
    }
}

/// Spins on the embassy timer without yielding to the executor.
#[derive(Copy, Clone, Debug, Default)]
pub struct BusyWait;

impl SettleDelay for BusyWait {
    fn settle(&mut self, interval: Duration) {
        let micros = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        block_for(EmbassyDuration::from_micros(micros));
    }
}

/// Monotonic clock backed by the embassy time driver.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    type Instant = FirmwareInstant;

    fn now(&mut self) -> FirmwareInstant {
        FirmwareInstant::from(Instant::now())
    }
}
