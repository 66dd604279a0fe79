//! Raw sample acquisition for one channel at a time.
//!
//! Multiplexed channels are addressed and given time to settle before the
//! shared pin is read. Direct channels are read immediately. Readings are
//! clamped to the configured converter range; there is no error path.

use core::time::Duration;

use crate::addressing::MuxAddressing;
use crate::channels::{AddressingMode, ChannelConfig, ChannelId, PinId};
use crate::config::ScanConfig;

/// Scan-cycle ordinal used as the logical sample time.
pub type Cycle = u64;

/// Physical input the sampling device should convert.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnalogInput {
    /// A dedicated pin from the direct bank.
    Pin(PinId),
    /// The pin shared by every multiplexed channel.
    MuxSignal,
}

/// Sampling device.
pub trait AnalogReader {
    /// Converts one sample. Values above full scale are clamped by the caller.
    fn read_raw(&mut self, input: AnalogInput) -> u16;
}

impl<T> AnalogReader for &mut T
where
    T: AnalogReader + ?Sized,
{
    fn read_raw(&mut self, input: AnalogInput) -> u16 {
        (**self).read_raw(input)
    }
}

/// Busy-wait used after a multiplexer address change.
pub trait SettleDelay {
    fn settle(&mut self, interval: Duration);
}

/// Settle delay that returns immediately. Suitable for simulated buses.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSettle;

impl SettleDelay for NoSettle {
    fn settle(&mut self, _: Duration) {}
}

/// One converted sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SampleReading {
    pub channel: ChannelId,
    pub value: u16,
    pub cycle: Cycle,
}

/// Reads channels through the addressing bus and the sampling device.
pub struct Sampler<M, R, D> {
    addressing: M,
    reader: R,
    delay: D,
    settle: Duration,
    max_sample: u16,
}

impl<M, R, D> Sampler<M, R, D>
where
    M: MuxAddressing,
    R: AnalogReader,
    D: SettleDelay,
{
    #[must_use]
    pub fn new(addressing: M, reader: R, delay: D, config: &ScanConfig) -> Self {
        Self {
            addressing,
            reader,
            delay,
            settle: config.mux_settle,
            max_sample: config.max_sample,
        }
    }

    /// Samples `channel` once.
    ///
    /// A multiplexed channel is always re-addressed, even when the bus already
    /// points at it, so every multiplexed read pays the full settle interval.
    pub fn read(&mut self, channel: &ChannelConfig, cycle: Cycle) -> SampleReading {
        let raw = match channel.addressing {
            AddressingMode::Direct(pin) => self.reader.read_raw(AnalogInput::Pin(pin)),
            AddressingMode::Multiplexed(code) => {
                self.addressing.set_address(code);
                self.delay.settle(self.settle);
                self.reader.read_raw(AnalogInput::MuxSignal)
            }
        };

        SampleReading {
            channel: channel.id,
            value: raw.min(self.max_sample),
            cycle,
        }
    }

    pub fn addressing(&self) -> &M {
        &self.addressing
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

#[cfg(test)]
mod tests {
    use heapless::Vec;

    use super::*;
    use crate::channels::{ChannelRole, MuxCode};
    use crate::config::TriggerConfig;

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    enum BusOp {
        Address(u8),
        Settle(Duration),
        Read(AnalogInput),
    }

    #[derive(Default)]
    struct Bus {
        ops: Vec<BusOp, 16>,
        value: u16,
    }

    struct Addr<'a>(&'a core::cell::RefCell<Bus>);
    struct Adc<'a>(&'a core::cell::RefCell<Bus>);
    struct Wait<'a>(&'a core::cell::RefCell<Bus>);

    impl MuxAddressing for Addr<'_> {
        fn set_address(&mut self, code: MuxCode) {
            let _ = self.0.borrow_mut().ops.push(BusOp::Address(code.raw()));
        }
    }

    impl AnalogReader for Adc<'_> {
        fn read_raw(&mut self, input: AnalogInput) -> u16 {
            let mut bus = self.0.borrow_mut();
            let _ = bus.ops.push(BusOp::Read(input));
            bus.value
        }
    }

    impl SettleDelay for Wait<'_> {
        fn settle(&mut self, interval: Duration) {
            let _ = self.0.borrow_mut().ops.push(BusOp::Settle(interval));
        }
    }

    fn channel(id: u8, addressing: AddressingMode) -> ChannelConfig {
        ChannelConfig::new(
            ChannelId::new(id),
            "test",
            addressing,
            ChannelRole::TriggerAndPeak,
            TriggerConfig::default(),
        )
    }

    #[test]
    fn multiplexed_read_addresses_then_settles_then_samples() {
        let bus = core::cell::RefCell::new(Bus {
            value: 321,
            ..Bus::default()
        });
        let config = ScanConfig::default();
        let mut sampler = Sampler::new(Addr(&bus), Adc(&bus), Wait(&bus), &config);

        let reading = sampler.read(
            &channel(9, AddressingMode::Multiplexed(MuxCode::expect_valid(6))),
            4,
        );

        assert_eq!(
            reading,
            SampleReading {
                channel: ChannelId::new(9),
                value: 321,
                cycle: 4,
            }
        );
        assert_eq!(
            bus.borrow().ops.as_slice(),
            &[
                BusOp::Address(6),
                BusOp::Settle(config.mux_settle),
                BusOp::Read(AnalogInput::MuxSignal),
            ]
        );
    }

    #[test]
    fn direct_read_skips_the_multiplexer() {
        let bus = core::cell::RefCell::new(Bus::default());
        let mut sampler = Sampler::new(Addr(&bus), Adc(&bus), Wait(&bus), &ScanConfig::default());

        sampler.read(&channel(2, AddressingMode::Direct(PinId::new(2))), 0);

        assert_eq!(
            bus.borrow().ops.as_slice(),
            &[BusOp::Read(AnalogInput::Pin(PinId::new(2)))]
        );
    }

    #[test]
    fn readings_are_clamped_to_full_scale() {
        let bus = core::cell::RefCell::new(Bus {
            value: 4_095,
            ..Bus::default()
        });
        let mut sampler = Sampler::new(Addr(&bus), Adc(&bus), Wait(&bus), &ScanConfig::default());

        let reading = sampler.read(&channel(0, AddressingMode::Direct(PinId::new(0))), 0);
        assert_eq!(reading.value, 1_023);
    }
}
