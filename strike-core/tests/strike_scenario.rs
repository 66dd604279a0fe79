use core::time::Duration;

use heapless::Vec as HeaplessVec;
use strike_core::addressing::MuxAddressing;
use strike_core::channels::{
    AddressingMode, ChannelConfig, ChannelId, ChannelRole, MuxCode, PinId,
};
use strike_core::clock::{Micros, SteppedClock};
use strike_core::config::{ScanConfig, TriggerConfig};
use strike_core::peaks::PeakRecord;
use strike_core::sampler::{AnalogInput, AnalogReader, NoSettle, Sampler};
use strike_core::scan::ScanLoop;
use strike_core::telemetry::{EventSink, StrikeEvent};
use strike_core::trigger::{TriggerEdge, TriggerState, TriggerStateMachine};

#[test]
fn documented_sequence_yields_onset_then_offset() {
    let mut machine = TriggerStateMachine::new(TriggerConfig::new(50, 30, 2));
    let samples = [0, 0, 60, 60, 0, 0];

    let mut edges: HeaplessVec<(usize, TriggerEdge), 4> = HeaplessVec::new();
    let mut low_counts: HeaplessVec<u16, 6> = HeaplessVec::new();
    let mut states: HeaplessVec<TriggerState, 6> = HeaplessVec::new();

    for (t, value) in samples.into_iter().enumerate() {
        if let Some(edge) = machine.update(value) {
            edges.push((t, edge)).unwrap();
        }
        low_counts.push(machine.low_count()).unwrap();
        states.push(machine.state()).unwrap();
    }

    assert_eq!(
        edges.as_slice(),
        &[(2, TriggerEdge::Onset), (5, TriggerEdge::Offset)]
    );
    assert_eq!(low_counts.as_slice(), &[1, 2, 0, 0, 1, 2]);
    assert_eq!(
        states.as_slice(),
        &[
            TriggerState::Idle,
            TriggerState::Idle,
            TriggerState::Triggered,
            TriggerState::Triggered,
            TriggerState::Triggered,
            TriggerState::Idle,
        ]
    );
}

/// Small deterministic generator so property checks cover many sequences.
struct Lcg(u32);

impl Lcg {
    fn next_sample(&mut self) -> u16 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        // Bias towards the interesting region around the thresholds.
        ((self.0 >> 16) % 120) as u16
    }
}

#[test]
fn onsets_only_fire_from_an_armed_idle_channel() {
    for (seed, required) in [(1, 0), (7, 1), (42, 2), (99, 3), (1234, 5)] {
        let config = TriggerConfig::new(50, 30, required);
        let mut machine = TriggerStateMachine::new(config);
        let mut rng = Lcg(seed);
        let mut live = false;

        for _ in 0..2_000 {
            let before_state = machine.state();
            let before_low = machine.low_count();
            let value = rng.next_sample();

            match machine.update(value) {
                Some(TriggerEdge::Onset) => {
                    assert_eq!(before_state, TriggerState::Idle);
                    assert!(before_low >= required);
                    assert!(value > 50);
                    assert!(!live, "second onset without offset");
                    live = true;
                }
                Some(TriggerEdge::Offset) => {
                    assert!(live, "offset without onset");
                    assert!(value <= 30);
                    live = false;
                }
                None => {}
            }

            assert!(machine.low_count() <= required);
            assert_eq!(machine.is_triggered(), live);
        }
    }
}

#[test]
fn dead_zone_oscillation_never_triggers() {
    let mut machine = TriggerStateMachine::new(TriggerConfig::new(50, 30, 2));
    for _ in 0..3 {
        machine.update(0);
    }
    for value in (31..=50).chain((31..=50).rev()).cycle().take(400) {
        assert_eq!(machine.update(value), None);
    }
    assert_eq!(machine.state(), TriggerState::Idle);
}

struct NoMux;

impl MuxAddressing for NoMux {
    fn set_address(&mut self, _: MuxCode) {}
}

/// One waveform per directly wired pin, indexed by scan cycle.
struct Waveforms<'a> {
    per_pin: &'a [&'a [u16]],
    cycle: usize,
    reads_this_cycle: usize,
}

impl AnalogReader for Waveforms<'_> {
    fn read_raw(&mut self, input: AnalogInput) -> u16 {
        let AnalogInput::Pin(pin) = input else {
            panic!("unexpected multiplexer read");
        };
        let value = self.per_pin[pin.as_index()]
            .get(self.cycle)
            .copied()
            .unwrap_or(0);
        self.reads_this_cycle += 1;
        if self.reads_this_cycle == self.per_pin.len() {
            self.reads_this_cycle = 0;
            self.cycle += 1;
        }
        value
    }
}

#[derive(Default)]
struct Collected {
    strikes: Vec<(StrikeEvent, Micros)>,
    windows: Vec<(Vec<PeakRecord>, Micros)>,
}

impl EventSink<Micros> for Collected {
    fn on_strike(&mut self, event: &StrikeEvent, at: Micros) {
        self.strikes.push((*event, at));
    }

    fn on_peaks(&mut self, peaks: &[PeakRecord], at: Micros) {
        self.windows.push((peaks.to_vec(), at));
    }
}

fn direct(id: u8) -> ChannelConfig {
    ChannelConfig::new(
        ChannelId::new(id),
        "D",
        AddressingMode::Direct(PinId::new(id)),
        ChannelRole::TriggerAndPeak,
        TriggerConfig::new(50, 30, 2),
    )
}

#[test]
fn scan_loop_reports_edges_per_channel_in_scan_order() {
    let channels = [direct(0), direct(1)];
    let config = ScanConfig::default().with_peak_window(Duration::from_millis(200));
    let mut scan = ScanLoop::<Micros, 4>::new(config, &channels, Micros::ZERO).unwrap();

    let pin0: &[u16] = &[0, 0, 60, 60, 0, 0];
    let pin1: &[u16] = &[0, 0, 80, 0, 0, 0];
    let pins = [pin0, pin1];
    let mut sampler = Sampler::new(
        NoMux,
        Waveforms {
            per_pin: &pins,
            cycle: 0,
            reads_this_cycle: 0,
        },
        NoSettle,
        &config,
    );
    let mut clock = SteppedClock::with_auto_advance(Micros::ZERO, Duration::from_millis(40));
    let mut sink = Collected::default();

    for _ in 0..6 {
        scan.scan_cycle(&mut sampler, &mut sink, &mut clock);
    }

    let edges: Vec<(u8, TriggerEdge, u64)> = sink
        .strikes
        .iter()
        .map(|(event, _)| (event.channel.raw(), event.edge, event.cycle))
        .collect();
    assert_eq!(
        edges,
        vec![
            (0, TriggerEdge::Onset, 2),
            (1, TriggerEdge::Onset, 2),
            (1, TriggerEdge::Offset, 4),
            (0, TriggerEdge::Offset, 5),
        ]
    );
    assert_eq!(sink.strikes[0].1, Micros::from_millis(80));

    // Window closes at the cycle stamped 200 ms and carries both peaks.
    assert_eq!(sink.windows.len(), 1);
    let (peaks, at) = &sink.windows[0];
    assert_eq!(*at, Micros::from_millis(200));
    assert_eq!(
        peaks
            .iter()
            .map(|record| record.max_value)
            .collect::<Vec<_>>(),
        vec![60, 80]
    );
}
