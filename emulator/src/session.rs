use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant as HostInstant};
use std::vec::Drain;

use strike_core::channels::{ChannelId, XYLOPHONE_CHANNELS, channel_by_id};
use strike_core::clock::{Clock, Micros, NoopPacer, Pacer, SteppedClock};
use strike_core::config::{ConfigError, DEFAULT_LOW_COUNT_REQUIRED, ScanConfig};
use strike_core::keymap::{KeyEmitter, KeystrokeSink, XYLOPHONE_KEYMAP, binding_for};
use strike_core::peaks::PeakRecord;
use strike_core::repl::{COMMANDS, Command, CommandTag, catalog, parse};
use strike_core::scan::{CycleReport, ScanLoop};
use strike_core::telemetry::{
    EventSink, PeakTelemetry, StrikeEvent, TelemetryInstant, TelemetryRecorder,
};

use crate::board::{self, SimSampler};

/// Velocity used when `strike` omits one.
pub const DEFAULT_VELOCITY: u16 = 600;

/// How a console line should be rendered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tone {
    Plain,
    /// A key press produced by an onset.
    Key,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Plain,
            text: text.into(),
        }
    }

    fn key(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Key,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }
}

/// Output of one console command.
#[derive(Debug, Default)]
pub struct Response {
    pub lines: Vec<Line>,
    /// The user asked to leave the console.
    pub close: bool,
}

impl Response {
    fn single(line: Line) -> Self {
        Self {
            lines: vec![line],
            close: false,
        }
    }
}

#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Transcript(io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(err) => write!(f, "invalid board configuration: {err}"),
            StartupError::Transcript(err) => write!(f, "cannot open transcript: {err}"),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(err: ConfigError) -> Self {
        StartupError::Config(err)
    }
}

impl From<io::Error> for StartupError {
    fn from(err: io::Error) -> Self {
        StartupError::Transcript(err)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyStroke {
    Press(char),
    Release(char),
}

/// Key emitter that queues strokes until the console prints them.
#[derive(Debug, Default)]
pub struct KeyBuffer {
    strokes: Vec<KeyStroke>,
    held: Vec<char>,
}

impl KeyBuffer {
    fn drain(&mut self) -> Drain<'_, KeyStroke> {
        self.strokes.drain(..)
    }

    /// Keys pressed and not yet released.
    pub fn held(&self) -> &[char] {
        &self.held
    }
}

impl KeyEmitter for KeyBuffer {
    fn press(&mut self, key: char) {
        self.strokes.push(KeyStroke::Press(key));
        if !self.held.contains(&key) {
            self.held.push(key);
        }
    }

    fn release(&mut self, key: char) {
        self.strokes.push(KeyStroke::Release(key));
        self.held.retain(|held| *held != key);
    }
}

/// Scan-loop sink that renders events as console lines, in the order the
/// loop produced them.
struct ConsoleSink {
    keys: KeystrokeSink<KeyBuffer>,
    recorder: TelemetryRecorder<Micros>,
    lines: Vec<Line>,
}

impl ConsoleSink {
    fn new() -> Self {
        Self {
            keys: KeystrokeSink::xylophone(KeyBuffer::default()),
            recorder: TelemetryRecorder::new(),
            lines: Vec::new(),
        }
    }
}

impl EventSink<Micros> for ConsoleSink {
    fn on_strike(&mut self, event: &StrikeEvent, at: Micros) {
        (&mut self.keys, &mut self.recorder).on_strike(event, at);

        let note = binding_for(&XYLOPHONE_KEYMAP, event.channel)
            .map_or_else(|| "--".to_string(), ToString::to_string);
        for stroke in self.keys.emitter_mut().drain() {
            self.lines.push(match stroke {
                KeyStroke::Press(key) => Line::key(format!("{key}  {note:<3} {event}")),
                KeyStroke::Release(key) => {
                    Line::plain(format!("   {note:<3} {event} (release {key})"))
                }
            });
        }
    }

    fn on_peaks(&mut self, peaks: &[PeakRecord], at: Micros) {
        self.recorder.on_peaks(peaks, at);

        if PeakTelemetry::summarize(peaks).active_channels > 0 {
            self.lines.extend(peak_rows(peaks));
        }
        self.lines.push(Line::plain("---"));
    }
}

/// Wall-clock time grafted onto the session's logical timeline.
struct WallClock {
    origin: HostInstant,
    base: Micros,
}

impl WallClock {
    fn starting_at(base: Micros) -> Self {
        Self {
            origin: HostInstant::now(),
            base,
        }
    }
}

impl Clock for WallClock {
    type Instant = Micros;

    fn now(&mut self) -> Micros {
        self.base + self.origin.elapsed()
    }
}

struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&mut self, interval: Duration) {
        thread::sleep(interval);
    }
}

/// Interactive console over a simulated board.
///
/// `step` advances a logical clock by one cycle delay per cycle; `run` paces
/// the same loop against the host clock and then resumes logical time where
/// the wall clock left off, so window timestamps stay monotonic.
pub struct Session {
    scan: ScanLoop<Micros>,
    sampler: SimSampler,
    sink: ConsoleSink,
    clock: SteppedClock,
    transcript: Option<TranscriptLogger>,
    started_at: HostInstant,
}

impl Session {
    pub fn new(transcript: Option<&Path>) -> Result<Self, StartupError> {
        let config = ScanConfig::default();
        let scan = ScanLoop::new(config, &XYLOPHONE_CHANNELS, Micros::ZERO)?;
        let transcript = transcript.map(TranscriptLogger::create).transpose()?;

        let mut session = Self {
            scan,
            sampler: board::sampler(&config),
            sink: ConsoleSink::new(),
            clock: SteppedClock::with_auto_advance(Micros::ZERO, config.cycle_delay),
            transcript,
            started_at: HostInstant::now(),
        };

        // Detectors only arm after a run of quiet samples.
        session.step(u32::from(DEFAULT_LOW_COUNT_REQUIRED));
        session.sink.lines.clear();
        Ok(session)
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Response> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Response::default());
        }

        let elapsed = self.started_at.elapsed();
        self.record(elapsed, TranscriptRole::Host, trimmed)?;

        let response = match parse(trimmed) {
            Ok(command) => self.execute(command),
            Err(err) => Response::single(Line::error(format!("ERR syntax {err}"))),
        };

        for line in &response.lines {
            self.record(elapsed, TranscriptRole::Emulator, &line.text)?;
        }
        Ok(response)
    }

    /// Keys currently held down by ringing bars.
    pub fn held_keys(&self) -> &[char] {
        self.sink.keys.emitter().held()
    }

    fn execute(&mut self, command: Command) -> Response {
        match command {
            Command::Strike { channel, velocity } => {
                self.strike(channel, velocity.unwrap_or(DEFAULT_VELOCITY))
            }
            Command::Step { cycles } => self.step(cycles),
            Command::Run { duration } => self.run_for(duration),
            Command::Peaks => self.peak_table(),
            Command::Status => self.status_table(),
            Command::Help { topic } => help(topic),
            Command::Exit => Response {
                lines: vec![Line::plain("Session closed.")],
                close: true,
            },
        }
    }

    fn strike(&mut self, channel: ChannelId, velocity: u16) -> Response {
        let Some(config) = self.scan.channels().find(|config| config.id == channel).copied()
        else {
            return Response::single(Line::error(format!("ERR unknown channel {channel}")));
        };

        if !self
            .sampler
            .reader_mut()
            .strike(config.addressing, velocity)
        {
            return Response::single(Line::error(format!(
                "ERR {} is not wired on this board",
                config.label
            )));
        }

        let note = binding_for(&XYLOPHONE_KEYMAP, channel)
            .map_or_else(|| "--".to_string(), ToString::to_string);
        Response::single(Line::plain(format!(
            "OK strike {channel} {} {note} velocity={velocity}",
            config.label
        )))
    }

    fn step(&mut self, cycles: u32) -> Response {
        let report = self.scan.run_cycles(
            cycles,
            &mut self.sampler,
            &mut self.sink,
            &mut self.clock,
            &mut NoopPacer,
        );
        self.finish(cycles, &report)
    }

    fn run_for(&mut self, duration: Duration) -> Response {
        let delay = self.scan.inter_cycle_delay();
        let cycles = cycles_in(duration, delay);
        let mut clock = WallClock::starting_at(self.clock.peek());

        let report = self.scan.run_cycles(
            cycles,
            &mut self.sampler,
            &mut self.sink,
            &mut clock,
            &mut SleepPacer,
        );
        self.clock = SteppedClock::with_auto_advance(clock.now(), delay);
        self.finish(cycles, &report)
    }

    fn finish(&mut self, cycles: u32, report: &CycleReport) -> Response {
        let mut lines: Vec<Line> = self.sink.lines.drain(..).collect();
        lines.push(Line::plain(format!(
            "OK {cycles} cycles through #{} onsets={} offsets={} t=+{}ms",
            report.cycle,
            report.onsets,
            report.offsets,
            millis(self.clock.peek()),
        )));
        Response {
            lines,
            close: false,
        }
    }

    fn peak_table(&self) -> Response {
        let peaks = self.scan.peaks();
        let open_for = self
            .clock
            .peek()
            .saturating_duration_since(peaks.window_start());

        let mut lines = vec![Line::plain(format!(
            "window open {}ms of {}ms",
            open_for.as_millis(),
            peaks.window().as_millis()
        ))];
        lines.extend(peak_rows(peaks.records()));
        Response {
            lines,
            close: false,
        }
    }

    fn status_table(&self) -> Response {
        let mut lines = vec![Line::plain(format!(
            "{:<5} {:<3} {:<4} {:<9} {:>3} {:>5} {:>5} {:>7}",
            "chan", "key", "note", "state", "low", "last", "peak", "strikes"
        ))];

        for status in self.scan.channel_status() {
            let binding = binding_for(&XYLOPHONE_KEYMAP, status.channel);
            let key = binding.map_or('-', |binding| binding.key);
            let note = binding.map_or_else(|| "-".to_string(), ToString::to_string);
            let state = status
                .state
                .map_or_else(|| "-".to_string(), |state| state.to_string());

            lines.push(Line::plain(format!(
                "{:<5} {:<3} {:<4} {:<9} {:>3} {:>5} {:>5} {:>7}",
                status.label,
                key,
                note,
                state,
                status.low_count,
                optional(status.last_value),
                optional(status.peak),
                self.sink.recorder.strike_count(status.channel),
            )));
        }

        let board = self.sampler.reader();
        let held: String = self.held_keys().iter().collect();
        lines.push(Line::plain(format!(
            "cycle={} strikes={} telemetry={} ringing={} conversions={} mux={} held=[{held}]",
            self.scan.cycle(),
            self.sink.recorder.total_strikes(),
            self.sink.recorder.len(),
            board.ringing(),
            board.conversions(),
            board.selected(),
        )));
        Response {
            lines,
            close: false,
        }
    }

    fn record(&mut self, elapsed: Duration, role: TranscriptRole, line: &str) -> io::Result<()> {
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(elapsed, role, line),
            None => Ok(()),
        }
    }
}

fn help(topic: Option<CommandTag>) -> Response {
    let mut lines = Vec::new();
    match topic {
        Some(tag) => {
            let spec = catalog::spec_for(tag);
            lines.push(Line::plain(format!("{}  - {}", spec.usage, spec.summary)));
            if !spec.aliases.is_empty() {
                lines.push(Line::plain(format!("aliases: {}", spec.aliases.join(", "))));
            }
        }
        None => {
            lines.push(Line::plain("Available commands:"));
            for spec in &COMMANDS {
                lines.push(Line::plain(format!("  {:<28} {}", spec.usage, spec.summary)));
            }
            lines.push(Line::plain("Type `help <command>` for a specific command."));
        }
    }
    Response {
        lines,
        close: false,
    }
}

/// Rows in the `D3:\t412` layout, one per tracked channel.
fn peak_rows(peaks: &[PeakRecord]) -> impl Iterator<Item = Line> + '_ {
    peaks.iter().map(|record| {
        let label = channel_by_id(&XYLOPHONE_CHANNELS, record.channel)
            .map_or("??", |config| config.label);
        Line::plain(format!("{label}:\t{}", record.max_value))
    })
}

/// Whole cycles that fit in `duration`, at least one.
fn cycles_in(duration: Duration, cycle_delay: Duration) -> u32 {
    let per_cycle = cycle_delay.as_micros().max(1);
    u32::try_from(duration.as_micros() / per_cycle)
        .unwrap_or(u32::MAX)
        .max(1)
}

fn millis(instant: Micros) -> u64 {
    instant.as_micros() / 1_000
}

fn optional(value: Option<u16>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

struct TranscriptLogger {
    writer: BufWriter<fs::File>,
}

impl TranscriptLogger {
    fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Strike emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

#[derive(Copy, Clone)]
enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
