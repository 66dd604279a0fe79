#![allow(clippy::module_name_repetitions)]

//! Parser for the emulator console.
//!
//! Lines are parsed directly from `&str` with `winnow` combinators. The
//! keyword is resolved against the [`catalog`](super::catalog) first, so an
//! argument error can quote the command's usage line.

use core::fmt;
use core::time::Duration;

use winnow::ModalResult;
use winnow::ascii::{Caseless, digit1, space0, space1};
use winnow::combinator::{alt, eof, opt, preceded, terminated};
use winnow::prelude::*;
use winnow::token::{literal, take_while};

use super::catalog::{self, CommandTag};
use crate::channels::ChannelId;

type Input<'a> = &'a str;

/// Structured commands produced by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Strike {
        channel: ChannelId,
        velocity: Option<u16>,
    },
    Step {
        cycles: u32,
    },
    Run {
        duration: Duration,
    },
    Peaks,
    Status,
    Help {
        topic: Option<CommandTag>,
    },
    Exit,
}

/// Grammar errors emitted by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrammarErrorKind {
    /// Blank line.
    Empty,
    UnknownCommand,
    /// Keyword was recognized but its arguments were not.
    InvalidArguments { usage: &'static str },
}

/// Parse failure with the byte offset where it was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub offset: usize,
}

impl GrammarError {
    const fn new(kind: GrammarErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GrammarErrorKind::Empty => f.write_str("empty command"),
            GrammarErrorKind::UnknownCommand => {
                write!(f, "unknown command at column {}", self.offset)
            }
            GrammarErrorKind::InvalidArguments { usage } => {
                write!(f, "expected `{usage}` (column {})", self.offset)
            }
        }
    }
}

/// Parses one console line. Trailing line terminators and whitespace are ignored.
pub fn parse(line: &str) -> Result<Command, GrammarError> {
    let source = line.trim_end_matches(['\r', '\n']);
    let mut input = source.trim_start();
    let offset = |rest: &str| source.len() - rest.len();

    if input.trim_end().is_empty() {
        return Err(GrammarError::new(GrammarErrorKind::Empty, 0));
    }

    let keyword_at = offset(input);
    let spec = keyword
        .parse_next(&mut input)
        .ok()
        .and_then(catalog::find)
        .ok_or(GrammarError::new(GrammarErrorKind::UnknownCommand, keyword_at))?;

    terminated(|input: &mut Input<'_>| arguments(spec.tag, input), (space0, eof))
        .parse_next(&mut input)
        .map_err(|_| {
            GrammarError::new(
                GrammarErrorKind::InvalidArguments { usage: spec.usage },
                offset(input),
            )
        })
}

fn keyword<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '?').parse_next(input)
}

fn arguments(tag: CommandTag, input: &mut Input<'_>) -> ModalResult<Command> {
    match tag {
        CommandTag::Strike => (
            preceded(space1, number::<u8>),
            opt(preceded(space1, number::<u16>)),
        )
            .map(|(channel, velocity)| Command::Strike {
                channel: ChannelId::new(channel),
                velocity,
            })
            .parse_next(input),
        CommandTag::Step => opt(preceded(space1, number::<u32>))
            .map(|cycles| Command::Step {
                cycles: cycles.unwrap_or(1),
            })
            .parse_next(input),
        CommandTag::Run => preceded(space1, duration)
            .map(|duration| Command::Run { duration })
            .parse_next(input),
        CommandTag::Peaks => Ok(Command::Peaks),
        CommandTag::Status => Ok(Command::Status),
        CommandTag::Help => opt(preceded(space1, topic))
            .map(|topic| Command::Help { topic })
            .parse_next(input),
        CommandTag::Exit => Ok(Command::Exit),
    }
}

fn topic(input: &mut Input<'_>) -> ModalResult<CommandTag> {
    keyword
        .verify_map(|word| catalog::find(word).map(|spec| spec.tag))
        .parse_next(input)
}

fn number<T>(input: &mut Input<'_>) -> ModalResult<T>
where
    T: core::str::FromStr,
{
    digit1
        .verify_map(|digits: &str| digits.parse::<T>().ok())
        .parse_next(input)
}

/// `<integer>ms` or `<integer>s`.
fn duration(input: &mut Input<'_>) -> ModalResult<Duration> {
    (
        number::<u64>,
        alt((
            literal(Caseless("ms")).value(1_u64),
            literal(Caseless("s")).value(1_000_u64),
        )),
    )
        .map(|(amount, scale)| Duration::from_millis(amount.saturating_mul(scale)))
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strike_with_and_without_velocity() {
        assert_eq!(
            parse("strike 12"),
            Ok(Command::Strike {
                channel: ChannelId::new(12),
                velocity: None,
            })
        );
        assert_eq!(
            parse("  HIT 3 800 \r\n"),
            Ok(Command::Strike {
                channel: ChannelId::new(3),
                velocity: Some(800),
            })
        );
    }

    #[test]
    fn step_defaults_to_one_cycle() {
        assert_eq!(parse("step"), Ok(Command::Step { cycles: 1 }));
        assert_eq!(parse("step 25"), Ok(Command::Step { cycles: 25 }));
    }

    #[test]
    fn run_requires_a_unit() {
        assert_eq!(
            parse("run 500ms"),
            Ok(Command::Run {
                duration: Duration::from_millis(500),
            })
        );
        assert_eq!(
            parse("run 2S"),
            Ok(Command::Run {
                duration: Duration::from_secs(2),
            })
        );
        assert!(matches!(
            parse("run 2"),
            Err(GrammarError {
                kind: GrammarErrorKind::InvalidArguments { .. },
                ..
            })
        ));
    }

    #[test]
    fn help_accepts_known_topics() {
        assert_eq!(parse("help"), Ok(Command::Help { topic: None }));
        assert_eq!(
            parse("help run"),
            Ok(Command::Help {
                topic: Some(CommandTag::Run),
            })
        );
        assert!(parse("help bogus").is_err());
    }

    #[test]
    fn unknown_keyword_reports_its_column() {
        assert_eq!(
            parse("  calibrate now"),
            Err(GrammarError::new(GrammarErrorKind::UnknownCommand, 2))
        );
        assert_eq!(
            parse("   "),
            Err(GrammarError::new(GrammarErrorKind::Empty, 0))
        );
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(matches!(
            parse("peaks now"),
            Err(GrammarError {
                kind: GrammarErrorKind::InvalidArguments { usage: "peaks" },
                ..
            })
        ));
        assert!(parse("strike 300").is_err());
        assert!(parse("exit").is_ok());
        assert!(parse("quit").is_ok());
    }
}
