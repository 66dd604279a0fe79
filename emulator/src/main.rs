mod board;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use crossterm::style::Stylize;
use crossterm::tty::IsTty;

use session::{Line, Session, Tone};

fn main() -> io::Result<()> {
    let transcript = parse_transcript_path().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: strike-emulator [--transcript <path>]");
        process::exit(2);
    });

    let mut session = Session::new(transcript.as_deref()).unwrap_or_else(|err| {
        eprintln!("{err}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let colour = stdout.is_tty();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Strike emulator ready: 25 bars, G3 to G5. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let response = session.handle_line(&line)?;
        for output in &response.lines {
            print_line(&mut writer, output, colour)?;
        }
        if response.close {
            break;
        }
    }

    Ok(())
}

fn print_line(writer: &mut impl Write, line: &Line, colour: bool) -> io::Result<()> {
    if !colour {
        return writeln!(writer, "{}", line.text);
    }
    match line.tone {
        Tone::Plain => writeln!(writer, "{}", line.text),
        Tone::Key => writeln!(writer, "{}", line.text.as_str().bold().green()),
        Tone::Error => writeln!(writer, "{}", line.text.as_str().red()),
    }
}

fn parse_transcript_path() -> Result<Option<PathBuf>, String> {
    let mut args = env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(None);
    };

    if let Some(value) = arg.strip_prefix("--transcript=") {
        Ok(Some(PathBuf::from(value)))
    } else if arg == "--transcript" {
        args.next()
            .map(|value| Some(PathBuf::from(value)))
            .ok_or_else(|| "Expected a path after --transcript".to_string())
    } else {
        Err(format!("Unknown argument `{arg}`"))
    }
}
