use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use serde::Serialize;

use crate::app::{ImportResult, InitResult, ProgressEvent, ProgressLevel, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_import(result: &ImportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_init(result: &InitResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Draws progress on a single rewritten stderr line; warnings and phase
/// messages scroll above it.
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn draw(event: &ProgressEvent) -> io::Result<()> {
        let mut stderr = io::stderr();
        queue!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        match event.level {
            ProgressLevel::Progress => {
                queue!(
                    stderr,
                    SetForegroundColor(Color::Cyan),
                    Print(format!("importing {}", event.message)),
                    ResetColor
                )?;
            }
            ProgressLevel::Warning => {
                queue!(
                    stderr,
                    SetForegroundColor(Color::Yellow),
                    Print(format!("warning: {}\n", event.message)),
                    ResetColor
                )?;
            }
            ProgressLevel::Info => {
                let elapsed = event
                    .elapsed
                    .map(|elapsed| format!(" [{:.1}s]", elapsed.as_secs_f64()))
                    .unwrap_or_default();
                queue!(
                    stderr,
                    SetForegroundColor(Color::DarkGrey),
                    Print(format!("{}{elapsed}\n", event.message)),
                    ResetColor
                )?;
            }
        }
        stderr.flush()
    }

    pub fn finish(&self) {
        let mut stderr = io::stderr();
        let _ = queue!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = stderr.flush();
    }
}

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        let _ = Self::draw(&event);
    }
}
