/*!
  The terminal side of a quiz session: colours, the presenter that draws listings and feedback,
  the line reader that turns typed lines into `InputEvent`s, and the pager that shows cheatsheets.

  Lines are read on a thread of their own and handed over through a channel, which the interrupt
  handler writes to as well. That way Ctrl-C ends a quiz blocked on input the same way `:q` does.
*/

use std::io::{self, BufRead, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use prettytable::{format as TableFormat, Table};
use tracing::{debug, warn};

use crate::bytecode::Instruction;
use crate::extract::CompiledUnit;
use crate::quiz::{AnswerSource, Completion, InputEvent, Pager, Presenter, ScoreCounters, Verdict};
use crate::registry::Registry;

/// Typed alone on a line, asks for the cheatsheet.
pub const CHEATSHEET_REQUEST: &str = "?";
/// Typed alone on a line, ends the run.
pub const QUIT_REQUEST: &str = ":q";

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Ansi {
  LightRed,
  LightGreen,
  LightYellow,
  LightBlue,
}

impl Ansi {
  pub fn code(&self) -> u8 {
    match self {
      Ansi::LightRed    => 91,
      Ansi::LightGreen  => 92,
      Ansi::LightYellow => 93,
      Ansi::LightBlue   => 94,
    }
  }

  pub fn paint(&self, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[m", self.code(), text)
  }
}

/// `4.2s` below a minute, `1m 35.3s` from there on.
pub fn format_time(elapsed: Duration) -> String {
  let seconds = elapsed.as_secs_f64();
  match seconds < 60.0 {
    true  => format!("{:.1}s", seconds),
    false => format!("{}m {:.1}s", (seconds / 60.0).floor() as u64, seconds % 60.0)
  }
}

/// The remaining instructions as a table of line, offset, opcode and operand.
pub fn cheatsheet_text(remaining: &[Instruction]) -> String {
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Line", ubr->"Offset", ubl->"Opcode", ubl->"Operand"]);

  for instruction in remaining {
    let line = instruction.line.map(|line| line.to_string()).unwrap_or_default();
    let operand = instruction.operand.as_ref().map(|operand| operand.to_string()).unwrap_or_default();
    table.add_row(row![
      r->line,
      r->format!("{}", instruction.offset),
      instruction.opcode_name(),
      operand
    ]);
  }

  table.to_string()
}

fn listing_table(unit: &CompiledUnit) -> Table {
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  for (i, text) in unit.source.iter().enumerate() {
    table.add_row(row![r->format!("{}", unit.first_line as usize + i), text]);
  }
  table
}

// region Presenter

pub struct TerminalPresenter<W: Write> {
  out   : W,
  color : bool,
}

impl<W: Write> TerminalPresenter<W> {
  pub fn new(out: W, color: bool) -> TerminalPresenter<W> {
    TerminalPresenter { out, color }
  }

  fn paint(&self, text: &str, color: Ansi) -> String {
    match self.color {
      true  => color.paint(text),
      false => text.to_string()
    }
  }

  /// The available units, for `--list`.
  pub fn show_registry(&mut self, registry: &Registry) -> io::Result<()> {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubl->"Name", ubl->"Difficulty"]);
    if registry.is_empty() {
      writeln!(self.out, "No challenges are registered.")?;
      return self.out.flush();
    }
    for unit in registry.iter() {
      table.add_row(row![unit.name, format!("{}", unit.difficulty)]);
    }
    write!(self.out, "{}", table)?;
    writeln!(self.out, "{} challenges", registry.len())?;
    self.out.flush()
  }

  pub fn show_warning(&mut self, message: &str) -> io::Result<()> {
    let painted = self.paint(message, Ansi::LightYellow);
    writeln!(self.out, "{}", painted)
  }

  /// The closing words: finished challenges with their times, the session time and the score.
  pub fn show_report(
    &mut self,
    score     : ScoreCounters,
    elapsed   : Duration,
    completed : &[Completion]
  ) -> io::Result<()> {
    writeln!(self.out, "\n\nThanks for playing! :)\n")?;

    if !completed.is_empty() {
      let mut table = Table::new();

      table.set_format(*TABLE_DISPLAY_FORMAT);
      table.set_titles(row![ubl->"Completed", ubr->"Time"]);
      for completion in completed {
        table.add_row(row![completion.name, r->format_time(completion.elapsed)]);
      }
      writeln!(self.out, "{}", table)?;
    }

    writeln!(self.out, "Session time: {}\n", format_time(elapsed))?;
    let results = self.paint(&score.to_string(), Ansi::LightBlue);
    writeln!(self.out, "{}", results)?;
    self.out.flush()
  }

  #[cfg(test)]
  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
  fn show_unit(&mut self, unit: &CompiledUnit) -> io::Result<()> {
    let listing = self.paint(&listing_table(unit).to_string(), Ansi::LightBlue);
    writeln!(self.out, "\n{} {}", unit.kind, unit.qualname)?;
    write!(self.out, "{}", listing)?;
    writeln!(
      self.out,
      "Write the disassembly below (line by line). `{}` shows the cheatsheet, `{}` quits.",
      CHEATSHEET_REQUEST,
      QUIT_REQUEST
    )
  }

  fn prompt(&mut self, offset: u32) -> io::Result<()> {
    write!(self.out, "{}: ", offset)?;
    self.out.flush()
  }

  fn show_verdict(&mut self, verdict: &Verdict) -> io::Result<()> {
    if let Some(error) = &verdict.malformed {
      let hint = self.paint(&format!("Could not parse your answer: {}", error), Ansi::LightYellow);
      writeln!(self.out, "{}", hint)?;
    }

    let feedback = match verdict.correct {
      true  => self.paint("Correct!", Ansi::LightGreen),
      false => self.paint(&format!("Incorrect - {}", verdict.expected), Ansi::LightRed),
    };
    writeln!(self.out, "{}\n", feedback)
  }

  fn show_unit_summary(
    &mut self,
    unit    : &CompiledUnit,
    score   : ScoreCounters,
    elapsed : Duration
  ) -> io::Result<()> {
    writeln!(
      self.out,
      "{}: {}/{} correct in {}",
      unit.qualname,
      score.correct,
      score.answered(),
      format_time(elapsed)
    )
  }
}

// endregion

// region Input

/// Reads answers one line at a time. End of input counts as a quit request.
pub struct LineReader<R: BufRead> {
  input : R,
}

impl<R: BufRead> LineReader<R> {
  pub fn new(input: R) -> LineReader<R> {
    LineReader { input }
  }
}

impl<R: BufRead> AnswerSource for LineReader<R> {
  fn read_event(&mut self) -> io::Result<InputEvent> {
    let mut line = String::new();
    if self.input.read_line(&mut line)? == 0 {
      return Ok(InputEvent::Terminate);
    }

    let event = match line.trim() {
      CHEATSHEET_REQUEST => InputEvent::Cheatsheet,
      QUIT_REQUEST       => InputEvent::Terminate,
      _                  => InputEvent::Answer(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
    };
    Ok(event)
  }
}

/// Answers handed over by `spawn_reader` and the interrupt handler.
pub struct ChannelReader {
  events : Receiver<InputEvent>,
}

impl ChannelReader {
  pub fn new(events: Receiver<InputEvent>) -> ChannelReader {
    ChannelReader { events }
  }
}

impl AnswerSource for ChannelReader {
  /// Every sender gone means nothing more can be typed, which ends the run.
  fn read_event(&mut self) -> io::Result<InputEvent> {
    Ok(self.events.recv().unwrap_or(InputEvent::Terminate))
  }
}

/**
  Reads events from `source` on a new thread and sends them on `events`, up to and including the
  first `Terminate`. A read error is sent as `Terminate` too.
*/
pub fn spawn_reader<A>(mut source: A, events: Sender<InputEvent>) -> JoinHandle<()>
  where A: AnswerSource + Send + 'static
{
  thread::spawn(move || loop {
    let event = match source.read_event() {
      Ok(event)  => event,
      Err(error) => {
        warn!(%error, "could not read an answer");
        InputEvent::Terminate
      }
    };

    let last = event == InputEvent::Terminate;
    if events.send(event).is_err() || last {
      debug!("stopped reading answers");
      break;
    }
  })
}

// endregion

// region Pager

/**
  Pipes text into an external pager command such as `less` and waits for it to exit. When the
  command cannot be started, the text is written to `fallback` instead.
*/
pub struct CommandPager<W: Write> {
  command  : String,
  fallback : W,
}

impl<W: Write> CommandPager<W> {
  pub fn new(command: &str, fallback: W) -> CommandPager<W> {
    CommandPager {
      command: command.to_string(),
      fallback
    }
  }

  fn print(&mut self, text: &str) -> io::Result<()> {
    write!(self.fallback, "{}", text)?;
    self.fallback.flush()
  }

  pub fn page(&mut self, text: &str) -> io::Result<()> {
    let command = self.command.clone();
    let mut words = command.split_whitespace();
    let program = match words.next() {
      Some(program) => program,
      None          => return self.print(text),
    };

    let spawned = Command::new(program).args(words).stdin(Stdio::piped()).spawn();
    let mut child = match spawned {
      Ok(child)  => child,
      Err(error) => {
        warn!(%error, command = command.as_str(), "could not start the pager, printing instead");
        return self.print(text);
      }
    };

    // Dropping the pipe at the end of the block signals end of input.
    let written = match child.stdin.take() {
      Some(mut stdin) => stdin.write_all(text.as_bytes()),
      None            => Ok(()),
    };

    match written {
      // The user may quit the pager before it has read everything.
      Err(error) if error.kind() != io::ErrorKind::BrokenPipe => {
        let _ = child.kill();
        child.wait()?;
        Err(error)
      }
      _ => {
        child.wait()?;
        Ok(())
      }
    }
  }

  #[cfg(test)]
  pub fn into_inner(self) -> W {
    self.fallback
  }
}

impl<W: Write> Pager for CommandPager<W> {
  fn show_cheatsheet(&mut self, remaining: &[Instruction]) -> io::Result<()> {
    self.page(&cheatsheet_text(remaining))
  }
}

// endregion
