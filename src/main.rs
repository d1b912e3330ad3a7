#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

mod bytecode;
mod challenges;
mod compiler;
mod extract;
mod quiz;
mod registry;
mod symboltable;
mod terminal;

use std::env;
use std::error::Error;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use strum_macros::EnumString;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::extract::extract_unit;
use crate::quiz::{AnswerSource, InputEvent, Outcome, Pager, QuizSession};
use crate::registry::{Difficulty, QuizUnit, Registry, RegistryBuilder};
use crate::terminal::{spawn_reader, ChannelReader, CommandPager, LineReader, TerminalPresenter};

/// Holds the log filter, in `EnvFilter` syntax.
const LOG_ENV: &str = "GUESSDIS_LOG";
const DEFAULT_PAGER: &str = "less";

#[derive(EnumString, Clone, Copy, Eq, PartialEq, Debug)]
#[strum(serialize_all = "lowercase")]
enum Order {
  Random,
  Sequential,
}

/// Quizzes you on the bytecode disassembly of small functions and classes, one instruction at a
/// time.
#[derive(FromArgs)]
struct Arguments {
  /// only quiz challenges of this difficulty:
  /// beginner, intermediate, advanced or custom
  #[argh(option, short = 'd')]
  difficulty: Option<Difficulty>,

  /// order: `random` (the default) keeps picking challenges until you quit,
  /// `sequential` asks each selected challenge once
  #[argh(option, default = "Order::Random")]
  order: Order,

  /// seed for the random order
  #[argh(option)]
  seed: Option<u64>,

  /// quiz only the challenge with this name
  #[argh(option, short = 'c')]
  challenge: Option<String>,

  /// also load every top-level definition in this file as a challenge,
  /// may be repeated
  #[argh(option, short = 'f')]
  file: Vec<PathBuf>,

  /// command that shows the cheatsheet,
  /// if not specified, $PAGER or else `less` is used
  #[argh(option)]
  pager: Option<String>,

  /// list the available challenges and exit
  #[argh(switch, short = 'l')]
  list: bool,

  /// whether colours should be turned off
  #[argh(switch)]
  no_color: bool,

  /// whether debug diagnostics should be logged to stderr
  #[argh(switch, short = 'v')]
  verbose: bool,
}

fn init_logging(verbose: bool) {
  let default = match verbose {
    true  => "debug",
    false => "warn"
  };
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(io::stderr)
    .init();
}

fn load_registry(files: &[PathBuf]) -> Result<Registry, Box<dyn Error>> {
  let mut builder = RegistryBuilder::new();
  challenges::register_builtin(&mut builder)?;

  for path in files {
    let names = builder.register_file(path)?;
    info!(path = %path.display(), count = names.len(), "loaded challenges");
  }

  Ok(builder.build())
}

fn select<'r>(registry: &'r Registry, arguments: &Arguments) -> Vec<&'r QuizUnit> {
  match (&arguments.challenge, arguments.difficulty) {
    (Some(name), _)          => registry.get(name).into_iter().collect(),
    (None, Some(difficulty)) => registry.filter(difficulty).collect(),
    (None, None)             => registry.iter().collect(),
  }
}

fn run(arguments: &Arguments) -> Result<ExitCode, Box<dyn Error>> {
  let registry = load_registry(&arguments.file)?;
  let color = !arguments.no_color && io::stdout().is_terminal();
  let mut presenter = TerminalPresenter::new(io::stdout(), color);

  if arguments.list {
    presenter.show_registry(&registry)?;
    return Ok(ExitCode::SUCCESS);
  }

  let candidates = select(&registry, arguments);
  if candidates.is_empty() {
    presenter.show_warning("No challenges match the selection.")?;
    return Ok(ExitCode::FAILURE);
  }

  let pager_command = arguments.pager
                               .clone()
                               .or_else(|| env::var("PAGER").ok())
                               .unwrap_or_else(|| DEFAULT_PAGER.to_string());

  let (events, received) = mpsc::channel();
  let interrupt = events.clone();
  ctrlc::set_handler(move || {
    // Fails only once the session is over and nobody listens anymore.
    let _ = interrupt.send(InputEvent::Terminate);
  })?;
  spawn_reader(LineReader::new(BufReader::new(io::stdin())), events);

  let mut session = QuizSession::new(
    ChannelReader::new(received),
    presenter,
    CommandPager::new(&pager_command, io::stdout())
  );

  let mut rng = match arguments.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None       => StdRng::from_entropy(),
  };

  quiz_candidates(&mut session, candidates, arguments.order, &mut rng)?;
  Ok(ExitCode::SUCCESS)
}

/**
  Quizzes `candidates` until the user quits, or until each has been asked once in sequential
  order. A unit that cannot be compiled is skipped with a warning, and in random order it is
  dropped from the candidates, so a selection that fails entirely still ends. The report is
  shown in every case.
*/
fn quiz_candidates<A, W, G, R>(
  session        : &mut QuizSession<A, TerminalPresenter<W>, G>,
  mut candidates : Vec<&QuizUnit>,
  order          : Order,
  rng            : &mut R,
) -> io::Result<()>
  where A: AnswerSource,
        W: Write,
        G: Pager,
        R: Rng
{
  let mut next = 0;

  loop {
    let picked = match order {
      Order::Sequential => {
        if next >= candidates.len() {
          session.presenter_mut().show_warning("Every selected challenge has been asked.")?;
          break;
        }
        next += 1;
        next - 1
      }
      Order::Random => {
        if candidates.is_empty() {
          break;
        }
        rng.gen_range(0..candidates.len())
      }
    };

    let unit = candidates[picked];
    let compiled = match extract_unit(unit) {
      Ok(compiled) => compiled,
      Err(error) => {
        warn!(name = unit.name.as_str(), %error, "skipping challenge");
        session.presenter_mut().show_warning(&format!("Skipping {}: {}", unit.name, error))?;
        if order == Order::Random {
          candidates.swap_remove(picked);
        }
        continue;
      }
    };

    info!(name = unit.name.as_str(), instructions = compiled.total_instructions(), "quizzing");
    if session.run(&compiled)? == Outcome::Terminated {
      break;
    }
  }

  let report = session.report();
  let elapsed = session.elapsed();
  let completed = session.completed().to_vec();
  session.presenter_mut().show_report(report, elapsed, &completed)
}

fn main() -> ExitCode {
  let arguments: Arguments = argh::from_env();
  init_logging(arguments.verbose);

  match run(&arguments) {
    Ok(code)   => code,
    Err(error) => {
      eprintln!("guessdis: {}", error);
      ExitCode::FAILURE
    }
  }
}


#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;
  use crate::quiz::ScoreCounters;

  type TestSession = QuizSession<LineReader<Cursor<&'static str>>, TerminalPresenter<Vec<u8>>,
                                 CommandPager<Vec<u8>>>;

  fn session(typed: &'static str) -> TestSession {
    QuizSession::new(
      LineReader::new(Cursor::new(typed)),
      TerminalPresenter::new(Vec::new(), false),
      CommandPager::new("", Vec::new())
    )
  }

  fn output(session: TestSession) -> String {
    let (_, presenter, _) = session.into_parts();
    String::from_utf8(presenter.into_inner()).unwrap()
  }

  fn answer() -> QuizUnit {
    QuizUnit::new("answer", Difficulty::Beginner, "def answer():\n    return 42\n")
  }

  fn broken(name: &str) -> QuizUnit {
    QuizUnit::new(name, Difficulty::Custom, "def broken():\n    return 1 +\n")
  }

  #[test]
  fn sequential_order_skips_broken_units_and_asks_the_rest() {
    let (broken, answer) = (broken("broken"), answer());
    let mut session = session("load_const 42\nreturn_value\n");
    let mut rng = StdRng::seed_from_u64(7);

    quiz_candidates(&mut session, vec![&broken, &answer], Order::Sequential, &mut rng).unwrap();
    assert_eq!(session.report(), ScoreCounters { correct: 2, incorrect: 0 });
    assert_eq!(session.completed().len(), 1);
    assert_eq!(session.completed()[0].name, "answer");

    let text = output(session);
    assert!(text.contains("Skipping broken: "));
    assert!(text.contains("Every selected challenge has been asked."));
    assert!(text.ends_with("Results\n-------\nCorrect: 2\nIncorrect: 0\n"));
  }

  #[test]
  fn random_order_keeps_quizzing_good_units_until_quit() {
    let (broken, answer) = (broken("broken"), answer());
    // The first pass is answered, the next one ends at end of input.
    let mut session = session("load_const 42\nreturn_value\n");
    let mut rng = StdRng::seed_from_u64(11);

    quiz_candidates(&mut session, vec![&broken, &answer], Order::Random, &mut rng).unwrap();
    assert_eq!(session.report(), ScoreCounters { correct: 2, incorrect: 0 });
    assert_eq!(session.completed().len(), 1);
    assert!(output(session).contains("Results"));
  }

  #[test]
  fn random_order_ends_when_every_unit_fails() {
    let (first, second) = (broken("first"), broken("second"));
    let mut session = session("");
    let mut rng = StdRng::seed_from_u64(3);

    quiz_candidates(&mut session, vec![&first, &second], Order::Random, &mut rng).unwrap();
    assert_eq!(session.report(), ScoreCounters::default());

    let text = output(session);
    assert!(text.contains("Skipping first: "));
    assert!(text.contains("Skipping second: "));
    assert!(text.ends_with("Results\n-------\nCorrect: 0\nIncorrect: 0\n"));
  }

  #[test]
  fn quitting_midway_still_reports() {
    let answer = answer();
    let mut session = session("load_const 42\n:q\n");
    let mut rng = StdRng::seed_from_u64(5);

    quiz_candidates(&mut session, vec![&answer], Order::Sequential, &mut rng).unwrap();
    assert_eq!(session.report(), ScoreCounters { correct: 1, incorrect: 0 });
    assert!(session.completed().is_empty());

    let text = output(session);
    assert!(!text.contains("Every selected challenge has been asked."));
    assert!(text.ends_with("Results\n-------\nCorrect: 1\nIncorrect: 0\n"));
  }
}
