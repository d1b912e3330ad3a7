/*!
  The quiz over one unit and, depth first, over the units nested in it.

  ```text
  PresentingSource ─▶ AwaitingLine ⟲ ─▶ UnitComplete ─▶ PresentingSource (next nested unit)
                           │                  │
                           └─ terminate ──▶ AllComplete ◀─ nothing left
  ```

  In `AwaitingLine` one blocking read decides what happens: an answer is judged, scored and
  answered with feedback before moving to the next instruction; a cheatsheet request pages the rest
  of the unit's stream and asks the same instruction again; a terminate request ends the whole
  run, leaving the remaining instructions uncounted.
*/

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::bytecode::Instruction;
use crate::extract::CompiledUnit;
use super::{match_answer, Completion, ScoreCounters, Scoreboard, Verdict};

/// The outcome of one blocking read.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InputEvent {
  Answer(String),
  Cheatsheet,
  Terminate,
}

pub trait AnswerSource {
  fn read_event(&mut self) -> io::Result<InputEvent>;
}

pub trait Presenter {
  /// Shows the source listing of a unit about to be quizzed.
  fn show_unit(&mut self, unit: &CompiledUnit) -> io::Result<()>;

  /// Asks for the instruction at `offset`.
  fn prompt(&mut self, offset: u32) -> io::Result<()>;

  fn show_verdict(&mut self, verdict: &Verdict) -> io::Result<()>;

  /// `elapsed` runs from showing the unit's source to its last verdict.
  fn show_unit_summary(
    &mut self,
    unit    : &CompiledUnit,
    score   : ScoreCounters,
    elapsed : Duration
  ) -> io::Result<()>;
}

pub trait Pager {
  /// Shows the instructions not yet answered and returns when the user is done reading.
  fn show_cheatsheet(&mut self, remaining: &[Instruction]) -> io::Result<()>;
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Outcome {
  /// Every instruction of the unit and its descendants was asked.
  Completed,
  Terminated,
}

#[derive(Clone, Copy, Debug)]
enum State<'u> {
  PresentingSource(&'u CompiledUnit),
  AwaitingLine {
    unit     : &'u CompiledUnit,
    position : usize
  },
  UnitComplete(&'u CompiledUnit),
  AllComplete,
}

/// Drives quizzes, keeping one score across all the units it is run on.
pub struct QuizSession<A, P, G> {
  answers    : A,
  presenter  : P,
  pager      : G,
  scoreboard : Scoreboard,
  started    : Instant,
}

impl<A, P, G> QuizSession<A, P, G>
  where A: AnswerSource,
        P: Presenter,
        G: Pager
{
  pub fn new(answers: A, presenter: P, pager: G) -> QuizSession<A, P, G> {
    QuizSession {
      answers,
      presenter,
      pager,
      scoreboard : Scoreboard::new(),
      started    : Instant::now(),
    }
  }

  pub fn report(&self) -> ScoreCounters {
    self.scoreboard.report()
  }

  /// Time since the session was created.
  pub fn elapsed(&self) -> Duration {
    self.started.elapsed()
  }

  /// The roots quizzed to the end, in the order they were finished.
  pub fn completed(&self) -> &[Completion] {
    self.scoreboard.completed()
  }

  pub fn presenter_mut(&mut self) -> &mut P {
    &mut self.presenter
  }

  /// Gives the collaborators back, for inspection after a run.
  #[cfg(test)]
  pub fn into_parts(self) -> (A, P, G) {
    (self.answers, self.presenter, self.pager)
  }

  /// Quizzes `root` and then its descendants in pre-order. Display failures are returned; a
  /// failing input stream ends the run like a terminate request.
  pub fn run(&mut self, root: &CompiledUnit) -> io::Result<Outcome> {
    let mut pending: Vec<&CompiledUnit> = Vec::new();
    let mut unit_score = ScoreCounters::default();
    let mut unit_started = Instant::now();
    let root_started = unit_started;
    let mut state = State::PresentingSource(root);

    loop {
      state =
        match state {

          State::PresentingSource(unit) => {
            debug!(qualname = unit.qualname.as_str(), "quizzing unit");
            self.presenter.show_unit(unit)?;
            unit_score = ScoreCounters::default();
            unit_started = Instant::now();
            State::AwaitingLine { unit, position: 0 }
          }

          State::AwaitingLine { unit, position } => {
            match unit.instructions.get(position) {
              None => State::UnitComplete(unit),
              Some(expected) => {
                self.presenter.prompt(expected.offset)?;
                match self.read_event() {

                  InputEvent::Answer(line) => {
                    let verdict = match_answer(expected, &line);
                    self.scoreboard.record(&verdict);
                    unit_score.record(verdict.correct);
                    self.presenter.show_verdict(&verdict)?;
                    State::AwaitingLine { unit, position: position + 1 }
                  }

                  InputEvent::Cheatsheet => {
                    if let Err(error) = self.pager.show_cheatsheet(&unit.instructions[position..]) {
                      warn!(%error, "could not show the cheatsheet");
                    }
                    State::AwaitingLine { unit, position }
                  }

                  InputEvent::Terminate => State::AllComplete,

                }
              }
            }
          }

          State::UnitComplete(unit) => {
            self.presenter.show_unit_summary(unit, unit_score, unit_started.elapsed())?;
            pending.extend(unit.children.iter().rev());
            match pending.pop() {
              Some(next) => State::PresentingSource(next),
              None       => {
                self.scoreboard.record_completion(&root.name, root_started.elapsed());
                return Ok(Outcome::Completed);
              }
            }
          }

          State::AllComplete => return Ok(Outcome::Terminated),

        }; // end match on state
    }
  }

  fn read_event(&mut self) -> InputEvent {
    match self.answers.read_event() {
      Ok(event)  => event,
      Err(error) => {
        warn!(%error, "could not read an answer, ending the quiz");
        InputEvent::Terminate
      }
    }
  }
}
