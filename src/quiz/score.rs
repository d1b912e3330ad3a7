use std::fmt::{Display, Formatter};
use std::time::Duration;

use super::Verdict;

/// Tallies of answered instructions. Skipped instructions are never counted.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct ScoreCounters {
  pub correct   : u32,
  pub incorrect : u32,
}

impl ScoreCounters {
  pub fn record(&mut self, correct: bool) {
    match correct {
      true  => self.correct += 1,
      false => self.incorrect += 1,
    }
  }

  pub fn answered(&self) -> u32 {
    self.correct + self.incorrect
  }
}

impl Display for ScoreCounters {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Results\n-------\nCorrect: {}\nIncorrect: {}", self.correct, self.incorrect)
  }
}

/// A challenge quizzed through to its last nested unit.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Completion {
  pub name    : String,
  pub elapsed : Duration,
}

/// Run-wide score, readable at any point.
#[derive(Clone, Default, Debug)]
pub struct Scoreboard {
  counters  : ScoreCounters,
  completed : Vec<Completion>,
}

impl Scoreboard {
  pub fn new() -> Scoreboard {
    Scoreboard::default()
  }

  pub fn record(&mut self, verdict: &Verdict) {
    self.counters.record(verdict.correct);
  }

  pub fn record_completion(&mut self, name: &str, elapsed: Duration) {
    self.completed.push(Completion { name: name.to_string(), elapsed });
  }

  pub fn report(&self) -> ScoreCounters {
    self.counters
  }

  pub fn completed(&self) -> &[Completion] {
    &self.completed
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::{Instruction, Opcode};

  fn verdict(correct: bool) -> Verdict {
    Verdict {
      correct,
      expected  : Instruction::new(0, Opcode::Nop, None),
      malformed : None
    }
  }

  #[test]
  fn counts_accumulate() {
    let mut scoreboard = Scoreboard::new();
    assert_eq!(scoreboard.report(), ScoreCounters::default());

    scoreboard.record(&verdict(true));
    scoreboard.record(&verdict(false));
    scoreboard.record(&verdict(true));
    assert_eq!(scoreboard.report(), ScoreCounters { correct: 2, incorrect: 1 });
    assert_eq!(scoreboard.report().answered(), 3);
  }

  #[test]
  fn completions_keep_their_order() {
    let mut scoreboard = Scoreboard::new();
    scoreboard.record_completion("square", Duration::from_millis(4200));
    scoreboard.record_completion("for_loop", Duration::from_secs(95));
    assert_eq!(
      scoreboard.completed(),
      &[
        Completion { name: "square".to_string(), elapsed: Duration::from_millis(4200) },
        Completion { name: "for_loop".to_string(), elapsed: Duration::from_secs(95) },
      ]
    );
  }

  #[test]
  fn report_format() {
    let counters = ScoreCounters { correct: 4, incorrect: 1 };
    assert_eq!(counters.to_string(), "Results\n-------\nCorrect: 4\nIncorrect: 1");
  }
}
