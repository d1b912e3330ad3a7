/*!
  Everything between an answer line and the final tally: normalizing and judging answers,
  keeping score, and the session state machine that walks a `CompiledUnit` tree asking for one
  instruction at a time. The terminal is reached only through the `AnswerSource`, `Presenter` and
  `Pager` traits.
*/

mod matcher;
mod normalize;
mod score;
mod session;

pub use matcher::{match_answer, Verdict};
pub use score::{Completion, ScoreCounters, Scoreboard};
pub use session::{AnswerSource, InputEvent, Outcome, Pager, Presenter, QuizSession};
