use tracing::debug;

use crate::bytecode::{tokenize_answer, Instruction, MalformedInputError};
use super::normalize::{opcode_matches, operand_matches};

/// The judgment of one answer, with the instruction that was expected for feedback.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Verdict {
  pub correct   : bool,
  pub expected  : Instruction,
  /// Set when the answer line could not be tokenized at all.
  pub malformed : Option<MalformedInputError>,
}

/// Judges one answer line against the expected instruction. Never fails: a malformed line is an
/// incorrect answer.
pub fn match_answer(expected: &Instruction, raw_line: &str) -> Verdict {
  match tokenize_answer(raw_line) {

    Ok(token) => {
      let opcode_ok  = opcode_matches(&token.opcode_name, expected.opcode);
      let operand_ok = operand_matches(token.operand.as_deref(), expected.operand.as_ref());
      debug!(
        offset  = expected.offset,
        opcode  = opcode_ok,
        operand = operand_ok,
        answer  = raw_line,
        "judged answer"
      );

      Verdict {
        correct   : opcode_ok && operand_ok,
        expected  : expected.clone(),
        malformed : None
      }
    }

    Err(error) => {
      debug!(offset = expected.offset, %error, "malformed answer");
      Verdict {
        correct   : false,
        expected  : expected.clone(),
        malformed : Some(error)
      }
    }

  }
}
