/*!
  The human readable textual form of an instruction is called assembly. This module parses the
  assembly a user types as an answer, one instruction per line:

    ```
    <answer>   ::= <opcode> ( <space>+ <operand> )?
    <opcode>   ::= [^<space>]+
    <operand>  ::= <bare> | "'" [^']* "'" | '"' [^"]* '"'
    <bare>     ::= [^<space>]+
    ```

  Whitespace around the whole line is ignored. Quoting is optional unless the operand contains
  whitespace, so `load_fast x` and `load_fast 'x'` both produce the operand `x`. The tokenizer does
  not know any opcodes; deciding whether the answer is right is the matcher's job.
*/

use nom::{
  bytes::complete::{take_till, take_till1},
  character::complete::char as one_char,
  sequence::delimited,
  IResult
};
use thiserror::Error;

/// One answer line split into its opcode name and its optional operand, quotes removed.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AnswerToken {
  pub opcode_name : String,
  pub operand     : Option<String>,
}

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum MalformedInputError {
  #[error("the answer is empty")]
  Empty,

  #[error("the quote at column {column} is never closed")]
  UnclosedQuote { column: usize },

  #[error("unexpected `{trailing}` after the closing quote")]
  TrailingAfterQuote { trailing: String },

  #[error("the operand `{operand}` contains whitespace, so it must be quoted")]
  UnquotedWhitespace { operand: String },
}

fn pword(text: &str) -> IResult<&str, &str> {
  take_till1(char::is_whitespace)(text)
}

fn pquoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
  delimited(one_char(quote), take_till(move |c| c == quote), one_char(quote))
}

/// Splits an answer line into an `AnswerToken`. Pure; fails only on malformed quoting.
pub fn tokenize_answer(line: &str) -> Result<AnswerToken, MalformedInputError> {
  let line = line.trim();

  let (rest, opcode_name) = pword(line).map_err(|_| MalformedInputError::Empty)?;
  // Whitespace-only operand text is no operand at all.
  let region = rest.trim_start();

  let operand =
    match region.chars().next() {

      None => None,

      Some(quote @ ('\'' | '"')) => {
        match pquoted(quote)(region) {
          Ok(("", text))      => Some(text),
          Ok((trailing, _))   => {
            return Err(MalformedInputError::TrailingAfterQuote {
              trailing: trailing.to_string()
            });
          }
          Err(_)              => {
            return Err(MalformedInputError::UnclosedQuote {
              column: line.len() - region.len() + 1
            });
          }
        }
      }

      Some(_) => {
        match pword(region) {
          Ok(("", word)) => Some(word),
          _              => {
            return Err(MalformedInputError::UnquotedWhitespace {
              operand: region.to_string()
            });
          }
        }
      }

    }; // end match on the first operand character

  Ok(AnswerToken {
    opcode_name : opcode_name.to_string(),
    operand     : operand.map(str::to_string),
  })
}
