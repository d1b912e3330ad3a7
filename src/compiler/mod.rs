/*!
  The compiler turns the source of a challenge, one `def` or `class`, into a `CodeObject` holding
  CPython 3.9 style wordcode. It exists so that the quiz has real bytecode to ask about without an
  interpreter at hand.
*/

mod code;
mod compile;
mod parser;
mod term;
mod variables;

use thiserror::Error;

pub use code::{CodeObject, Constant, UnitKind};
pub use compile::compile;

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum CompileError {
  #[error("line {line}: invalid syntax near `{near}`")]
  Syntax { line: u32, near: String },

  #[error("line {line}: expected an indented block")]
  ExpectedIndent { line: u32 },

  #[error("line {line}: unexpected indent")]
  UnexpectedIndent { line: u32 },

  #[error("line {line}: indentation must use spaces")]
  TabIndent { line: u32 },

  #[error("line {line}: `{keyword}` without a matching `if`")]
  DanglingElse { line: u32, keyword: &'static str },

  #[error("line {line}: `return` outside function")]
  ReturnOutsideFunction { line: u32 },

  #[error("expected exactly one top-level definition, found {found}")]
  ExpectedOneDefinition { found: usize },

  #[error("line {line}: expected `def` or `class`")]
  NotADefinition { line: u32 },

  #[error("the source is empty")]
  Empty,
}
