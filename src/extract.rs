/*!
  Disassembly. Decodes the wordcode of a `CodeObject` into the stream of `Instruction`s the quiz
  asks about, resolving every argument to the operand `dis` would show, and builds the tree of
  `CompiledUnit`s for the definitions nested inside it.
*/

use thiserror::Error;
use tracing::debug;

use crate::bytecode::{try_decode_instructions, ArgumentKind, DecodeError, Instruction, Opcode,
                      Operand, RawInstruction, COMPARISON_OPERATORS};
use crate::compiler::{compile, CodeObject, CompileError, Constant, UnitKind};
use crate::registry::QuizUnit;

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ExtractionError {
  #[error("`{qualname}` has no executable body")]
  EmptyBody { qualname: String },

  #[error(transparent)]
  Decode(#[from] DecodeError),

  #[error("{opcode} at offset {offset} refers to missing table entry {index}")]
  MissingArgument { opcode: Opcode, offset: usize, index: u32 },

  #[error(transparent)]
  Compile(#[from] CompileError),
}

/// A disassembled definition together with the disassembled definitions nested inside it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompiledUnit {
  pub name         : String,
  pub qualname     : String,
  pub kind         : UnitKind,
  pub first_line   : u32,
  pub source       : Vec<String>,
  pub instructions : Vec<Instruction>,
  /// In source order.
  pub children     : Vec<CompiledUnit>,
}

impl CompiledUnit {
  /// The number of instructions in this unit and all of its descendants.
  pub fn total_instructions(&self) -> usize {
    self.instructions.len()
      + self.children.iter().map(CompiledUnit::total_instructions).sum::<usize>()
  }
}

/// Compiles the unit's source and disassembles the result.
pub fn extract_unit(unit: &QuizUnit) -> Result<CompiledUnit, ExtractionError> {
  let code = compile(&unit.source)?;
  extract(&code)
}

pub fn extract(code: &CodeObject) -> Result<CompiledUnit, ExtractionError> {
  if code.code.is_empty() {
    return Err(ExtractionError::EmptyBody { qualname: code.qualname.clone() });
  }

  let instructions =
    try_decode_instructions(&code.code)?
      .iter()
      .map(|raw| {
        Ok(Instruction {
          offset  : raw.offset as u32,
          opcode  : raw.opcode,
          operand : resolve_operand(code, raw)?,
          line    : code.line_starting_at(raw.offset as u32),
        })
      })
      .collect::<Result<Vec<Instruction>, ExtractionError>>()?;

  let mut children = code.nested.iter().map(extract).collect::<Result<Vec<_>, _>>()?;
  children.sort_by_key(|child| child.first_line);

  debug!(
    qualname     = code.qualname.as_str(),
    instructions = instructions.len(),
    children     = children.len(),
    "extracted"
  );

  Ok(CompiledUnit {
    name       : code.name.to_string(),
    qualname   : code.qualname.clone(),
    kind       : code.kind,
    first_line : code.first_line,
    source     : code.source.clone(),
    instructions,
    children,
  })
}

fn resolve_operand(code: &CodeObject, raw: &RawInstruction)
  -> Result<Option<Operand>, ExtractionError>
{
  let missing = || ExtractionError::MissingArgument {
    opcode : raw.opcode,
    offset : raw.offset,
    index  : raw.argument
  };

  let operand =
    match raw.opcode.argument_kind() {

      ArgumentKind::Nothing => return Ok(None),

      ArgumentKind::Constant => {
        match code.consts.get(raw.argument).ok_or_else(missing)? {
          Constant::Integer(value) => Operand::Integer(*value),
          Constant::Str(text)      => Operand::Text(text.clone()),
          Constant::Code(index)    => {
            let nested = code.nested.get(*index).ok_or_else(missing)?;
            Operand::Text(format!("<code:{}>", nested.name))
          }
          // `None`, `True` and `False` are asked for by name.
          other => Operand::Text(other.to_string()),
        }
      }

      ArgumentKind::Name => {
        let name = code.names.get(raw.argument).ok_or_else(missing)?;
        Operand::Text(name.to_string())
      }

      ArgumentKind::Local => {
        let name = code.varnames.get(raw.argument).ok_or_else(missing)?;
        Operand::Text(name.to_string())
      }

      ArgumentKind::Comparison => {
        let symbol = COMPARISON_OPERATORS.get(raw.argument as usize).ok_or_else(missing)?;
        Operand::from(*symbol)
      }

      ArgumentKind::RelativeJump => {
        Operand::Integer(raw.next_offset() as i64 + raw.argument as i64)
      }

      ArgumentKind::AbsoluteJump | ArgumentKind::Raw => Operand::Integer(raw.argument as i64),

    };

  Ok(Some(operand))
}
