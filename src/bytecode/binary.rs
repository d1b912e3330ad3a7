/*!
  This module is responsible for the encoding and decoding of wordcode.
*/
use std::convert::TryFrom;

use thiserror::Error;

use super::Opcode;

/// Every instruction, `extended_arg` prefixes included, occupies this many bytes.
pub const INSTRUCTION_SIZE: usize = 2;

/// An instruction as it appears in wordcode, before its argument is resolved to an operand.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct RawInstruction {
  pub offset   : usize,
  pub opcode   : Opcode,
  /// The full argument, with the bytes of any preceding `extended_arg` prefixes folded in.
  pub argument : u32,
}

impl RawInstruction {
  /// The offset of the instruction that follows this one.
  pub fn next_offset(&self) -> usize {
    self.offset + INSTRUCTION_SIZE
  }
}

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum DecodeError {
  #[error("code ends in the middle of the instruction at offset {offset}")]
  Truncated { offset: usize },

  #[error("unknown opcode {byte} at offset {offset}")]
  UnknownOpcode { offset: usize, byte: u8 },
}

/// Returns the size in bytes of an instruction with the given argument, prefixes included.
pub fn encoded_size(argument: u32) -> usize {
  let prefixes = match argument {
    0..=0xFF         => 0,
    0x100..=0xFFFF   => 1,
    0x1_0000..=0xFF_FFFF => 2,
    _                => 3
  };
  (prefixes + 1) * INSTRUCTION_SIZE
}

/**
  Encodes the instruction into wordcode, emitting as many `extended_arg` prefixes as the
  argument needs. Argumentless opcodes are written with a zero argument byte.
*/
pub fn encode_instruction(opcode: Opcode, argument: u32) -> Vec<u8> {
  let argument = match opcode.has_argument() {
    true  => argument,
    false => 0
  };
  let size  = encoded_size(argument);
  let mut code = Vec::with_capacity(size);

  for prefix in (1..size / INSTRUCTION_SIZE).rev() {
    code.push(Opcode::ExtendedArg.code());
    code.push((argument >> (8 * prefix)) as u8);
  }
  code.push(opcode.code());
  code.push(argument as u8);
  code
}

/**
  Decodes a whole code string. `extended_arg` prefixes are kept as instructions of their own, as
  `dis` lists them, and their argument is the argument accumulated so far.
*/
pub fn try_decode_instructions(code: &[u8]) -> Result<Vec<RawInstruction>, DecodeError> {
  let mut instructions = Vec::with_capacity(code.len() / INSTRUCTION_SIZE);
  let mut extended: u32 = 0;

  for (index, word) in code.chunks(INSTRUCTION_SIZE).enumerate() {
    let offset = index * INSTRUCTION_SIZE;
    if word.len() != INSTRUCTION_SIZE {
      return Err(DecodeError::Truncated { offset });
    }

    let opcode = Opcode::try_from(word[0])
      .map_err(|_| DecodeError::UnknownOpcode { offset, byte: word[0] })?;

    let argument = match opcode.has_argument() {
      true  => extended | word[1] as u32,
      false => 0
    };
    extended = match opcode {
      Opcode::ExtendedArg => argument << 8,
      _                   => 0
    };

    instructions.push(RawInstruction { offset, opcode, argument });
  }

  Ok(instructions)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn small_arguments_take_one_word() {
    assert_eq!(encode_instruction(Opcode::LoadFast, 3), vec![124, 3]);
    assert_eq!(encode_instruction(Opcode::ReturnValue, 7), vec![83, 0]);
    assert_eq!(encoded_size(255), 2);
  }

  #[test]
  fn wide_arguments_are_prefixed() {
    let code = encode_instruction(Opcode::LoadConst, 0x1_02_03);
    assert_eq!(code, vec![144, 0x01, 144, 0x02, 100, 0x03]);
    assert_eq!(encoded_size(0x1_02_03), 6);

    let decoded = try_decode_instructions(&code).unwrap();
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[0].argument, 0x01);
    assert_eq!(decoded[1].argument, 0x01_02);
    assert_eq!(decoded[2].opcode, Opcode::LoadConst);
    assert_eq!(decoded[2].argument, 0x1_02_03);
    assert_eq!(decoded[2].offset, 4);
  }

  #[test]
  fn odd_length_is_truncated() {
    assert_eq!(
      try_decode_instructions(&[100, 0, 83]),
      Err(DecodeError::Truncated { offset: 2 })
    );
  }

  #[test]
  fn unknown_opcode_is_reported() {
    assert_eq!(
      try_decode_instructions(&[100, 0, 3, 0]),
      Err(DecodeError::UnknownOpcode { offset: 2, byte: 3 })
    );
  }
}
