/*!

  The compiler emits "wordcode": every instruction is exactly two bytes, an opcode byte followed
  by an argument byte. Opcodes numbered below `HAVE_ARGUMENT` ignore their argument byte. Arguments
  wider than a byte are spelled with one or more `extended_arg` prefixes, each of which contributes
  the next most significant byte of the argument of the instruction that follows it.

    Opcode:    8 bits
    Argument:  8 bits (prefix-extended to 32)

  Arguments of most opcodes are not values but indices into a table that belongs to the code
  object: the constant table, the name table (globals, attributes, class body names) or the
  local variable table. Jumps carry byte offsets, either absolute or relative to the next
  instruction. The quiz never shows the raw argument. Like `dis`, it resolves the argument to the
  value it stands for, and that resolved value is the `Operand` of an `Instruction`.

  The human readable textual form of an instruction is `offset: opcode operand`, and the answer
  lines users type are parsed by the `assembly` module.

*/

mod assembly;
mod binary;
mod instruction;

pub use assembly::{tokenize_answer, MalformedInputError};
pub use binary::{encode_instruction, encoded_size, try_decode_instructions, DecodeError,
                 RawInstruction, INSTRUCTION_SIZE};
pub use instruction::{ArgumentKind, Instruction, Opcode, Operand, COMPARISON_OPERATORS};
