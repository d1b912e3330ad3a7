use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// Opcodes below this value do not take an argument.
pub const HAVE_ARGUMENT: u8 = 90;

/// The operators `compare_op` indexes with its argument.
pub const COMPARISON_OPERATORS: [&str; 6] = ["<", "<=", "==", "!=", ">", ">="];

/**
  Opcodes of the virtual machine.

  The numbering follows CPython 3.9 so that the disassembly a user learns here reads the same as
  the output of `dis` on that interpreter. The numeric value of an opcode is significant: every
  opcode at or above `HAVE_ARGUMENT` reads its argument byte. Textual forms are the lowercase,
  underscore separated names (`load_fast`).
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq, PartialEq,  Debug,    Hash
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Opcode {
  // Argumentless opcodes //
  PopTop              = 1,
  RotTwo              = 2,
  DupTop              = 4,
  Nop                 = 9,
  UnaryPositive       = 10,
  UnaryNegative       = 11,
  UnaryNot            = 12,
  UnaryInvert         = 15,
  BinaryPower         = 19,
  BinaryMultiply      = 20,
  BinaryModulo        = 22,
  BinaryAdd           = 23,
  BinarySubtract      = 24,
  BinarySubscr        = 25,
  BinaryFloorDivide   = 26,
  BinaryTrueDivide    = 27,
  InplaceFloorDivide  = 28,
  InplaceTrueDivide   = 29,
  InplaceAdd          = 55,
  InplaceSubtract     = 56,
  InplaceMultiply     = 57,
  InplaceModulo       = 59,
  StoreSubscr         = 60,
  BinaryLshift        = 62,
  BinaryRshift        = 63,
  BinaryAnd           = 64,
  BinaryXor           = 65,
  BinaryOr            = 66,
  InplacePower        = 67,
  GetIter             = 68,
  LoadBuildClass      = 71,
  InplaceLshift       = 75,
  InplaceRshift       = 76,
  InplaceAnd          = 77,
  InplaceXor          = 78,
  InplaceOr           = 79,
  ReturnValue         = 83,

  // Opcodes with an argument //
  StoreName           = 90,
  DeleteName          = 91,
  ForIter             = 93,
  StoreAttr           = 95,
  LoadConst           = 100,
  LoadName            = 101,
  BuildTuple          = 102,
  BuildList           = 103,
  LoadAttr            = 106,
  CompareOp           = 107,
  JumpForward         = 110,
  JumpAbsolute        = 113,
  PopJumpIfFalse      = 114,
  PopJumpIfTrue       = 115,
  LoadGlobal          = 116,
  IsOp                = 117,
  ContainsOp          = 118,
  LoadFast            = 124,
  StoreFast           = 125,
  DeleteFast          = 126,
  CallFunction        = 131,
  MakeFunction        = 132,
  ExtendedArg         = 144,
  LoadMethod          = 160,
  CallMethod          = 161,
}

/// Describes how the argument of an opcode resolves to an operand.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ArgumentKind {
  /// The opcode takes no argument.
  Nothing,
  /// An index into the constant table.
  Constant,
  /// An index into the name table.
  Name,
  /// An index into the local variable table.
  Local,
  /// An index into `COMPARISON_OPERATORS`.
  Comparison,
  /// A byte distance from the end of this instruction.
  RelativeJump,
  /// A byte offset from the start of the code.
  AbsoluteJump,
  /// The argument is the operand: counts, flags.
  Raw,
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn has_argument(&self) -> bool {
    self.code() >= HAVE_ARGUMENT
  }

  /// The canonical textual form, e.g. `load_fast`.
  pub fn name(&self) -> &'static str {
    self.into()
  }

  pub fn argument_kind(&self) -> ArgumentKind {
    use Opcode::*;

    match self {
      LoadConst                                       => ArgumentKind::Constant,
      | StoreName | DeleteName | LoadName
      | StoreAttr | LoadAttr   | LoadGlobal
      | LoadMethod                                    => ArgumentKind::Name,
      LoadFast | StoreFast | DeleteFast               => ArgumentKind::Local,
      CompareOp                                       => ArgumentKind::Comparison,
      JumpForward | ForIter                           => ArgumentKind::RelativeJump,
      JumpAbsolute | PopJumpIfFalse | PopJumpIfTrue   => ArgumentKind::AbsoluteJump,
      opcode if opcode.has_argument()                 => ArgumentKind::Raw,
      _                                               => ArgumentKind::Nothing
    }
  }
}

/// The resolved value of an instruction's argument.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Operand {
  Integer(i64),
  /// Names, string constants, comparison operators and the spelling of non-integer constants.
  Text(String),
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Integer(value) => write!(f, "{}", value),
      Operand::Text(text)     => write!(f, "{}", text),
    }
  }
}

impl From<i64> for Operand {
  fn from(value: i64) -> Self {
    Operand::Integer(value)
  }
}

impl From<&str> for Operand {
  fn from(text: &str) -> Self {
    Operand::Text(text.to_string())
  }
}

/**
  One instruction of a disassembled code object. `offset` is the byte offset of the instruction
  within its code and is strictly increasing along a stream. `line` is set on the first
  instruction generated for a source line.
*/
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Instruction {
  pub offset  : u32,
  pub opcode  : Opcode,
  pub operand : Option<Operand>,
  pub line    : Option<u32>,
}

impl Instruction {
  pub fn new(offset: u32, opcode: Opcode, operand: Option<Operand>) -> Instruction {
    Instruction { offset, opcode, operand, line: None }
  }

  pub fn opcode_name(&self) -> &'static str {
    self.opcode.name()
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match &self.operand {
      Some(operand) => write!(f, "{}: {} {}", self.offset, self.opcode, operand),
      None          => write!(f, "{}: {}", self.offset, self.opcode),
    }
  }
}
