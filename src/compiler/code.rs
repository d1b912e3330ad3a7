use std::fmt::{Display, Formatter};

use string_cache::DefaultAtom;
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::symboltable::SymbolTable;

/// An entry of a code object's constant table.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Constant {
  None,
  Bool(bool),
  Integer(i64),
  Str(String),
  /// A nested code object, by index into `CodeObject::nested`.
  Code(usize),
}

impl Display for Constant {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Constant::None          => write!(f, "None"),
      Constant::Bool(true)    => write!(f, "True"),
      Constant::Bool(false)   => write!(f, "False"),
      Constant::Integer(value) => write!(f, "{}", value),
      Constant::Str(text)     => write!(f, "{:?}", text),
      Constant::Code(index)   => write!(f, "<code #{}>", index),
    }
  }
}

#[derive(StrumDisplay, IntoStaticStr, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum UnitKind {
  Function,
  Class,
}

/**
  The compilation artifact of one `def` or `class` body. Bodies of definitions nested inside it are
  separate code objects, owned by `nested` and referred to from the constant table.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CodeObject {
  pub name       : DefaultAtom,
  /// The dotted path of the definition, e.g. `outer.<locals>.inner` or `Point.norm`.
  pub qualname   : String,
  pub kind       : UnitKind,
  pub code       : Vec<u8>,
  pub consts     : SymbolTable<Constant>,
  /// Globals, attributes, and the variables of class bodies.
  pub names      : SymbolTable<DefaultAtom>,
  /// Parameters first, then the other locals of a function body.
  pub varnames   : SymbolTable<DefaultAtom>,
  pub nested     : Vec<CodeObject>,
  /// `(byte offset, source line)` for the first instruction of every line, in offset order.
  pub line_table : Vec<(u32, u32)>,
  pub first_line : u32,
  /// The source lines of the definition, starting at `first_line`.
  pub source     : Vec<String>,
}

impl CodeObject {
  /// The source line that starts at `offset`, if any.
  pub fn line_starting_at(&self, offset: u32) -> Option<u32> {
    self.line_table
        .iter()
        .find(|(start, _)| *start == offset)
        .map(|(_, line)| *line)
  }
}
