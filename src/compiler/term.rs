//! The abstract syntax tree type for challenge source code.

use string_cache::DefaultAtom;

use crate::bytecode::Opcode;
use super::code::Constant;

pub type Name = DefaultAtom;

/// Abstract Syntax Representation of an expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
  /// Integer and string literals, `None`, `True` and `False`. Never `Constant::Code`.
  Constant(Constant),
  Name(Name),
  Attribute {
    value : Box<Expr>,
    attr  : Name
  },
  Subscript {
    value : Box<Expr>,
    index : Box<Expr>
  },
  Call {
    func : Box<Expr>,
    args : Vec<Expr>
  },
  Unary {
    op      : UnaryOp,
    operand : Box<Expr>
  },
  Binary {
    op    : BinaryOp,
    left  : Box<Expr>,
    right : Box<Expr>
  },
  /// Comparisons do not chain: `a < b < c` is a syntax error.
  Compare {
    op    : CompareOp,
    left  : Box<Expr>,
    right : Box<Expr>
  },
  Tuple(Vec<Expr>),
  List(Vec<Expr>),
}

impl Expr {
  pub fn integer(value: i64) -> Expr {
    Expr::Constant(Constant::Integer(value))
  }

  pub fn name(name: &str) -> Expr {
    Expr::Name(Name::from(name))
  }

  pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary { op, operand: Box::new(operand) }
  }

  pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
  }

  pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    Expr::Compare { op, left: Box::new(left), right: Box::new(right) }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
  Negative,
  Positive,
  Invert,
  Not,
}

impl UnaryOp {
  pub fn opcode(&self) -> Opcode {
    match self {
      UnaryOp::Negative => Opcode::UnaryNegative,
      UnaryOp::Positive => Opcode::UnaryPositive,
      UnaryOp::Invert   => Opcode::UnaryInvert,
      UnaryOp::Not      => Opcode::UnaryNot,
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
  Power,
  Multiply,
  TrueDivide,
  FloorDivide,
  Modulo,
  Add,
  Subtract,
  Lshift,
  Rshift,
  And,
  Xor,
  Or,
}

impl BinaryOp {
  pub fn opcode(&self) -> Opcode {
    match self {
      BinaryOp::Power       => Opcode::BinaryPower,
      BinaryOp::Multiply    => Opcode::BinaryMultiply,
      BinaryOp::TrueDivide  => Opcode::BinaryTrueDivide,
      BinaryOp::FloorDivide => Opcode::BinaryFloorDivide,
      BinaryOp::Modulo      => Opcode::BinaryModulo,
      BinaryOp::Add         => Opcode::BinaryAdd,
      BinaryOp::Subtract    => Opcode::BinarySubtract,
      BinaryOp::Lshift      => Opcode::BinaryLshift,
      BinaryOp::Rshift      => Opcode::BinaryRshift,
      BinaryOp::And         => Opcode::BinaryAnd,
      BinaryOp::Xor         => Opcode::BinaryXor,
      BinaryOp::Or          => Opcode::BinaryOr,
    }
  }

  /// The opcode of the augmented assignment form, `x op= y`.
  pub fn inplace_opcode(&self) -> Opcode {
    match self {
      BinaryOp::Power       => Opcode::InplacePower,
      BinaryOp::Multiply    => Opcode::InplaceMultiply,
      BinaryOp::TrueDivide  => Opcode::InplaceTrueDivide,
      BinaryOp::FloorDivide => Opcode::InplaceFloorDivide,
      BinaryOp::Modulo      => Opcode::InplaceModulo,
      BinaryOp::Add         => Opcode::InplaceAdd,
      BinaryOp::Subtract    => Opcode::InplaceSubtract,
      BinaryOp::Lshift      => Opcode::InplaceLshift,
      BinaryOp::Rshift      => Opcode::InplaceRshift,
      BinaryOp::And         => Opcode::InplaceAnd,
      BinaryOp::Xor         => Opcode::InplaceXor,
      BinaryOp::Or          => Opcode::InplaceOr,
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
  Less,
  LessEqual,
  Equal,
  NotEqual,
  Greater,
  GreaterEqual,
  Is,
  IsNot,
  In,
  NotIn,
}

impl CompareOp {
  /// The opcode and argument that implement the comparison.
  pub fn instruction(&self) -> (Opcode, u32) {
    match self {
      CompareOp::Less         => (Opcode::CompareOp, 0),
      CompareOp::LessEqual    => (Opcode::CompareOp, 1),
      CompareOp::Equal        => (Opcode::CompareOp, 2),
      CompareOp::NotEqual     => (Opcode::CompareOp, 3),
      CompareOp::Greater      => (Opcode::CompareOp, 4),
      CompareOp::GreaterEqual => (Opcode::CompareOp, 5),
      CompareOp::Is           => (Opcode::IsOp, 0),
      CompareOp::IsNot        => (Opcode::IsOp, 1),
      CompareOp::In           => (Opcode::ContainsOp, 0),
      CompareOp::NotIn        => (Opcode::ContainsOp, 1),
    }
  }
}

/// The left hand side of a plain assignment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Target {
  Name(Name),
  Attribute {
    value : Expr,
    attr  : Name
  },
  Subscript {
    value : Expr,
    index : Expr
  },
}

/// A `def` or `class` together with the source lines it spans.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Definition {
  pub name       : Name,
  /// Always empty for classes.
  pub params     : Vec<Name>,
  pub body       : Vec<Stmt>,
  pub first_line : u32,
  pub last_line  : u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stmt {
  pub line : u32,
  pub kind : StmtKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StmtKind {
  Expr(Expr),
  Assign {
    target : Target,
    value  : Expr
  },
  AugAssign {
    name  : Name,
    op    : BinaryOp,
    value : Expr
  },
  Return(Option<Expr>),
  Pass,
  Delete(Name),
  /// `elif` chains are nested `If`s in `orelse`.
  If {
    test   : Expr,
    body   : Vec<Stmt>,
    orelse : Vec<Stmt>
  },
  While {
    test : Expr,
    body : Vec<Stmt>
  },
  For {
    target : Name,
    iter   : Expr,
    body   : Vec<Stmt>
  },
  FunctionDef(Definition),
  ClassDef(Definition),
}

impl Stmt {
  pub fn is_return(&self) -> bool {
    matches!(self.kind, StmtKind::Return(_))
  }
}
