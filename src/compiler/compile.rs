/*!
  Functions to produce a compilation artifact from source code input.

  The compilation pipeline is this:
  ```
  text -> [`parser::parse`] -> `Stmt`s -> [`CodeBuilder`] -> `Emitted` instructions ->⋯

  ⋯-> [`CodeBuilder::assemble`] -> wordcode + line table -> `CodeObject`
  ```
  Every `def` and `class` body gets a `CodeBuilder` of its own. The code objects of nested
  definitions are built first and stored in the constant table of the enclosing one, exactly as
  `make_function` expects to find them.
*/

use tracing::trace;

use crate::bytecode::{encode_instruction, encoded_size, ArgumentKind, Opcode, INSTRUCTION_SIZE};
use crate::symboltable::SymbolTable;
use super::code::{CodeObject, Constant, UnitKind};
use super::parser::parse;
use super::term::*;
use super::variables::collect_locals;
use super::CompileError;

/// A jump target, bound to an instruction index once the code after it is emitted.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
struct Label(usize);

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum Argument {
  Value(u32),
  Target(Label),
}

/// An instruction whose jump targets are still labels.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
struct Emitted {
  opcode   : Opcode,
  argument : Argument,
  line     : u32,
}

struct CodeBuilder<'s> {
  /// The whole source, for slicing out the lines of each definition.
  lines    : &'s [&'s str],
  kind     : UnitKind,
  qualname : String,
  consts   : SymbolTable<Constant>,
  names    : SymbolTable<Name>,
  /// Function bodies only. Class bodies resolve every name through `names`.
  varnames : Option<SymbolTable<Name>>,
  nested   : Vec<CodeObject>,
  emitted  : Vec<Emitted>,
  labels   : Vec<Option<usize>>,
  line     : u32,
}

/**
  Compiles source holding exactly one top-level `def` or `class` to the code object of that
  definition.
*/
pub fn compile(source: &str) -> Result<CodeObject, CompileError> {
  let stmts = parse(source)?;
  if stmts.len() != 1 {
    return Err(CompileError::ExpectedOneDefinition { found: stmts.len() });
  }

  let lines: Vec<&str> = source.lines().collect();
  match &stmts[0].kind {
    StmtKind::FunctionDef(definition) => {
      compile_definition(&lines, definition, UnitKind::Function, definition.name.to_string())
    }
    StmtKind::ClassDef(definition) => {
      compile_definition(&lines, definition, UnitKind::Class, definition.name.to_string())
    }
    _ => Err(CompileError::NotADefinition { line: stmts[0].line })
  }
}

fn compile_definition(
  lines      : &[&str],
  definition : &Definition,
  kind       : UnitKind,
  qualname   : String,
) -> Result<CodeObject, CompileError>
{
  let varnames = match kind {
    UnitKind::Function => Some(collect_locals(&definition.params, &definition.body)),
    UnitKind::Class    => None,
  };

  let mut builder = CodeBuilder {
    lines,
    kind,
    qualname,
    consts  : SymbolTable::new(),
    names   : SymbolTable::new(),
    varnames,
    nested  : Vec::new(),
    emitted : Vec::new(),
    labels  : Vec::new(),
    line    : definition.first_line,
  };

  if kind == UnitKind::Class {
    builder.emit_name_load(&Name::from("__name__"));
    builder.emit_name_store(&Name::from("__module__"));
    builder.emit_const(Constant::Str(builder.qualname.clone()));
    builder.emit_name_store(&Name::from("__qualname__"));
  }

  builder.compile_body(&definition.body)?;
  if !definition.body.last().map_or(false, Stmt::is_return) {
    builder.emit_const(Constant::None);
    builder.emit(Opcode::ReturnValue, 0);
  }

  builder.thread_jumps();
  let (code, line_table) = builder.assemble();
  let first = definition.first_line as usize;
  let last  = definition.last_line as usize;
  let source = match lines.get(first.saturating_sub(1)..last.min(lines.len())) {
    Some(slice) => slice.iter().map(|line| line.to_string()).collect(),
    None        => Vec::new()
  };

  trace!(qualname = builder.qualname.as_str(), bytes = code.len(), "compiled");

  Ok(CodeObject {
    name       : definition.name.clone(),
    qualname   : builder.qualname,
    kind,
    code,
    consts     : builder.consts,
    names      : builder.names,
    varnames   : builder.varnames.unwrap_or_default(),
    nested     : builder.nested,
    line_table,
    first_line : definition.first_line,
    source,
  })
}

impl<'s> CodeBuilder<'s> {

  // region Emission

  fn emit(&mut self, opcode: Opcode, argument: u32) {
    self.emitted.push(Emitted { opcode, argument: Argument::Value(argument), line: self.line });
  }

  fn emit_jump(&mut self, opcode: Opcode, target: Label) {
    self.emitted.push(Emitted { opcode, argument: Argument::Target(target), line: self.line });
  }

  fn emit_const(&mut self, constant: Constant) {
    let index = self.consts.intern(constant);
    self.emit(Opcode::LoadConst, index);
  }

  fn new_label(&mut self) -> Label {
    self.labels.push(None);
    Label(self.labels.len() - 1)
  }

  /// Binds `label` to the next instruction emitted.
  fn bind(&mut self, label: Label) {
    self.labels[label.0] = Some(self.emitted.len());
  }

  fn local_index(&self, name: &Name) -> Option<u32> {
    self.varnames.as_ref().and_then(|varnames| varnames.index_of(name))
  }

  fn emit_name_load(&mut self, name: &Name) {
    match (self.kind, self.local_index(name)) {
      (UnitKind::Class, _)     => {
        let index = self.names.intern(name.clone());
        self.emit(Opcode::LoadName, index);
      }
      (_, Some(index))         => self.emit(Opcode::LoadFast, index),
      (_, None)                => {
        let index = self.names.intern(name.clone());
        self.emit(Opcode::LoadGlobal, index);
      }
    }
  }

  // A function stores only to names `collect_locals` found, so a store is always `store_fast`
  // there.
  fn emit_name_store(&mut self, name: &Name) {
    match self.local_index(name) {
      Some(index) => self.emit(Opcode::StoreFast, index),
      None        => {
        let index = self.names.intern(name.clone());
        self.emit(Opcode::StoreName, index);
      }
    }
  }

  fn emit_name_delete(&mut self, name: &Name) {
    match self.local_index(name) {
      Some(index) => self.emit(Opcode::DeleteFast, index),
      None        => {
        let index = self.names.intern(name.clone());
        self.emit(Opcode::DeleteName, index);
      }
    }
  }

  // endregion

  // region Statements

  fn compile_body(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
    for stmt in body {
      self.compile_statement(stmt)?;
    }
    Ok(())
  }

  fn compile_statement(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
    self.line = stmt.line;

    match &stmt.kind {

      StmtKind::Expr(expr) => {
        self.compile_expr(expr);
        self.emit(Opcode::PopTop, 0);
      }

      StmtKind::Assign { target, value } => {
        self.compile_expr(value);
        match target {
          Target::Name(name) => self.emit_name_store(name),
          Target::Attribute { value, attr } => {
            self.compile_expr(value);
            let index = self.names.intern(attr.clone());
            self.emit(Opcode::StoreAttr, index);
          }
          Target::Subscript { value, index } => {
            self.compile_expr(value);
            self.compile_expr(index);
            self.emit(Opcode::StoreSubscr, 0);
          }
        }
      }

      StmtKind::AugAssign { name, op, value } => {
        self.emit_name_load(name);
        self.compile_expr(value);
        self.emit(op.inplace_opcode(), 0);
        self.emit_name_store(name);
      }

      StmtKind::Return(value) => {
        if self.kind == UnitKind::Class {
          return Err(CompileError::ReturnOutsideFunction { line: stmt.line });
        }
        match value {
          Some(expr) => self.compile_expr(expr),
          None       => self.emit_const(Constant::None),
        }
        self.emit(Opcode::ReturnValue, 0);
      }

      StmtKind::Pass => {}

      StmtKind::Delete(name) => self.emit_name_delete(name),

      StmtKind::If { test, body, orelse } => {
        let orelse_label = self.new_label();
        self.compile_jump_if_false(test, orelse_label);
        self.compile_body(body)?;

        match orelse.is_empty() {
          true  => self.bind(orelse_label),
          false => {
            let end = self.new_label();
            if !body.last().map_or(false, Stmt::is_return) {
              self.emit_jump(Opcode::JumpForward, end);
            }
            self.bind(orelse_label);
            self.compile_body(orelse)?;
            self.bind(end);
          }
        }
      }

      StmtKind::While { test, body } => {
        let top = self.new_label();
        let end = self.new_label();
        self.bind(top);
        self.compile_jump_if_false(test, end);
        self.compile_body(body)?;
        self.emit_jump(Opcode::JumpAbsolute, top);
        self.bind(end);
      }

      StmtKind::For { target, iter, body } => {
        let top = self.new_label();
        let end = self.new_label();
        self.compile_expr(iter);
        self.emit(Opcode::GetIter, 0);
        self.bind(top);
        self.emit_jump(Opcode::ForIter, end);
        self.emit_name_store(target);
        self.compile_body(body)?;
        self.emit_jump(Opcode::JumpAbsolute, top);
        self.bind(end);
      }

      StmtKind::FunctionDef(definition) => {
        let qualname = self.nested_qualname(&definition.name);
        let code = compile_definition(self.lines, definition, UnitKind::Function, qualname.clone())?;
        self.nested.push(code);
        self.emit_const(Constant::Code(self.nested.len() - 1));
        self.emit_const(Constant::Str(qualname));
        self.emit(Opcode::MakeFunction, 0);
        self.emit_name_store(&definition.name);
      }

      StmtKind::ClassDef(definition) => {
        let qualname = self.nested_qualname(&definition.name);
        let code = compile_definition(self.lines, definition, UnitKind::Class, qualname)?;
        self.nested.push(code);
        self.emit(Opcode::LoadBuildClass, 0);
        self.emit_const(Constant::Code(self.nested.len() - 1));
        self.emit_const(Constant::Str(definition.name.to_string()));
        self.emit(Opcode::MakeFunction, 0);
        self.emit_const(Constant::Str(definition.name.to_string()));
        self.emit(Opcode::CallFunction, 2);
        self.emit_name_store(&definition.name);
      }

    } // end match on statement kind

    Ok(())
  }

  /// `outer.<locals>.inner` inside a function, `Outer.inner` inside a class.
  fn nested_qualname(&self, name: &Name) -> String {
    match self.kind {
      UnitKind::Function => format!("{}.<locals>.{}", self.qualname, name),
      UnitKind::Class    => format!("{}.{}", self.qualname, name),
    }
  }

  /// Jumps to `target` when `test` is false. `not` is compiled into the jump.
  fn compile_jump_if_false(&mut self, test: &Expr, target: Label) {
    match test {
      Expr::Unary { op: UnaryOp::Not, operand } => {
        self.compile_expr(operand);
        self.emit_jump(Opcode::PopJumpIfTrue, target);
      }
      _ => {
        self.compile_expr(test);
        self.emit_jump(Opcode::PopJumpIfFalse, target);
      }
    }
  }

  // endregion

  // region Expressions

  fn compile_expr(&mut self, expr: &Expr) {
    if let Some(value) = fold(expr) {
      self.emit_const(Constant::Integer(value));
      return;
    }

    match expr {

      Expr::Constant(constant) => self.emit_const(constant.clone()),

      Expr::Name(name) => self.emit_name_load(name),

      Expr::Attribute { value, attr } => {
        self.compile_expr(value);
        let index = self.names.intern(attr.clone());
        self.emit(Opcode::LoadAttr, index);
      }

      Expr::Subscript { value, index } => {
        self.compile_expr(value);
        self.compile_expr(index);
        self.emit(Opcode::BinarySubscr, 0);
      }

      Expr::Call { func, args } => {
        match func.as_ref() {
          Expr::Attribute { value, attr } => {
            self.compile_expr(value);
            let index = self.names.intern(attr.clone());
            self.emit(Opcode::LoadMethod, index);
            self.compile_exprs(args);
            self.emit(Opcode::CallMethod, args.len() as u32);
          }
          _ => {
            self.compile_expr(func);
            self.compile_exprs(args);
            self.emit(Opcode::CallFunction, args.len() as u32);
          }
        }
      }

      Expr::Unary { op, operand } => {
        self.compile_expr(operand);
        self.emit(op.opcode(), 0);
      }

      Expr::Binary { op, left, right } => {
        self.compile_expr(left);
        self.compile_expr(right);
        self.emit(op.opcode(), 0);
      }

      Expr::Compare { op, left, right } => {
        self.compile_expr(left);
        self.compile_expr(right);
        let (opcode, argument) = op.instruction();
        self.emit(opcode, argument);
      }

      Expr::Tuple(items) => {
        self.compile_exprs(items);
        self.emit(Opcode::BuildTuple, items.len() as u32);
      }

      Expr::List(items) => {
        self.compile_exprs(items);
        self.emit(Opcode::BuildList, items.len() as u32);
      }

    } // end match on expression
  }

  fn compile_exprs(&mut self, exprs: &[Expr]) {
    for expr in exprs {
      self.compile_expr(expr);
    }
  }

  // endregion

  // region Assembly

  /// The unconditional jump `label` lands on, as `(index, its own target)`.
  fn unconditional_jump_at(&self, label: Label) -> Option<(usize, Label)> {
    let index = self.labels[label.0]?;
    let emitted = self.emitted.get(index)?;
    match (emitted.opcode, emitted.argument) {
      (Opcode::JumpAbsolute | Opcode::JumpForward, Argument::Target(target)) => Some((index, target)),
      _ => None
    }
  }

  /**
    Redirects a jump that lands on an unconditional jump to where that jump goes, in one hop per
    jump and in code order. A redirected `jump_forward` becomes a `jump_absolute`; other relative
    jumps are only redirected forward.
  */
  fn thread_jumps(&mut self) {
    for index in 0..self.emitted.len() {
      let label = match self.emitted[index].argument {
        Argument::Target(label) => label,
        Argument::Value(_)      => continue,
      };
      let (landing, target) = match self.unconditional_jump_at(label) {
        Some(found) => found,
        None        => continue,
      };
      if landing == index {
        continue;
      }

      let opcode = self.emitted[index].opcode;
      let opcode = match opcode.argument_kind() {
        _ if opcode == Opcode::JumpForward => Opcode::JumpAbsolute,
        ArgumentKind::RelativeJump => {
          match self.labels[target.0] {
            Some(destination) if destination > index => opcode,
            _ => continue,
          }
        }
        _ => opcode
      };

      trace!(index, ?opcode, "threaded jump");
      self.emitted[index].opcode   = opcode;
      self.emitted[index].argument = Argument::Target(target);
    }
  }

  /// The jump argument of `emitted[index]`, or its plain argument, given instruction offsets.
  fn resolve(&self, index: usize, offsets: &[usize]) -> u32 {
    let emitted = &self.emitted[index];
    match emitted.argument {
      Argument::Value(value) => value,
      Argument::Target(label) => {
        // Every label is bound before assembly.
        let target = offsets[self.labels[label.0].unwrap_or(self.emitted.len())];
        match emitted.opcode.argument_kind() {
          ArgumentKind::RelativeJump => target.saturating_sub(offsets[index + 1]) as u32,
          _                          => target as u32,
        }
      }
    }
  }

  /**
    Lays the instructions out in wordcode. Jump arguments depend on offsets and offsets depend on
    how many `extended_arg` prefixes each argument needs, so sizes are recomputed until nothing
    changes. Sizes never shrink, which guarantees termination; an instruction left larger than its
    argument needs is padded with `extended_arg 0` prefixes.

    Returns the code and its line table.
  */
  fn assemble(&self) -> (Vec<u8>, Vec<(u32, u32)>) {
    let mut sizes: Vec<usize> =
      self.emitted
          .iter()
          .map(|emitted| match emitted.argument {
            Argument::Value(value) => encoded_size(value),
            Argument::Target(_)    => INSTRUCTION_SIZE,
          })
          .collect();

    loop {
      let offsets   = offsets_of(&sizes);
      let arguments : Vec<u32> = (0..self.emitted.len()).map(|i| self.resolve(i, &offsets)).collect();
      let resized   : Vec<usize> =
        arguments.iter()
                 .zip(sizes.iter())
                 .map(|(argument, size)| encoded_size(*argument).max(*size))
                 .collect();

      if resized != sizes {
        sizes = resized;
        continue;
      }

      let mut code       = Vec::with_capacity(offsets[self.emitted.len()]);
      let mut line_table = Vec::new();
      let mut last_line  = None;

      for (i, emitted) in self.emitted.iter().enumerate() {
        if last_line != Some(emitted.line) {
          line_table.push((offsets[i] as u32, emitted.line));
          last_line = Some(emitted.line);
        }

        let encoded = encode_instruction(emitted.opcode, arguments[i]);
        for _ in 0..(sizes[i] - encoded.len()) / INSTRUCTION_SIZE {
          code.push(Opcode::ExtendedArg.code());
          code.push(0);
        }
        code.extend(encoded);
      }

      return (code, line_table);
    }
  }

  // endregion
}

/// Prefix sums of `sizes`, one longer than `sizes`: the offset of every instruction and the end.
fn offsets_of(sizes: &[usize]) -> Vec<usize> {
  let mut offsets = Vec::with_capacity(sizes.len() + 1);
  let mut offset = 0;
  offsets.push(offset);
  for size in sizes {
    offset += size;
    offsets.push(offset);
  }
  offsets
}

// region Constant folding

/// The value of an integer expression that can be computed at compile time, if any.
fn fold(expr: &Expr) -> Option<i64> {
  match expr {
    Expr::Constant(Constant::Integer(value)) => Some(*value),
    Expr::Unary { op, operand } => {
      let value = fold(operand)?;
      match op {
        UnaryOp::Negative => value.checked_neg(),
        UnaryOp::Positive => Some(value),
        UnaryOp::Invert   => Some(!value),
        UnaryOp::Not      => None,
      }
    }
    Expr::Binary { op, left, right } => fold_binary(*op, fold(left)?, fold(right)?),
    _ => None
  }
}

/// Integer arithmetic with the rounding of floor division. `None` for results that are not
/// exact 64 bit integers.
fn fold_binary(op: BinaryOp, left: i64, right: i64) -> Option<i64> {
  match op {
    BinaryOp::Add      => left.checked_add(right),
    BinaryOp::Subtract => left.checked_sub(right),
    BinaryOp::Multiply => left.checked_mul(right),

    BinaryOp::FloorDivide => {
      let quotient = left.checked_div(right)?;
      match left % right != 0 && (left < 0) != (right < 0) {
        true  => quotient.checked_sub(1),
        false => Some(quotient)
      }
    }

    BinaryOp::Modulo => {
      let remainder = left.checked_rem(right)?;
      match remainder != 0 && (remainder < 0) != (right < 0) {
        true  => Some(remainder + right),
        false => Some(remainder)
      }
    }

    BinaryOp::Power => {
      let exponent = u32::try_from(right).ok()?;
      left.checked_pow(exponent)
    }

    BinaryOp::Lshift => {
      match right {
        0..=63 => {
          let shifted = left << right;
          match shifted >> right == left {
            true  => Some(shifted),
            false => None
          }
        }
        _ if right >= 64 && left == 0 => Some(0),
        _ => None
      }
    }

    BinaryOp::Rshift => {
      match right {
        0..=63            => Some(left >> right),
        _ if right >= 64  => Some(if left < 0 { -1 } else { 0 }),
        _                 => None
      }
    }

    BinaryOp::And        => Some(left & right),
    BinaryOp::Or         => Some(left | right),
    BinaryOp::Xor        => Some(left ^ right),
    BinaryOp::TrueDivide => None,
  }
}

// endregion


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::try_decode_instructions;

  /// `(opcode, argument)` pairs of the code, `extended_arg` prefixes included.
  fn listing(code: &CodeObject) -> Vec<(Opcode, u32)> {
    try_decode_instructions(&code.code)
      .unwrap()
      .into_iter()
      .map(|raw| (raw.opcode, raw.argument))
      .collect()
  }

  fn opcodes(code: &CodeObject) -> Vec<Opcode> {
    listing(code).into_iter().map(|(opcode, _)| opcode).collect()
  }

  #[test]
  fn empty_function_returns_none() {
    let code = compile("def no_op_pass():\n    pass\n").unwrap();
    assert_eq!(listing(&code), vec![(Opcode::LoadConst, 0), (Opcode::ReturnValue, 0)]);
    assert_eq!(code.consts.get(0), Some(&Constant::None));
    assert_eq!(code.line_table, vec![(0, 2)]);
    assert_eq!(code.source, vec!["def no_op_pass():", "    pass"]);
    assert_eq!(code.kind, UnitKind::Function);
  }

  #[test]
  fn locals_globals_and_constants() {
    let code = compile("def square(x):\n    y = x * x\n    return print(y)\n").unwrap();
    assert_eq!(
      listing(&code),
      vec![
        (Opcode::LoadFast, 0),
        (Opcode::LoadFast, 0),
        (Opcode::BinaryMultiply, 0),
        (Opcode::StoreFast, 1),
        (Opcode::LoadGlobal, 0),
        (Opcode::LoadFast, 1),
        (Opcode::CallFunction, 1),
        (Opcode::ReturnValue, 0),
      ]
    );
    assert_eq!(code.names.get(0), Some(&Name::from("print")));
    assert_eq!(code.line_table, vec![(0, 2), (8, 3)]);
  }

  #[test]
  fn integer_arithmetic_is_folded() {
    let code = compile("def f():\n    return -7 // 2 + 2 ** 10 % 1000 - (1 << 3)\n").unwrap();
    assert_eq!(listing(&code), vec![(Opcode::LoadConst, 0), (Opcode::ReturnValue, 0)]);
    assert_eq!(code.consts.get(0), Some(&Constant::Integer(-4 + 24 - 8)));
  }

  #[test]
  fn floor_semantics() {
    assert_eq!(fold_binary(BinaryOp::FloorDivide, -7, 2), Some(-4));
    assert_eq!(fold_binary(BinaryOp::FloorDivide, 7, -2), Some(-4));
    assert_eq!(fold_binary(BinaryOp::Modulo, -7, 2), Some(1));
    assert_eq!(fold_binary(BinaryOp::Modulo, 7, -2), Some(-1));
    assert_eq!(fold_binary(BinaryOp::FloorDivide, 1, 0), None);
    assert_eq!(fold_binary(BinaryOp::Power, 2, -1), None);
    assert_eq!(fold_binary(BinaryOp::Multiply, i64::MAX, 2), None);
  }

  #[test]
  fn unfoldable_operands_are_computed() {
    let code = compile("def f(x):\n    return -x / 2\n").unwrap();
    assert_eq!(
      opcodes(&code),
      vec![
        Opcode::LoadFast,
        Opcode::UnaryNegative,
        Opcode::LoadConst,
        Opcode::BinaryTrueDivide,
        Opcode::ReturnValue,
      ]
    );
  }

  #[test]
  fn method_calls_and_attributes() {
    let code = compile("def f(s):\n    s.x = s.upper(1)\n").unwrap();
    assert_eq!(
      opcodes(&code),
      vec![
        Opcode::LoadFast,
        Opcode::LoadMethod,
        Opcode::LoadConst,
        Opcode::CallMethod,
        Opcode::LoadFast,
        Opcode::StoreAttr,
        Opcode::LoadConst,
        Opcode::ReturnValue,
      ]
    );
    assert_eq!(code.names.iter().map(|name| name.to_string()).collect::<Vec<_>>(),
               vec!["upper", "x"]);
  }

  #[test]
  fn if_else_jumps() {
    let source = "\
def sign(x):
    if x < 0:
        y = 1
    else:
        y = 2
    return y
";
    let code = compile(source).unwrap();
    assert_eq!(
      listing(&code),
      vec![
        (Opcode::LoadFast, 0),        //  0
        (Opcode::LoadConst, 0),       //  2
        (Opcode::CompareOp, 0),       //  4
        (Opcode::PopJumpIfFalse, 14), //  6
        (Opcode::LoadConst, 1),       //  8
        (Opcode::StoreFast, 1),       // 10
        (Opcode::JumpForward, 4),     // 12
        (Opcode::LoadConst, 2),       // 14
        (Opcode::StoreFast, 1),       // 16
        (Opcode::LoadFast, 1),        // 18
        (Opcode::ReturnValue, 0),     // 20
      ]
    );
    assert_eq!(code.line_table, vec![(0, 2), (8, 3), (14, 5), (18, 6)]);
  }

  #[test]
  fn returning_branch_has_no_jump_over_else() {
    let source = "\
def f(x):
    if not x:
        return 1
    else:
        return 2
";
    let code = compile(source).unwrap();
    assert_eq!(
      listing(&code),
      vec![
        (Opcode::LoadFast, 0),
        (Opcode::PopJumpIfTrue, 8),
        (Opcode::LoadConst, 0),
        (Opcode::ReturnValue, 0),
        (Opcode::LoadConst, 1),
        (Opcode::ReturnValue, 0),
        (Opcode::LoadConst, 2),
        (Opcode::ReturnValue, 0),
      ]
    );
  }

  #[test]
  fn loops() {
    let source = "\
def f(items):
    for item in items:
        item += 1
    while items:
        del items
";
    let code = compile(source).unwrap();
    assert_eq!(
      listing(&code),
      vec![
        (Opcode::LoadFast, 0),        //  0
        (Opcode::GetIter, 0),         //  2
        (Opcode::ForIter, 12),        //  4
        (Opcode::StoreFast, 1),       //  6
        (Opcode::LoadFast, 1),        //  8
        (Opcode::LoadConst, 0),       // 10
        (Opcode::InplaceAdd, 0),      // 12
        (Opcode::StoreFast, 1),       // 14
        (Opcode::JumpAbsolute, 4),    // 16
        (Opcode::LoadFast, 0),        // 18
        (Opcode::PopJumpIfFalse, 26), // 20
        (Opcode::DeleteFast, 0),      // 22
        (Opcode::JumpAbsolute, 18),   // 24
        (Opcode::LoadConst, 1),       // 26
        (Opcode::ReturnValue, 0),     // 28
      ]
    );
  }

  #[test]
  fn jumps_onto_loop_jumps_go_to_the_loop_head() {
    let source = "\
def dedupe(items):
    seen = []
    for item in items:
        if item not in seen:
            seen.append(item)
    return seen
";
    let code = compile(source).unwrap();
    assert_eq!(
      listing(&code),
      vec![
        (Opcode::BuildList, 0),       //  0
        (Opcode::StoreFast, 1),       //  2
        (Opcode::LoadFast, 0),        //  4
        (Opcode::GetIter, 0),         //  6
        (Opcode::ForIter, 22),        //  8
        (Opcode::StoreFast, 2),       // 10
        (Opcode::LoadFast, 2),        // 12
        (Opcode::LoadFast, 1),        // 14
        (Opcode::ContainsOp, 1),      // 16
        (Opcode::PopJumpIfFalse, 8),  // 18
        (Opcode::LoadFast, 1),        // 20
        (Opcode::LoadMethod, 0),      // 22
        (Opcode::LoadFast, 2),        // 24
        (Opcode::CallMethod, 1),      // 26
        (Opcode::PopTop, 0),          // 28
        (Opcode::JumpAbsolute, 8),    // 30
        (Opcode::LoadFast, 1),        // 32
        (Opcode::ReturnValue, 0),     // 34
      ]
    );
  }

  #[test]
  fn if_else_inside_loop_jumps_to_the_loop_head() {
    let source = "\
def f(xs):
    for x in xs:
        if x:
            a()
        else:
            b()
";
    let code = compile(source).unwrap();
    assert_eq!(
      listing(&code),
      vec![
        (Opcode::LoadFast, 0),        //  0
        (Opcode::GetIter, 0),         //  2
        (Opcode::ForIter, 22),        //  4
        (Opcode::StoreFast, 1),       //  6
        (Opcode::LoadFast, 1),        //  8
        (Opcode::PopJumpIfFalse, 20), // 10
        (Opcode::LoadGlobal, 0),      // 12
        (Opcode::CallFunction, 0),    // 14
        (Opcode::PopTop, 0),          // 16
        (Opcode::JumpAbsolute, 4),    // 18
        (Opcode::LoadGlobal, 1),      // 20
        (Opcode::CallFunction, 0),    // 22
        (Opcode::PopTop, 0),          // 24
        (Opcode::JumpAbsolute, 4),    // 26
        (Opcode::LoadConst, 0),       // 28
        (Opcode::ReturnValue, 0),     // 30
      ]
    );
  }

  #[test]
  fn nested_function_and_class() {
    let source = "\
def outer():
    def inner():
        return 1
    class Point:
        def norm(self):
            return self
    return inner
";
    let code = compile(source).unwrap();
    assert_eq!(
      opcodes(&code),
      vec![
        Opcode::LoadConst,
        Opcode::LoadConst,
        Opcode::MakeFunction,
        Opcode::StoreFast,
        Opcode::LoadBuildClass,
        Opcode::LoadConst,
        Opcode::LoadConst,
        Opcode::MakeFunction,
        Opcode::LoadConst,
        Opcode::CallFunction,
        Opcode::StoreFast,
        Opcode::LoadFast,
        Opcode::ReturnValue,
      ]
    );
    assert_eq!(code.nested.len(), 2);
    assert_eq!(code.nested[0].qualname, "outer.<locals>.inner");
    assert_eq!(code.nested[1].qualname, "outer.<locals>.Point");
    assert_eq!(code.nested[1].nested[0].qualname, "outer.<locals>.Point.norm");
    assert_eq!(code.nested[0].source, vec!["    def inner():", "        return 1"]);

    let point = &code.nested[1];
    assert_eq!(point.kind, UnitKind::Class);
    assert_eq!(
      opcodes(point),
      vec![
        Opcode::LoadName,
        Opcode::StoreName,
        Opcode::LoadConst,
        Opcode::StoreName,
        Opcode::LoadConst,
        Opcode::LoadConst,
        Opcode::MakeFunction,
        Opcode::StoreName,
        Opcode::LoadConst,
        Opcode::ReturnValue,
      ]
    );
    assert_eq!(point.line_table, vec![(0, 4), (8, 5)]);
  }

  #[test]
  fn wide_arguments_get_prefixes() {
    let mut source = String::from("def f():\n");
    for i in 0..300 {
      source.push_str(&format!("    x = {}\n", i));
    }
    let code = compile(&source).unwrap();
    let listing = listing(&code);
    // `x = 256` is the first constant past one byte.
    let position = listing.iter().position(|(opcode, _)| *opcode == Opcode::ExtendedArg).unwrap();
    assert_eq!(listing[position], (Opcode::ExtendedArg, 1));
    assert_eq!(listing[position + 1], (Opcode::LoadConst, 256));
    assert_eq!(code.line_table[256], (position as u32 * 2, 258));
  }

  #[test]
  fn long_forward_jumps_are_widened() {
    let mut source = String::from("def f(x):\n    if x:\n");
    for _ in 0..100 {
      source.push_str("        x = x\n");
    }
    source.push_str("    return x\n");
    let code = compile(&source).unwrap();
    let listing = listing(&code);
    // The `if` body is 400 bytes, so the jump needs one prefix and the code shifts by 2.
    assert_eq!(listing[1], (Opcode::ExtendedArg, 1));
    assert_eq!(listing[2], (Opcode::PopJumpIfFalse, 6 + 400));
    assert_eq!(listing[listing.len() - 2], (Opcode::LoadFast, 0));
  }

  #[test]
  fn return_in_class_body_is_rejected() {
    assert_eq!(
      compile("class C:\n    return 1\n"),
      Err(CompileError::ReturnOutsideFunction { line: 2 })
    );
  }

  #[test]
  fn exactly_one_definition() {
    assert_eq!(
      compile("def f():\n    pass\ndef g():\n    pass\n"),
      Err(CompileError::ExpectedOneDefinition { found: 2 })
    );
    assert_eq!(compile("x = 1\n"), Err(CompileError::NotADefinition { line: 1 }));
  }
}
