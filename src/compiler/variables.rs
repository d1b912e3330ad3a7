/*!
  Locals of a function body. A name is local when it is a parameter or when the body binds it:
  assignment, augmented assignment, a `for` target, `del`, or a nested `def`/`class`. Every other
  name the body mentions is global. Bodies of nested definitions are separate scopes and are not
  searched.
*/

use crate::symboltable::SymbolTable;
use super::term::*;

/// The local variable table of a function: parameters first, then bound names in order of first
/// binding.
pub fn collect_locals(params: &[Name], body: &[Stmt]) -> SymbolTable<Name> {
  let mut locals = SymbolTable::new();
  for param in params {
    locals.intern(param.clone());
  }
  collect_bindings(body, &mut locals);
  locals
}

fn collect_bindings(body: &[Stmt], locals: &mut SymbolTable<Name>) {
  for stmt in body {
    match &stmt.kind {

      StmtKind::Assign { target: Target::Name(name), .. }
      | StmtKind::AugAssign { name, .. }
      | StmtKind::Delete(name) => {
        locals.intern(name.clone());
      }

      StmtKind::FunctionDef(definition) | StmtKind::ClassDef(definition) => {
        locals.intern(definition.name.clone());
      }

      StmtKind::If { body, orelse, .. } => {
        collect_bindings(body, locals);
        collect_bindings(orelse, locals);
      }

      StmtKind::While { body, .. } => collect_bindings(body, locals),

      StmtKind::For { target, body, .. } => {
        locals.intern(target.clone());
        collect_bindings(body, locals);
      }

      _ => {}

    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::compiler::parser::parse;

  fn locals_of(source: &str) -> Vec<String> {
    let stmts = parse(source).unwrap();
    match &stmts[0].kind {
      StmtKind::FunctionDef(definition) => {
        collect_locals(&definition.params, &definition.body)
          .iter()
          .map(|name| name.to_string())
          .collect()
      }
      other => panic!("not a function: {:?}", other)
    }
  }

  #[test]
  fn parameters_come_first() {
    let source = "def f(a, b):\n    c = a\n    b = c\n    return b\n";
    assert_eq!(locals_of(source), vec!["a", "b", "c"]);
  }

  #[test]
  fn bindings_in_nested_blocks_are_local() {
    let source = "\
def f(items):
    total = 0
    for item in items:
        if item:
            total += item
        else:
            del item
    while total:
        def helper():
            inside = 1
        total -= 1
    return total
";
    assert_eq!(locals_of(source), vec!["items", "total", "item", "helper"]);
  }

  #[test]
  fn attribute_targets_bind_nothing() {
    let source = "def f(p):\n    p.x = g\n    q[0] = 1\n";
    assert_eq!(locals_of(source), vec!["p"]);
  }
}
