//! Equivalence of what the user typed and what the disassembly says.

use std::str::FromStr;

use nom::{
  bytes::complete::tag,
  character::complete::{digit1, one_of},
  combinator::{all_consuming, map_res, opt, recognize},
  multi::many0,
  sequence::{pair, tuple},
  IResult
};

use crate::bytecode::{Opcode, Operand};

/// Lowercase with `-` read as `_`, so `LOAD-FAST` names `load_fast`.
pub fn normalize_opcode_name(raw: &str) -> String {
  raw.to_lowercase().replace('-', "_")
}

/// An unknown opcode name is simply not a match.
pub fn opcode_matches(raw: &str, expected: Opcode) -> bool {
  Opcode::from_str(&normalize_opcode_name(raw)).ok() == Some(expected)
}

/**
  Decides whether the raw operand, with one layer of quotes already removed, denotes the expected
  operand.

  * A string operand must be equal byte for byte.
  * An integer operand must parse to the same value. Signs, leading zeros and `_` between digit
    groups are allowed, so `+5`, `05` and `5` all denote 5.
  * Operand text that is empty or only whitespace counts as no operand, unless it is exactly the
    expected string.
*/
pub fn operand_matches(raw: Option<&str>, expected: Option<&Operand>) -> bool {
  if let (Some(raw), Some(Operand::Text(text))) = (raw, expected) {
    if raw == text {
      return true;
    }
  }

  let raw = raw.filter(|text| !text.trim().is_empty());
  match (raw, expected) {
    (None, None)                              => true,
    (Some(raw), Some(Operand::Integer(value))) => parse_integer(raw) == Some(*value),
    _                                         => false
  }
}

fn pinteger(text: &str) -> IResult<&str, i64> {
  map_res(
    recognize(tuple((opt(one_of("+-")), digit1, many0(pair(tag("_"), digit1))))),
    |digits: &str| digits.replace('_', "").parse::<i64>()
  )(text)
}

fn parse_integer(raw: &str) -> Option<i64> {
  all_consuming(pinteger)(raw.trim()).ok().map(|(_, value)| value)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn opcode_names_ignore_case_and_separator() {
    assert!(opcode_matches("load_fast", Opcode::LoadFast));
    assert!(opcode_matches("LOAD_FAST", Opcode::LoadFast));
    assert!(opcode_matches("Load_Fast", Opcode::LoadFast));
    assert!(opcode_matches("load-fast", Opcode::LoadFast));
    assert!(!opcode_matches("load_global", Opcode::LoadFast));
    assert!(!opcode_matches("loadfast", Opcode::LoadFast));
    assert!(!opcode_matches("no_such_op", Opcode::LoadFast));
  }

  #[test]
  fn absent_operands() {
    assert!(operand_matches(None, None));
    assert!(operand_matches(Some("   "), None));
    assert!(!operand_matches(Some("x"), None));
    assert!(!operand_matches(None, Some(&Operand::Integer(0))));
    assert!(!operand_matches(None, Some(&Operand::from("x"))));
  }

  #[test]
  fn integer_spellings() {
    let five = Operand::Integer(5);
    for raw in ["5", "+5", "05", " 5 "] {
      assert!(operand_matches(Some(raw), Some(&five)), "{} should match 5", raw);
    }
    assert!(operand_matches(Some("1_000"), Some(&Operand::Integer(1000))));
    assert!(operand_matches(Some("-3"), Some(&Operand::Integer(-3))));
    for raw in ["five", "5.0", "0x5", "5_", "6"] {
      assert!(!operand_matches(Some(raw), Some(&five)), "{} should not match 5", raw);
    }
  }

  #[test]
  fn strings_match_exactly() {
    let text = Operand::from(" years old");
    assert!(operand_matches(Some(" years old"), Some(&text)));
    assert!(!operand_matches(Some("years old"), Some(&text)));
    assert!(!operand_matches(Some("X"), Some(&Operand::from("x"))));
    assert!(operand_matches(Some("42"), Some(&Operand::from("42"))));
    assert!(!operand_matches(Some("42"), Some(&Operand::Integer(43))));
  }

  #[test]
  fn empty_string_constant_needs_empty_quotes() {
    let empty = Operand::from("");
    assert!(operand_matches(Some(""), Some(&empty)));
    assert!(!operand_matches(None, Some(&empty)));
  }
}
