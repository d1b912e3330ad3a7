//! The challenges that ship with the trainer.

use crate::registry::{Difficulty, RegistryBuilder, RegistryError};

const CHALLENGES: &[(Difficulty, &str)] = &[

  // region Beginner

  (Difficulty::Beginner, "
    def no_op_pass():
        pass
  "),

  (Difficulty::Beginner, "
    def return_constant():
        return 42
  "),

  (Difficulty::Beginner, "
    def square(x):
        return x * x
  "),

  (Difficulty::Beginner, "
    def unary_op():
        x = 5
        return -x
  "),

  (Difficulty::Beginner, "
    def string_upper(s):
        return s.upper()
  "),

  (Difficulty::Beginner, "
    def greeting(name):
        message = 'hello, ' + name
        print(message)
  "),

  // endregion

  // region Intermediate

  (Difficulty::Intermediate, "
    def repeat_text(x, y):
        x *= 2
        z = 'abc'
        return z * x ** y
  "),

  (Difficulty::Intermediate, "
    def bit_juggling(x):
        y = 3 ^ x
        z = 4 * ~y
        s = 'miniature' * y ** len('lamp')
        return s[z] * 5
  "),

  (Difficulty::Intermediate, "
    def store_collection_types_fast(a, b):
        x = [1, 2]
        y = (a, b)
        z = ['a', 'b']
        return x, y, z
  "),

  (Difficulty::Intermediate, "
    def classify(n):
        if n < 0:
            return 'negative'
        elif n == 0:
            return 'zero'
        else:
            return 'positive'
  "),

  (Difficulty::Intermediate, "
    def folded_constants():
        seconds = 60 * 60 * 24
        mask = (1 << 8) - 1
        return seconds & mask
  "),

  (Difficulty::Intermediate, "
    def set_item(items, key, value):
        items[key] = value
        items.count = items.count + 1
        del key
  "),

  // endregion

  // region Advanced

  (Difficulty::Advanced, "
    def for_loop():
        l = []
        for i in range(16):
            l.append(~i & 4)
        return l
  "),

  (Difficulty::Advanced, "
    def countdown(n):
        while n > 0:
            print(n)
            n -= 1
        return None
  "),

  (Difficulty::Advanced, "
    def dedupe(items):
        seen = []
        for item in items:
            if item not in seen:
                seen.append(item)
        return seen
  "),

  (Difficulty::Advanced, "
    def make_adder():
        def add_one(y):
            return y + 1
        return add_one(2)
  "),

  (Difficulty::Advanced, "
    class Counter:
        start = 0
        def bump(self, n):
            self.value = self.value + n
            return self.value
  "),

  (Difficulty::Advanced, "
    def identity_checks(a, b):
        if a is None:
            return not b
        return a is not b
  "),

  // endregion

];

/// Registers every built-in challenge.
pub fn register_builtin(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
  for (difficulty, source) in CHALLENGES {
    builder.register(*difficulty, source)?;
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::extract_unit;

  #[test]
  fn every_challenge_compiles() {
    let mut builder = RegistryBuilder::new();
    register_builtin(&mut builder).unwrap();
    let registry = builder.build();
    assert_eq!(registry.len(), CHALLENGES.len());

    for unit in registry.iter() {
      let compiled = extract_unit(unit);
      assert!(compiled.is_ok(), "{} failed: {:?}", unit.name, compiled);
      assert!(!compiled.unwrap().instructions.is_empty());
    }
  }

  #[test]
  fn every_difficulty_but_custom_is_represented() {
    let mut builder = RegistryBuilder::new();
    register_builtin(&mut builder).unwrap();
    let registry = builder.build();

    assert!(registry.filter(Difficulty::Beginner).count() > 0);
    assert!(registry.filter(Difficulty::Intermediate).count() > 0);
    assert!(registry.filter(Difficulty::Advanced).count() > 0);
    assert_eq!(registry.filter(Difficulty::Custom).count(), 0);
  }

  #[test]
  fn for_loop_disassembly() {
    let mut builder = RegistryBuilder::new();
    register_builtin(&mut builder).unwrap();
    let registry = builder.build();
    let unit = extract_unit(registry.get("for_loop").unwrap()).unwrap();

    let shown: Vec<String> = unit.instructions.iter().map(|i| i.to_string()).collect();
    assert_eq!(
      shown,
      vec![
        "0: build_list 0",
        "2: store_fast l",
        "4: load_global range",
        "6: load_const 16",
        "8: call_function 1",
        "10: get_iter",
        "12: for_iter 34",
        "14: store_fast i",
        "16: load_fast l",
        "18: load_method append",
        "20: load_fast i",
        "22: unary_invert",
        "24: load_const 4",
        "26: binary_and",
        "28: call_method 1",
        "30: pop_top",
        "32: jump_absolute 12",
        "34: load_fast l",
        "36: return_value",
      ]
    );
  }

  #[test]
  fn skipped_if_inside_loop_goes_back_to_for_iter() {
    let mut builder = RegistryBuilder::new();
    register_builtin(&mut builder).unwrap();
    let registry = builder.build();
    let unit = extract_unit(registry.get("dedupe").unwrap()).unwrap();

    let shown: Vec<String> = unit.instructions.iter().map(|i| i.to_string()).collect();
    assert_eq!(shown[4], "8: for_iter 32");
    assert_eq!(shown[9], "18: pop_jump_if_false 8");
    assert_eq!(shown[15], "30: jump_absolute 8");
  }
}
