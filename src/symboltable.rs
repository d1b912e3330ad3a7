use std::hash::Hash;

use bimap::BiMap;

/**
  A symbol table is a dense mapping between symbols (constants, names) and the argument indices
  that instructions use to refer to them. The compiler interns into it, the extractor looks
  indices back up. It is really just a convenience wrapper around a BiMap whose right side is
  always `0..len`.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymbolTable<T>
  where T: Hash + Eq
{
  table: BiMap<T, u32>
}

impl<T> SymbolTable<T>
  where T: Hash + Eq
{

  pub fn new() -> SymbolTable<T> {
    SymbolTable {
      table: BiMap::new()
    }
  }

  /// Returns the index of `symbol`, appending it to the table if it is not already present.
  pub fn intern(&mut self, symbol: T) -> u32 {
    if let Some(index) = self.table.get_by_left(&symbol) {
      return *index;
    }
    let index = self.table.len() as u32;
    self.table.insert(symbol, index);
    index
  }

  pub fn index_of(&self, symbol: &T) -> Option<u32> {
    self.table.get_by_left(symbol).copied()
  }

  pub fn get(&self, index: u32) -> Option<&T> {
    self.table.get_by_right(&index)
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  /// Iterates over the symbols in index order.
  pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
    (0..self.len() as u32).filter_map(move |index| self.get(index))
  }
}

impl<T> Default for SymbolTable<T>
  where T: Hash + Eq
{
  fn default() -> Self {
    SymbolTable::new()
  }
}
