/*!
  The registry of quizzable units. It is filled once at startup through a `RegistryBuilder`, from
  the built-in challenges and from user files, and then frozen into a `Registry` that is only
  queried.
*/

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::debug;

#[derive(StrumDisplay, EnumString, EnumIter, IntoStaticStr, Clone, Copy, Eq, PartialEq, Hash, Debug)]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
  /// Units loaded from user files.
  Custom,
}

#[derive(Error, Debug)]
pub enum RegistryError {
  #[error("a unit named `{name}` is already registered")]
  DuplicateName { name: String },

  #[error("no top-level `def` or `class` header found")]
  MissingDefinition,

  #[error("could not read {}: {source}", path.display())]
  Read {
    path   : PathBuf,
    #[source]
    source : std::io::Error
  },
}

/// A named piece of source holding one top-level definition.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct QuizUnit {
  pub name       : String,
  pub difficulty : Difficulty,
  /// Dedented, starting with the definition's header.
  pub source     : String,
}

impl QuizUnit {
  pub fn new(name: &str, difficulty: Difficulty, source: &str) -> QuizUnit {
    QuizUnit {
      name: name.to_string(),
      difficulty,
      source: source.to_string()
    }
  }
}

#[derive(Default, Debug)]
pub struct RegistryBuilder {
  units   : Vec<QuizUnit>,
  by_name : HashMap<String, usize>,
}

impl RegistryBuilder {
  pub fn new() -> RegistryBuilder {
    RegistryBuilder::default()
  }

  /// Registers `source` under the name in its definition header, returning that name.
  pub fn register(&mut self, difficulty: Difficulty, source: &str) -> Result<String, RegistryError> {
    let source = dedent(source);
    let name = header_name(&source).ok_or(RegistryError::MissingDefinition)?;

    if self.by_name.contains_key(&name) {
      return Err(RegistryError::DuplicateName { name });
    }

    debug!(name = name.as_str(), %difficulty, "registered");
    self.by_name.insert(name.clone(), self.units.len());
    self.units.push(QuizUnit { name: name.clone(), difficulty, source });
    Ok(name)
  }

  /// Registers every top-level definition in the file as a custom unit. Returns the names.
  pub fn register_file(&mut self, path: &Path) -> Result<Vec<String>, RegistryError> {
    let text = fs::read_to_string(path)
      .map_err(|source| RegistryError::Read { path: path.to_path_buf(), source })?;

    let definitions = split_definitions(&text);
    if definitions.is_empty() {
      return Err(RegistryError::MissingDefinition);
    }

    definitions
      .iter()
      .map(|definition| self.register(Difficulty::Custom, definition))
      .collect()
  }

  pub fn build(self) -> Registry {
    Registry {
      units   : self.units,
      by_name : self.by_name
    }
  }
}

/// The frozen, query-only registry.
#[derive(Debug)]
pub struct Registry {
  units   : Vec<QuizUnit>,
  by_name : HashMap<String, usize>,
}

impl Registry {
  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  /// In registration order.
  pub fn iter(&self) -> impl Iterator<Item = &QuizUnit> + '_ {
    self.units.iter()
  }

  pub fn get(&self, name: &str) -> Option<&QuizUnit> {
    self.by_name.get(name).map(|index| &self.units[*index])
  }

  pub fn filter(&self, difficulty: Difficulty) -> impl Iterator<Item = &QuizUnit> + '_ {
    self.units.iter().filter(move |unit| unit.difficulty == difficulty)
  }
}

fn indent_of(line: &str) -> usize {
  line.len() - line.trim_start().len()
}

/// Removes the indentation common to all non-blank lines, and blank lines at either end.
pub fn dedent(source: &str) -> String {
  let lines: Vec<&str> = source.lines().collect();
  let margin = lines.iter()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| indent_of(line))
                    .min()
                    .unwrap_or(0);

  let start = lines.iter().position(|line| !line.trim().is_empty()).unwrap_or(lines.len());
  let end   = lines.iter().rposition(|line| !line.trim().is_empty()).map_or(start, |i| i + 1);

  let mut dedented = String::new();
  for line in &lines[start..end] {
    match line.trim().is_empty() {
      true  => {}
      false => dedented.push_str(&line[margin..]),
    }
    dedented.push('\n');
  }
  dedented
}

/// The name declared by the first non-comment line, if it is a `def` or `class` header.
fn header_name(source: &str) -> Option<String> {
  let header = source.lines()
                     .map(str::trim)
                     .find(|line| !line.is_empty() && !line.starts_with('#'))?;

  let rest = header.strip_prefix("def ").or_else(|| header.strip_prefix("class "))?;
  let name: String = rest.trim_start()
                         .chars()
                         .take_while(|c| c.is_alphanumeric() || *c == '_')
                         .collect();
  match name.is_empty() {
    true  => None,
    false => Some(name)
  }
}

/**
  Cuts a file into its top-level definitions. A definition runs from its unindented `def` or
  `class` header through the indented, blank and comment lines after it. Any other unindented
  line ends it and is skipped.
*/
fn split_definitions(text: &str) -> Vec<String> {
  let mut definitions: Vec<String> = Vec::new();
  let mut current: Option<String> = None;

  for line in text.lines() {
    let top_level = !line.trim().is_empty() && indent_of(line) == 0 && !line.starts_with('#');

    if top_level {
      if let Some(definition) = current.take() {
        definitions.push(definition);
      }
      if line.starts_with("def ") || line.starts_with("class ") {
        current = Some(String::new());
      }
    }

    if let Some(definition) = current.as_mut() {
      definition.push_str(line);
      definition.push('\n');
    }
  }

  definitions.extend(current);
  definitions
}
