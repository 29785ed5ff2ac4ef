//! Qualifiers and the registry of recognised qualifier types.

use crate::error::{Error, Result};
use dashmap::DashMap;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A marker used to tell apart several beans of the same type.
///
/// A qualifier is a marker name plus an optional list of members. Two
/// qualifiers are equal when both the name and all members are equal, so
/// `Named("primary")` and `Named("replica")` are different qualifiers of the
/// same qualifier type.
///
/// Only markers whose name has been registered with the container as a
/// [`QualifierType`] are accepted. `Default`, `Any` and `Named` are always
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
  name: Cow<'static, str>,
  // Kept sorted by key so equality does not depend on insertion order.
  members: Vec<(Cow<'static, str>, String)>,
}

impl Qualifier {
  /// Carried by every bean that declares no qualifiers other than `Named` or `Any`.
  /// A lookup without explicit qualifiers requires it.
  pub const DEFAULT: Qualifier = Qualifier::builtin("Default");
  /// Carried by every bean.
  pub const ANY: Qualifier = Qualifier::builtin("Any");

  pub const DEFAULT_NAME: &'static str = "Default";
  pub const ANY_NAME: &'static str = "Any";
  pub const NAMED_NAME: &'static str = "Named";

  const fn builtin(name: &'static str) -> Self {
    Self {
      name: Cow::Borrowed(name),
      members: Vec::new(),
    }
  }

  /// Creates a qualifier with the given marker name and no members.
  pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
    Self {
      name: name.into(),
      members: Vec::new(),
    }
  }

  /// The built-in `Named` qualifier with the given value.
  pub fn named(value: impl Into<String>) -> Self {
    Self::new(Self::NAMED_NAME).with_member("value", value)
  }

  /// Adds (or replaces) a member of this qualifier.
  pub fn with_member(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
    let key = key.into();
    let value = value.into();
    match self.members.binary_search_by(|(k, _)| k.as_ref().cmp(key.as_ref())) {
      Ok(pos) => self.members[pos].1 = value,
      Err(pos) => self.members.insert(pos, (key, value)),
    }
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn member(&self, key: &str) -> Option<&str> {
    self
      .members
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  pub(crate) fn is_named(&self) -> bool {
    self.name == Self::NAMED_NAME
  }
}

impl fmt::Display for Qualifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "@{}", self.name)?;
    if !self.members.is_empty() {
      write!(f, "(")?;
      for (i, (k, v)) in self.members.iter().enumerate() {
        if i > 0 {
          write!(f, ", ")?;
        }
        write!(f, "{} = {:?}", k, v)?;
      }
      write!(f, ")")?;
    }
    Ok(())
  }
}

/// Renders a qualifier set as `[@A, @B(value = "x")]`.
pub(crate) fn display_set(qualifiers: &[Qualifier]) -> String {
  let parts: Vec<String> = qualifiers.iter().map(ToString::to_string).collect();
  format!("[{}]", parts.join(", "))
}

/// Declares a marker name as a qualifier type.
///
/// A non-repeatable qualifier type may appear at most once in a lookup's
/// required qualifiers and at most once on a bean.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifierType {
  name: Cow<'static, str>,
  repeatable: bool,
}

impl QualifierType {
  pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
    Self {
      name: name.into(),
      repeatable: false,
    }
  }

  /// Allows several instances of this qualifier type in one qualifier set.
  pub fn repeatable(mut self) -> Self {
    self.repeatable = true;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_repeatable(&self) -> bool {
    self.repeatable
  }
}

/// The set of marker names the container recognises as qualifiers.
pub(crate) struct QualifierRegistry {
  types: DashMap<String, QualifierType>,
}

impl QualifierRegistry {
  pub(crate) fn with_builtins() -> Self {
    let registry = Self {
      types: DashMap::new(),
    };
    for name in [
      Qualifier::DEFAULT_NAME,
      Qualifier::ANY_NAME,
      Qualifier::NAMED_NAME,
    ] {
      registry.register(QualifierType::new(name));
    }
    registry
  }

  pub(crate) fn register(&self, qualifier_type: QualifierType) {
    self
      .types
      .insert(qualifier_type.name().to_owned(), qualifier_type);
  }

  pub(crate) fn is_registered(&self, name: &str) -> bool {
    self.types.contains_key(name)
  }

  /// Checks that every qualifier in `additional` is a recognised qualifier type,
  /// and that no non-repeatable type occurs twice across `existing` and `additional`.
  pub(crate) fn validate(&self, existing: &[Qualifier], additional: &[Qualifier]) -> Result<()> {
    for qualifier in additional {
      if !self.is_registered(qualifier.name()) {
        return Err(Error::IllegalArgument(format!(
          "{} is not a qualifier type",
          qualifier
        )));
      }
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for qualifier in existing.iter().chain(additional) {
      *seen.entry(qualifier.name()).or_default() += 1;
    }
    for (name, count) in seen {
      if count < 2 {
        continue;
      }
      let repeatable = self
        .types
        .get(name)
        .map(|t| t.is_repeatable())
        .unwrap_or(false);
      if !repeatable {
        return Err(Error::IllegalArgument(format!(
          "duplicate qualifier of non-repeatable type @{}",
          name
        )));
      }
    }
    Ok(())
  }
}
