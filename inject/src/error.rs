use thiserror::Error;

/// The error type for container lookups, registrations and configuration loading.
#[derive(Debug, Error)]
pub enum Error {
  /// No enabled bean has the required type and qualifiers.
  #[error("Unsatisfied dependency: no bean of type {type_name} with qualifiers {qualifiers}")]
  Unsatisfied {
    type_name: &'static str,
    qualifiers: String,
  },

  /// More than one equally eligible bean remains after alternatives are applied.
  #[error("Ambiguous dependency: type {type_name} with qualifiers {qualifiers} matches beans {beans:?}")]
  Ambiguous {
    type_name: &'static str,
    qualifiers: String,
    beans: Vec<String>,
  },

  /// An invalid qualifier combination, or a marker that is not a registered qualifier type.
  #[error("Illegal argument: {0}")]
  IllegalArgument(String),

  /// The container is shut down, or the operation is not legal for this lookup.
  #[error("Illegal state: {0}")]
  IllegalState(String),

  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),
}

impl Error {
  pub fn is_unsatisfied(&self) -> bool {
    matches!(self, Error::Unsatisfied { .. })
  }

  pub fn is_ambiguous(&self) -> bool {
    matches!(self, Error::Ambiguous { .. })
  }

  pub fn is_illegal_argument(&self) -> bool {
    matches!(self, Error::IllegalArgument(_))
  }

  pub fn is_illegal_state(&self) -> bool {
    matches!(self, Error::IllegalState(_))
  }
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
