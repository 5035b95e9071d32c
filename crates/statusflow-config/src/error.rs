use thiserror::Error;

/// Errors raised while parsing or validating a status identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
  /// The raw id does not split into one or two `/`-separated tokens.
  #[error("not a valid status id format: '{raw}'")]
  InvalidFormat { raw: String },

  /// The workflow segment does not match the id pattern.
  #[error("not a valid status id: incorrect workflow id format in '{raw}'")]
  InvalidWorkflowId { raw: String },

  /// The local segment does not match the id pattern.
  #[error("not a valid status id: incorrect status local id format in '{raw}'")]
  InvalidLocalId { raw: String },

  /// A relative id was given without a workflow to resolve it against.
  #[error("failed to get workflow id for relative status id '{raw}'")]
  MissingContext { raw: String },
}

impl IdError {
  /// The raw value that failed to parse.
  pub fn raw(&self) -> &str {
    match self {
      IdError::InvalidFormat { raw }
      | IdError::InvalidWorkflowId { raw }
      | IdError::InvalidLocalId { raw }
      | IdError::MissingContext { raw } => raw,
    }
  }

  /// True for malformed ids, false when only the resolution context was missing.
  pub fn is_format_error(&self) -> bool {
    !matches!(self, IdError::MissingContext { .. })
  }
}
