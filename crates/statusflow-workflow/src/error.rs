use std::path::PathBuf;

use statusflow_config::{IdError, StatusId};
use statusflow_normalizer::NormalizeError;
use thiserror::Error;

use crate::factory::ObjectRole;

/// Errors raised by a [`DefinitionProvider`](crate::DefinitionProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
  /// The workflow id cannot be mapped to a definition location.
  #[error("invalid workflow id: {0}")]
  InvalidWorkflowId(String),

  /// Reading the definition failed.
  #[error("failed to read definition for workflow '{workflow_id}': {source}")]
  Io {
    workflow_id: String,
    #[source]
    source: std::io::Error,
  },

  /// Listing the definition directory failed.
  #[error("failed to list definitions in '{}': {source}", root.display())]
  List {
    root: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The definition is not valid JSON.
  #[error("failed to parse definition for workflow '{workflow_id}': {source}")]
  Parse {
    workflow_id: String,
    #[source]
    source: serde_json::Error,
  },

  /// Provider lock was poisoned.
  #[error("definition provider lock poisoned: {0}")]
  Poisoned(String),
}

/// Errors raised by the [`WorkflowStore`](crate::WorkflowStore).
#[derive(Debug, Error)]
pub enum StoreError {
  /// No definition is registered and no provider yields one.
  #[error("workflow not found: {workflow_id}")]
  WorkflowNotFound { workflow_id: String },

  /// The status is not declared by its workflow.
  #[error("status not found: {status_id}")]
  StatusNotFound { status_id: StatusId },

  /// A declared transition points at a status that does not exist.
  #[error("transition target not found: {start} -> {end}")]
  TransitionTargetNotFound { start: StatusId, end: StatusId },

  /// The injected type map lacks a constructor.
  #[error("type map has no constructor for role '{role}'")]
  IncompleteTypeMap { role: ObjectRole },

  /// A cache lock was poisoned.
  #[error("cache lock poisoned: {0}")]
  CachePoisoned(String),

  /// A status id could not be parsed or resolved.
  #[error(transparent)]
  Id(#[from] IdError),

  /// The definition could not be normalized.
  #[error("invalid definition: {0}")]
  Normalize(#[from] NormalizeError),

  /// The definition provider failed.
  #[error("definition provider error: {0}")]
  Provider(#[from] ProviderError),
}

impl StoreError {
  /// True for the not-found family of errors.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      StoreError::WorkflowNotFound { .. }
        | StoreError::StatusNotFound { .. }
        | StoreError::TransitionTargetNotFound { .. }
    )
  }
}
