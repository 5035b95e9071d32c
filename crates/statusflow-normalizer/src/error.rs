use statusflow_config::{IdError, StatusId};
use thiserror::Error;

/// Errors that can occur while normalizing a raw workflow definition.
#[derive(Debug, Error)]
pub enum NormalizeError {
  /// The raw definition is not a keyed map.
  #[error("workflow definition for '{workflow_id}' must be provided as a keyed map")]
  NotAMap { workflow_id: String },

  /// The raw definition is an empty map.
  #[error("workflow definition for '{workflow_id}' is empty")]
  EmptyDefinition { workflow_id: String },

  /// No initial status id was declared.
  #[error("missing initialStatusId in workflow '{workflow_id}'")]
  MissingInitialStatusId { workflow_id: String },

  /// The initial status id is not a string.
  #[error("initialStatusId in workflow '{workflow_id}' must be a string")]
  InvalidInitialStatusId { workflow_id: String },

  /// No status section was declared.
  #[error("no status definition found in workflow '{workflow_id}'")]
  MissingStatusSection { workflow_id: String },

  /// The status section is neither a map nor a list of ids.
  #[error("invalid status section in workflow '{workflow_id}': map or list of ids expected")]
  InvalidStatusSection { workflow_id: String },

  /// A status body is neither null nor a map.
  #[error("wrong definition for status '{status_id}': map expected")]
  InvalidStatusBody { status_id: StatusId },

  /// The same canonical status id was declared twice.
  #[error("status '{status_id}' is declared more than once")]
  DuplicateStatus { status_id: StatusId },

  /// A status label is not a string.
  #[error("invalid label for status '{status_id}': string expected")]
  InvalidLabel { status_id: StatusId },

  /// Metadata is present but not a keyed map.
  #[error("invalid metadata definition for '{owner}': keyed map expected")]
  InvalidMetadata { owner: String },

  /// The transition section is not a string, list or map.
  #[error("invalid transition definition format for status '{status_id}'")]
  InvalidTransitionList { status_id: StatusId },

  /// A keyed transition body is neither null nor a map.
  #[error("invalid transition body for '{start}' -> '{end}': map expected")]
  InvalidTransitionBody { start: StatusId, end: StatusId },

  /// The initial status belongs to another workflow.
  #[error("initial status must belong to workflow '{workflow_id}': {status_id}")]
  CrossWorkflowInitialStatus {
    workflow_id: String,
    status_id: StatusId,
  },

  /// A declared status belongs to another workflow.
  #[error("status must belong to workflow '{workflow_id}': {status_id}")]
  CrossWorkflowStatus {
    workflow_id: String,
    status_id: StatusId,
  },

  /// The minimal dialect was given a keyed transition body.
  #[error("keyed transition bodies are not supported (status: {status_id})")]
  AssociativeNotSupported { status_id: StatusId },

  /// The initial status id is not among the declared statuses.
  #[error("initial status not defined: {id}")]
  MissingInitialStatus { id: StatusId },

  /// Same-workflow transition targets that are not declared.
  #[error("one or more end statuses are not defined: {}", format_ids(.ids))]
  MissingStatus { ids: Vec<StatusId> },

  /// A status id could not be parsed or resolved.
  #[error(transparent)]
  Id(#[from] IdError),
}

impl NormalizeError {
  /// True for integrity failures detected by the validation pass.
  pub fn is_validation_error(&self) -> bool {
    matches!(
      self,
      NormalizeError::MissingInitialStatus { .. } | NormalizeError::MissingStatus { .. }
    )
  }
}

fn format_ids(ids: &[StatusId]) -> String {
  ids
    .iter()
    .map(|id| id.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}
