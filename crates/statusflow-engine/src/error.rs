use statusflow_config::{IdError, StatusId};
use statusflow_workflow::StoreError;
use thiserror::Error;

/// Errors raised while resolving a status change.
#[derive(Debug, Error)]
pub enum EngineError {
  /// A workflow can only be entered through its initial status.
  #[error(
    "status '{status_id}' is not the initial status of workflow '{workflow_id}' (expected '{initial_status_id}')"
  )]
  NotInitialStatus {
    status_id: StatusId,
    workflow_id: String,
    initial_status_id: StatusId,
  },

  /// The requested status cannot be reached from the current one.
  #[error("no transition found from '{start}' to '{end}'")]
  NoTransitionFound { start: StatusId, end: StatusId },

  /// A status id could not be parsed or resolved.
  #[error(transparent)]
  Id(#[from] IdError),

  /// Graph lookup failed.
  #[error(transparent)]
  Store(#[from] StoreError),
}

impl EngineError {
  /// True for errors caused by an illegal move rather than a broken graph.
  pub fn is_state_error(&self) -> bool {
    matches!(
      self,
      EngineError::NotInitialStatus { .. } | EngineError::NoTransitionFound { .. }
    )
  }
}
