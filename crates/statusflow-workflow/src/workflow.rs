use serde::Serialize;
use serde_json::Value;
use statusflow_config::{Metadata, StatusId};

/// Everything needed to construct a [`Workflow`].
#[derive(Debug, Clone)]
pub struct WorkflowParts {
  pub id: String,
  pub initial_status_id: StatusId,
  pub metadata: Metadata,
}

/// A named graph of statuses with one designated initial status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
  id: String,
  initial_status_id: StatusId,
  #[serde(skip_serializing_if = "Metadata::is_empty")]
  metadata: Metadata,
}

impl Workflow {
  pub fn new(parts: WorkflowParts) -> Self {
    Self {
      id: parts.id,
      initial_status_id: parts.initial_status_id,
      metadata: parts.metadata,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn initial_status_id(&self) -> &StatusId {
    &self.initial_status_id
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn metadata_value(&self, key: &str) -> Option<&Value> {
    self.metadata.get(key)
  }

  /// True if `status_id` is this workflow's initial status.
  pub fn is_initial_status(&self, status_id: &StatusId) -> bool {
    self.initial_status_id == *status_id
  }
}
