use std::sync::Arc;

use serde_json::Value;
use statusflow_config::Metadata;

use crate::status::Status;

/// Everything needed to construct a [`Transition`].
#[derive(Debug, Clone)]
pub struct TransitionParts {
  pub start: Arc<Status>,
  pub end: Arc<Status>,
  pub metadata: Metadata,
}

/// A directed edge between two statuses, possibly in different workflows.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  id: String,
  start: Arc<Status>,
  end: Arc<Status>,
  metadata: Metadata,
}

impl Transition {
  pub fn new(parts: TransitionParts) -> Self {
    Self {
      id: format!("{}-{}", parts.start.id(), parts.end.id()),
      start: parts.start,
      end: parts.end,
      metadata: parts.metadata,
    }
  }

  /// `startId-endId`, e.g. `post/draft-post/published`.
  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn start(&self) -> &Arc<Status> {
    &self.start
  }

  pub fn end(&self) -> &Arc<Status> {
    &self.end
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn metadata_value(&self, key: &str) -> Option<&Value> {
    self.metadata.get(key)
  }

  /// True if the transition leaves its start workflow.
  pub fn is_cross_workflow(&self) -> bool {
    self.start.workflow_id() != self.end.workflow_id()
  }
}
