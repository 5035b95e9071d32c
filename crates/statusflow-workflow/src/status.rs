use serde::Serialize;
use serde_json::Value;
use statusflow_config::{Metadata, StatusId};

/// Everything needed to construct a [`Status`].
#[derive(Debug, Clone)]
pub struct StatusParts {
  pub id: StatusId,
  pub label: String,
  pub metadata: Metadata,
  /// Declared end ids, in declaration order.
  pub outgoing: Vec<StatusId>,
}

/// A node of a workflow graph.
///
/// Statuses are created once per canonical id by the store and shared as
/// `Arc<Status>`. The transitions themselves are owned by the store; a status
/// only records the ids it leads to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
  id: StatusId,
  label: String,
  #[serde(skip_serializing_if = "Metadata::is_empty")]
  metadata: Metadata,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  outgoing: Vec<StatusId>,
}

impl Status {
  pub fn new(parts: StatusParts) -> Self {
    Self {
      id: parts.id,
      label: parts.label,
      metadata: parts.metadata,
      outgoing: parts.outgoing,
    }
  }

  pub fn id(&self) -> &StatusId {
    &self.id
  }

  pub fn workflow_id(&self) -> &str {
    self.id.workflow_id()
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  /// A single metadata entry.
  pub fn metadata_value(&self, key: &str) -> Option<&Value> {
    self.metadata.get(key)
  }

  /// Ids of the statuses this one has a declared transition to.
  pub fn outgoing(&self) -> &[StatusId] {
    &self.outgoing
  }

  /// True if no transition leaves this status.
  pub fn is_final(&self) -> bool {
    self.outgoing.is_empty()
  }
}
