use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::StatusId;

/// Free-form keyed metadata attached to workflows, statuses and transitions.
pub type Metadata = serde_json::Map<String, Value>;

/// Raw key holding the initial status id.
pub const KEY_INITIAL_STATUS_ID: &str = "initialStatusId";
/// Accepted alias of [`KEY_INITIAL_STATUS_ID`].
pub const KEY_INITIAL: &str = "initial";
/// Raw key holding the status section.
pub const KEY_STATUS: &str = "status";
pub const KEY_LABEL: &str = "label";
pub const KEY_METADATA: &str = "metadata";
pub const KEY_TRANSITION: &str = "transition";

/// Canonical workflow definition, produced by a normalizer.
///
/// Every status key belongs to the workflow the definition was normalized for.
/// Transition targets may point into other workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
  #[serde(rename = "initialStatusId")]
  pub initial_status_id: StatusId,

  #[serde(rename = "status")]
  pub statuses: IndexMap<StatusId, StatusDefinition>,

  /// Top-level properties carried over verbatim from the raw definition.
  #[serde(flatten)]
  pub extra: Metadata,
}

/// Canonical status entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDefinition {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata: Option<Metadata>,

  /// Outgoing transitions keyed by canonical end id, in declaration order.
  #[serde(
    default,
    rename = "transition",
    skip_serializing_if = "IndexMap::is_empty"
  )]
  pub transitions: IndexMap<StatusId, TransitionDefinition>,

  #[serde(flatten)]
  pub extra: Metadata,
}

impl StatusDefinition {
  /// True if the status declares nothing beyond its id.
  pub fn is_bare(&self) -> bool {
    self.label.is_none()
      && self.metadata.is_none()
      && self.transitions.is_empty()
      && self.extra.is_empty()
  }
}

/// Canonical transition body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionDefinition {
  #[serde(default, skip_serializing_if = "Metadata::is_empty")]
  pub metadata: Metadata,

  #[serde(flatten)]
  pub extra: Metadata,
}

impl WorkflowDefinition {
  /// Id of the workflow this definition describes.
  pub fn workflow_id(&self) -> &str {
    self.initial_status_id.workflow_id()
  }

  pub fn status(&self, id: &StatusId) -> Option<&StatusDefinition> {
    self.statuses.get(id)
  }

  pub fn contains_status(&self, id: &StatusId) -> bool {
    self.statuses.contains_key(id)
  }

  /// Total number of declared transitions.
  pub fn transition_count(&self) -> usize {
    self.statuses.values().map(|s| s.transitions.len()).sum()
  }

  /// Iterate `(start, end, body)` for every declared transition.
  pub fn transitions(&self) -> impl Iterator<Item = (&StatusId, &StatusId, &TransitionDefinition)> {
    self.statuses.iter().flat_map(|(start, status)| {
      status
        .transitions
        .iter()
        .map(move |(end, body)| (start, end, body))
    })
  }

  /// Workflow-level metadata, read from the passthrough `metadata` property.
  pub fn metadata(&self) -> Metadata {
    match self.extra.get(KEY_METADATA) {
      Some(Value::Object(map)) => map.clone(),
      _ => Metadata::new(),
    }
  }

  /// Render the definition back into the standard raw dialect.
  ///
  /// Normalizing the result yields an equal definition.
  pub fn to_raw(&self) -> serde_json::Result<Value> {
    serde_json::to_value(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn id(raw: &str) -> StatusId {
    raw.parse().unwrap()
  }

  fn sample() -> WorkflowDefinition {
    let mut statuses = IndexMap::new();
    let mut draft = StatusDefinition {
      label: Some("Draft".to_string()),
      ..Default::default()
    };
    draft
      .transitions
      .insert(id("post/published"), TransitionDefinition::default());
    statuses.insert(id("post/draft"), draft);
    statuses.insert(id("post/published"), StatusDefinition::default());

    let mut extra = Metadata::new();
    extra.insert("metadata".to_string(), json!({"owner": "editorial"}));

    WorkflowDefinition {
      initial_status_id: id("post/draft"),
      statuses,
      extra,
    }
  }

  #[test]
  fn test_to_raw_uses_standard_keys() {
    let raw = sample().to_raw().unwrap();
    assert_eq!(
      raw,
      json!({
        "initialStatusId": "post/draft",
        "status": {
          "post/draft": {"label": "Draft", "transition": {"post/published": {}}},
          "post/published": {}
        },
        "metadata": {"owner": "editorial"}
      })
    );
  }

  #[test]
  fn test_accessors() {
    let def = sample();
    assert_eq!(def.workflow_id(), "post");
    assert_eq!(def.transition_count(), 1);
    assert!(def.contains_status(&id("post/published")));
    assert!(def.status(&id("post/published")).unwrap().is_bare());
    assert_eq!(def.metadata().get("owner"), Some(&json!("editorial")));

    let edges: Vec<String> = def
      .transitions()
      .map(|(s, e, _)| format!("{}->{}", s, e))
      .collect();
    assert_eq!(edges, vec!["post/draft->post/published"]);
  }
}
