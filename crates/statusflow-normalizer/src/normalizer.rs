use indexmap::IndexSet;
use serde_json::Value;
use statusflow_config::{IdContext, IdError, StatusId, WorkflowDefinition, parse_status_id};

use crate::error::NormalizeError;

/// Normalizer transforms a raw workflow definition into its canonical form.
pub trait Normalizer: Send + Sync {
  /// Normalize `raw` as the definition of `workflow_id`.
  ///
  /// Relative ids are resolved inside `workflow_id`. When validation is
  /// enabled the result is guaranteed to contain its initial status and every
  /// same-workflow transition target.
  fn normalize(&self, workflow_id: &str, raw: &Value) -> Result<WorkflowDefinition, NormalizeError>;
}

/// Options shared by the normalizer dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerOptions {
  /// Run the integrity checks (missing initial status, dangling same-workflow targets).
  pub validate: bool,
}

impl Default for NormalizerOptions {
  fn default() -> Self {
    Self { validate: true }
  }
}

/// Check that `workflow_id` itself is well formed.
pub(crate) fn ensure_workflow_id(workflow_id: &str) -> Result<(), NormalizeError> {
  if statusflow_config::is_valid_workflow_id(workflow_id) {
    Ok(())
  } else {
    Err(NormalizeError::Id(IdError::InvalidWorkflowId {
      raw: workflow_id.to_string(),
    }))
  }
}

/// Resolve a status id declared on the start side; it must belong to `workflow_id`.
pub(crate) fn resolve_start_id(workflow_id: &str, raw: &str) -> Result<StatusId, NormalizeError> {
  let status_id = parse_status_id(raw, IdContext::workflow(workflow_id))?;
  if !status_id.belongs_to(workflow_id) {
    return Err(NormalizeError::CrossWorkflowStatus {
      workflow_id: workflow_id.to_string(),
      status_id,
    });
  }
  Ok(status_id)
}

/// Resolve a transition target; foreign workflows are allowed.
pub(crate) fn resolve_end_id(workflow_id: &str, raw: &str) -> Result<StatusId, NormalizeError> {
  Ok(parse_status_id(raw, IdContext::workflow(workflow_id))?)
}

/// Split a comma-separated id list. A blank string is an empty list.
pub(crate) fn split_id_list(raw: &str) -> Vec<&str> {
  if raw.trim().is_empty() {
    return Vec::new();
  }
  raw.split(',').map(str::trim).collect()
}

/// Ids collected while walking a raw definition.
#[derive(Debug, Default)]
pub(crate) struct IdIndex {
  pub starts: IndexSet<StatusId>,
  pub ends: IndexSet<StatusId>,
}

impl IdIndex {
  /// Record a start id, rejecting duplicates.
  pub fn add_start(&mut self, id: &StatusId) -> Result<(), NormalizeError> {
    if !self.starts.insert(id.clone()) {
      return Err(NormalizeError::DuplicateStatus {
        status_id: id.clone(),
      });
    }
    Ok(())
  }

  pub fn add_end(&mut self, id: &StatusId) {
    self.ends.insert(id.clone());
  }

  /// Integrity checks shared by both dialects.
  pub fn check(&self, workflow_id: &str, initial_status_id: &StatusId) -> Result<(), NormalizeError> {
    if !self.starts.contains(initial_status_id) {
      return Err(NormalizeError::MissingInitialStatus {
        id: initial_status_id.clone(),
      });
    }

    let missing: Vec<StatusId> = self
      .ends
      .iter()
      .filter(|id| id.belongs_to(workflow_id) && !self.starts.contains(*id))
      .cloned()
      .collect();

    if !missing.is_empty() {
      return Err(NormalizeError::MissingStatus { ids: missing });
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(raw: &str) -> StatusId {
    raw.parse().unwrap()
  }

  #[test]
  fn test_split_id_list() {
    assert_eq!(split_id_list("A, B ,C"), vec!["A", "B", "C"]);
    assert!(split_id_list("  ").is_empty());
    assert_eq!(split_id_list("A,"), vec!["A", ""]);
  }

  #[test]
  fn test_resolve_start_id_rejects_foreign_workflow() {
    let result = resolve_start_id("wf", "other/A");
    assert!(matches!(result, Err(NormalizeError::CrossWorkflowStatus { .. })));
    assert_eq!(resolve_start_id("wf", "A").unwrap(), id("wf/A"));
  }

  #[test]
  fn test_index_check_reports_only_same_workflow_targets() {
    let mut index = IdIndex::default();
    index.add_start(&id("wf/A")).unwrap();
    index.add_end(&id("wf/B"));
    index.add_end(&id("other/X"));
    index.add_end(&id("wf/C"));

    match index.check("wf", &id("wf/A")) {
      Err(NormalizeError::MissingStatus { ids }) => {
        assert_eq!(ids, vec![id("wf/B"), id("wf/C")]);
      }
      other => panic!("expected MissingStatus, got {:?}", other),
    }
  }

  #[test]
  fn test_index_rejects_duplicate_start() {
    let mut index = IdIndex::default();
    index.add_start(&id("wf/A")).unwrap();
    assert!(matches!(
      index.add_start(&id("wf/A")),
      Err(NormalizeError::DuplicateStatus { .. })
    ));
  }
}
