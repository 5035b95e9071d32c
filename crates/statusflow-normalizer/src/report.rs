//! Non-fatal structural report for normalized definitions.
//!
//! Unlike the normalizer's validation pass, the report never fails: it lists
//! every problem it finds, including unreachable statuses, together with a few
//! counts describing the graph.

use indexmap::IndexSet;
use serde::Serialize;
use statusflow_config::{StatusId, WorkflowDefinition};

/// Result of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
  pub errors: ValidationErrors,
  pub stats: DefinitionStats,
}

impl ValidationReport {
  pub fn has_errors(&self) -> bool {
    self.errors.missing_initial_status.is_some()
      || !self.errors.missing_status.is_empty()
      || !self.errors.unreachable_status.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
  /// The initial status id, when it is not declared.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub missing_initial_status: Option<StatusId>,

  /// Same-workflow transition targets that are not declared.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub missing_status: Vec<StatusId>,

  /// Declared statuses no transition leads to, other than the initial status.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub unreachable_status: Vec<StatusId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionStats {
  pub status_count: usize,
  pub transition_count: usize,
  /// Number of distinct transition targets.
  pub end_status_count: usize,
  /// Statuses without outgoing transitions.
  pub final_status_ids: Vec<StatusId>,
}

/// Build the report for `definition`, considering only its own transitions.
pub fn validate(workflow_id: &str, definition: &WorkflowDefinition) -> ValidationReport {
  validate_with_inbound(workflow_id, definition, std::iter::empty())
}

/// Build the report, also counting `inbound` ids as reachable.
///
/// `inbound` holds the targets of transitions declared by other workflows.
pub fn validate_with_inbound<'a>(
  workflow_id: &str,
  definition: &'a WorkflowDefinition,
  inbound: impl IntoIterator<Item = &'a StatusId>,
) -> ValidationReport {
  let ends: IndexSet<&StatusId> = definition.transitions().map(|(_, end, _)| end).collect();
  let reachable: IndexSet<&StatusId> = ends.iter().copied().chain(inbound).collect();

  let missing_initial_status = (!definition.contains_status(&definition.initial_status_id))
    .then(|| definition.initial_status_id.clone());

  let missing_status = ends
    .iter()
    .filter(|id| id.belongs_to(workflow_id) && !definition.contains_status(id))
    .map(|id| (*id).clone())
    .collect();

  let unreachable_status = definition
    .statuses
    .keys()
    .filter(|id| **id != definition.initial_status_id && !reachable.contains(id))
    .cloned()
    .collect();

  let final_status_ids = definition
    .statuses
    .iter()
    .filter(|(_, status)| status.transitions.is_empty())
    .map(|(id, _)| id.clone())
    .collect();

  ValidationReport {
    errors: ValidationErrors {
      missing_initial_status,
      missing_status,
      unreachable_status,
    },
    stats: DefinitionStats {
      status_count: definition.statuses.len(),
      transition_count: definition.transition_count(),
      end_status_count: ends.len(),
      final_status_ids,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Normalizer, NormalizerOptions, StandardNormalizer};
  use serde_json::json;

  fn id(raw: &str) -> StatusId {
    raw.parse().unwrap()
  }

  fn unvalidated(raw: serde_json::Value) -> WorkflowDefinition {
    StandardNormalizer::new(NormalizerOptions { validate: false })
      .normalize("WID", &raw)
      .unwrap()
  }

  #[test]
  fn test_report_for_clean_definition() {
    let def = unvalidated(json!({
      "initialStatusId": "A",
      "status": {"A": {"transition": "B, C"}, "B": {"transition": "A"}, "C": null}
    }));

    let report = validate("WID", &def);
    assert!(!report.has_errors());
    assert_eq!(report.stats.status_count, 3);
    assert_eq!(report.stats.transition_count, 3);
    assert_eq!(report.stats.end_status_count, 3);
    assert_eq!(report.stats.final_status_ids, vec![id("WID/C")]);
  }

  #[test]
  fn test_report_lists_every_problem() {
    let def = unvalidated(json!({
      "initialStatusId": "Z",
      "status": {"A": {"transition": "B, other/X"}, "C": null}
    }));

    let report = validate("WID", &def);
    assert!(report.has_errors());
    assert_eq!(report.errors.missing_initial_status, Some(id("WID/Z")));
    assert_eq!(report.errors.missing_status, vec![id("WID/B")]);
    assert_eq!(report.errors.unreachable_status, vec![id("WID/A"), id("WID/C")]);
  }

  #[test]
  fn test_initial_status_is_never_unreachable() {
    let def = unvalidated(json!({
      "initialStatusId": "A",
      "status": {"A": {"transition": "B"}, "B": null}
    }));
    assert!(validate("WID", &def).errors.unreachable_status.is_empty());
  }

  #[test]
  fn test_inbound_edges_make_status_reachable() {
    let def = unvalidated(json!({
      "initialStatusId": "A",
      "status": {"A": null, "B": null}
    }));

    assert_eq!(validate("WID", &def).errors.unreachable_status, vec![id("WID/B")]);

    let inbound = [id("WID/B")];
    let report = validate_with_inbound("WID", &def, inbound.iter());
    assert!(report.errors.unreachable_status.is_empty());
  }

  #[test]
  fn test_inbound_edges_borrowed_from_another_definition() {
    let def = unvalidated(json!({
      "initialStatusId": "A",
      "status": {"A": null, "B": null, "C": null}
    }));
    let other = StandardNormalizer::new(NormalizerOptions { validate: false })
      .normalize("other", &json!({"initialStatusId": "X", "status": {"X": {"transition": "WID/C"}}}))
      .unwrap();

    let report = validate_with_inbound("WID", &def, other.transitions().map(|(_, end, _)| end));
    assert_eq!(report.errors.unreachable_status, vec![id("WID/B")]);
    assert_eq!(report.stats.end_status_count, 0);
  }

  #[test]
  fn test_report_serializes_with_camel_case_keys() {
    let def = unvalidated(json!({"initialStatusId": "A", "status": {"A": null, "B": null}}));
    let value = serde_json::to_value(validate("WID", &def)).unwrap();

    assert_eq!(value["errors"], json!({"unreachableStatus": ["WID/B"]}));
    assert_eq!(value["stats"]["statusCount"], json!(2));
    assert_eq!(value["stats"]["finalStatusIds"], json!(["WID/A", "WID/B"]));
  }
}
