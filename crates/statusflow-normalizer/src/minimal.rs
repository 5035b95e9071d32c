use indexmap::IndexMap;
use serde_json::Value;
use statusflow_config::{Metadata, StatusDefinition, StatusId, TransitionDefinition, WorkflowDefinition};
use tracing::{debug, instrument};

use crate::error::NormalizeError;
use crate::normalizer::{
  IdIndex, Normalizer, NormalizerOptions, ensure_workflow_id, resolve_end_id, resolve_start_id,
  split_id_list,
};

/// Normalizer for the minimal dialect: a flat map from status id to its end ids.
///
/// The first entry is the initial status.
///
/// ```json
/// { "A": "B, C", "B": ["A"], "C": null }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MinimalNormalizer {
  options: NormalizerOptions,
}

impl MinimalNormalizer {
  pub fn new(options: NormalizerOptions) -> Self {
    Self { options }
  }

  pub fn options(&self) -> NormalizerOptions {
    self.options
  }

  fn end_ids<'a>(&self, start: &StatusId, targets: &'a Value) -> Result<Vec<&'a str>, NormalizeError> {
    match targets {
      Value::Null => Ok(Vec::new()),
      Value::String(list) => Ok(split_id_list(list)),
      Value::Array(items) => items
        .iter()
        .map(|item| match item {
          Value::String(end) => Ok(end.as_str()),
          Value::Object(_) => Err(NormalizeError::AssociativeNotSupported {
            status_id: start.clone(),
          }),
          _ => Err(NormalizeError::InvalidTransitionList {
            status_id: start.clone(),
          }),
        })
        .collect(),
      Value::Object(_) => Err(NormalizeError::AssociativeNotSupported {
        status_id: start.clone(),
      }),
      _ => Err(NormalizeError::InvalidTransitionList {
        status_id: start.clone(),
      }),
    }
  }
}

impl Normalizer for MinimalNormalizer {
  #[instrument(name = "normalize_minimal", skip(self, raw))]
  fn normalize(&self, workflow_id: &str, raw: &Value) -> Result<WorkflowDefinition, NormalizeError> {
    ensure_workflow_id(workflow_id)?;

    let entries = raw.as_object().ok_or_else(|| NormalizeError::NotAMap {
      workflow_id: workflow_id.to_string(),
    })?;

    let mut index = IdIndex::default();
    let mut statuses = IndexMap::new();
    let mut initial_status_id = None;

    for (raw_id, targets) in entries {
      let start = resolve_start_id(workflow_id, raw_id)?;
      index.add_start(&start)?;
      if initial_status_id.is_none() {
        initial_status_id = Some(start.clone());
      }

      let mut status = StatusDefinition::default();
      for raw_end in self.end_ids(&start, targets)? {
        let end = resolve_end_id(workflow_id, raw_end)?;
        index.add_end(&end);
        status.transitions.insert(end, TransitionDefinition::default());
      }
      statuses.insert(start, status);
    }

    let initial_status_id = initial_status_id.ok_or_else(|| NormalizeError::EmptyDefinition {
      workflow_id: workflow_id.to_string(),
    })?;

    if self.options.validate {
      index.check(workflow_id, &initial_status_id)?;
    }

    debug!(
      workflow_id = %workflow_id,
      statuses = statuses.len(),
      "minimal definition normalized"
    );

    Ok(WorkflowDefinition {
      initial_status_id,
      statuses,
      extra: Metadata::new(),
    })
  }
}
