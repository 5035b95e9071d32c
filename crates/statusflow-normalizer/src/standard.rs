use indexmap::IndexMap;
use serde_json::Value;
use statusflow_config::{
  IdContext, KEY_INITIAL, KEY_INITIAL_STATUS_ID, KEY_LABEL, KEY_METADATA, KEY_STATUS,
  KEY_TRANSITION, Metadata, StatusDefinition, StatusId, TransitionDefinition, WorkflowDefinition,
  parse_status_id,
};
use tracing::{debug, instrument};

use crate::error::NormalizeError;
use crate::normalizer::{
  IdIndex, Normalizer, NormalizerOptions, ensure_workflow_id, resolve_end_id, resolve_start_id,
  split_id_list,
};

/// Normalizer for the full definition dialect.
///
/// ```json
/// {
///   "initialStatusId": "draft",
///   "status": {
///     "draft": { "label": "Draft", "transition": "review, trash" },
///     "review": { "transition": { "published": { "metadata": { "role": "editor" } } } },
///     "published": null,
///     "trash": null
///   }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StandardNormalizer {
  options: NormalizerOptions,
}

impl StandardNormalizer {
  /// Create a normalizer with the given options.
  pub fn new(options: NormalizerOptions) -> Self {
    Self { options }
  }

  pub fn options(&self) -> NormalizerOptions {
    self.options
  }

  /// Normalize one status entry of the status section.
  fn normalize_status(
    &self,
    workflow_id: &str,
    raw_id: &str,
    body: Option<&Value>,
    index: &mut IdIndex,
  ) -> Result<(StatusId, StatusDefinition), NormalizeError> {
    let status_id = resolve_start_id(workflow_id, raw_id)?;
    index.add_start(&status_id)?;

    let mut status = StatusDefinition::default();
    let body = match body {
      None | Some(Value::Null) | Some(Value::String(_)) => return Ok((status_id, status)),
      Some(Value::Object(body)) => body,
      Some(_) => return Err(NormalizeError::InvalidStatusBody { status_id }),
    };

    for (key, value) in body {
      match key.as_str() {
        KEY_LABEL => match value {
          Value::String(label) => status.label = Some(label.clone()),
          Value::Null => {}
          _ => {
            return Err(NormalizeError::InvalidLabel {
              status_id: status_id.clone(),
            });
          }
        },
        KEY_METADATA => {
          status.metadata = Some(expect_metadata(value, &status_id.to_string())?);
        }
        KEY_TRANSITION => {
          status.transitions = self.normalize_transitions(workflow_id, &status_id, value, index)?;
        }
        _ => {
          status.extra.insert(key.clone(), value.clone());
        }
      }
    }

    Ok((status_id, status))
  }

  /// Normalize the `transition` property of a status.
  fn normalize_transitions(
    &self,
    workflow_id: &str,
    start: &StatusId,
    value: &Value,
    index: &mut IdIndex,
  ) -> Result<IndexMap<StatusId, TransitionDefinition>, NormalizeError> {
    let mut transitions = IndexMap::new();

    match value {
      Value::Null => {}
      Value::String(list) => {
        for raw_end in split_id_list(list) {
          let end = resolve_end_id(workflow_id, raw_end)?;
          index.add_end(&end);
          transitions.insert(end, TransitionDefinition::default());
        }
      }
      Value::Array(items) => {
        for item in items {
          let raw_end = item
            .as_str()
            .ok_or_else(|| NormalizeError::InvalidTransitionList {
              status_id: start.clone(),
            })?;
          let end = resolve_end_id(workflow_id, raw_end)?;
          index.add_end(&end);
          transitions.insert(end, TransitionDefinition::default());
        }
      }
      Value::Object(entries) => {
        for (raw_end, body) in entries {
          let end = resolve_end_id(workflow_id, raw_end)?;
          let transition = normalize_transition_body(start, &end, body)?;
          index.add_end(&end);
          transitions.insert(end, transition);
        }
      }
      _ => {
        return Err(NormalizeError::InvalidTransitionList {
          status_id: start.clone(),
        });
      }
    }

    Ok(transitions)
  }
}

fn normalize_transition_body(
  start: &StatusId,
  end: &StatusId,
  body: &Value,
) -> Result<TransitionDefinition, NormalizeError> {
  let mut transition = TransitionDefinition::default();

  let body = match body {
    Value::Null => return Ok(transition),
    Value::Object(body) => body,
    _ => {
      return Err(NormalizeError::InvalidTransitionBody {
        start: start.clone(),
        end: end.clone(),
      });
    }
  };

  for (key, value) in body {
    if key == KEY_METADATA {
      transition.metadata = expect_metadata(value, &format!("{}-{}", start, end))?;
    } else {
      transition.extra.insert(key.clone(), value.clone());
    }
  }

  Ok(transition)
}

fn expect_metadata(value: &Value, owner: &str) -> Result<Metadata, NormalizeError> {
  match value {
    Value::Object(map) => Ok(map.clone()),
    _ => Err(NormalizeError::InvalidMetadata {
      owner: owner.to_string(),
    }),
  }
}

/// A list entry is either a bare id or a single-key `{id: body}` map.
fn list_entry(entry: &Value) -> Option<(&str, Option<&Value>)> {
  match entry {
    Value::String(raw_id) => Some((raw_id.as_str(), None)),
    Value::Object(keyed) if keyed.len() == 1 => {
      let (raw_id, body) = keyed.iter().next()?;
      Some((raw_id.as_str(), Some(body)))
    }
    _ => None,
  }
}

impl Normalizer for StandardNormalizer {
  #[instrument(name = "normalize_standard", skip(self, raw))]
  fn normalize(&self, workflow_id: &str, raw: &Value) -> Result<WorkflowDefinition, NormalizeError> {
    ensure_workflow_id(workflow_id)?;

    let definition = raw.as_object().ok_or_else(|| NormalizeError::NotAMap {
      workflow_id: workflow_id.to_string(),
    })?;

    let raw_initial = definition
      .get(KEY_INITIAL_STATUS_ID)
      .or_else(|| definition.get(KEY_INITIAL))
      .ok_or_else(|| NormalizeError::MissingInitialStatusId {
        workflow_id: workflow_id.to_string(),
      })?
      .as_str()
      .ok_or_else(|| NormalizeError::InvalidInitialStatusId {
        workflow_id: workflow_id.to_string(),
      })?;

    let initial_status_id = parse_status_id(raw_initial, IdContext::workflow(workflow_id))?;
    if !initial_status_id.belongs_to(workflow_id) {
      return Err(NormalizeError::CrossWorkflowInitialStatus {
        workflow_id: workflow_id.to_string(),
        status_id: initial_status_id,
      });
    }

    let section = definition
      .get(KEY_STATUS)
      .ok_or_else(|| NormalizeError::MissingStatusSection {
        workflow_id: workflow_id.to_string(),
      })?;

    let mut index = IdIndex::default();
    let mut statuses = IndexMap::new();

    match section {
      Value::Object(entries) => {
        for (raw_id, body) in entries {
          let (id, status) = self.normalize_status(workflow_id, raw_id, Some(body), &mut index)?;
          statuses.insert(id, status);
        }
      }
      Value::Array(entries) => {
        for entry in entries {
          let (raw_id, body) = list_entry(entry).ok_or_else(|| NormalizeError::InvalidStatusSection {
            workflow_id: workflow_id.to_string(),
          })?;
          let (id, status) = self.normalize_status(workflow_id, raw_id, body, &mut index)?;
          statuses.insert(id, status);
        }
      }
      _ => {
        return Err(NormalizeError::InvalidStatusSection {
          workflow_id: workflow_id.to_string(),
        });
      }
    }

    let extra: Metadata = definition
      .iter()
      .filter(|(key, _)| !matches!(key.as_str(), KEY_INITIAL_STATUS_ID | KEY_INITIAL | KEY_STATUS))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    if self.options.validate {
      index.check(workflow_id, &initial_status_id)?;
    }

    debug!(
      workflow_id = %workflow_id,
      statuses = statuses.len(),
      transitions = index.ends.len(),
      "definition normalized"
    );

    Ok(WorkflowDefinition {
      initial_status_id,
      statuses,
      extra,
    })
  }
}
