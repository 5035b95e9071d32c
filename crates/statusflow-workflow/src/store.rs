//! Workflow graph store.
//!
//! The store lazily materializes workflows, statuses and transitions from
//! normalized definitions and memoizes them. Definitions are either registered
//! explicitly or fetched from the [`DefinitionProvider`] on first access.
//!
//! Caches are only ever invalidated by [`WorkflowStore::register_definition`]
//! with `overwrite = true`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use statusflow_config::{IdContext, StatusId, WorkflowDefinition, parse_status_id};
use statusflow_normalizer::{Normalizer, StandardNormalizer, ValidationReport, validate_with_inbound};
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::factory::{ObjectFactory, TypeMap};
use crate::label::humanize;
use crate::provider::DefinitionProvider;
use crate::status::{Status, StatusParts};
use crate::transition::{Transition, TransitionParts};
use crate::workflow::{Workflow, WorkflowParts};

/// Configuration for a [`WorkflowStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig<N = StandardNormalizer> {
  /// Normalizer (dialect) applied to every definition.
  pub normalizer: N,
  /// Constructors for the materialized objects.
  pub type_map: TypeMap,
}

impl Default for StoreConfig<StandardNormalizer> {
  fn default() -> Self {
    Self {
      normalizer: StandardNormalizer::default(),
      type_map: TypeMap::standard(),
    }
  }
}

/// A registered definition: the raw input and its normalized form.
#[derive(Debug, Clone)]
struct DefinitionEntry {
  raw: Value,
  normalized: Arc<WorkflowDefinition>,
}

type TransitionList = Arc<Vec<Arc<Transition>>>;

/// Lazily built, memoized workflow graph.
///
/// Lookups take `&self`. Callers sharing one store across threads get
/// consistent objects: each canonical id is materialized into a single shared
/// instance even if two callers race on first access.
pub struct WorkflowStore<P, N = StandardNormalizer> {
  provider: P,
  normalizer: N,
  factory: ObjectFactory,
  definitions: RwLock<HashMap<String, DefinitionEntry>>,
  workflows: RwLock<HashMap<String, Arc<Workflow>>>,
  statuses: RwLock<HashMap<StatusId, Arc<Status>>>,
  transitions: RwLock<HashMap<StatusId, TransitionList>>,
}

impl<P: DefinitionProvider> WorkflowStore<P, StandardNormalizer> {
  /// Create a store with the standard dialect and default object types.
  pub fn new(provider: P) -> Self {
    Self::build(provider, StandardNormalizer::default(), ObjectFactory::default())
  }
}

impl<P: DefinitionProvider, N: Normalizer> WorkflowStore<P, N> {
  /// Create a store from an explicit configuration.
  ///
  /// Fails if the type map does not cover every object role.
  pub fn with_config(provider: P, config: StoreConfig<N>) -> Result<Self, StoreError> {
    let factory = ObjectFactory::from_type_map(config.type_map)?;
    Ok(Self::build(provider, config.normalizer, factory))
  }

  fn build(provider: P, normalizer: N, factory: ObjectFactory) -> Self {
    Self {
      provider,
      normalizer,
      factory,
      definitions: RwLock::new(HashMap::new()),
      workflows: RwLock::new(HashMap::new()),
      statuses: RwLock::new(HashMap::new()),
      transitions: RwLock::new(HashMap::new()),
    }
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  pub fn normalizer(&self) -> &N {
    &self.normalizer
  }

  /// Normalize and register a raw definition.
  ///
  /// Returns `false` without doing anything if a definition is already present
  /// and `overwrite` is false. Overwriting purges every cached object that
  /// belongs to, or points into, the workflow.
  #[instrument(skip(self, raw))]
  pub fn register_definition(
    &self,
    workflow_id: &str,
    raw: Value,
    overwrite: bool,
  ) -> Result<bool, StoreError> {
    if !overwrite && read(&self.definitions, "definition")?.contains_key(workflow_id) {
      debug!(workflow_id = %workflow_id, "definition already registered");
      return Ok(false);
    }

    let normalized = Arc::new(self.normalizer.normalize(workflow_id, &raw)?);
    let replaced = write(&self.definitions, "definition")?
      .insert(workflow_id.to_string(), DefinitionEntry { raw, normalized })
      .is_some();

    if replaced {
      self.purge(workflow_id)?;
    }

    info!(workflow_id = %workflow_id, replaced, "definition registered");
    Ok(true)
  }

  /// True if a definition for `workflow_id` is registered (without asking the provider).
  pub fn has_definition(&self, workflow_id: &str) -> Result<bool, StoreError> {
    Ok(read(&self.definitions, "definition")?.contains_key(workflow_id))
  }

  /// Ids of every registered workflow.
  pub fn workflow_ids(&self) -> Result<Vec<String>, StoreError> {
    let mut ids: Vec<String> = read(&self.definitions, "definition")?.keys().cloned().collect();
    ids.sort();
    Ok(ids)
  }

  /// The raw definition as it was registered or provided.
  pub fn raw_definition(&self, workflow_id: &str) -> Result<Option<Value>, StoreError> {
    self.load_definition(workflow_id)?;
    Ok(
      read(&self.definitions, "definition")?
        .get(workflow_id)
        .map(|entry| entry.raw.clone()),
    )
  }

  /// The normalized definition, fetching it from the provider if needed.
  pub fn definition(&self, workflow_id: &str) -> Result<Option<Arc<WorkflowDefinition>>, StoreError> {
    self.load_definition(workflow_id)
  }

  fn load_definition(&self, workflow_id: &str) -> Result<Option<Arc<WorkflowDefinition>>, StoreError> {
    if let Some(entry) = read(&self.definitions, "definition")?.get(workflow_id) {
      return Ok(Some(entry.normalized.clone()));
    }

    let Some(raw) = self.provider.get_definition(workflow_id)? else {
      debug!(workflow_id = %workflow_id, "no definition available");
      return Ok(None);
    };

    let normalized = Arc::new(self.normalizer.normalize(workflow_id, &raw)?);
    let mut definitions = write(&self.definitions, "definition")?;
    let entry = definitions
      .entry(workflow_id.to_string())
      .or_insert(DefinitionEntry { raw, normalized });

    info!(workflow_id = %workflow_id, "definition loaded from provider");
    Ok(Some(entry.normalized.clone()))
  }

  /// Load every definition the provider lists. Returns how many were listed.
  pub fn load_all(&self) -> Result<usize, StoreError> {
    let ids = self.provider.workflow_ids()?;
    for workflow_id in &ids {
      self.load_definition(workflow_id)?;
    }
    debug!(count = ids.len(), "provider definitions loaded");
    Ok(ids.len())
  }

  fn require_definition(&self, workflow_id: &str) -> Result<Arc<WorkflowDefinition>, StoreError> {
    self
      .load_definition(workflow_id)?
      .ok_or_else(|| StoreError::WorkflowNotFound {
        workflow_id: workflow_id.to_string(),
      })
  }

  /// Get a workflow, or `None` if no definition exists for it.
  pub fn get_workflow(&self, workflow_id: &str) -> Result<Option<Arc<Workflow>>, StoreError> {
    if let Some(workflow) = read(&self.workflows, "workflow")?.get(workflow_id) {
      return Ok(Some(workflow.clone()));
    }

    let Some(definition) = self.load_definition(workflow_id)? else {
      return Ok(None);
    };

    let workflow = self.factory.create_workflow(WorkflowParts {
      id: workflow_id.to_string(),
      initial_status_id: definition.initial_status_id.clone(),
      metadata: definition.metadata(),
    });

    let mut workflows = write(&self.workflows, "workflow")?;
    Ok(Some(
      workflows
        .entry(workflow_id.to_string())
        .or_insert(workflow)
        .clone(),
    ))
  }

  /// Resolve `raw_id` against `context` and return the status.
  pub fn get_status(&self, raw_id: &str, context: IdContext<'_>) -> Result<Arc<Status>, StoreError> {
    let id = parse_status_id(raw_id, context)?;
    self.status(&id)
  }

  /// Return the status with canonical id `id`, materializing it on first access.
  pub fn status(&self, id: &StatusId) -> Result<Arc<Status>, StoreError> {
    if let Some(status) = read(&self.statuses, "status")?.get(id) {
      return Ok(status.clone());
    }

    let definition = self.require_definition(id.workflow_id())?;
    let declared = definition
      .status(id)
      .ok_or_else(|| StoreError::StatusNotFound {
        status_id: id.clone(),
      })?;

    let status = self.factory.create_status(StatusParts {
      id: id.clone(),
      label: declared
        .label
        .clone()
        .unwrap_or_else(|| humanize(id.local_id())),
      metadata: declared.metadata.clone().unwrap_or_default(),
      outgoing: declared.transitions.keys().cloned().collect(),
    });

    let mut statuses = write(&self.statuses, "status")?;
    Ok(statuses.entry(id.clone()).or_insert(status).clone())
  }

  /// Every declared status of `workflow_id`, in declaration order.
  pub fn get_all_statuses(&self, workflow_id: &str) -> Result<Vec<Arc<Status>>, StoreError> {
    let definition = self.require_definition(workflow_id)?;
    definition.statuses.keys().map(|id| self.status(id)).collect()
  }

  /// Outgoing transitions of the status `raw_id` resolves to.
  pub fn get_transitions(
    &self,
    raw_id: &str,
    context: IdContext<'_>,
  ) -> Result<Vec<Arc<Transition>>, StoreError> {
    let id = parse_status_id(raw_id, context)?;
    self.transitions(&id)
  }

  /// Outgoing transitions of `start`, in declaration order.
  pub fn transitions(&self, start: &StatusId) -> Result<Vec<Arc<Transition>>, StoreError> {
    if let Some(list) = read(&self.transitions, "transition")?.get(start) {
      return Ok(list.as_ref().clone());
    }

    let start_status = self.status(start)?;
    let definition = self.require_definition(start.workflow_id())?;
    let declared = definition
      .status(start)
      .ok_or_else(|| StoreError::StatusNotFound {
        status_id: start.clone(),
      })?;

    let mut list = Vec::with_capacity(declared.transitions.len());
    for (end, body) in &declared.transitions {
      let end_status = match self.status(end) {
        Ok(status) => status,
        Err(StoreError::StatusNotFound { .. } | StoreError::WorkflowNotFound { .. }) => {
          return Err(StoreError::TransitionTargetNotFound {
            start: start.clone(),
            end: end.clone(),
          });
        }
        Err(e) => return Err(e),
      };

      list.push(self.factory.create_transition(TransitionParts {
        start: start_status.clone(),
        end: end_status,
        metadata: body.metadata.clone(),
      }));
    }

    debug!(start = %start, count = list.len(), "transitions materialized");

    let mut transitions = write(&self.transitions, "transition")?;
    let cached = transitions
      .entry(start.clone())
      .or_insert_with(|| Arc::new(list));
    Ok(cached.as_ref().clone())
  }

  /// The transition from `raw_start` to `raw_end`, if one is declared.
  pub fn get_transition(
    &self,
    raw_start: &str,
    raw_end: &str,
    context: IdContext<'_>,
  ) -> Result<Option<Arc<Transition>>, StoreError> {
    let start = parse_status_id(raw_start, context)?;
    let end = parse_status_id(raw_end, context)?;
    self.transition(&start, &end)
  }

  /// The transition from `start` to `end`, if one is declared.
  pub fn transition(&self, start: &StatusId, end: &StatusId) -> Result<Option<Arc<Transition>>, StoreError> {
    Ok(
      self
        .transitions(start)?
        .into_iter()
        .find(|t| t.end().id() == end),
    )
  }

  /// True if no transition leaves `id`.
  pub fn is_final_status(&self, id: &StatusId) -> Result<bool, StoreError> {
    Ok(self.status(id)?.is_final())
  }

  /// Structural report for `workflow_id`.
  ///
  /// Every definition the provider lists is loaded first. Transitions declared
  /// by every other known workflow count as inbound edges when looking for
  /// unreachable statuses.
  pub fn validate_workflow(&self, workflow_id: &str) -> Result<ValidationReport, StoreError> {
    let definition = self.require_definition(workflow_id)?;
    self.load_all()?;

    let definitions = read(&self.definitions, "definition")?;
    let inbound: Vec<StatusId> = definitions
      .iter()
      .filter(|(id, _)| id.as_str() != workflow_id)
      .flat_map(|(_, entry)| {
        entry
          .normalized
          .transitions()
          .map(|(_, end, _)| end.clone())
          .collect::<Vec<_>>()
      })
      .filter(|end| end.belongs_to(workflow_id))
      .collect();

    Ok(validate_with_inbound(workflow_id, &definition, inbound.iter()))
  }

  /// Drop every cached object of `workflow_id` and every transition list touching it.
  fn purge(&self, workflow_id: &str) -> Result<(), StoreError> {
    write(&self.workflows, "workflow")?.remove(workflow_id);
    write(&self.statuses, "status")?.retain(|id, _| !id.belongs_to(workflow_id));
    write(&self.transitions, "transition")?.retain(|start, list| {
      !start.belongs_to(workflow_id) && !list.iter().any(|t| t.end().id().belongs_to(workflow_id))
    });

    debug!(workflow_id = %workflow_id, "cached objects purged");
    Ok(())
  }
}

fn read<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockReadGuard<'a, T>, StoreError> {
  lock
    .read()
    .map_err(|e| StoreError::CachePoisoned(format!("{} cache: {}", name, e)))
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
  lock
    .write()
    .map_err(|e| StoreError::CachePoisoned(format!("{} cache: {}", name, e)))
}
