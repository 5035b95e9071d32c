//! The status-change state machine.
//!
//! An entity is either in no status or in exactly one status. A move request
//! names the current and the requested status (either may be absent), which
//! selects one of four cases:
//!
//! | current | requested | move |
//! |---|---|---|
//! | none | none | nothing happens |
//! | none | S | enter the workflow of S (S must be its initial status) |
//! | C | none | leave the workflow of C |
//! | C | S | follow the transition C -> S (a reflexive move without one is a no-op) |

use std::sync::Arc;

use statusflow_config::{IdContext, StatusId, parse_status_id};
use statusflow_normalizer::{Normalizer, StandardNormalizer};
use statusflow_workflow::{DefinitionProvider, Status, StoreError, Transition, WorkflowStore};
use tracing::{debug, info, instrument};

use crate::error::EngineError;
use crate::handlers::{HandlerOutcome, HandlerRegistry};
use crate::policy::{EventSequenceGenerator, ensure_initial};
use crate::scenario;
use crate::signal::EventSequence;

/// Result of resolving a move.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
  /// Status after the move, `None` when outside any workflow.
  pub next_status: Option<Arc<Status>>,
  /// Scenario labels, always produced.
  pub scenarios: Vec<String>,
  /// Lifecycle signals, empty when no policy is configured.
  pub events: EventSequence,
}

impl Resolution {
  fn unchanged(status: Option<Arc<Status>>) -> Self {
    Self {
      next_status: status,
      ..Self::default()
    }
  }

  /// True if nothing fires for this move.
  pub fn is_noop(&self) -> bool {
    self.scenarios.is_empty() && self.events.is_empty()
  }

  pub fn next_status_id(&self) -> Option<&StatusId> {
    self.next_status.as_ref().map(|s| s.id())
  }
}

/// Result of [`TransitionResolver::send_to_status`].
#[derive(Debug, Clone)]
pub struct MoveOutcome {
  /// Status after the attempt: the requested one, or the current one if blocked.
  pub status: Option<Arc<Status>>,
  /// False if a `before` handler blocked the move.
  pub moved: bool,
  /// Messages returned by handlers, in dispatch order.
  pub messages: Vec<String>,
  pub resolution: Resolution,
}

/// A status reachable in one move.
#[derive(Debug, Clone)]
pub struct NextStatus {
  pub status: Arc<Status>,
  /// The transition followed, `None` when entering a workflow.
  pub transition: Option<Arc<Transition>>,
  /// Whether `before` handlers allow the move; `None` when no handlers were given.
  pub allowed: Option<bool>,
  pub messages: Vec<String>,
}

/// Decides what a requested move means and what it fires.
pub struct TransitionResolver<'s, P, N = StandardNormalizer> {
  store: &'s WorkflowStore<P, N>,
  policy: Option<Arc<dyn EventSequenceGenerator>>,
}

impl<'s, P: DefinitionProvider, N: Normalizer> TransitionResolver<'s, P, N> {
  /// A resolver producing scenario labels only.
  pub fn new(store: &'s WorkflowStore<P, N>) -> Self {
    Self { store, policy: None }
  }

  /// Also produce lifecycle signals with `policy`.
  pub fn with_policy(mut self, policy: impl EventSequenceGenerator + 'static) -> Self {
    self.policy = Some(Arc::new(policy));
    self
  }

  pub fn store(&self) -> &'s WorkflowStore<P, N> {
    self.store
  }

  pub fn has_policy(&self) -> bool {
    self.policy.is_some()
  }

  /// Resolve a move from `current` to `requested`.
  #[instrument(
    name = "resolve_move",
    skip_all,
    fields(
      from = %display_id(current),
      to = %display_id(requested),
    )
  )]
  pub fn resolve(
    &self,
    current: Option<&Arc<Status>>,
    requested: Option<&Arc<Status>>,
  ) -> Result<Resolution, EngineError> {
    let resolution = match (current, requested) {
      (None, None) => Resolution::unchanged(None),
      (None, Some(status)) => self.enter_workflow(status)?,
      (Some(status), None) => self.leave_workflow(status),
      (Some(current), Some(requested)) => self.change_status(current, requested)?,
    };

    debug!(
      next_status = %display_id(resolution.next_status.as_ref()),
      scenarios = resolution.scenarios.len(),
      signals = resolution.events.before.len(),
      "move_resolved"
    );
    Ok(resolution)
  }

  /// Like [`resolve`](Self::resolve), taking raw ids.
  ///
  /// `current` is resolved against `default_workflow_id`; `requested` against the
  /// workflow of the current status, or `default_workflow_id` when there is none.
  pub fn resolve_raw(
    &self,
    current: Option<&str>,
    requested: Option<&str>,
    default_workflow_id: Option<&str>,
  ) -> Result<Resolution, EngineError> {
    let (current, requested) = self.lookup(current, requested, default_workflow_id)?;
    self.resolve(current.as_ref(), requested.as_ref())
  }

  /// Look up raw current and requested ids as statuses.
  pub fn lookup(
    &self,
    current: Option<&str>,
    requested: Option<&str>,
    default_workflow_id: Option<&str>,
  ) -> Result<(Option<Arc<Status>>, Option<Arc<Status>>), EngineError> {
    let context = IdContext {
      workflow_id: default_workflow_id,
      status: None,
    };

    let current = current
      .map(|raw| self.status(raw, context))
      .transpose()?;

    let context = match &current {
      Some(status) => IdContext::status(status.id()),
      None => context,
    };
    let requested = requested
      .map(|raw| self.status(raw, context))
      .transpose()?;

    Ok((current, requested))
  }

  fn status(&self, raw: &str, context: IdContext<'_>) -> Result<Arc<Status>, EngineError> {
    let id = parse_status_id(raw, context)?;
    Ok(self.store.status(&id)?)
  }

  fn enter_workflow(&self, status: &Arc<Status>) -> Result<Resolution, EngineError> {
    let workflow_id = status.workflow_id();
    let workflow = self
      .store
      .get_workflow(workflow_id)?
      .ok_or_else(|| StoreError::WorkflowNotFound {
        workflow_id: workflow_id.to_string(),
      })?;

    ensure_initial(&workflow, status)?;

    let events = match &self.policy {
      Some(policy) => policy.enter_workflow(&workflow, status)?,
      None => EventSequence::default(),
    };

    Ok(Resolution {
      next_status: Some(status.clone()),
      scenarios: scenario::entering(status.id()),
      events,
    })
  }

  fn leave_workflow(&self, status: &Arc<Status>) -> Resolution {
    Resolution {
      next_status: None,
      scenarios: scenario::leaving(status.id()),
      events: self
        .policy
        .as_ref()
        .map(|policy| policy.leave_workflow(status))
        .unwrap_or_default(),
    }
  }

  fn change_status(
    &self,
    current: &Arc<Status>,
    requested: &Arc<Status>,
  ) -> Result<Resolution, EngineError> {
    let Some(transition) = self.store.transition(current.id(), requested.id())? else {
      if current.id() == requested.id() {
        debug!(status = %current.id(), "reflexive move without transition");
        return Ok(Resolution::unchanged(Some(requested.clone())));
      }
      return Err(EngineError::NoTransitionFound {
        start: current.id().clone(),
        end: requested.id().clone(),
      });
    };

    Ok(Resolution {
      next_status: Some(requested.clone()),
      scenarios: scenario::changing(current.id(), requested.id()),
      events: self
        .policy
        .as_ref()
        .map(|policy| policy.change_status(&transition))
        .unwrap_or_default(),
    })
  }

  /// Resolve a move and run it through `handlers`.
  ///
  /// `before` signals are dispatched first; if a handler blocks the move the
  /// outcome keeps `current`. Otherwise `after` signals are dispatched and the
  /// outcome carries the new status.
  pub fn send_to_status(
    &self,
    current: Option<&Arc<Status>>,
    requested: Option<&Arc<Status>>,
    handlers: &HandlerRegistry,
  ) -> Result<MoveOutcome, EngineError> {
    let resolution = self.resolve(current, requested)?;

    let before = handlers.dispatch_before(&resolution.events.before);
    if !before.proceed {
      info!(
        from = %display_id(current),
        to = %display_id(requested),
        messages = before.messages.len(),
        "move_blocked"
      );
      return Ok(MoveOutcome {
        status: current.cloned(),
        moved: false,
        messages: before.messages,
        resolution,
      });
    }

    let mut messages = before.messages;
    messages.extend(handlers.dispatch_after(&resolution.events.after));

    Ok(MoveOutcome {
      status: resolution.next_status.clone(),
      moved: true,
      messages,
      resolution,
    })
  }

  /// Statuses reachable in one move from `current`.
  ///
  /// Outside any workflow the only candidate is the initial status of
  /// `entry_workflow_id`; without one the list is empty. When `handlers` is
  /// given, each candidate's `before` signals are dispatched to report whether
  /// the move would be allowed.
  pub fn next_statuses(
    &self,
    current: Option<&Arc<Status>>,
    entry_workflow_id: Option<&str>,
    handlers: Option<&HandlerRegistry>,
  ) -> Result<Vec<NextStatus>, EngineError> {
    let candidates: Vec<(Arc<Status>, Option<Arc<Transition>>)> = match current {
      Some(status) => self
        .store
        .transitions(status.id())?
        .into_iter()
        .map(|t| (t.end().clone(), Some(t)))
        .collect(),
      None => match entry_workflow_id {
        Some(workflow_id) => {
          let workflow = self.store.get_workflow(workflow_id)?.ok_or_else(|| {
            StoreError::WorkflowNotFound {
              workflow_id: workflow_id.to_string(),
            }
          })?;
          vec![(self.store.status(workflow.initial_status_id())?, None)]
        }
        None => Vec::new(),
      },
    };

    candidates
      .into_iter()
      .map(|(status, transition)| -> Result<NextStatus, EngineError> {
        let outcome = match handlers {
          Some(handlers) => {
            let resolution = self.resolve(current, Some(&status))?;
            Some(handlers.dispatch_before(&resolution.events.before))
          }
          None => None,
        };
        let (allowed, messages) = match outcome {
          Some(HandlerOutcome { proceed, messages }) => (Some(proceed), messages),
          None => (None, Vec::new()),
        };

        Ok(NextStatus {
          status,
          transition,
          allowed,
          messages,
        })
      })
      .collect()
  }
}

/// Status id for log fields, `-` outside any workflow.
fn display_id(status: Option<&Arc<Status>>) -> String {
  status.map_or_else(|| "-".to_string(), |s| s.id().to_string())
}
