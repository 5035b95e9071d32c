//! Event sequence policies.
//!
//! A policy turns one of the three kinds of move into the ordered signals
//! fired around it:
//!
//! | move | basic | extended | reduced |
//! |---|---|---|---|
//! | enter workflow | EnterWorkflow, EnterStatus | each preceded by its `{*}` form | EnterWorkflow |
//! | leave workflow | LeaveStatus, LeaveWorkflow | each preceded by its `{*}` form | LeaveWorkflow |
//! | change status | LeaveStatus, ChangeStatus, EnterStatus | status signals preceded by their `{*}` form | ChangeStatus |

use std::sync::Arc;

use statusflow_workflow::{Status, Transition, Workflow};

use crate::error::EngineError;
use crate::signal::{EventSequence, Phase, Scope, Signal, SignalKind};

/// Produces the signals for each kind of move.
pub trait EventSequenceGenerator: Send + Sync {
  /// Signals for entering `workflow` through `status`.
  ///
  /// Fails with [`EngineError::NotInitialStatus`] unless `status` is the
  /// workflow's initial status.
  fn enter_workflow(
    &self,
    workflow: &Workflow,
    status: &Arc<Status>,
  ) -> Result<EventSequence, EngineError>;

  /// Signals for leaving the workflow of `status`.
  fn leave_workflow(&self, status: &Arc<Status>) -> EventSequence;

  /// Signals for following `transition`.
  fn change_status(&self, transition: &Arc<Transition>) -> EventSequence;
}

/// Fail unless `status` is the initial status of `workflow`.
pub fn ensure_initial(workflow: &Workflow, status: &Status) -> Result<(), EngineError> {
  if workflow.is_initial_status(status.id()) {
    return Ok(());
  }

  Err(EngineError::NotInitialStatus {
    status_id: status.id().clone(),
    workflow_id: workflow.id().to_string(),
    initial_status_id: workflow.initial_status_id().clone(),
  })
}

fn enter_workflow(scope: Scope, status: &Arc<Status>) -> Signal {
  Signal::new(Phase::Before, SignalKind::EnterWorkflow { workflow: scope }).with_status(status.clone())
}

fn leave_workflow(scope: Scope, status: &Arc<Status>) -> Signal {
  Signal::new(Phase::Before, SignalKind::LeaveWorkflow { workflow: scope }).with_status(status.clone())
}

fn enter_status(scope: Scope, status: &Arc<Status>) -> Signal {
  Signal::new(Phase::Before, SignalKind::EnterStatus { status: scope }).with_status(status.clone())
}

fn leave_status(scope: Scope, status: &Arc<Status>) -> Signal {
  Signal::new(Phase::Before, SignalKind::LeaveStatus { status: scope }).with_status(status.clone())
}

fn change_status(transition: &Arc<Transition>) -> Signal {
  Signal::new(
    Phase::Before,
    SignalKind::ChangeStatus {
      start: transition.start().id().clone(),
      end: transition.end().id().clone(),
    },
  )
  .with_status(transition.end().clone())
  .with_transition(transition.clone())
}

fn workflow_scope(status: &Status) -> Scope {
  Scope::named(status.workflow_id())
}

fn status_scope(status: &Status) -> Scope {
  Scope::named(status.id())
}

/// One signal pair per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEventSequence;

impl EventSequenceGenerator for BasicEventSequence {
  fn enter_workflow(
    &self,
    workflow: &Workflow,
    status: &Arc<Status>,
  ) -> Result<EventSequence, EngineError> {
    ensure_initial(workflow, status)?;
    Ok(EventSequence::mirrored(vec![
      enter_workflow(Scope::named(workflow.id()), status),
      enter_status(status_scope(status), status),
    ]))
  }

  fn leave_workflow(&self, status: &Arc<Status>) -> EventSequence {
    EventSequence::mirrored(vec![
      leave_status(status_scope(status), status),
      leave_workflow(workflow_scope(status), status),
    ])
  }

  fn change_status(&self, transition: &Arc<Transition>) -> EventSequence {
    EventSequence::mirrored(vec![
      leave_status(status_scope(transition.start()), transition.start())
        .with_transition(transition.clone()),
      change_status(transition),
      enter_status(status_scope(transition.end()), transition.end())
        .with_transition(transition.clone()),
    ])
  }
}

/// Like [`BasicEventSequence`], with every scoped signal preceded by its wildcard form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedEventSequence;

impl EventSequenceGenerator for ExtendedEventSequence {
  fn enter_workflow(
    &self,
    workflow: &Workflow,
    status: &Arc<Status>,
  ) -> Result<EventSequence, EngineError> {
    ensure_initial(workflow, status)?;
    Ok(EventSequence::mirrored(vec![
      enter_workflow(Scope::Any, status),
      enter_workflow(Scope::named(workflow.id()), status),
      enter_status(Scope::Any, status),
      enter_status(status_scope(status), status),
    ]))
  }

  fn leave_workflow(&self, status: &Arc<Status>) -> EventSequence {
    EventSequence::mirrored(vec![
      leave_status(Scope::Any, status),
      leave_status(status_scope(status), status),
      leave_workflow(Scope::Any, status),
      leave_workflow(workflow_scope(status), status),
    ])
  }

  fn change_status(&self, transition: &Arc<Transition>) -> EventSequence {
    let start = transition.start();
    let end = transition.end();
    EventSequence::mirrored(vec![
      leave_status(Scope::Any, start).with_transition(transition.clone()),
      leave_status(status_scope(start), start).with_transition(transition.clone()),
      change_status(transition),
      enter_status(Scope::Any, end).with_transition(transition.clone()),
      enter_status(status_scope(end), end).with_transition(transition.clone()),
    ])
  }
}

/// Only the coarsest signal of each move.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReducedEventSequence;

impl EventSequenceGenerator for ReducedEventSequence {
  fn enter_workflow(
    &self,
    workflow: &Workflow,
    status: &Arc<Status>,
  ) -> Result<EventSequence, EngineError> {
    ensure_initial(workflow, status)?;
    Ok(EventSequence::mirrored(vec![enter_workflow(
      Scope::named(workflow.id()),
      status,
    )]))
  }

  fn leave_workflow(&self, status: &Arc<Status>) -> EventSequence {
    EventSequence::mirrored(vec![leave_workflow(workflow_scope(status), status)])
  }

  fn change_status(&self, transition: &Arc<Transition>) -> EventSequence {
    EventSequence::mirrored(vec![change_status(transition)])
  }
}

/// Runtime choice between the built-in policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventPolicy {
  #[default]
  Basic,
  Extended,
  Reduced,
}

impl EventPolicy {
  fn generator(&self) -> &'static dyn EventSequenceGenerator {
    match self {
      EventPolicy::Basic => &BasicEventSequence,
      EventPolicy::Extended => &ExtendedEventSequence,
      EventPolicy::Reduced => &ReducedEventSequence,
    }
  }
}

impl std::str::FromStr for EventPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "basic" => Ok(EventPolicy::Basic),
      "extended" => Ok(EventPolicy::Extended),
      "reduced" => Ok(EventPolicy::Reduced),
      other => Err(format!("unknown event policy: {}", other)),
    }
  }
}

impl EventSequenceGenerator for EventPolicy {
  fn enter_workflow(
    &self,
    workflow: &Workflow,
    status: &Arc<Status>,
  ) -> Result<EventSequence, EngineError> {
    self.generator().enter_workflow(workflow, status)
  }

  fn leave_workflow(&self, status: &Arc<Status>) -> EventSequence {
    self.generator().leave_workflow(status)
  }

  fn change_status(&self, transition: &Arc<Transition>) -> EventSequence {
    self.generator().change_status(transition)
  }
}
