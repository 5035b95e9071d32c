//! Lifecycle signals emitted around a status change.
//!
//! Signal names are matched verbatim by subscribers:
//! ```text
//! beforeEnterWorkflow{post}        afterEnterWorkflow{*}
//! beforeEnterStatus{post/draft}    afterLeaveStatus{*}
//! beforeLeaveWorkflow{post}        afterChangeStatusFrom{post/draft}to{post/done}
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use statusflow_config::StatusId;
use statusflow_workflow::{Status, Transition};

/// Scope payload of the wildcard form.
pub const ANY: &str = "*";

/// Whether a signal fires before or after the status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  Before,
  After,
}

impl Phase {
  pub fn prefix(&self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::After => "after",
    }
  }
}

/// A signal scope: one workflow or status, or any of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Scope {
  Any,
  Named(String),
}

impl Scope {
  pub fn named(name: impl fmt::Display) -> Self {
    Scope::Named(name.to_string())
  }

  pub fn is_any(&self) -> bool {
    matches!(self, Scope::Any)
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::Any => f.write_str(ANY),
      Scope::Named(name) => f.write_str(name),
    }
  }
}

impl From<Scope> for String {
  fn from(scope: Scope) -> Self {
    scope.to_string()
  }
}

/// What a signal is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SignalKind {
  EnterWorkflow { workflow: Scope },
  LeaveWorkflow { workflow: Scope },
  EnterStatus { status: Scope },
  LeaveStatus { status: Scope },
  ChangeStatus { start: StatusId, end: StatusId },
}

impl SignalKind {
  /// The signal name without its phase prefix, e.g. `EnterStatus{post/draft}`.
  pub fn suffix(&self) -> String {
    match self {
      SignalKind::EnterWorkflow { workflow } => format!("EnterWorkflow{{{}}}", workflow),
      SignalKind::LeaveWorkflow { workflow } => format!("LeaveWorkflow{{{}}}", workflow),
      SignalKind::EnterStatus { status } => format!("EnterStatus{{{}}}", status),
      SignalKind::LeaveStatus { status } => format!("LeaveStatus{{{}}}", status),
      SignalKind::ChangeStatus { start, end } => {
        format!("ChangeStatusFrom{{{}}}to{{{}}}", start, end)
      }
    }
  }
}

/// One lifecycle signal.
///
/// Besides its name, a signal carries the objects it is about so handlers can
/// inspect labels and metadata without going back to the store.
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
  name: String,
  phase: Phase,
  #[serde(flatten)]
  kind: SignalKind,
  #[serde(skip)]
  status: Option<Arc<Status>>,
  #[serde(skip)]
  transition: Option<Arc<Transition>>,
}

impl Signal {
  pub fn new(phase: Phase, kind: SignalKind) -> Self {
    Self {
      name: signal_name(phase, &kind),
      phase,
      kind,
      status: None,
      transition: None,
    }
  }

  pub fn with_status(mut self, status: Arc<Status>) -> Self {
    self.status = Some(status);
    self
  }

  pub fn with_transition(mut self, transition: Arc<Transition>) -> Self {
    self.transition = Some(transition);
    self
  }

  /// The same signal in another phase.
  pub fn in_phase(&self, phase: Phase) -> Self {
    Self {
      name: signal_name(phase, &self.kind),
      phase,
      kind: self.kind.clone(),
      status: self.status.clone(),
      transition: self.transition.clone(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn kind(&self) -> &SignalKind {
    &self.kind
  }

  /// The status the signal is scoped to, or the one being entered or left.
  pub fn status(&self) -> Option<&Arc<Status>> {
    self.status.as_ref()
  }

  pub fn transition(&self) -> Option<&Arc<Transition>> {
    self.transition.as_ref()
  }
}

impl PartialEq for Signal {
  fn eq(&self, other: &Self) -> bool {
    self.phase == other.phase && self.kind == other.kind
  }
}

impl fmt::Display for Signal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)
  }
}

/// Full signal name for `kind` in `phase`.
pub fn signal_name(phase: Phase, kind: &SignalKind) -> String {
  format!("{}{}", phase.prefix(), kind.suffix())
}

/// Ordered signals fired before and after a status change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventSequence {
  pub before: Vec<Signal>,
  pub after: Vec<Signal>,
}

impl EventSequence {
  /// Build a sequence whose `after` list mirrors `before`.
  ///
  /// `signals` may be in either phase; they are rebuilt for both.
  pub fn mirrored(signals: Vec<Signal>) -> Self {
    Self {
      before: signals.iter().map(|s| s.in_phase(Phase::Before)).collect(),
      after: signals.iter().map(|s| s.in_phase(Phase::After)).collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.before.is_empty() && self.after.is_empty()
  }

  pub fn signals(&self, phase: Phase) -> &[Signal] {
    match phase {
      Phase::Before => &self.before,
      Phase::After => &self.after,
    }
  }

  /// Signal names of one phase, in order.
  pub fn names(&self, phase: Phase) -> Vec<&str> {
    self.signals(phase).iter().map(Signal::name).collect()
  }
}
