//! Signal handlers.
//!
//! Handlers are registered per signal name. A `before` handler can veto a move
//! by returning an outcome with `proceed = false`; its messages are collected
//! and handed back to the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::signal::Signal;

/// What a handler (or a whole dispatch) decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerOutcome {
  pub proceed: bool,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub messages: Vec<String>,
}

impl HandlerOutcome {
  /// Let the move go ahead.
  pub fn proceed() -> Self {
    Self {
      proceed: true,
      messages: Vec::new(),
    }
  }

  /// Block the move with a message.
  pub fn abort(message: impl Into<String>) -> Self {
    Self {
      proceed: false,
      messages: vec![message.into()],
    }
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.messages.push(message.into());
    self
  }

  fn merge(&mut self, other: HandlerOutcome) {
    self.proceed &= other.proceed;
    self.messages.extend(other.messages);
  }
}

impl Default for HandlerOutcome {
  fn default() -> Self {
    Self::proceed()
  }
}

/// Reacts to one signal.
pub trait SignalHandler: Send + Sync {
  fn handle(&self, signal: &Signal) -> HandlerOutcome;
}

impl<F> SignalHandler for F
where
  F: Fn(&Signal) -> HandlerOutcome + Send + Sync,
{
  fn handle(&self, signal: &Signal) -> HandlerOutcome {
    self(signal)
  }
}

/// Handlers keyed by exact signal name.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
  handlers: HashMap<String, Vec<Arc<dyn SignalHandler>>>,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `handler` for the signal called `name`, e.g. `beforeEnterStatus{*}`.
  ///
  /// Handlers for the same name run in registration order.
  pub fn on(&mut self, name: impl Into<String>, handler: impl SignalHandler + 'static) -> &mut Self {
    self
      .handlers
      .entry(name.into())
      .or_default()
      .push(Arc::new(handler));
    self
  }

  pub fn has_handlers(&self, name: &str) -> bool {
    self.handlers.get(name).is_some_and(|h| !h.is_empty())
  }

  /// Run the handlers of one signal and merge their outcomes.
  pub fn dispatch(&self, signal: &Signal) -> HandlerOutcome {
    let mut outcome = HandlerOutcome::proceed();
    for handler in self.handlers.get(signal.name()).into_iter().flatten() {
      outcome.merge(handler.handle(signal));
    }
    outcome
  }

  /// Dispatch `before` signals in order.
  ///
  /// Every handler of a signal runs; dispatch stops after the first signal
  /// whose handlers blocked the move.
  pub fn dispatch_before(&self, signals: &[Signal]) -> HandlerOutcome {
    let mut outcome = HandlerOutcome::proceed();
    for signal in signals {
      outcome.merge(self.dispatch(signal));
      if !outcome.proceed {
        debug!(signal = %signal.name(), "move blocked by handler");
        break;
      }
    }
    outcome
  }

  /// Dispatch `after` signals in order. Vetoes are ignored; messages are kept.
  pub fn dispatch_after(&self, signals: &[Signal]) -> Vec<String> {
    signals
      .iter()
      .flat_map(|signal| self.dispatch(signal).messages)
      .collect()
  }
}

impl fmt::Debug for HandlerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<&String> = self.handlers.keys().collect();
    names.sort();
    f.debug_struct("HandlerRegistry")
      .field("signals", &names)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signal::{Phase, Scope, SignalKind};
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn enter(status: &str) -> Signal {
    Signal::new(
      Phase::Before,
      SignalKind::EnterStatus {
        status: Scope::named(status),
      },
    )
  }

  #[test]
  fn test_dispatch_without_handlers_proceeds() {
    let registry = HandlerRegistry::new();
    let outcome = registry.dispatch_before(&[enter("wf/a")]);
    assert!(outcome.proceed);
    assert!(outcome.messages.is_empty());
  }

  #[test]
  fn test_before_dispatch_stops_after_blocking_signal() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::new();

    registry
      .on("beforeEnterStatus{wf/a}", |_: &Signal| HandlerOutcome::abort("not yet"))
      .on("beforeEnterStatus{wf/a}", |_: &Signal| {
        HandlerOutcome::proceed().with_message("checked")
      });

    let counter = calls.clone();
    registry.on("beforeEnterStatus{wf/b}", move |_: &Signal| {
      counter.fetch_add(1, Ordering::SeqCst);
      HandlerOutcome::proceed()
    });

    let outcome = registry.dispatch_before(&[enter("wf/a"), enter("wf/b")]);
    assert!(!outcome.proceed);
    assert_eq!(outcome.messages, vec!["not yet", "checked"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn test_after_dispatch_collects_messages() {
    let mut registry = HandlerRegistry::new();
    registry.on("afterEnterStatus{wf/a}", |signal: &Signal| {
      HandlerOutcome::abort(format!("saw {}", signal.name()))
    });

    let signal = enter("wf/a").in_phase(Phase::After);
    assert_eq!(
      registry.dispatch_after(&[signal]),
      vec!["saw afterEnterStatus{wf/a}"]
    );
    assert!(registry.has_handlers("afterEnterStatus{wf/a}"));
    assert!(!registry.has_handlers("afterEnterStatus{*}"));
  }
}
