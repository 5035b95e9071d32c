//! Statusflow Engine
//!
//! Decides what a requested status change means and what it fires:
//! - [`TransitionResolver`] classifies a move (enter workflow, leave workflow,
//!   change status), checks it against the [`WorkflowStore`](statusflow_workflow::WorkflowStore)
//!   and returns the next status
//! - an [`EventSequenceGenerator`] policy lists the `before`/`after` [`Signal`]s
//!   of the move
//! - [`scenario`] labels tag the move for external validation rules
//! - a [`HandlerRegistry`] lets callers veto a move from `before` signals

mod error;
mod handlers;
mod policy;
mod resolver;
pub mod scenario;
mod signal;

pub use error::EngineError;
pub use handlers::{HandlerOutcome, HandlerRegistry, SignalHandler};
pub use policy::{
  BasicEventSequence, EventPolicy, EventSequenceGenerator, ExtendedEventSequence,
  ReducedEventSequence, ensure_initial,
};
pub use resolver::{MoveOutcome, NextStatus, Resolution, TransitionResolver};
pub use signal::{ANY, EventSequence, Phase, Scope, Signal, SignalKind, signal_name};
