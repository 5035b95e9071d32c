//! Statusflow Workflow
//!
//! The materialized workflow graph: [`Workflow`], [`Status`] and [`Transition`]
//! objects built from normalized definitions and cached by a [`WorkflowStore`].
//!
//! Key points:
//! - Objects are created lazily, once per canonical id, and shared as `Arc`s
//! - Definitions come from explicit registration or a [`DefinitionProvider`]
//! - Object construction is pluggable through a [`TypeMap`]

mod error;
mod factory;
mod label;
mod provider;
mod status;
mod store;
mod transition;
mod workflow;

pub use error::{ProviderError, StoreError};
pub use factory::{
  ObjectFactory, ObjectRole, StatusConstructor, TransitionConstructor, TypeMap,
  WorkflowConstructor,
};
pub use label::humanize;
pub use provider::{
  ChainProvider, DefinitionProvider, FsDefinitionProvider, MemoryDefinitionProvider, NoProvider,
};
pub use status::{Status, StatusParts};
pub use store::{StoreConfig, WorkflowStore};
pub use transition::{Transition, TransitionParts};
pub use workflow::{Workflow, WorkflowParts};
