//! Statusflow Config
//!
//! This crate contains the identifier and definition types shared by every
//! other statusflow crate:
//! - [`StatusId`] and [`parse_status_id`], which resolve relative ids such as
//!   `draft` against a workflow context into canonical `post/draft` ids
//! - [`WorkflowDefinition`], the canonical shape a raw definition takes once it
//!   has been normalized
//!
//! Raw definitions themselves are plain `serde_json::Value`s and are never used
//! directly; see `statusflow-normalizer`.

mod definition;
mod error;
mod id;

pub use definition::{
  KEY_INITIAL, KEY_INITIAL_STATUS_ID, KEY_LABEL, KEY_METADATA, KEY_STATUS, KEY_TRANSITION, Metadata,
  StatusDefinition, TransitionDefinition, WorkflowDefinition,
};
pub use error::IdError;
pub use id::{
  IdContext, SEPARATOR, StatusId, is_valid_status_local_id, is_valid_workflow_id, parse_status_id,
};
