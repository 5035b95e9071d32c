//! Statusflow Normalizer
//!
//! Turns loosely written workflow definitions into a canonical
//! [`WorkflowDefinition`](statusflow_config::WorkflowDefinition):
//! - relative status ids are resolved against the workflow being normalized
//! - every transition shorthand (comma-separated string, list, keyed map)
//!   becomes a map from canonical end id to transition body
//! - the graph is checked for a declared initial status and for dangling
//!   same-workflow targets (see [`NormalizerOptions`])
//!
//! Two dialects are provided, [`StandardNormalizer`] and [`MinimalNormalizer`].
//! [`validate`] builds a non-fatal report on an already normalized definition.

mod error;
mod minimal;
mod normalizer;
mod report;
mod standard;

use serde_json::Value;
use statusflow_config::WorkflowDefinition;

pub use error::NormalizeError;
pub use minimal::MinimalNormalizer;
pub use normalizer::{Normalizer, NormalizerOptions};
pub use report::{
  DefinitionStats, ValidationErrors, ValidationReport, validate, validate_with_inbound,
};
pub use standard::StandardNormalizer;

/// Runtime choice between the two dialects.
#[derive(Debug, Clone)]
pub enum Dialect {
  Standard(StandardNormalizer),
  Minimal(MinimalNormalizer),
}

impl Default for Dialect {
  fn default() -> Self {
    Dialect::Standard(StandardNormalizer::default())
  }
}

impl Normalizer for Dialect {
  fn normalize(&self, workflow_id: &str, raw: &Value) -> Result<WorkflowDefinition, NormalizeError> {
    match self {
      Dialect::Standard(normalizer) => normalizer.normalize(workflow_id, raw),
      Dialect::Minimal(normalizer) => normalizer.normalize(workflow_id, raw),
    }
  }
}
