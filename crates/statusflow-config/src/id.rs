//! Status identifiers.
//!
//! A status is addressed by its canonical id `workflowId/localId`. Relative ids
//! (a bare `localId`) are resolved against an [`IdContext`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IdError;

/// Separator between the workflow id and the local id.
pub const SEPARATOR: char = '/';

static SEGMENT_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("segment pattern is valid"));

/// Returns true if `id` is a well-formed workflow id.
pub fn is_valid_workflow_id(id: &str) -> bool {
  SEGMENT_PATTERN.is_match(id)
}

/// Returns true if `id` is a well-formed status local id.
pub fn is_valid_status_local_id(id: &str) -> bool {
  SEGMENT_PATTERN.is_match(id)
}

/// Canonical status identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusId {
  workflow_id: String,
  local_id: String,
}

impl StatusId {
  /// Build a canonical id from its two segments, validating both.
  pub fn new(workflow_id: impl Into<String>, local_id: impl Into<String>) -> Result<Self, IdError> {
    let workflow_id = workflow_id.into();
    let local_id = local_id.into();
    let raw = format!("{}{}{}", workflow_id, SEPARATOR, local_id);

    if !is_valid_workflow_id(&workflow_id) {
      return Err(IdError::InvalidWorkflowId { raw });
    }
    if !is_valid_status_local_id(&local_id) {
      return Err(IdError::InvalidLocalId { raw });
    }

    Ok(Self {
      workflow_id,
      local_id,
    })
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }

  pub fn local_id(&self) -> &str {
    &self.local_id
  }

  /// True if this status belongs to `workflow_id`.
  pub fn belongs_to(&self, workflow_id: &str) -> bool {
    self.workflow_id == workflow_id
  }
}

impl fmt::Display for StatusId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}{}", self.workflow_id, SEPARATOR, self.local_id)
  }
}

impl FromStr for StatusId {
  type Err = IdError;

  /// Parses an absolute id. Relative ids fail with [`IdError::MissingContext`].
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_status_id(s, IdContext::none())
  }
}

impl Serialize for StatusId {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for StatusId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

/// Context used to resolve relative status ids.
///
/// The explicit workflow id wins over the workflow of the context status.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdContext<'a> {
  pub workflow_id: Option<&'a str>,
  pub status: Option<&'a StatusId>,
}

impl<'a> IdContext<'a> {
  /// No context: only absolute ids resolve.
  pub fn none() -> Self {
    Self::default()
  }

  /// Resolve relative ids inside `workflow_id`.
  pub fn workflow(workflow_id: &'a str) -> Self {
    Self {
      workflow_id: Some(workflow_id),
      status: None,
    }
  }

  /// Resolve relative ids inside the workflow of `status`.
  pub fn status(status: &'a StatusId) -> Self {
    Self {
      workflow_id: None,
      status: Some(status),
    }
  }

  fn resolve_workflow_id(&self) -> Option<&'a str> {
    self
      .workflow_id
      .or_else(|| self.status.map(StatusId::workflow_id))
  }
}

/// Parse a raw status id, resolving a relative id against `context`.
///
/// Segments are trimmed before validation.
pub fn parse_status_id(raw: &str, context: IdContext<'_>) -> Result<StatusId, IdError> {
  let tokens: Vec<&str> = raw.split(SEPARATOR).map(str::trim).collect();

  let (workflow_id, local_id) = match tokens.as_slice() {
    [local_id] => {
      let workflow_id = context
        .resolve_workflow_id()
        .ok_or_else(|| IdError::MissingContext {
          raw: raw.to_string(),
        })?;
      (workflow_id, *local_id)
    }
    [workflow_id, local_id] => (*workflow_id, *local_id),
    _ => {
      return Err(IdError::InvalidFormat {
        raw: raw.to_string(),
      });
    }
  };

  if !is_valid_workflow_id(workflow_id) {
    return Err(IdError::InvalidWorkflowId {
      raw: raw.to_string(),
    });
  }
  if !is_valid_status_local_id(local_id) {
    return Err(IdError::InvalidLocalId {
      raw: raw.to_string(),
    });
  }

  Ok(StatusId {
    workflow_id: workflow_id.to_string(),
    local_id: local_id.to_string(),
  })
}
