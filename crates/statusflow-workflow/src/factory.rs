//! Pluggable construction of statuses, transitions and workflows.
//!
//! The store never builds these objects directly: it asks an [`ObjectFactory`],
//! built from a [`TypeMap`] holding one constructor per [`ObjectRole`].

use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;
use crate::status::{Status, StatusParts};
use crate::transition::{Transition, TransitionParts};
use crate::workflow::{Workflow, WorkflowParts};

pub type StatusConstructor = Arc<dyn Fn(StatusParts) -> Status + Send + Sync>;
pub type TransitionConstructor = Arc<dyn Fn(TransitionParts) -> Transition + Send + Sync>;
pub type WorkflowConstructor = Arc<dyn Fn(WorkflowParts) -> Workflow + Send + Sync>;

/// The three object roles a type map must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRole {
  Status,
  Transition,
  Workflow,
}

impl fmt::Display for ObjectRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ObjectRole::Status => "status",
      ObjectRole::Transition => "transition",
      ObjectRole::Workflow => "workflow",
    };
    f.write_str(name)
  }
}

/// Constructors keyed by role. Roles may be left empty; [`ObjectFactory::from_type_map`]
/// rejects incomplete maps.
#[derive(Clone, Default)]
pub struct TypeMap {
  status: Option<StatusConstructor>,
  transition: Option<TransitionConstructor>,
  workflow: Option<WorkflowConstructor>,
}

impl TypeMap {
  /// An empty map.
  pub fn new() -> Self {
    Self::default()
  }

  /// A map using the plain constructors for every role.
  pub fn standard() -> Self {
    Self::new()
      .with_status(Status::new)
      .with_transition(Transition::new)
      .with_workflow(Workflow::new)
  }

  pub fn with_status(mut self, f: impl Fn(StatusParts) -> Status + Send + Sync + 'static) -> Self {
    self.status = Some(Arc::new(f));
    self
  }

  pub fn with_transition(
    mut self,
    f: impl Fn(TransitionParts) -> Transition + Send + Sync + 'static,
  ) -> Self {
    self.transition = Some(Arc::new(f));
    self
  }

  pub fn with_workflow(
    mut self,
    f: impl Fn(WorkflowParts) -> Workflow + Send + Sync + 'static,
  ) -> Self {
    self.workflow = Some(Arc::new(f));
    self
  }

  fn covers(&self, role: ObjectRole) -> bool {
    match role {
      ObjectRole::Status => self.status.is_some(),
      ObjectRole::Transition => self.transition.is_some(),
      ObjectRole::Workflow => self.workflow.is_some(),
    }
  }
}

impl fmt::Debug for TypeMap {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeMap")
      .field("status", &self.covers(ObjectRole::Status))
      .field("transition", &self.covers(ObjectRole::Transition))
      .field("workflow", &self.covers(ObjectRole::Workflow))
      .finish()
  }
}

/// A validated type map.
#[derive(Clone)]
pub struct ObjectFactory {
  status: StatusConstructor,
  transition: TransitionConstructor,
  workflow: WorkflowConstructor,
}

impl ObjectFactory {
  /// Validate `map`: every role must have a constructor.
  pub fn from_type_map(map: TypeMap) -> Result<Self, StoreError> {
    match map {
      TypeMap {
        status: Some(status),
        transition: Some(transition),
        workflow: Some(workflow),
      } => Ok(Self {
        status,
        transition,
        workflow,
      }),
      TypeMap { status: None, .. } => Err(StoreError::IncompleteTypeMap {
        role: ObjectRole::Status,
      }),
      TypeMap {
        transition: None, ..
      } => Err(StoreError::IncompleteTypeMap {
        role: ObjectRole::Transition,
      }),
      TypeMap { .. } => Err(StoreError::IncompleteTypeMap {
        role: ObjectRole::Workflow,
      }),
    }
  }

  pub fn create_status(&self, parts: StatusParts) -> Arc<Status> {
    Arc::new((self.status)(parts))
  }

  pub fn create_transition(&self, parts: TransitionParts) -> Arc<Transition> {
    Arc::new((self.transition)(parts))
  }

  pub fn create_workflow(&self, parts: WorkflowParts) -> Arc<Workflow> {
    Arc::new((self.workflow)(parts))
  }
}

impl Default for ObjectFactory {
  fn default() -> Self {
    Self {
      status: Arc::new(Status::new),
      transition: Arc::new(Transition::new),
      workflow: Arc::new(Workflow::new),
    }
  }
}

impl fmt::Debug for ObjectFactory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ObjectFactory").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use statusflow_config::{Metadata, StatusId};

  fn parts(local: &str) -> StatusParts {
    StatusParts {
      id: StatusId::new("wf", local).unwrap(),
      label: local.to_string(),
      metadata: Metadata::new(),
      outgoing: Vec::new(),
    }
  }

  #[test]
  fn test_incomplete_type_map_is_rejected() {
    let result = ObjectFactory::from_type_map(TypeMap::new());
    assert!(matches!(
      result,
      Err(StoreError::IncompleteTypeMap {
        role: ObjectRole::Status
      })
    ));

    let map = TypeMap::new()
      .with_status(Status::new)
      .with_workflow(Workflow::new);
    assert!(matches!(
      ObjectFactory::from_type_map(map),
      Err(StoreError::IncompleteTypeMap {
        role: ObjectRole::Transition
      })
    ));

    let map = TypeMap::new()
      .with_status(Status::new)
      .with_transition(Transition::new);
    assert!(matches!(
      ObjectFactory::from_type_map(map),
      Err(StoreError::IncompleteTypeMap {
        role: ObjectRole::Workflow
      })
    ));
  }

  #[test]
  fn test_custom_constructor_is_used() {
    let map = TypeMap::standard().with_status(|mut parts: StatusParts| {
      parts.label = parts.label.to_uppercase();
      Status::new(parts)
    });
    let factory = ObjectFactory::from_type_map(map).unwrap();

    let status = factory.create_status(parts("draft"));
    assert_eq!(status.label(), "DRAFT");
  }
}
