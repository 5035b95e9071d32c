use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use statusflow_config::is_valid_workflow_id;
use tracing::debug;

use crate::error::ProviderError;

/// Source of raw workflow definitions.
///
/// The store asks its provider for a definition the first time a workflow id
/// is needed and caches the normalized result.
pub trait DefinitionProvider: Send + Sync {
  /// Get the raw definition for `workflow_id`, or `None` if this provider has none.
  fn get_definition(&self, workflow_id: &str) -> Result<Option<Value>, ProviderError>;

  /// Ids of every workflow this provider can yield, sorted.
  ///
  /// Providers that cannot enumerate their definitions return an empty list.
  fn workflow_ids(&self) -> Result<Vec<String>, ProviderError> {
    Ok(Vec::new())
  }
}

impl<P: DefinitionProvider + ?Sized> DefinitionProvider for Arc<P> {
  fn get_definition(&self, workflow_id: &str) -> Result<Option<Value>, ProviderError> {
    (**self).get_definition(workflow_id)
  }

  fn workflow_ids(&self) -> Result<Vec<String>, ProviderError> {
    (**self).workflow_ids()
  }
}

impl<P: DefinitionProvider + ?Sized> DefinitionProvider for &P {
  fn get_definition(&self, workflow_id: &str) -> Result<Option<Value>, ProviderError> {
    (**self).get_definition(workflow_id)
  }

  fn workflow_ids(&self) -> Result<Vec<String>, ProviderError> {
    (**self).workflow_ids()
  }
}

/// A provider that never yields a definition. Every workflow must be registered explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvider;

impl DefinitionProvider for NoProvider {
  fn get_definition(&self, _workflow_id: &str) -> Result<Option<Value>, ProviderError> {
    Ok(None)
  }
}

/// In-memory definitions keyed by workflow id.
#[derive(Debug, Default)]
pub struct MemoryDefinitionProvider {
  definitions: RwLock<HashMap<String, Value>>,
}

impl MemoryDefinitionProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  pub fn with_definition(self, workflow_id: impl Into<String>, definition: Value) -> Self {
    self.insert(workflow_id, definition);
    self
  }

  /// Add or replace a definition. Returns the previous one, if any.
  pub fn insert(&self, workflow_id: impl Into<String>, definition: Value) -> Option<Value> {
    let mut definitions = self.definitions.write().unwrap_or_else(|e| e.into_inner());
    definitions.insert(workflow_id.into(), definition)
  }
}

impl DefinitionProvider for MemoryDefinitionProvider {
  fn get_definition(&self, workflow_id: &str) -> Result<Option<Value>, ProviderError> {
    let definitions = self
      .definitions
      .read()
      .map_err(|e| ProviderError::Poisoned(e.to_string()))?;
    Ok(definitions.get(workflow_id).cloned())
  }

  fn workflow_ids(&self) -> Result<Vec<String>, ProviderError> {
    let definitions = self
      .definitions
      .read()
      .map_err(|e| ProviderError::Poisoned(e.to_string()))?;
    let mut ids: Vec<String> = definitions.keys().cloned().collect();
    ids.sort();
    Ok(ids)
  }
}

/// Filesystem-based provider.
///
/// Definitions are stored as one JSON file per workflow:
/// ```text
/// {root}/
/// ├── post.json
/// └── review.json
/// ```
#[derive(Debug, Clone)]
pub struct FsDefinitionProvider {
  root: PathBuf,
}

impl FsDefinitionProvider {
  /// Create a provider reading from `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of the definition file for `workflow_id`.
  pub fn definition_path(&self, workflow_id: &str) -> PathBuf {
    self.root.join(format!("{}.json", workflow_id))
  }
}

impl DefinitionProvider for FsDefinitionProvider {
  fn get_definition(&self, workflow_id: &str) -> Result<Option<Value>, ProviderError> {
    // The id becomes a file name; reject anything the id pattern does not allow.
    if !is_valid_workflow_id(workflow_id) {
      return Err(ProviderError::InvalidWorkflowId(workflow_id.to_string()));
    }

    let path = self.definition_path(workflow_id);
    let content = match std::fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        debug!(workflow_id = %workflow_id, path = %path.display(), "no definition file");
        return Ok(None);
      }
      Err(source) => {
        return Err(ProviderError::Io {
          workflow_id: workflow_id.to_string(),
          source,
        });
      }
    };

    let definition = serde_json::from_str(&content).map_err(|source| ProviderError::Parse {
      workflow_id: workflow_id.to_string(),
      source,
    })?;

    Ok(Some(definition))
  }

  /// Every `<id>.json` file under the root whose stem is a valid workflow id.
  fn workflow_ids(&self) -> Result<Vec<String>, ProviderError> {
    let list_error = |source| ProviderError::List {
      root: self.root.clone(),
      source,
    };

    let entries = match std::fs::read_dir(&self.root) {
      Ok(entries) => entries,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(list_error(e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
      let path = entry.map_err(list_error)?.path();
      if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
        continue;
      }
      match path.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) if is_valid_workflow_id(stem) => ids.push(stem.to_string()),
        _ => debug!(path = %path.display(), "skipping file with invalid workflow id"),
      }
    }
    ids.sort();
    Ok(ids)
  }
}

/// Asks `first`, then `second` when `first` has no definition.
#[derive(Debug, Clone, Default)]
pub struct ChainProvider<A, B> {
  first: A,
  second: B,
}

impl<A, B> ChainProvider<A, B> {
  pub fn new(first: A, second: B) -> Self {
    Self { first, second }
  }
}

impl<A: DefinitionProvider, B: DefinitionProvider> DefinitionProvider for ChainProvider<A, B> {
  fn get_definition(&self, workflow_id: &str) -> Result<Option<Value>, ProviderError> {
    match self.first.get_definition(workflow_id)? {
      Some(definition) => Ok(Some(definition)),
      None => self.second.get_definition(workflow_id),
    }
  }

  fn workflow_ids(&self) -> Result<Vec<String>, ProviderError> {
    let mut ids = self.first.workflow_ids()?;
    ids.extend(self.second.workflow_ids()?);
    ids.sort();
    ids.dedup();
    Ok(ids)
  }
}
