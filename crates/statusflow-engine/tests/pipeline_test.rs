//! Integration tests for the provider -> store -> resolver pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use statusflow_config::{IdContext, StatusId};
use statusflow_engine::{
  EngineError, EventPolicy, HandlerOutcome, HandlerRegistry, Phase, Signal, TransitionResolver,
  scenario,
};
use statusflow_normalizer::{Dialect, MinimalNormalizer, NormalizeError, Normalizer};
use statusflow_workflow::{
  ChainProvider, FsDefinitionProvider, MemoryDefinitionProvider, StoreConfig, StoreError, TypeMap,
  WorkflowStore,
};

fn id(raw: &str) -> StatusId {
  raw.parse().expect("valid status id")
}

/// Write `post` and `review` definitions into a temp directory.
fn definition_dir() -> tempfile::TempDir {
  let dir = tempfile::tempdir().expect("failed to create temp dir");

  let post = json!({
    "initialStatusId": "draft",
    "metadata": {"owner": "editorial"},
    "status": {
      "draft": {"transition": "correction, review/open"},
      "correction": {"label": "Needs correction", "transition": ["draft"]},
      "published": {"metadata": {"color": "green"}}
    }
  });
  let review = json!({
    "initial": "open",
    "status": {
      "open": {"transition": {"approved": {"metadata": {"role": "editor"}}, "rejected": null}},
      "approved": {"transition": "post/published"},
      "rejected": null
    }
  });

  std::fs::write(dir.path().join("post.json"), post.to_string()).expect("write post");
  std::fs::write(dir.path().join("review.json"), review.to_string()).expect("write review");
  dir
}

#[test]
fn test_full_lifecycle_across_workflows() {
  let dir = definition_dir();
  let store = WorkflowStore::new(FsDefinitionProvider::new(dir.path()));
  let resolver = TransitionResolver::new(&store).with_policy(EventPolicy::Basic);

  // Enter
  let entered = resolver.resolve_raw(None, Some("draft"), Some("post")).unwrap();
  assert_eq!(entered.next_status_id(), Some(&id("post/draft")));
  assert_eq!(
    entered.events.names(Phase::Before),
    vec!["beforeEnterWorkflow{post}", "beforeEnterStatus{post/draft}"]
  );

  // Cross-workflow move, relative requested id resolved against the current workflow
  let draft = entered.next_status.clone();
  let to_review = resolver
    .resolve_raw(Some("post/draft"), Some("review/open"), None)
    .unwrap();
  assert_eq!(
    to_review.scenarios,
    vec![
      "leave status {post/draft}",
      "from {post/draft} to {review/open}",
      "enter status {review/open}",
    ]
  );

  let approved = resolver
    .resolve_raw(Some("review/open"), Some("approved"), None)
    .unwrap();
  let transition = approved.events.before[1]
    .transition()
    .expect("change signal carries its transition");
  assert_eq!(transition.metadata_value("role"), Some(&json!("editor")));

  let published = resolver
    .resolve_raw(Some("review/approved"), Some("post/published"), None)
    .unwrap();
  let status = published.next_status.clone().expect("moved into published");
  assert_eq!(status.label(), "Published");
  assert_eq!(status.metadata_value("color"), Some(&json!("green")));
  assert!(store.is_final_status(status.id()).unwrap());

  // Leave
  let left = resolver.resolve(Some(&status), None).unwrap();
  assert!(left.next_status.is_none());
  assert_eq!(
    left.events.names(Phase::After),
    vec!["afterLeaveStatus{post/published}", "afterLeaveWorkflow{post}"]
  );

  // Draft is the same shared instance the store hands out
  let again = store.get_status("draft", IdContext::workflow("post")).unwrap();
  assert!(Arc::ptr_eq(draft.as_ref().unwrap(), &again));
}

#[test]
fn test_state_errors() {
  let dir = definition_dir();
  let store = WorkflowStore::new(FsDefinitionProvider::new(dir.path()));
  let resolver = TransitionResolver::new(&store).with_policy(EventPolicy::Basic);

  let result = resolver.resolve_raw(None, Some("post/correction"), None);
  assert!(matches!(
    result,
    Err(EngineError::NotInitialStatus { ref initial_status_id, .. }) if *initial_status_id == id("post/draft")
  ));

  let result = resolver.resolve_raw(Some("post/draft"), Some("published"), None);
  assert!(matches!(result, Err(EngineError::NoTransitionFound { .. })));
  assert!(result.unwrap_err().is_state_error());

  let same = resolver
    .resolve_raw(Some("post/published"), Some("published"), None)
    .unwrap();
  assert_eq!(same.next_status_id(), Some(&id("post/published")));
  assert!(same.events.is_empty());

  let result = resolver.resolve_raw(None, Some("missing/start"), None);
  assert!(matches!(
    result,
    Err(EngineError::Store(StoreError::WorkflowNotFound { .. }))
  ));
}

#[test]
fn test_memory_provider_overrides_filesystem() {
  let dir = definition_dir();
  let memory = MemoryDefinitionProvider::new().with_definition(
    "post",
    json!({"initial": "idea", "status": {"idea": {"transition": "review/open"}}}),
  );
  let store = WorkflowStore::new(ChainProvider::new(
    memory,
    FsDefinitionProvider::new(dir.path()),
  ));

  let workflow = store.get_workflow("post").unwrap().expect("post workflow");
  assert_eq!(workflow.initial_status_id(), &id("post/idea"));
  assert!(workflow.metadata().is_empty());

  let transitions = store.get_transitions("post/idea", IdContext::none()).unwrap();
  assert_eq!(transitions.len(), 1);
  assert_eq!(transitions[0].end().id(), &id("review/open"));
}

#[test]
fn test_minimal_dialect_store() {
  let config = StoreConfig {
    normalizer: Dialect::Minimal(MinimalNormalizer::default()),
    type_map: TypeMap::standard(),
  };
  let provider = MemoryDefinitionProvider::new()
    .with_definition("WID", json!({"A": "B,C", "B": "A", "C": []}));
  let store = WorkflowStore::with_config(provider, config).unwrap();

  let workflow = store.get_workflow("WID").unwrap().expect("workflow");
  assert_eq!(workflow.initial_status_id(), &id("WID/A"));

  let ends: Vec<String> = store
    .transitions(&id("WID/A"))
    .unwrap()
    .iter()
    .map(|t| t.end().id().to_string())
    .collect();
  assert_eq!(ends, vec!["WID/B", "WID/C"]);
  assert!(store.is_final_status(&id("WID/C")).unwrap());

  let err = store
    .register_definition("bad", json!({"A": {"B": {"metadata": {}}}}), false)
    .unwrap_err();
  assert!(matches!(
    err,
    StoreError::Normalize(NormalizeError::AssociativeNotSupported { .. })
  ));
}

#[test]
fn test_normalized_definition_round_trips_through_store() {
  let dir = definition_dir();
  let store = WorkflowStore::new(FsDefinitionProvider::new(dir.path()));

  let normalized = store.definition("review").unwrap().expect("review definition");
  let raw = normalized.to_raw().unwrap();

  let again = store.normalizer().normalize("review", &raw).unwrap();
  assert_eq!(*normalized, again);
}

#[test]
fn test_handlers_gate_moves() {
  let dir = definition_dir();
  let store = WorkflowStore::new(FsDefinitionProvider::new(dir.path()));
  let resolver = TransitionResolver::new(&store).with_policy(EventPolicy::Extended);

  let entered = Arc::new(AtomicUsize::new(0));
  let counter = entered.clone();

  let mut handlers = HandlerRegistry::new();
  handlers
    .on("beforeEnterStatus{*}", |signal: &Signal| {
      let label = signal.status().map(|s| s.label().to_string()).unwrap_or_default();
      if label == "Rejected" {
        HandlerOutcome::abort("rejections need a reason")
      } else {
        HandlerOutcome::proceed()
      }
    })
    .on("afterEnterStatus{*}", move |_: &Signal| {
      counter.fetch_add(1, Ordering::SeqCst);
      HandlerOutcome::proceed()
    });

  let (current, rejected) = resolver
    .lookup(Some("review/open"), Some("rejected"), None)
    .unwrap();
  let outcome = resolver
    .send_to_status(current.as_ref(), rejected.as_ref(), &handlers)
    .unwrap();
  assert!(!outcome.moved);
  assert_eq!(outcome.status.as_ref().map(|s| s.id()), Some(&id("review/open")));
  assert_eq!(outcome.messages, vec!["rejections need a reason"]);
  assert_eq!(entered.load(Ordering::SeqCst), 0);

  let next = resolver
    .next_statuses(current.as_ref(), None, Some(&handlers))
    .unwrap();
  let allowed: Vec<(String, Option<bool>)> = next
    .iter()
    .map(|n| (n.status.id().to_string(), n.allowed))
    .collect();
  assert_eq!(
    allowed,
    vec![
      ("review/approved".to_string(), Some(true)),
      ("review/rejected".to_string(), Some(false)),
    ]
  );

  let (_, approved) = resolver
    .lookup(Some("review/open"), Some("approved"), None)
    .unwrap();
  let outcome = resolver
    .send_to_status(current.as_ref(), approved.as_ref(), &handlers)
    .unwrap();
  assert!(outcome.moved);
  assert_eq!(entered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_scenario_rules_select_by_label() {
  let dir = definition_dir();
  let store = WorkflowStore::new(FsDefinitionProvider::new(dir.path()));
  let resolver = TransitionResolver::new(&store);

  let rules = ["from {*} to {post/published}", "enter workflow {post}"];
  let resolution = resolver
    .resolve_raw(Some("review/approved"), Some("post/published"), None)
    .unwrap();

  let applied: Vec<&String> = resolution
    .scenarios
    .iter()
    .filter(|label| scenario::matches_any(label, rules))
    .collect();
  assert_eq!(applied, vec!["from {review/approved} to {post/published}"]);
}

#[test]
fn test_validate_workflow_sees_cross_workflow_edges() {
  let dir = definition_dir();
  let store = WorkflowStore::new(FsDefinitionProvider::new(dir.path()));

  assert!(!store.has_definition("review").unwrap());

  // review.json targets post/published; it is loaded from the directory listing
  let report = store.validate_workflow("post").unwrap();
  assert!(report.errors.unreachable_status.is_empty());
  assert!(!report.has_errors());
  assert!(store.has_definition("review").unwrap());
  assert_eq!(report.stats.status_count, 3);
  assert_eq!(report.stats.final_status_ids, vec![id("post/published")]);
}
