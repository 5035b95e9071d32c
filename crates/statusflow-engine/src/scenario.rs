//! Scenario labels.
//!
//! Every move is tagged with an ordered list of labels such as
//! `enter workflow {post}` or `from {post/draft} to {post/done}`. External
//! validation rules declare the labels they apply to, possibly with `*` in
//! place of an id, and are selected with [`matches`].

use std::sync::LazyLock;

use regex::Regex;
use statusflow_config::StatusId;

use crate::signal::ANY;

static SEGMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"([^{]+)\{([^}]*)\}").expect("scenario segment pattern is valid"));

pub fn enter_workflow(workflow_id: &str) -> String {
  format!("enter workflow {{{}}}", workflow_id)
}

pub fn leave_workflow(workflow_id: &str) -> String {
  format!("leave workflow {{{}}}", workflow_id)
}

pub fn enter_status(status_id: &StatusId) -> String {
  format!("enter status {{{}}}", status_id)
}

pub fn leave_status(status_id: &StatusId) -> String {
  format!("leave status {{{}}}", status_id)
}

pub fn change_status(start: &StatusId, end: &StatusId) -> String {
  format!("from {{{}}} to {{{}}}", start, end)
}

/// Labels for entering a workflow through `status_id`.
pub fn entering(status_id: &StatusId) -> Vec<String> {
  vec![enter_workflow(status_id.workflow_id()), enter_status(status_id)]
}

/// Labels for leaving the workflow of `status_id`.
pub fn leaving(status_id: &StatusId) -> Vec<String> {
  vec![leave_status(status_id), leave_workflow(status_id.workflow_id())]
}

/// Labels for moving from `start` to `end`.
pub fn changing(start: &StatusId, end: &StatusId) -> Vec<String> {
  vec![leave_status(start), change_status(start, end), enter_status(end)]
}

/// True if two scenario labels match.
///
/// Labels match when they have the same `prefix {payload}` segments, with equal
/// prefixes and payloads that are equal or `*` on either side, followed by the
/// same trailing text. Labels without any segment only match themselves.
pub fn matches(a: &str, b: &str) -> bool {
  let (left, left_tail) = split(a);
  let (right, right_tail) = split(b);

  left_tail == right_tail
    && left.len() == right.len()
    && left
      .iter()
      .zip(&right)
      .all(|((lp, lv), (rp, rv))| lp == rp && (lv == rv || *lv == ANY || *rv == ANY))
}

/// True if `label` matches any of `labels`.
pub fn matches_any<'a>(label: &str, labels: impl IntoIterator<Item = &'a str>) -> bool {
  labels.into_iter().any(|other| matches(label, other))
}

/// Trimmed `(prefix, payload)` segments and the trimmed text after the last one.
fn split(label: &str) -> (Vec<(&str, &str)>, &str) {
  let mut end = 0;
  let segments: Vec<(&str, &str)> = SEGMENT
    .captures_iter(label)
    .filter_map(|caps| {
      end = caps.get(0)?.end();
      let prefix = caps.get(1)?.as_str().trim();
      let payload = caps.get(2)?.as_str().trim();
      Some((prefix, payload))
    })
    .collect();
  (segments, label[end..].trim())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(raw: &str) -> StatusId {
    raw.parse().unwrap()
  }

  #[test]
  fn test_labels() {
    assert_eq!(
      entering(&id("post/draft")),
      vec!["enter workflow {post}", "enter status {post/draft}"]
    );
    assert_eq!(
      leaving(&id("post/done")),
      vec!["leave status {post/done}", "leave workflow {post}"]
    );
    assert_eq!(
      changing(&id("post/draft"), &id("review/open")),
      vec![
        "leave status {post/draft}",
        "from {post/draft} to {review/open}",
        "enter status {review/open}",
      ]
    );
  }

  #[test]
  fn test_matches() {
    assert!(matches("enter workflow {post}", "enter workflow {post}"));
    assert!(matches("enter workflow {post}", "enter workflow {*}"));
    assert!(matches("enter workflow {*}", "enter workflow {post}"));
    assert!(matches("from {wf/a} to {wf/b}", "from {*} to {wf/b}"));
    assert!(matches("from {wf/a} to {wf/b}", "from { wf/a } to {*}"));

    assert!(!matches("enter workflow {post}", "enter workflow {review}"));
    assert!(!matches("enter workflow {post}", "leave workflow {post}"));
    assert!(!matches("from {wf/a} to {wf/b}", "from {wf/b} to {wf/a}"));
    assert!(!matches("from {wf/a} to {wf/b}", "enter status {*}"));

    assert!(matches("default", "default"));
    assert!(!matches("default", "enter status {*}"));
  }

  #[test]
  fn test_matches_compares_trailing_text() {
    assert!(!matches("enter status {wf/a} extra", "enter status {wf/a}"));
    assert!(!matches("enter status {*}", "enter status {wf/a} extra"));
    assert!(matches("enter status {wf/a} extra", "enter status {*} extra "));
    assert!(!matches("from {wf/a} to {wf/b} now", "from {wf/a} to {wf/b} later"));
  }

  #[test]
  fn test_matches_any() {
    let rules = ["leave status {*}", "enter workflow {review}"];
    assert!(matches_any("leave status {post/draft}", rules));
    assert!(!matches_any("enter workflow {post}", rules));
  }
}
