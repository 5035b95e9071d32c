use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use statusflow_engine::{EventPolicy, Phase, Resolution, TransitionResolver};
use statusflow_normalizer::{
  Dialect, MinimalNormalizer, NormalizerOptions, StandardNormalizer,
};
use statusflow_workflow::{FsDefinitionProvider, StoreConfig, TypeMap, WorkflowStore};

/// Statusflow - move entities through declared workflow graphs
#[derive(Parser)]
#[command(name = "statusflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.statusflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Definition dialect
  #[arg(long, global = true, value_enum, default_value_t = DialectArg::Standard)]
  dialect: DialectArg,

  /// Skip the structural checks while normalizing definitions
  #[arg(long, global = true)]
  no_validate: bool,

  /// Log debug output to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DialectArg {
  Standard,
  Minimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
  Basic,
  Extended,
  Reduced,
  /// Scenario labels only
  None,
}

impl PolicyArg {
  fn policy(self) -> Option<EventPolicy> {
    match self {
      PolicyArg::Basic => Some(EventPolicy::Basic),
      PolicyArg::Extended => Some(EventPolicy::Extended),
      PolicyArg::Reduced => Some(EventPolicy::Reduced),
      PolicyArg::None => None,
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Print the structural report of a workflow
  Validate {
    /// Workflow id, read from `<data-dir>/workflows/<id>.json`
    workflow_id: String,
  },

  /// Print a workflow with its statuses
  Show { workflow_id: String },

  /// Resolve a status change
  Move {
    /// Workflow used to resolve relative ids
    workflow_id: String,

    /// Current status (omit when entering the workflow)
    #[arg(long)]
    from: Option<String>,

    /// Requested status (omit when leaving the workflow)
    #[arg(long)]
    to: Option<String>,

    #[arg(long, value_enum, default_value_t = PolicyArg::Basic)]
    policy: PolicyArg,
  },

  /// List the statuses reachable in one move
  Next {
    workflow_id: String,

    /// Current status (omit to get the entry status)
    #[arg(long)]
    from: Option<String>,
  },
}

type Store = WorkflowStore<FsDefinitionProvider, Dialect>;

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".statusflow"),
  };

  let Some(command) = cli.command else {
    println!("statusflow - use --help to see available commands");
    return Ok(());
  };

  let store = open_store(data_dir, cli.dialect, !cli.no_validate)?;

  match command {
    Commands::Validate { workflow_id } => validate(&store, &workflow_id),
    Commands::Show { workflow_id } => show(&store, &workflow_id),
    Commands::Move {
      workflow_id,
      from,
      to,
      policy,
    } => move_status(&store, &workflow_id, from.as_deref(), to.as_deref(), policy),
    Commands::Next { workflow_id, from } => next(&store, &workflow_id, from.as_deref()),
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn open_store(data_dir: PathBuf, dialect: DialectArg, validate: bool) -> Result<Store> {
  let options = NormalizerOptions { validate };
  let normalizer = match dialect {
    DialectArg::Standard => Dialect::Standard(StandardNormalizer::new(options)),
    DialectArg::Minimal => Dialect::Minimal(MinimalNormalizer::new(options)),
  };

  let provider = FsDefinitionProvider::new(data_dir.join("workflows"));
  let config = StoreConfig {
    normalizer,
    type_map: TypeMap::standard(),
  };

  WorkflowStore::with_config(provider, config).context("failed to create workflow store")
}

fn require_workflow(store: &Store, workflow_id: &str) -> Result<()> {
  let found = store
    .get_workflow(workflow_id)
    .with_context(|| format!("failed to load workflow: {}", workflow_id))?;
  if found.is_none() {
    bail!(
      "workflow not found: {} (looked in {})",
      workflow_id,
      store.provider().definition_path(workflow_id).display()
    );
  }
  Ok(())
}

fn validate(store: &Store, workflow_id: &str) -> Result<()> {
  require_workflow(store, workflow_id)?;

  let report = store
    .validate_workflow(workflow_id)
    .with_context(|| format!("failed to validate workflow: {}", workflow_id))?;

  println!("{}", serde_json::to_string_pretty(&report)?);

  if report.has_errors() {
    bail!("workflow {} has structural errors", workflow_id);
  }
  Ok(())
}

fn show(store: &Store, workflow_id: &str) -> Result<()> {
  require_workflow(store, workflow_id)?;

  let workflow = store
    .get_workflow(workflow_id)?
    .context("workflow disappeared while loading")?;
  let statuses = store
    .get_all_statuses(workflow_id)
    .with_context(|| format!("failed to load statuses of workflow: {}", workflow_id))?;

  let statuses: Vec<serde_json::Value> = statuses
    .iter()
    .map(|status| {
      json!({
        "id": status.id(),
        "label": status.label(),
        "metadata": status.metadata(),
        "initial": workflow.is_initial_status(status.id()),
        "final": status.is_final(),
        "transitions": status.outgoing(),
      })
    })
    .collect();

  let output = json!({
    "workflow": workflow.as_ref(),
    "statuses": statuses,
  });
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn move_status(
  store: &Store,
  workflow_id: &str,
  from: Option<&str>,
  to: Option<&str>,
  policy: PolicyArg,
) -> Result<()> {
  let resolver = match policy.policy() {
    Some(policy) => TransitionResolver::new(store).with_policy(policy),
    None => TransitionResolver::new(store),
  };

  let resolution = resolver
    .resolve_raw(from, to, Some(workflow_id))
    .context("move rejected")?;

  println!("{}", serde_json::to_string_pretty(&resolution_json(&resolution))?);
  Ok(())
}

fn resolution_json(resolution: &Resolution) -> serde_json::Value {
  json!({
    "nextStatus": resolution.next_status_id(),
    "scenarios": resolution.scenarios,
    "events": {
      "before": resolution.events.names(Phase::Before),
      "after": resolution.events.names(Phase::After),
    },
  })
}

fn next(store: &Store, workflow_id: &str, from: Option<&str>) -> Result<()> {
  let resolver = TransitionResolver::new(store);
  let (current, _) = resolver
    .lookup(from, None, Some(workflow_id))
    .context("failed to resolve current status")?;

  let next = resolver
    .next_statuses(current.as_ref(), Some(workflow_id), None)
    .context("failed to list next statuses")?;

  let output: Vec<serde_json::Value> = next
    .iter()
    .map(|n| {
      json!({
        "id": n.status.id(),
        "label": n.status.label(),
        "transition": n.transition.as_ref().map(|t| t.id()),
      })
    })
    .collect();
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_move_command() {
    let cli = Cli::try_parse_from([
      "statusflow",
      "--dialect",
      "minimal",
      "move",
      "post",
      "--from",
      "draft",
      "--to",
      "review/open",
      "--policy",
      "extended",
    ])
    .unwrap();

    assert_eq!(cli.dialect, DialectArg::Minimal);
    assert!(!cli.no_validate);
    match cli.command {
      Some(Commands::Move {
        workflow_id,
        from,
        to,
        policy,
      }) => {
        assert_eq!(workflow_id, "post");
        assert_eq!(from.as_deref(), Some("draft"));
        assert_eq!(to.as_deref(), Some("review/open"));
        assert_eq!(policy.policy(), Some(EventPolicy::Extended));
      }
      _ => panic!("expected move command"),
    }
  }

  #[test]
  fn test_move_against_definition_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("workflows")).unwrap();
    std::fs::write(
      dir.path().join("workflows").join("post.json"),
      r#"{"initial": "draft", "status": {"draft": {"transition": "done"}, "done": null}}"#,
    )
    .unwrap();

    let store = open_store(dir.path().to_path_buf(), DialectArg::Standard, true).unwrap();
    let resolver = TransitionResolver::new(&store).with_policy(EventPolicy::Reduced);
    let resolution = resolver
      .resolve_raw(Some("draft"), Some("done"), Some("post"))
      .unwrap();

    assert_eq!(
      resolution_json(&resolution),
      json!({
        "nextStatus": "post/done",
        "scenarios": ["leave status {post/draft}", "from {post/draft} to {post/done}", "enter status {post/done}"],
        "events": {
          "before": ["beforeChangeStatusFrom{post/draft}to{post/done}"],
          "after": ["afterChangeStatusFrom{post/draft}to{post/done}"],
        },
      })
    );
    assert!(require_workflow(&store, "missing").is_err());
  }
}
