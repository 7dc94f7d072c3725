#![forbid(unsafe_code)]
//! `lbx` — preview save plans and inspect edit-history graphs.
//!
//! The editor's GUI is out of scope for this workspace; `lbx` is the outer
//! surface that drives the full pipeline from a serialized session file:
//!
//! ```text
//! lbx plan  --history session.json [--settings lightbox.toml] [--fork]
//! lbx graph --history session.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lightbox_history::{EditHistory, HistoryGraph, ItemInfo};
use lightbox_version::{
    FileNameRequest, VersionFileInfo, VersionFileOperation, VersionManager, VersionSettings,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lightbox: edit-history versioning toolbox",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Preview the save plan for a session",
        after_help = "EXAMPLES:\n    # Plan a regular save\n    lbx plan --history session.json\n\n    # Plan an explicit fork\n    lbx plan --history session.json --fork"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Summarize the history graph of a session",
        after_help = "EXAMPLES:\n    lbx graph --history session.json"
    )]
    Graph(GraphArgs),
}

#[derive(clap::Args, Debug)]
struct PlanArgs {
    /// Session file (JSON: loaded_file, resolved_initial, current).
    #[arg(long)]
    history: PathBuf,

    /// Versioning settings (TOML). Defaults apply when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Always fork a new version.
    #[arg(long)]
    fork: bool,

    /// Fork a new version in this format.
    #[arg(long, conflicts_with = "save_as")]
    format: Option<String>,

    /// Fork to this explicit target path (directory/name.ext).
    #[arg(long, conflicts_with_all = ["fork", "format"])]
    save_as: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct GraphArgs {
    /// Session file (JSON: loaded_file, resolved_initial, current).
    #[arg(long)]
    history: PathBuf,
}

/// The serialized session an editor hands over.
#[derive(Debug, Deserialize)]
struct SessionFile {
    loaded_file: VersionFileInfo,
    #[serde(default)]
    resolved_initial: EditHistory,
    current: EditHistory,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Plan(args) => run_plan(&args),
        Commands::Graph(args) => run_graph(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

fn run_plan(args: &PlanArgs) -> Result<()> {
    let session = load_session(&args.history)?;
    let settings = load_settings(args.settings.as_deref())?;
    let manager = VersionManager::new(settings);

    let operation: VersionFileOperation = if let Some(target) = &args.save_as {
        let location = target_info(target)?;
        manager.operation_new_version_as(
            &session.loaded_file,
            &location,
            &session.resolved_initial,
            &session.current,
        )?
    } else if let Some(format) = &args.format {
        manager.operation_new_version_in_format(
            &session.loaded_file,
            format,
            &session.resolved_initial,
            &session.current,
        )?
    } else {
        let request = if args.fork {
            FileNameRequest::NewVersionName
        } else {
            FileNameRequest::CurrentVersionName
        };
        manager.operation(
            request,
            &session.loaded_file,
            &session.resolved_initial,
            &session.current,
        )?
    };

    println!("{}", serde_json::to_string_pretty(&operation)?);
    Ok(())
}

fn load_session(path: &Path) -> Result<SessionFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading session file {}", path.display()))?;
    let session: SessionFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing session file {}", path.display()))?;
    tracing::debug!(
        loaded = %session.loaded_file.file_name,
        initial_entries = session.resolved_initial.len(),
        current_entries = session.current.len(),
        "loaded session"
    );
    Ok(session)
}

fn load_settings(path: Option<&Path>) -> Result<VersionSettings> {
    let Some(path) = path else {
        return Ok(VersionSettings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading settings file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing settings file {}", path.display()))
}

/// Split an explicit target path into a `VersionFileInfo`, deriving the
/// format from the extension.
fn target_info(target: &Path) -> Result<VersionFileInfo> {
    let Some(file_name) = target.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        bail!("target path {} has no file name", target.display());
    };
    let directory = target.parent().unwrap_or_else(|| Path::new("."));
    let format = target
        .extension()
        .map(|e| e.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    if format.is_empty() {
        bail!("target path {} has no extension to derive a format from", target.display());
    }
    Ok(VersionFileInfo::new(directory, file_name, format))
}

// ---------------------------------------------------------------------------
// graph
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GraphSummary {
    vertices: Vec<VertexSummary>,
    edges: Vec<EdgeSummary>,
    main_line: Vec<i64>,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct VertexSummary {
    ids: Vec<i64>,
    categories: String,
}

#[derive(Debug, Serialize)]
struct EdgeSummary {
    from: i64,
    to: i64,
    actions: Vec<String>,
}

fn run_graph(args: &GraphArgs) -> Result<()> {
    let session = load_session(&args.history)?;

    let mut graph = HistoryGraph::new();
    graph
        .add_history(&session.resolved_initial)
        .context("folding resolved initial history into the graph")?;
    let last = graph
        .add_history(&session.current)
        .context("folding current history into the graph")?;

    let Some(subject_vertex) = last else {
        bail!("the current history refers to no files; nothing to summarize");
    };
    let subject: ItemInfo = graph
        .graph()
        .vertex_properties(subject_vertex)
        .map(|props| props.first_info().clone())
        .context("subject vertex has no info")?;
    graph.prepare_for_display(&subject);

    let categories = graph.categorize();
    let first_id = |v| {
        graph
            .graph()
            .vertex_properties(v)
            .map_or(-1, |props| props.first_info().id)
    };

    let vertices = graph
        .graph()
        .vertices()
        .into_iter()
        .map(|v| VertexSummary {
            ids: graph
                .graph()
                .vertex_properties(v)
                .map(|props| props.infos().iter().map(|i| i.id).collect())
                .unwrap_or_default(),
            categories: format!("{:?}", categories.get(&v).copied().unwrap_or_default()),
        })
        .collect();

    let edges = graph
        .graph()
        .edges()
        .into_iter()
        .map(|(from, to)| EdgeSummary {
            from: first_id(from),
            to: first_id(to),
            actions: graph
                .graph()
                .edge_properties(from, to)
                .map(|e| e.actions.iter().map(|a| a.identifier.clone()).collect())
                .unwrap_or_default(),
        })
        .collect();

    let reference = graph
        .find_vertex(&subject)
        .context("subject vertex disappeared during display preparation")?;
    let main_line = graph.main_line(reference).into_iter().map(first_id).collect();

    let summary = GraphSummary {
        vertices,
        edges,
        main_line,
        fingerprint: graph.fingerprint(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
