//! Archscope CLI - architecture knowledge graph and impact analysis

use archscope::callgraph::{
    blast_radius, bounded_traverse, temporal_trace, CallGraph, CallShapeDenylist, Direction,
    TraversalBounds,
};
use archscope::config;
use archscope::matcher::{build_type_flow_edges, match_across_repos};
use archscope::render::{mermaid, text};
use archscope::schema::{CallEdge, ExtractionSnapshot, TopologyFacts, TypeDefinition};
use archscope::store::SqliteStore;
use archscope::topology::{build_ecosystem_graph, focus};
use archscope::ui;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "archscope")]
#[command(version = "0.1.0")]
#[command(about = "Architecture knowledge graph - cross-repo contracts, blast radius, topology")]
#[command(long_about = r#"
Archscope ingests extraction snapshots produced by per-language front ends
and answers architecture questions over them:
  • Which types form cross-service data contracts
  • What breaks if a function or external dependency fails
  • How repositories depend on each other
  • What changed between two revisions

Example usage:
  archscope ingest snapshots/*.json
  archscope matches --min 60
  archscope impact --repo web-app
  archscope topology --format mermaid
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file (defaults to archscope.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default archscope.toml in the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Ingest extraction snapshot files (JSON) into the store
    Ingest {
        /// Snapshot files to ingest
        files: Vec<PathBuf>,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List stored snapshots
    Snapshots {
        /// Limit to one repository
        #[arg(short, long)]
        repo: Option<String>,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Cross-repo type-similarity matches over the latest snapshots
    Matches {
        /// Discard matches below this similarity
        #[arg(short, long)]
        min: Option<u32>,

        /// Maximum number of matches to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Type-flow edges: which repos share which data contracts
    Flow {
        /// Minimum similarity for an edge (defaults to the configured floor)
        #[arg(short, long)]
        min: Option<u32>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Bounded call-graph traversal from seed functions
    Graph {
        /// Repository to analyze
        #[arg(short, long)]
        repo: String,

        /// Seed function(s) to traverse from
        #[arg(short, long, required = true)]
        seed: Vec<String>,

        /// Traversal direction (callers, callees, both)
        #[arg(long, default_value = "callees")]
        direction: String,

        /// Maximum traversal depth (capped at 5)
        #[arg(long, default_value = "3")]
        depth: usize,

        /// Maximum number of nodes
        #[arg(long, default_value = "50")]
        max_nodes: usize,

        /// Output format (text, mermaid, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Temporal trace: admitted calls in source order, noise filtered
    Trace {
        /// Repository to analyze
        #[arg(short, long)]
        repo: String,

        /// Seed function(s) to trace from
        #[arg(short, long, required = true)]
        seed: Vec<String>,

        /// Maximum traversal depth (capped at 5)
        #[arg(long, default_value = "3")]
        depth: usize,

        /// Maximum number of nodes
        #[arg(long, default_value = "50")]
        max_nodes: usize,

        /// Output format (text, mermaid)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Blast radius of external dependencies in a repository
    Impact {
        /// Repository to analyze
        #[arg(short, long)]
        repo: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Service topology and repository impact ranking
    Topology {
        /// Focus on one repository and its direct dependents
        #[arg(long)]
        focus: Option<String>,

        /// Output format (text, mermaid, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Diff two snapshot refs, per repo or ecosystem-wide
    Diff {
        /// Limit to one repository (otherwise the whole ecosystem)
        #[arg(short, long)]
        repo: Option<String>,

        /// Git ref on the "from" side
        #[arg(long)]
        from: String,

        /// Git ref on the "to" side
        #[arg(long)]
        to: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show statistics about the stored snapshots
    Stats {
        /// Path to the database file (defaults to the configured path)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Init { force } => {
            let path = config::default_config_path();
            let mut defaults = config::ArchscopeConfig::default();
            defaults.database = Some(
                config::default_database_path_in(std::path::Path::new("."))
                    .display()
                    .to_string(),
            );
            config::write_config(&path, &defaults, force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Ingest { files, database } => {
            if files.is_empty() {
                anyhow::bail!("no snapshot files given");
            }

            let database = config.database_path(database);
            config::ensure_db_dir(&database)?;
            let store = SqliteStore::open(&database)?;

            ui::header(&format!("Ingesting {} snapshot file(s)", files.len()));
            let started = Instant::now();
            let progress = ui::IngestProgress::new(files.len());
            let mut ingested = 0;

            for file in &files {
                progress.inc(&file.display().to_string());
                match read_snapshot(file) {
                    Ok(snapshot) => {
                        tracing::debug!(
                            "ingesting {}@{} ({} domains)",
                            snapshot.repo,
                            snapshot.git_ref,
                            snapshot.facts_by_domain.len()
                        );
                        store.insert_snapshot(&snapshot)?;
                        ingested += 1;
                    }
                    Err(e) => {
                        ui::warn(&format!("skipping {}: {}", file.display(), e));
                    }
                }
            }

            progress.finish_with_summary(started.elapsed(), files.len(), ingested);
            let stats = store.stats()?;
            println!("{}", stats);
        }

        Commands::Snapshots { repo, database } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;

            match repo {
                Some(repo) => {
                    let refs = store.list_snapshots(&repo)?;
                    if refs.is_empty() {
                        ui::warn(&format!("{}: no data", repo));
                        return Ok(());
                    }
                    ui::section(&format!("Snapshots for {}", repo));
                    let mut table = ui::TableBuilder::new();
                    for snapshot_ref in refs {
                        table.add_row(
                            &snapshot_ref.git_ref,
                            &snapshot_ref.captured_at.to_rfc3339(),
                        );
                    }
                    println!("{}", table.build());
                }
                None => {
                    let repos = store.list_repos()?;
                    if repos.is_empty() {
                        ui::warn("no snapshots stored");
                        return Ok(());
                    }
                    ui::section("Repositories");
                    let mut table = ui::TableBuilder::new();
                    for repo in repos {
                        let count = store.list_snapshots(&repo)?.len();
                        table.add_row(&repo, &format!("{} snapshot(s)", count));
                    }
                    println!("{}", table.build());
                }
            }
        }

        Commands::Matches {
            min,
            limit,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let types = types_by_repo(&store)?;

            let mut matches = match_across_repos(&types, &config.similarity);
            if let Some(min) = min {
                matches.retain(|m| m.similarity >= min);
            }
            matches.truncate(limit);

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&matches)?),
                _ => {
                    ui::section("Cross-repo type matches");
                    println!("{}", text::match_table(&matches));
                }
            }
        }

        Commands::Flow {
            min,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let types = types_by_repo(&store)?;

            let matches = match_across_repos(&types, &config.similarity);
            let floor = min.unwrap_or(config.flow_floor);
            let edges = build_type_flow_edges(&matches, floor);

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&edges)?),
                _ => {
                    ui::section(&format!("Type flow (similarity >= {})", floor));
                    if edges.is_empty() {
                        println!("No shared type contracts above the floor.");
                    }
                    for edge in &edges {
                        println!(
                            "{} {} -> {}  {} [{}] ({})",
                            ui::Icons::LINK,
                            edge.from_repo,
                            edge.to_repo,
                            edge.type_name,
                            edge.shared_fields.join(", "),
                            edge.similarity
                        );
                    }
                }
            }
        }

        Commands::Graph {
            repo,
            seed,
            direction,
            depth,
            max_nodes,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let calls = calls_for(&store, &repo)?;
            let graph = CallGraph::build(&calls);

            let direction = Direction::from_str(&direction)?;
            let bounds = TraversalBounds::new(depth, max_nodes);
            let traversal = bounded_traverse(&graph, &seed, direction, bounds);

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&traversal)?),
                "mermaid" => println!("{}", mermaid::call_graph(&traversal)),
                _ => {
                    ui::section(&format!("Call graph around {}", seed.join(", ")));
                    for node in &traversal.nodes {
                        println!("{}{}", "  ".repeat(node.depth), node.name);
                    }
                    ui::summary_row(
                        "nodes / edges",
                        &format!("{} / {}", traversal.nodes.len(), traversal.edges.len()),
                    );
                    if traversal.truncated {
                        ui::warn("traversal truncated by bounds");
                    }
                    println!("{}", graph.stats());
                }
            }
        }

        Commands::Trace {
            repo,
            seed,
            depth,
            max_nodes,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let calls = calls_for(&store, &repo)?;
            let graph = CallGraph::build(&calls);

            let bounds = TraversalBounds::new(depth, max_nodes);
            let traversal = bounded_traverse(&graph, &seed, Direction::Callees, bounds);
            let trace = temporal_trace(&traversal, &CallShapeDenylist::default());

            match format.as_str() {
                "mermaid" => println!("{}", mermaid::sequence(&trace)),
                _ => {
                    ui::section(&format!("Trace from {}", seed.join(", ")));
                    for edge in &trace {
                        println!(
                            "{}:{}  {} -> {}",
                            edge.origin_file, edge.origin_line, edge.from, edge.to
                        );
                    }
                    if trace.is_empty() {
                        println!("No calls admitted.");
                    }
                }
            }
        }

        Commands::Impact {
            repo,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let calls = calls_for(&store, &repo)?;
            let graph = CallGraph::build(&calls);

            let trees = blast_radius(&graph, &config.risk);

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&trees)?),
                _ => {
                    ui::section(&format!("Blast radius for {}", repo));
                    print!("{}", text::impact_report(&trees));
                }
            }
        }

        Commands::Topology {
            focus: focus_repo,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let types = types_by_repo(&store)?;
            let topo = inventories(&store)?;

            let spinner = ui::Spinner::new("Building ecosystem graph");
            let matches = match_across_repos(&types, &config.similarity);
            let flow = build_type_flow_edges(&matches, config.flow_floor);
            let options = config.topology_options();
            let graph = build_ecosystem_graph(&topo, &flow, &options);
            spinner.finish_with_message(format!("{} repositories ranked", graph.repos.len()).as_str());

            if let Some(name) = focus_repo {
                let view = focus(&graph, &name)?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                    _ => {
                        ui::section(&format!("Focus: {}", view.target.repo));
                        println!("{}", text::repo_table(&[view.target.clone()]));
                        if view.dependents.is_empty() {
                            println!("No direct dependents.");
                        } else {
                            ui::section("Direct dependents");
                            println!("{}", text::repo_table(&view.dependents));
                        }
                    }
                }
                return Ok(());
            }

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&graph)?),
                "mermaid" => println!("{}", mermaid::ecosystem(&graph)),
                _ => {
                    ui::section("Repository impact ranking");
                    println!("{}", text::repo_table(&graph.repos));
                }
            }
        }

        Commands::Diff {
            repo,
            from,
            to,
            format,
            database,
        } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;

            let diffs = match repo {
                Some(repo) => {
                    let before = store.require_snapshot(&repo, &from)?;
                    let after = store.require_snapshot(&repo, &to)?;
                    archscope::differ::diff_snapshots(&before, &after)
                }
                None => {
                    let mut before: BTreeMap<String, ExtractionSnapshot> = BTreeMap::new();
                    let mut after: BTreeMap<String, ExtractionSnapshot> = BTreeMap::new();
                    for repo in store.list_repos()? {
                        if let Some(snapshot) = store.get_snapshot(&repo, &from)? {
                            before.insert(repo.clone(), snapshot);
                        }
                        if let Some(snapshot) = store.get_snapshot(&repo, &to)? {
                            after.insert(repo.clone(), snapshot);
                        }
                    }
                    archscope::differ::diff_ecosystem(&before, &after)
                }
            };

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&diffs)?),
                _ => {
                    ui::section(&format!("Diff {} -> {}", from, to));
                    print!("{}", text::diff_report(&diffs));
                }
            }
        }

        Commands::Stats { database } => {
            let database = config.database_path(database);
            let store = SqliteStore::open(&database)?;
            let stats = store.stats()?;

            ui::header(&format!("Archscope statistics ({})", database.display()));
            let repos = stats.repos.to_string();
            let snapshots = stats.snapshots.to_string();
            println!(
                "{}",
                ui::stats_table(&[("Repos", repos.as_str()), ("Snapshots", snapshots.as_str())])
            );

            for repo in store.list_repos()? {
                if let Some(snapshot) = store.latest_snapshot(&repo)? {
                    let types = snapshot.type_facts();
                    let topo = snapshot.topology_facts();
                    ui::summary_row(
                        &repo,
                        &format!(
                            "{}@{}: {} types, {} calls, {} services",
                            snapshot.repo,
                            snapshot.git_ref,
                            types.types.len(),
                            types.calls.len(),
                            topo.services.len()
                        ),
                    );
                }
            }
        }
    }

    Ok(())
}

fn read_snapshot(path: &PathBuf) -> anyhow::Result<ExtractionSnapshot> {
    let contents = std::fs::read_to_string(path)?;
    let snapshot: ExtractionSnapshot = serde_json::from_str(&contents)?;
    if snapshot.repo.is_empty() || snapshot.git_ref.is_empty() {
        anyhow::bail!("snapshot is missing repo or git_ref");
    }
    Ok(snapshot)
}

/// Latest type definitions per repo. Repos without type facts degrade to
/// an empty list rather than aborting a multi-repo query.
fn types_by_repo(store: &SqliteStore) -> anyhow::Result<BTreeMap<String, Vec<TypeDefinition>>> {
    let mut by_repo = BTreeMap::new();
    for (repo, snapshot) in store.latest_snapshots()? {
        by_repo.insert(repo, snapshot.type_facts().types);
    }
    Ok(by_repo)
}

/// Latest topology facts per repo.
fn inventories(store: &SqliteStore) -> anyhow::Result<BTreeMap<String, TopologyFacts>> {
    let mut by_repo = BTreeMap::new();
    for (repo, snapshot) in store.latest_snapshots()? {
        by_repo.insert(repo, snapshot.topology_facts());
    }
    Ok(by_repo)
}

/// Call edges from a repo's latest snapshot; missing data degrades to empty.
fn calls_for(store: &SqliteStore, repo: &str) -> anyhow::Result<Vec<CallEdge>> {
    match store.latest_snapshot(repo)? {
        Some(snapshot) => Ok(snapshot.type_facts().calls),
        None => {
            ui::warn(&format!("{}: no data", repo));
            Ok(Vec::new())
        }
    }
}
