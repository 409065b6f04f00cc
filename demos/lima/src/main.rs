//! `lima` — evacuation routes and critical intersections over central Lima.
//!
//! Loads either CSV exports (`nodes.csv`, `edges.csv`, `safe_points.csv` in
//! one directory) or a built-in synthetic grid, then runs the requested
//! analysis through the engine's background task queue, polling it the way
//! a map front end would.
//!
//! Run with:
//!   cargo run -p lima --release -- route --lat -12.06 --lon -77.04 --compare
//!   cargo run -p lima --release -- critical --top-k 20 --sample 200
//!   RUST_LOG=info cargo run -p lima -- --data ./lima_csv route --algorithm astar

mod network;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use ev_core::{EngineConfig, GeoPoint};
use ev_engine::{RouteResult, Session, Supersede, TaskOutcome, TaskQueue};
use ev_spatial::{Algorithm, CriticalNodeRanking, RawEdge, RawNode, SafePoint, loader};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON engine configuration; missing keys take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with nodes.csv, edges.csv and safe_points.csv.
    /// Uses the synthetic grid when omitted.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Route from a coordinate to the cheapest safe point
    Route {
        #[arg(long, default_value_t = -12.0464, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, default_value_t = -77.0428, allow_negative_numbers = true)]
        lon: f64,
        /// dijkstra, astar or bellman-ford
        #[arg(short, long, default_value = "dijkstra")]
        algorithm: String,
        /// Run all three algorithms side by side
        #[arg(long)]
        compare: bool,
    },
    /// Rank intersections by betweenness centrality
    Critical {
        /// Defaults to `top_k` from the configuration
        #[arg(long)]
        top_k: Option<usize>,
        /// Pivot count; defaults to `sample_size` from the configuration
        #[arg(long, conflicts_with = "exact")]
        sample: Option<usize>,
        /// Use every node as a pivot
        #[arg(long)]
        exact: bool,
    },
}

// ── JSON output ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RouteOutput<'a> {
    route: &'a RouteResult,
    path:  Vec<GeoPoint>,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    config.validate().context("invalid engine configuration")?;

    let (nodes, edges, safe_points) = match &args.data {
        Some(dir) => load_csv_dir(dir)?,
        None => {
            info!("using synthetic {}×{} grid", network::ROWS, network::COLS);
            network::build_records()
        }
    };

    let queue = TaskQueue::new(&config)?;
    let mut supersede = Supersede::new();

    // ── Load ──────────────────────────────────────────────────────────────
    let t0 = Instant::now();
    queue.spawn_load(nodes, edges, safe_points, config.clone())?;
    let session = match poll(&queue, &mut supersede, 1).pop() {
        Some(TaskOutcome::Loaded { result, .. }) => result.context("network load failed")?,
        other => bail!("unexpected outcome while loading: {other:?}"),
    };
    let report = session.report();
    println!(
        "Loaded {} nodes, {} edges ({} arcs), {} safe points in {:.2?}",
        report.node_count, report.edge_count, report.arc_count, report.usable_safe_points,
        t0.elapsed()
    );
    if report.stats.discarded_nodes > 0 {
        println!("  {} nodes outside the main component were discarded", report.stats.discarded_nodes);
    }

    // ── Requested analysis ────────────────────────────────────────────────
    match args.cmd {
        Command::Route { lat, lon, algorithm, compare } => {
            let origin = GeoPoint::new(lat, lon);
            let algorithms = if compare {
                Algorithm::ALL.to_vec()
            } else {
                vec![algorithm.parse::<Algorithm>()?]
            };
            // One at a time: a later route of the same kind supersedes an
            // earlier one that is delivered after it.
            for alg in algorithms {
                queue.spawn_route(Arc::clone(&session), origin, alg)?;
                for outcome in poll(&queue, &mut supersede, 1) {
                    let TaskOutcome::Routed { result, .. } = outcome else { continue };
                    match result {
                        Ok(route) => print_route(&session, &route, args.json)?,
                        Err(e) => println!("{}: {e}", alg.label()),
                    }
                }
            }
        }
        Command::Critical { top_k, sample, exact } => {
            let top_k = top_k.unwrap_or(config.top_k);
            let sample = if exact { None } else { sample.or(config.sample_size) };
            queue.spawn_critical(Arc::clone(&session), top_k, sample)?;
            for outcome in poll(&queue, &mut supersede, 1) {
                let TaskOutcome::Ranked { result, .. } = outcome else { continue };
                print_ranking(&result?, args.json)?;
            }
        }
    }

    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<EngineConfig> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn load_csv_dir(dir: &Path) -> Result<(Vec<RawNode>, Vec<RawEdge>, Vec<SafePoint>)> {
    let nodes = loader::load_nodes_csv(&dir.join("nodes.csv")).context("reading nodes.csv")?;
    let edges = loader::load_edges_csv(&dir.join("edges.csv")).context("reading edges.csv")?;
    let safe  = loader::load_safe_points_csv(&dir.join("safe_points.csv"))
        .context("reading safe_points.csv")?;
    info!("read {} nodes, {} edges, {} safe points from {}", nodes.len(), edges.len(), safe.len(), dir.display());
    Ok((nodes, edges, safe))
}

/// Drain the queue every poll interval until `expected` outcomes have been
/// delivered.  Returns the ones that are not stale, oldest first.
fn poll(queue: &TaskQueue, supersede: &mut Supersede, expected: usize) -> Vec<TaskOutcome> {
    let mut delivered = 0;
    let mut current = Vec::new();
    while delivered < expected {
        thread::sleep(queue.poll_interval());
        for outcome in queue.drain() {
            delivered += 1;
            if supersede.accept(&outcome) {
                current.push(outcome);
            } else {
                warn!("dropping stale result {}", outcome.ticket());
            }
        }
    }
    current
}

fn print_route(session: &Session, route: &RouteResult, json: bool) -> Result<()> {
    if json {
        let path = session.path_coords(route);
        println!("{}", serde_json::to_string_pretty(&RouteOutput { route, path })?);
        return Ok(());
    }
    println!(
        "{:<13} → {:<22} cost {:>8.3} min  {:>4} nodes  {:.2?}",
        route.algorithm.label(),
        route.destination.name,
        route.cost,
        route.nodes.len(),
        route.elapsed
    );
    let net = session.network();
    println!(
        "  node {} {} to node {} {}",
        net.external_id(route.origin_node()),
        net.node_pos(route.origin_node()),
        net.external_id(route.destination_node()),
        net.node_pos(route.destination_node()),
    );
    Ok(())
}

fn print_ranking(ranking: &CriticalNodeRanking, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(ranking)?);
        return Ok(());
    }
    println!("Top {} critical nodes ({} pivots, {:.2?}):", ranking.len(), ranking.pivots, ranking.elapsed);
    println!("{:>4}  {:>12}  {:>24}  {:>10}", "rank", "node", "position", "score");
    for (i, c) in ranking.nodes.iter().enumerate() {
        println!("{:>4}  {:>12}  {:>24}  {:>10.6}", i + 1, c.external_id, c.pos.to_string(), c.score);
    }
    Ok(())
}
