//! Board connectivity checker
//!
//! Loads a board JSON file, propagates pad nets to tracks and vias, removes
//! isolated copper islands from every zone and reports nets that are not
//! completely routed.
//!
//! Usage:
//!   cargo run --release --bin connectivity_check -- <board.json> [options]
//!
//! Options:
//!   --output <path>     Write the updated board to this file
//!   --tolerance <n>     Override the board's connection tolerance
//!   --keep-islands      Report islands without removing them
//!   --summary           Print counts only

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pcb_connectivity::board::Board;
use pcb_connectivity::connectivity::{ConnectivityAlgo, DisjointNetEntry, ItemRef, PropagationReport};

#[derive(Serialize)]
struct ZoneIslands {
    zone: ItemRef,
    islands: Vec<usize>,
    removed: usize,
}

#[derive(Serialize)]
struct CheckReport {
    propagation: PropagationReport,
    zones: Vec<ZoneIslands>,
    disjoint_nets: Vec<DisjointNetEntry>,
    unconnected: usize,
}

#[derive(Debug)]
struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    tolerance: Option<i64>,
    keep_islands: bool,
    summary: bool,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <board.json> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --output <path>     Write the updated board to this file");
    eprintln!("  --tolerance <n>     Override the board's connection tolerance");
    eprintln!("  --keep-islands      Report islands without removing them");
    eprintln!("  --summary           Print counts only");
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut opts = Options {
        input: PathBuf::from(&args[1]),
        output: None,
        tolerance: None,
        keep_islands: false,
        summary: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| anyhow!("--output needs a path"))?;
                opts.output = Some(PathBuf::from(path));
            }
            "--tolerance" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("--tolerance needs a value"))?;
                let tolerance: i64 = value.parse().with_context(|| format!("invalid tolerance '{}'", value))?;
                if tolerance < 0 {
                    return Err(anyhow!("--tolerance must not be negative, got {}", tolerance));
                }
                opts.tolerance = Some(tolerance);
            }
            "--keep-islands" => opts.keep_islands = true,
            "--summary" => opts.summary = true,
            other => return Err(anyhow!("unknown option '{}'", other)),
        }
        i += 1;
    }

    Ok(opts)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pcb_connectivity=info,connectivity_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }
    let opts = parse_args(&args)?;

    let start = Instant::now();
    let mut board = Board::load(&opts.input)?;

    let mut settings = board.settings().clone();
    if let Some(tolerance) = opts.tolerance {
        settings.connection_tolerance = tolerance;
    }

    let mut algo = ConnectivityAlgo::new(settings);
    let nodes = algo.set_board(&board)?;
    info!("Loaded {} items ({} nodes) from {}", board.len(), nodes, opts.input.display());

    let propagation = algo.propagate_nets(&mut board);

    let mut zones = Vec::new();
    for zone in board.zone_ids() {
        let islands = algo.find_isolated_copper_islands(&board, zone)?;
        if islands.is_empty() {
            continue;
        }

        let mut removed = 0;
        if !opts.keep_islands {
            if let Some(z) = board.zone_mut(zone) {
                removed = z.remove_filled(&islands);
            }
            algo.remove(&board, zone);
            algo.add(&board, zone)?;
        }

        info!("Zone {}: {} isolated islands, {} removed", zone, islands.len(), removed);
        zones.push(ZoneIslands { zone, islands, removed });
    }

    let disjoint_nets = algo.check_connectivity(&board);
    let report = CheckReport {
        unconnected: disjoint_nets.len(),
        propagation,
        zones,
        disjoint_nets,
    };

    info!("Checked {} in {:?}", opts.input.display(), start.elapsed());

    if opts.summary {
        println!("Updated items:   {}", report.propagation.updated_items);
        println!("Net conflicts:   {}", report.propagation.conflicts.len());
        println!("Zones pruned:    {}", report.zones.len());
        println!("Unconnected:     {}", report.unconnected);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if let Some(output) = &opts.output {
        board.save(output)?;
        info!("Wrote {}", output.display());
    }

    Ok(())
}
