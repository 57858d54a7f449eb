use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use link_force::similarity::{SimilarityGraph, StrengthStats, parse_similarities};
use link_force::{Simulation, SimulationConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Similarities JSON; `-` reads stdin.
    #[arg(long, default_value = "-")]
    input: String,
    /// Positions JSON destination; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 2)]
    iterations: usize,
    #[arg(long, default_value_t = 0.01)]
    alpha_decay: f64,
    /// Strength subtracted from every link; defaults to the mean strength.
    #[arg(long)]
    cutoff: Option<f64>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    shuffle: bool,
    #[arg(long, default_value_t = 1_000)]
    max_ticks: usize,
}

#[derive(Debug, Serialize)]
struct Position<'a> {
    id: &'a str,
    x: f64,
    y: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let raw = if args.input == "-" {
        io::read_to_string(io::stdin()).context("failed to read stdin")?
    } else {
        fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read {}", args.input))?
    };

    let records = parse_similarities(&raw)?;
    let stats = StrengthStats::from_similarities(&records)?;
    info!(
        links = records.len(),
        average = stats.average,
        std_dev = stats.std_dev,
        "loaded similarities"
    );

    let mut graph = SimilarityGraph::build(&records);
    if args.shuffle {
        graph.shuffle(args.seed);
    }

    let cutoff = args.cutoff.unwrap_or(stats.average);
    let mut force = graph.link_force(cutoff, args.iterations);
    force.set_seed(args.seed);

    let config = SimulationConfig {
        alpha_decay: args.alpha_decay,
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::new(graph.nodes, config);
    simulation.add_force("link", force)?;
    let ticks = simulation.run(args.max_ticks);
    info!(ticks, nodes = simulation.nodes().len(), "layout finished");

    let positions = simulation
        .nodes()
        .iter()
        .map(|node| Position {
            id: &node.data,
            x: node.x,
            y: node.y,
        })
        .collect::<Vec<_>>();
    let json = serde_json::to_string_pretty(&positions).context("failed to encode positions")?;

    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write stdout")?;
        }
    }

    Ok(())
}
