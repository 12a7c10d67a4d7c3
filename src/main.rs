use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use route_baselines::compare::{generate_report, render_summary};
use route_baselines::model::ModelKind;
use route_baselines::runtime::export::{
    save_comparison_report, save_results, select_routing_table, write_routing_table,
    RoutingSelection,
};
use route_baselines::runtime::ingest::{load_demands_csv, load_topology};
use route_baselines::runtime::training::{build_training_data, save_training_data};
use route_baselines::runtime::{load_baseline_config, BaselineConfig, ModelManager};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "route-baselines")]
#[command(about = "Run baseline routing models over a topology and compare them")]
struct Args {
    #[arg(long)]
    topology: PathBuf,
    #[arg(long)]
    demands: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// `all` or one of max_flow, min_cost_max_flow, multi_commodity_flow, load_balanced_sp.
    #[arg(long, default_value = "all")]
    model: String,
    #[arg(long)]
    compare: bool,
    #[arg(long, default_value = "routing.json")]
    output: PathBuf,
    #[arg(long)]
    results_dir: Option<PathBuf>,
    #[arg(long)]
    training_data: bool,
    #[arg(long, default_value = "INFO")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let cfg = match &args.config {
        Some(path) => load_baseline_config(path)?,
        None => BaselineConfig::default(),
    };
    let results_dir = args
        .results_dir
        .clone()
        .unwrap_or_else(|| cfg.results_dir.clone());

    let topology = load_topology(&args.topology)?;
    let demands = load_demands_csv(&args.demands)?;
    let manager = ModelManager::new(topology, demands, &cfg);

    let summary = manager.data_summary();
    info!(
        "topology: {} nodes, {} links; {} flow demands totalling {:.3} Mbps",
        summary.topology_nodes, summary.topology_links, summary.flow_demands, summary.total_demand
    );

    let selection = if args.model.trim().eq_ignore_ascii_case("all") {
        run_all(&args, &manager, &results_dir)?
    } else {
        let kind: ModelKind = args
            .model
            .parse()
            .with_context(|| format!("invalid --model {}", args.model))?;
        let run = manager.run_model(kind);
        if let Some(error) = run.error() {
            warn!("{kind} failed, writing an empty routing table: {error}");
        }
        RoutingSelection::from_run(&run, "requested model")
    };

    info!(
        "routing table source: {} ({})",
        selection
            .model
            .map_or_else(|| "none".to_string(), |kind| kind.to_string()),
        selection.reason
    );
    let table = write_routing_table(&args.output, selection)?;
    for route in table.routes.iter().take(5) {
        println!(
            "{} -> {} via {} ({})",
            route.src,
            route.dst,
            route
                .next_hop
                .map_or_else(|| "-".to_string(), |hop| hop.to_string()),
            route.model
        );
    }
    if table.routes.len() > 5 {
        println!("... and {} more routes", table.routes.len() - 5);
    }
    Ok(())
}

fn run_all(
    args: &Args,
    manager: &ModelManager,
    results_dir: &Path,
) -> Result<RoutingSelection> {
    let results = manager.run_all();
    save_results(results_dir, &results)?;

    if args.compare {
        let report = generate_report(&results);
        save_comparison_report(results_dir, &report)?;
        print!("{}", render_summary(&report));
    }

    if args.training_data {
        let data = build_training_data(&results, manager.topology().nodes);
        save_training_data(results_dir, &data)?;
    }

    Ok(select_routing_table(&results))
}

fn init_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact()
        .init();
    Ok(())
}
