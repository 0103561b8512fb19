//! corridor — end-to-end haulsim run.
//!
//! Loads a JSON config (or uses the defaults), builds a random road network,
//! runs the fleet until the horizon, and writes `event_log.csv` and
//! `order_summary.csv`.
//!
//! ```text
//! cargo run -p corridor -- [CONFIG_JSON] [OUTPUT_DIR] [--tsplib FILE] [--orders FILE]
//! RUST_LOG=debug cargo run -p corridor -- demos/corridor/config.json
//! cargo run -p corridor -- --help
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hs_core::{RngStream, SimConfig, SimRng};
use hs_demand::load_orders_csv;
use hs_network::load_tsplib;
use hs_output::{CsvWriter, LogOutputObserver};
use hs_sim::{SimBuilder, TruckView};

// ── Arguments ─────────────────────────────────────────────────────────────────

const DEFAULT_OUTPUT: &str = "output/corridor";

/// End-to-end haulsim run over a random or TSPLIB road network.
#[derive(Parser, Debug)]
#[command(name = "corridor")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON run configuration.  Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Directory for event_log.csv and order_summary.csv.
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Build the network from a TSPLIB file instead of generating one.
    #[arg(long, value_name = "FILE")]
    tsplib: Option<PathBuf>,

    /// CSV of scripted orders to run alongside generated ones.
    #[arg(long, value_name = "FILE")]
    orders: Option<PathBuf>,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // 1. Config.
    let config = match &args.config {
        Some(path) => SimConfig::from_json_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let start_unix_secs = config.start_unix_secs;
    info!(seed = config.seed, horizon_secs = config.horizon_secs, trucks = config.fleet.size, "config loaded");

    // 2. Network and scripted orders, if given.
    let mut builder = SimBuilder::new(config.clone());
    if let Some(path) = &args.tsplib {
        let mut rng = SimRng::stream(config.seed, RngStream::Network);
        let network = load_tsplib(path, &config.network, &mut rng)
            .with_context(|| format!("loading TSPLIB {}", path.display()))?;
        builder = builder.network(network);
    }
    if let Some(path) = &args.orders {
        let orders = load_orders_csv(path).with_context(|| format!("loading orders {}", path.display()))?;
        info!(count = orders.len(), "scripted orders loaded");
        builder = builder.orders(orders);
    }
    let mut sim = builder.build()?;
    println!(
        "Road network: {} nodes, {} edges  |  trucks: {}",
        sim.network().node_count(),
        sim.network().edge_count(),
        sim.fleet().truck_count(),
    );

    // 3. Output.
    let out_dir = args.output;
    std::fs::create_dir_all(&out_dir)?;
    let writer = CsvWriter::new(&out_dir)?;
    let mut obs = LogOutputObserver::new(writer, start_unix_secs);

    // 4. Run.
    let t0 = Instant::now();
    let summary = sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  events     : {}", summary.events);
    println!("  final time : {}", summary.final_time);
    println!("  delivered  : {}", summary.delivered);
    println!("  cancelled  : {}", summary.cancelled);
    println!("  open       : {}", summary.open);
    println!("  output     : {}", out_dir.display());
    println!();

    let snapshot = sim.snapshot();
    println!("{:<8} {:<12} {:>10} {:>10} {:>10}", "Truck", "State", "Lat", "Lon", "Drive h");
    println!("{}", "-".repeat(54));
    for t in &snapshot.trucks {
        print_truck(t);
    }

    let late: Vec<_> = snapshot.orders.iter().filter(|o| o.lateness_secs() > 0).collect();
    if !late.is_empty() {
        println!();
        println!("{} orders delivered late", late.len());
    }

    Ok(())
}

fn print_truck(t: &TruckView) {
    println!(
        "{:<8} {:<12} {:>10.4} {:>10.4} {:>10.2}",
        t.id.0,
        t.state.to_string(),
        t.pos.lat,
        t.pos.lon,
        t.drive_secs as f64 / 3_600.0,
    );
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, DEFAULT_OUTPUT};

    #[test]
    fn positional_and_flags() {
        let args = Args::try_parse_from([
            "corridor", "run.json", "out", "--tsplib", "berlin52.tsp", "--orders", "orders.csv",
        ])
        .unwrap();
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("run.json")));
        assert_eq!(args.output, std::path::PathBuf::from("out"));
        assert_eq!(args.tsplib.as_deref(), Some(std::path::Path::new("berlin52.tsp")));
        assert!(args.orders.is_some());
    }

    #[test]
    fn defaults_and_rejections() {
        let args = Args::try_parse_from(["corridor"]).unwrap();
        assert!(args.config.is_none());
        assert_eq!(args.output, std::path::PathBuf::from(DEFAULT_OUTPUT));

        assert!(Args::try_parse_from(["corridor", "--bogus"]).is_err());
        assert!(Args::try_parse_from(["corridor", "--tsplib"]).is_err());
        assert!(Args::try_parse_from(["corridor", "a", "b", "c"]).is_err());
    }
}
