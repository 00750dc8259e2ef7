//! outbreak — headless driver for the contagion simulator.
//!
//! ```text
//! outbreak [CONFIG.toml] [--days N | --live SECONDS]
//! ```
//!
//! Without `--live` the population runs on the deterministic virtual
//! scheduler for `N` days (default 120), stopping early once nobody is
//! infected any more.  With `--live` every agent gets its own tokio task and
//! the run lasts `SECONDS` of wall-clock time.
//!
//! Daily bucket counts and every transition are written to
//! `output/outbreak/`.  Set `RUST_LOG=info` (or `debug`) for progress logs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::info;

use ct_output::{CsvObserver, CsvWriter};
use ct_sim::{Population, PopulationBuilder, SimConfig, Simulation};

// ── Constants ─────────────────────────────────────────────────────────────────

const DEFAULT_DAYS: u64 = 120;
const OUTPUT_DIR:   &str = "output/outbreak";

// ── Arguments ─────────────────────────────────────────────────────────────────

enum Mode {
    Virtual { days: u64 },
    Live { duration: Duration },
}

struct Args {
    config: Option<PathBuf>,
    mode:   Mode,
}

fn parse_args() -> Result<Args> {
    let mut config = None;
    let mut mode = Mode::Virtual { days: DEFAULT_DAYS };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--days" => {
                let n = args.next().context("--days needs a value")?;
                mode = Mode::Virtual { days: n.parse().context("--days must be an integer")? };
            }
            "--live" => {
                let secs = args.next().context("--live needs a value")?;
                let secs: f64 = secs.parse().context("--live must be a number of seconds")?;
                if !(secs.is_finite() && secs > 0.0) {
                    bail!("--live must be positive, got {secs}");
                }
                mode = Mode::Live { duration: Duration::from_secs_f64(secs) };
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            path => config = Some(PathBuf::from(path)),
        }
    }
    Ok(Args { config, mode })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;

    // 1. Configuration.
    let config = match &args.config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    println!("=== outbreak — contagion simulator ===");
    println!(
        "Agents: {}  |  Initially infected: {}  |  Seed: {}",
        config.agent_count, config.initially_infected, config.seed
    );
    println!();

    // 2. Runtime.
    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(n) = config.worker_threads {
        runtime.worker_threads(n);
    }
    let runtime = runtime.build()?;

    // 3. Output and population.
    let observer = Arc::new(CsvObserver::new(CsvWriter::new(Path::new(OUTPUT_DIR))?));
    let population = PopulationBuilder::new(config)
        .observer(observer.clone())
        .build()?;

    // 4. Run.
    let t0 = Instant::now();
    let (final_day, population) = match args.mode {
        Mode::Virtual { days } => {
            let day = runtime.block_on(run_virtual(&population, days));
            population.finish();
            (day, Arc::new(population))
        }
        Mode::Live { duration } => {
            let observer = observer.clone();
            runtime.block_on(async move {
                let sim = Simulation::start(population, observer);
                tokio::time::sleep(duration).await;
                let population = Arc::clone(sim.population());
                let day = sim.shutdown().await?;
                anyhow::Ok((day, population))
            })?
        }
    };
    let elapsed = t0.elapsed();

    if let Some(e) = observer.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!("Simulation complete in {:.3} s, {} days", elapsed.as_secs_f64(), final_day.0);
    println!("  {OUTPUT_DIR}/daily_stats.csv");
    println!("  {OUTPUT_DIR}/transitions.csv");
    println!();

    println!("Recent history:");
    for line in population.history().lines() {
        println!("  {line}");
    }
    println!();

    println!("{:<13} {:>7}", "State", "Agents");
    println!("{}", "-".repeat(21));
    println!("{}", population.census());

    Ok(())
}

/// Run day by day until `days` have passed or the epidemic is over.
async fn run_virtual(population: &Population, days: u64) -> ct_core::SimDay {
    let radius = population.config().contact_radius;
    for _ in 0..days {
        let day = population.run_days(1).await;
        if let Err(e) = population.refresh_neighbors(radius) {
            tracing::warn!(error = %e, "neighbor refresh failed");
        }
        if population.census().is_settled() {
            info!(day = day.0, "no infections left");
            break;
        }
    }
    population.current_day()
}
