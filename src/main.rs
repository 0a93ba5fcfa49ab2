//! schedbench — Workload Scheduling Battery Runner
//!
//! Usage:
//!   schedbench                          # stock four-scenario battery
//!   schedbench --skip cpu-seq,io-seq   # skip scenarios
//!   schedbench --export results        # export CSV + JSON
//!   schedbench --out-dir traces        # trace artifact directory

use clap::Parser;
use colored::Colorize;
use schedbench::report;
use schedbench::scenarios::{RunConfig, Scenario};
use schedbench::{BenchError, BenchResult, RunSuite, SystemInfo};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "schedbench", about = "Workload scheduling benchmark with trace capture")]
#[command(version)]
struct Cli {
    /// CPU workload iterations per task.
    #[arg(long, default_value = "50000")]
    cpu_iterations: u64,

    /// CPU task count (sequential) and worker count (threaded).
    #[arg(long, default_value = "2")]
    cpu_workers: usize,

    /// I/O pause per task in milliseconds.
    #[arg(long, default_value = "250")]
    io_pause_ms: u64,

    /// I/O task count (sequential) and worker count (threaded).
    #[arg(long, default_value = "4")]
    io_workers: usize,

    /// Directory for trace artifacts.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Skip scenarios (comma-separated: cpu-seq, cpu-threaded, io-seq, io-threaded).
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Export directory for CSV + JSON results.
    #[arg(long)]
    export: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

fn main() -> BenchResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = RunConfig {
        cpu_iterations: cli.cpu_iterations,
        cpu_tasks: cli.cpu_workers,
        io_pause: Duration::from_millis(cli.io_pause_ms),
        io_tasks: cli.io_workers,
    };

    let skip: Vec<String> = cli.skip.iter().map(|s| s.to_lowercase()).collect();

    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════╗"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "║            schedbench Workload Battery               ║"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════╝"
            .bold()
            .blue()
    );
    println!(
        "  CPU: {} iters × {}   I/O: {}ms × {}",
        cfg.cpu_iterations,
        cfg.cpu_tasks,
        cfg.io_pause.as_millis(),
        cfg.io_tasks
    );

    std::fs::create_dir_all(&cli.out_dir)?;

    let battery: Vec<Scenario> = Scenario::battery(&cfg)
        .into_iter()
        .filter(|s| {
            if skip.contains(&s.key.to_string()) {
                println!("  {} {}", "SKIP".yellow(), s.label);
                false
            } else {
                true
            }
        })
        .collect();

    if battery.is_empty() {
        return Err(BenchError::Config(
            "No scenarios to run. Check --skip flags.".into(),
        ));
    }

    let mut suite = RunSuite {
        system_info: SystemInfo::collect(),
        results: Vec::new(),
    };

    for scenario in &battery {
        println!("\n{} {}", "▶".green(), scenario.label.bold());
        let result = scenario.execute(&cli.out_dir)?;
        println!("  Execution time: {:.3}s", result.wall_secs);
        println!("  Trace saved to {}", result.trace_path.dimmed());
        suite.results.push(result);
    }

    report::print_suite(&suite);

    if let Some(ref dir) = cli.export {
        let export_dir = Path::new(dir);
        std::fs::create_dir_all(export_dir)?;
        report::export_csv(&suite, &export_dir.join("schedbench_results.csv"))?;
        report::export_json(&suite, &export_dir.join("schedbench_results.json"))?;
    }

    println!("\nAll tracing complete.");
    println!("Open the trace files with a chrome-trace viewer (chrome://tracing or Perfetto).");

    Ok(())
}
