//! Pretty-print battery results with comparison tables, CSV and JSON export.

use crate::{RunSuite, ScenarioResult};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use std::path::Path;

// ────────────────────────────────────────────────────────────────────────────────
// Terminal output
// ────────────────────────────────────────────────────────────────────────────────

/// Print the full battery report.
pub fn print_suite(suite: &RunSuite) {
    println!(
        "\n{}",
        "━━━ Workload Battery Report ━━━".bold().cyan()
    );
    println!(
        "  OS: {}  Arch: {}  CPUs: {}  Time: {}",
        suite.system_info.os,
        suite.system_info.arch,
        suite.system_info.cpus,
        suite.system_info.timestamp
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        "Scenario",
        "Mode",
        "Tasks",
        "Wall (s)",
        "p50 (μs)",
        "p99 (μs)",
        "Mean (μs)",
        "Events",
        "Trace",
    ]);

    for r in &suite.results {
        let is_fastest = is_fastest_of_kind(r, &suite.results);
        let name = if is_fastest {
            format!("★ {}", r.label)
        } else {
            r.label.clone()
        };
        let name_cell = if is_fastest {
            Cell::new(name).fg(Color::Green)
        } else {
            Cell::new(name)
        };
        let wall_cell = if is_fastest {
            Cell::new(format!("{:.3}", r.wall_secs)).fg(Color::Green)
        } else {
            Cell::new(format!("{:.3}", r.wall_secs))
        };

        table.add_row(vec![
            name_cell,
            Cell::new(&r.mode),
            Cell::new(r.tasks),
            wall_cell,
            Cell::new(format!("{:.1}", r.p50_us)),
            Cell::new(format!("{:.1}", r.p99_us)),
            Cell::new(format!("{:.1}", r.mean_us)),
            Cell::new(format_count(r.events as u64)),
            Cell::new(&r.trace_path),
        ]);
    }

    println!("{table}");

    for r in &suite.results {
        println!(
            "  {} {}",
            r.trace_path.dimmed(),
            "open with a chrome-trace viewer (chrome://tracing or Perfetto)".dimmed()
        );
    }
}

/// Fastest wall time among the results sharing this result's workload kind
/// (the part of the key before the first dash).
fn is_fastest_of_kind(result: &ScenarioResult, results: &[ScenarioResult]) -> bool {
    let kind = workload_kind(&result.key);
    let best = results
        .iter()
        .filter(|r| workload_kind(&r.key) == kind)
        .map(|r| r.wall_secs)
        .fold(f64::INFINITY, f64::min);
    result.wall_secs <= best
}

fn workload_kind(key: &str) -> &str {
    key.split('-').next().unwrap_or(key)
}

// ────────────────────────────────────────────────────────────────────────────────
// CSV export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_csv(suite: &RunSuite, path: &Path) -> std::io::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "scenario",
        "mode",
        "tasks",
        "wall_secs",
        "ops",
        "p50_us",
        "p99_us",
        "mean_us",
        "events",
        "trace_path",
    ])?;

    for r in &suite.results {
        wtr.write_record([
            &r.key,
            &r.mode,
            &r.tasks.to_string(),
            &format!("{:.6}", r.wall_secs),
            &r.ops.to_string(),
            &format!("{:.2}", r.p50_us),
            &format!("{:.2}", r.p99_us),
            &format!("{:.2}", r.mean_us),
            &r.events.to_string(),
            &r.trace_path,
        ])?;
    }

    wtr.flush()?;
    println!("  CSV exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// JSON export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_json(suite: &RunSuite, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(suite)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(path, json)?;
    println!("  JSON exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// Formatting helpers
// ────────────────────────────────────────────────────────────────────────────────

fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}
