use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use replication::SyncConfig;
use simbench::{preset, run_scenario, ScenarioReport, PRESETS};

#[derive(Parser)]
#[command(
    name = "simbench",
    version,
    about = "glide link simulation benchmark harness"
)]
struct Cli {
    /// Scenario presets to run; all of them when omitted.
    #[arg(long = "scenario")]
    scenarios: Vec<String>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Sync config JSON; defaults apply to missing keys.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory for summary.json.
    #[arg(long, default_value = "target/simbench")]
    out_dir: PathBuf,
    /// Fail if any scenario's p95 playback error exceeds this value.
    #[arg(long)]
    max_p95_error: Option<f32>,
    /// Fail if any scenario's average packet size exceeds this value.
    #[arg(long)]
    max_avg_packet_bytes: Option<u64>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SyncConfig::default(),
    };

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create output dir {}", cli.out_dir.display()))?;

    let names: Vec<String> = if cli.scenarios.is_empty() {
        PRESETS.iter().map(ToString::to_string).collect()
    } else {
        cli.scenarios.clone()
    };

    let mut reports = Vec::with_capacity(names.len());
    for name in &names {
        let scenario = preset(name)
            .with_context(|| format!("unknown scenario {name}; expected one of {PRESETS:?}"))?
            .with_ticks(cli.ticks)
            .with_seed(cli.seed);
        let report = run_scenario(&scenario, &config)
            .with_context(|| format!("run scenario {name}"))?;
        println!(
            "{name}: sent {} dropped {} avg {} B (bincode {} B) mean error {:.4} p95 {:.4}",
            report.sent,
            report.dropped,
            report.avg_packet_bytes,
            report.bincode_bytes_total / report.sent.max(1),
            report.mean_error,
            report.p95_error
        );
        reports.push(report);
    }

    write_summary_json(&cli.out_dir, &reports)?;
    let max_packet = config.wire_layout(false).max_packet_len() as u64;
    let limits = wire::Limits::default();
    for report in &reports {
        if report.p95_packet_bytes > max_packet
            || report.p95_packet_bytes > limits.max_packet_bytes as u64
        {
            anyhow::bail!(
                "{}: p95 packet bytes {} exceed the layout maximum {max_packet}",
                report.name,
                report.p95_packet_bytes
            );
        }
        report.assert_budgets(cli.max_p95_error, cli.max_avg_packet_bytes)?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: &Path) -> Result<SyncConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: SyncConfig = serde_json::from_str(&contents).context("parse config json")?;
    config
        .validate()
        .map_err(|err| anyhow::anyhow!("config validation failed: {err}"))?;
    Ok(config)
}

fn write_summary_json(out_dir: &Path, reports: &[ScenarioReport]) -> Result<()> {
    let path = out_dir.join("summary.json");
    let contents = serde_json::to_string_pretty(reports).context("serialize summary")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
