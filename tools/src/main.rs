use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glide_tools::{
    decode_packet_json, describe_layout, encode_packet_json, format_decode_pretty, inspect_packet,
    DecodedPacket, InspectReport,
};
use glob::Pattern;
use replication::SyncConfig;
use tracing::debug;
use wire::{Limits, WireLayout};

#[derive(Parser)]
#[command(
    name = "glide-tools",
    version,
    about = "glide packet inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Selects the wire layout packets were written with.
#[derive(Args)]
struct LayoutArgs {
    /// Sync config JSON; defaults apply to missing keys.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Packets come from a character and may carry a movement mode.
    #[arg(long)]
    character: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect packet structure and sizes.
    Inspect {
        /// Path to the packet bytes, or a directory of packets.
        packet_path: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected packets.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected packets (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode a packet into structured JSON.
    Decode {
        /// Path to the packet bytes.
        packet_file: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Encode a JSON state into packet bytes.
    Encode {
        /// JSON state in the format `decode` prints.
        state_file: PathBuf,
        /// Where to write the packet.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Print the wire layout a config produces.
    Layout {
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            packet_path,
            layout,
            glob,
            sort,
            limit,
        } => {
            let layout = load_layout(&layout)?;
            if packet_path.is_dir() {
                let entries = collect_packet_entries(&packet_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    let bytes = fs::read(&entry.path)
                        .with_context(|| format!("read packet {}", entry.path.display()))?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    match inspect_packet(&bytes, &layout, &Limits::default()) {
                        Ok(report) => print_inspect_report(&report),
                        Err(err) => println!("decode failed: {err}"),
                    }
                }
            } else {
                let bytes = fs::read(&packet_path)
                    .with_context(|| format!("read packet {}", packet_path.display()))?;
                let report = inspect_packet(&bytes, &layout, &Limits::default())
                    .with_context(|| format!("decode {}", packet_path.display()))?;
                print_inspect_report(&report);
            }
        }
        Command::Decode {
            packet_file,
            layout,
            format,
        } => {
            let bytes = fs::read(&packet_file)
                .with_context(|| format!("read packet {}", packet_file.display()))?;
            let layout = load_layout(&layout)?;
            let output = decode_packet_json(&bytes, &layout, &Limits::default())
                .with_context(|| format!("decode {}", packet_file.display()))?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&output).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    println!("{}", format_decode_pretty(&output));
                }
            }
        }
        Command::Encode {
            state_file,
            out,
            layout,
        } => {
            let layout = load_layout(&layout)?;
            let contents = fs::read_to_string(&state_file)
                .with_context(|| format!("read state {}", state_file.display()))?;
            let packet: DecodedPacket =
                serde_json::from_str(&contents).context("parse state json")?;
            let bytes = encode_packet_json(&packet, &layout, &Limits::default())
                .context("encode packet")?;
            fs::write(&out, &bytes).with_context(|| format!("write packet {}", out.display()))?;
            println!("wrote {} bytes to {}", bytes.len(), out.display());
        }
        Command::Layout { layout } => {
            let layout = load_layout(&layout)?;
            let report = describe_layout(&layout);
            let json = serde_json::to_string_pretty(&report).context("serialize json")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_layout(args: &LayoutArgs) -> Result<WireLayout> {
    let config = match &args.config {
        Some(path) => load_config(path).context("load config")?,
        None => SyncConfig::default(),
    };
    let layout = config.wire_layout(args.character);
    debug!(?layout, "using wire layout");
    Ok(layout)
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

struct PacketEntry {
    path: PathBuf,
    size: u64,
}

fn collect_packet_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<PacketEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(PacketEntry { path, size });
    }
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<PacketEntry>,
    sort: Option<InspectSort>,
) -> Vec<PacketEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}

fn print_inspect_report(report: &InspectReport) {
    let flags = report.flags;
    println!(
        "flags: 0x{:02x} timestamp: {:.4} length: {} bytes",
        flags.raw(),
        report.state.timestamp,
        report.len
    );
    println!(
        "rest: position={} rotation={}",
        flags.at_positional_rest(),
        flags.at_rotational_rest()
    );
    println!("sections:");
    println!("  prefix: {} bytes", report.prefix_bytes);
    if let Some(origin) = report.state.origin {
        println!("  origin {origin}: {} bytes", report.origin_bytes);
    }
    if let Some(mode) = report.state.movement_mode {
        println!("  movement mode {mode}: {} bytes", report.movement_mode_bytes);
    }
    for field in &report.fields {
        let encoding = if field.compressed { "half" } else { "full" };
        println!(
            "  {}: {:?} {encoding} ({} bytes)",
            field.kind, field.mode, field.bytes
        );
    }
}
