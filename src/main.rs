use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use video_engagement_analyzer::analyzer::VideoEngagementAnalyzer;
use video_engagement_analyzer::{ingest, report};

#[derive(Parser)]
#[command(name = "engagement-analyzer")]
#[command(about = "Video engagement analysis for community outreach tracking data", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a tracking export and write the full report
    Analyze {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print monthly engagement trends
    Trends {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print metrics, insights and strategies for one community
    Community {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Analyze { csv, format, out } => {
            let report = load(&csv)?.analyze();
            let rendered = match format {
                Format::Markdown => report::build_markdown(&report),
                Format::Json => report::build_json(&report).context("failed to encode report")?,
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Trends { csv } => {
            let trends = load(&csv)?.calculate_monthly_trends();
            let mut output = String::new();
            report::write_trends(&mut output, &trends);
            println!("Monthly trends:");
            print!("{output}");
        }
        Commands::Community { csv, name } => {
            let analysis = load(&csv)?.analyze();
            let community = analysis
                .communities
                .get(&name)
                .with_context(|| format!("community {name:?} not found in {}", csv.display()))?;
            let strategies = analysis
                .strategies
                .get(&name)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let mut output = String::new();
            report::write_community(&mut output, &name, community, strategies);
            print!("{output}");
        }
    }

    Ok(())
}

fn load(csv: &Path) -> anyhow::Result<VideoEngagementAnalyzer> {
    let records = ingest::read_path(csv)
        .with_context(|| format!("failed to load tracking data from {}", csv.display()))?;
    let analyzer = VideoEngagementAnalyzer::new(records);
    info!(
        rows = analyzer.raw_records().len(),
        path = %csv.display(),
        "loaded tracking data"
    );
    Ok(analyzer)
}
