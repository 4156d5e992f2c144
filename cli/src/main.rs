//! rakeview CLI - Rake-adjusted results from exported session and chart data
//!
//! Usage:
//!   rakeview analyze --hands ev_data.json --sessions sessions.json --year 2024
//!   rakeview analyze ... --mode tolerant --fallback nearest --format json
//!   rakeview sessions --sessions sessions.json --year 2024

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use rakeview_engine::{FallbackPolicy, MatchingMode, RakeEngine, SessionRecord};
use rakeview_ingest::{hands_from_points, parse_points, SessionParser, SessionRow};

mod logging;
mod render;
mod settings;

use logging::{init_logging, LogFormat};
use settings::Settings;

#[derive(Parser)]
#[command(name = "rakeview")]
#[command(about = "Rake-adjusted win/loss and all-in EV per stake level", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML settings file (engine, ingest, logging sections)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match hands to sessions and print the rake-adjusted report
    Analyze {
        /// Chart data points (JSON array)
        #[arg(long)]
        hands: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        /// Rake as a fraction of the estimated pot (0.05 = 5%)
        #[arg(long)]
        rake_pct: Option<f64>,

        /// Rake cap in big blinds
        #[arg(long)]
        cap_bb: Option<f64>,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Required with --mode tolerant unless set in the settings file
        #[arg(long, value_enum)]
        fallback: Option<FallbackArg>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Parse the session table and print the resulting session records
    Sessions {
        #[command(flatten)]
        table: TableArgs,
    },
}

#[derive(clap::Args)]
struct TableArgs {
    /// Session table rows (JSON array of raw cell text)
    #[arg(long)]
    sessions: PathBuf,

    /// Calendar year the session table refers to
    #[arg(long)]
    year: i32,

    /// Table local time offset from UTC, in minutes
    #[arg(long)]
    utc_offset: Option<i32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Strict,
    Tolerant,
}

#[derive(Clone, Copy, ValueEnum)]
enum FallbackArg {
    Nearest,
    Highest,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Nearest => FallbackPolicy::NearestInTime,
            FallbackArg::Highest => FallbackPolicy::HighestStakes,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    let format: LogFormat = settings.logging.format.parse().map_err(anyhow::Error::msg)?;
    init_logging(&settings.logging.level, format)?;

    match cli.command {
        Commands::Analyze { hands, table, rake_pct, cap_bb, mode, fallback, format } => {
            if let Some(pct) = rake_pct {
                settings.engine.rake.percentage = pct;
            }
            if let Some(cap) = cap_bb {
                settings.engine.rake.cap_in_bb = cap;
            }
            settings.engine.matching = resolve_mode(settings.engine.matching, mode, fallback)?;

            let engine = RakeEngine::new(settings.engine)?;
            let sessions = load_sessions(&table, &settings)?;
            let points = parse_points(&read(&hands)?)?;
            let hands = hands_from_points(&points)?;
            info!(hands = hands.len(), sessions = sessions.len(), "inputs loaded");

            let report = engine.run(&hands, &sessions)?;
            match format {
                OutputFormat::Table => print!("{}", render::render_report(&report)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Sessions { table } => {
            let sessions = load_sessions(&table, &settings)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}

/// Apply --mode/--fallback on top of the configured matching mode.
fn resolve_mode(
    configured: MatchingMode,
    mode: Option<ModeArg>,
    fallback: Option<FallbackArg>,
) -> Result<MatchingMode> {
    let configured_policy = match configured {
        MatchingMode::Tolerant(policy) => Some(policy),
        MatchingMode::Strict => None,
    };
    let policy = fallback.map(FallbackPolicy::from).or(configured_policy);

    match (mode, policy) {
        (Some(ModeArg::Strict), _) => Ok(MatchingMode::Strict),
        (Some(ModeArg::Tolerant), Some(policy)) => Ok(MatchingMode::Tolerant(policy)),
        (Some(ModeArg::Tolerant), None) => bail!("--mode tolerant needs a fallback policy (--fallback nearest|highest)"),
        (None, Some(policy)) if fallback.is_some() => Ok(MatchingMode::Tolerant(policy)),
        (None, _) => Ok(configured),
    }
}

fn load_sessions(table: &TableArgs, settings: &Settings) -> Result<Vec<SessionRecord>> {
    let rows: Vec<SessionRow> = serde_json::from_str(&read(&table.sessions)?)
        .with_context(|| format!("parsing {}", table.sessions.display()))?;
    let parser = SessionParser::new(table.year)
        .with_utc_offset(table.utc_offset.unwrap_or(settings.ingest.utc_offset_minutes))
        .with_end_buffer_ms(settings.ingest.end_buffer_ms);
    Ok(parser.parse_rows(&rows)?)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
