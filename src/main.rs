//! WAIS-IV Profile Charts - command line host
//!
//! Reads a score sheet (JSON), renders the requested profile charts and writes
//! the PNG files.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wais_profile::{
    ChartError, ChartMode, ChartRequest, RenderOptions, ScoreSheet, StaticChartRenderer,
};

#[derive(Parser, Debug)]
#[command(
    name = "wais-profile",
    author,
    version,
    about = "WAIS-IV subtest and composite score profile charts"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render charts for one score sheet
    Render(RenderArgs),
    /// Render both charts for many score sheets
    Batch(BatchArgs),
    /// Print the default score sheet as JSON
    Defaults,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// "subtest", "composite", a chart title, or "both"
    #[arg(long, default_value = "both", value_parser = parse_selection)]
    mode: Selection,

    /// Score sheet JSON; the default scores are used when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Filename prefix, e.g. "wais-iv" gives wais-iv_composite_score_profile.png
    #[arg(long)]
    prefix: Option<String>,

    /// Figure width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Figure height in pixels
    #[arg(long)]
    height: Option<u32>,
}

#[derive(clap::Args, Debug)]
struct BatchArgs {
    /// Score sheet JSON files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Each sheet is written to <out-dir>/<sheet file stem>/
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Debug, Clone)]
enum Selection {
    One(ChartMode),
    Both,
}

impl Selection {
    fn modes(&self) -> Vec<ChartMode> {
        match self {
            Selection::One(mode) => vec![*mode],
            Selection::Both => ChartMode::ALL.to_vec(),
        }
    }
}

fn parse_selection(s: &str) -> Result<Selection, ChartError> {
    if s == "both" {
        Ok(Selection::Both)
    } else {
        s.parse().map(Selection::One)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Batch(args) => handle_batch(args),
        Command::Defaults => {
            let json = serde_json::to_string_pretty(&ScoreSheet::default())?;
            println!("{json}");
            Ok(())
        }
    }
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let sheet = match &args.input {
        Some(path) => load_sheet(path)?,
        None => ScoreSheet::default(),
    };

    let modes = args.mode.modes();
    let mut options = RenderOptions::default();
    if let Some(prefix) = args.prefix {
        options.file_prefix = prefix;
    }
    for mode in &modes {
        let size = match mode {
            ChartMode::SubtestProfile => &mut options.subtest_size,
            ChartMode::CompositeProfile => &mut options.composite_size,
        };
        if let Some(width) = args.width {
            size.width = width;
        }
        if let Some(height) = args.height {
            size.height = height;
        }
    }

    let renderer = StaticChartRenderer::new(options);
    for mode in modes {
        let path = render_to_file(&renderer, &sheet, mode, &args.out_dir)?;
        info!(mode = %mode, path = %path.display(), "chart written");
    }
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<()> {
    let mut options = RenderOptions::default();
    if let Some(prefix) = args.prefix {
        options.file_prefix = prefix;
    }
    let renderer = StaticChartRenderer::new(options);

    // Sheets are independent; each render owns all of its state.
    let failures: Vec<(PathBuf, anyhow::Error)> = args
        .inputs
        .par_iter()
        .filter_map(|input| {
            render_sheet(&renderer, input, &args.out_dir)
                .err()
                .map(|err| (input.clone(), err))
        })
        .collect();

    for (input, err) in &failures {
        error!(input = %input.display(), "{err:#}");
    }
    info!(
        rendered = args.inputs.len() - failures.len(),
        failed = failures.len(),
        "batch finished"
    );

    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} score sheets failed",
            failures.len(),
            args.inputs.len()
        ))
    }
}

fn render_sheet(renderer: &StaticChartRenderer, input: &Path, out_dir: &Path) -> Result<()> {
    let sheet = load_sheet(input)?;
    let stem = input
        .file_stem()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;
    let sheet_dir = out_dir.join(stem);

    for mode in ChartMode::ALL {
        let path = render_to_file(renderer, &sheet, mode, &sheet_dir)?;
        info!(input = %input.display(), path = %path.display(), "chart written");
    }
    Ok(())
}

fn render_to_file(
    renderer: &StaticChartRenderer,
    sheet: &ScoreSheet,
    mode: ChartMode,
    out_dir: &Path,
) -> Result<PathBuf> {
    let request = ChartRequest::from_sheet(sheet, mode)?;
    let chart = renderer
        .render(&request)
        .with_context(|| format!("Failed to render {mode}"))?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(chart.filename());
    fs::write(&path, chart.into_png())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn load_sheet(path: &Path) -> Result<ScoreSheet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read score sheet {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse score sheet {}", path.display()))
}
