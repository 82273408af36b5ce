mod logic;
mod util;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use logic::{
    CareerPlan, CareerSummary, DriverStrategy, SaveTarget, run_career, write_console_report,
    write_json_report, write_markdown_report,
};
use redline_game::EngineConfig;
use util::{parse_seeds, split_csv};

#[derive(Debug, Parser)]
#[command(name = "redline-tester", version = "0.1.0")]
#[command(about = "Headless career simulation and invariant checks for the Redline engine")]
struct Args {
    /// Seeds to run (comma-separated, `start..end` ranges allowed)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Race slots per career
    #[arg(long, default_value_t = 60)]
    races: u32,

    /// Driver strategies to simulate (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',', default_value = "balanced")]
    strategies: Vec<DriverStrategy>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine tuning overrides as JSON; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to commit final profiles to instead of memory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    if args.report == "console" && args.output.is_none() {
        announce_banner(&args, seeds.len());
    }

    let start_time = Instant::now();
    let results = run_careers(&args, &seeds, &config)?;
    write_reports(&args, &results, start_time.elapsed())?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn announce_banner(args: &Args, seed_count: usize) {
    println!("{}", "🏎️  Redline Career Tester".bright_cyan().bold());
    println!(
        "{} seeds × {} strategies, {} race slots each",
        seed_count,
        args.strategies.len(),
        args.races
    );
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("invalid engine config in {}", path.display()))
}

fn run_careers(args: &Args, seeds: &[u64], config: &EngineConfig) -> Result<Vec<CareerSummary>> {
    let mut results = Vec::with_capacity(seeds.len() * args.strategies.len());
    for &seed in seeds {
        for &strategy in &args.strategies {
            let plan = CareerPlan::new(seed, strategy)
                .with_races(args.races)
                .with_config(config.clone());
            let storage = match &args.save_dir {
                Some(dir) => SaveTarget::directory(dir.clone())?,
                None => SaveTarget::memory(),
            };
            let summary = run_career(&plan, storage)
                .with_context(|| format!("career {} failed to run", plan.profile_id()))?;
            log::info!(
                "{} finished: level {}, ${}, passed={}",
                summary.profile_id,
                summary.final_level,
                summary.final_money,
                summary.passed
            );
            results.push(summary);
        }
    }
    Ok(results)
}

fn write_reports(args: &Args, results: &[CareerSummary], duration: Duration) -> Result<()> {
    if args.output.is_some() {
        colored::control::set_override(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => write_json_report(&mut output_target, results, Utc::now())?,
        "markdown" => write_markdown_report(&mut output_target, results, Utc::now())?,
        _ => write_console_report(&mut output_target, results, duration)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
