#![warn(missing_docs)]
//! uavsweep CLI Library
//!
//! Command-line front end and engine for PSP-UAV parameter sweeps. The
//! facade binary calls [`run`]; embedders can parse their own [`Cli`] and
//! call [`run_with_cli`].
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     uavsweep_cli::run()
//! }
//! ```

mod config;
mod executor;
mod metrics;
mod planner;
mod supervisor;

pub use config::*;
pub use executor::{
    Executor, build_report, build_report_meta, compute_averages, format_summary_line,
    format_text_report,
};
pub use metrics::{MetricsParser, PatternSet};
pub use planner::{ExecutionPlan, RunSpec, build_plan, instance_stem, instance_variant};
pub use supervisor::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use uavsweep_report::{ReportPaths, generate_csv_report};

/// uavsweep CLI arguments
#[derive(Parser, Debug)]
#[command(name = "uavsweep")]
#[command(author, version, about = "uavsweep - parameter sweeps for the PSP-UAV solver")]
pub struct Cli {
    /// Optional subcommand (Run, List, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Experiments configuration (JSON, or TOML by extension)
    /// Defaults to <root>/scripts/experiments_config.json
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root; instance paths are relative to it
    #[arg(long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Simulator executable (defaults to <root>/PSP-UAV)
    #[arg(long, global = true)]
    pub binary: Option<PathBuf>,

    /// Command run in <root> when the simulator binary is missing
    #[arg(long, default_value = "make", global = true)]
    pub build_command: String,

    /// Report directory (defaults to <root>/experiments)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Run only this experiment (repeatable)
    #[arg(short = 'e', long = "experiment", global = true)]
    pub experiments: Vec<String>,

    /// Dry run - print the plan without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every selected experiment (default)
    Run,
    /// Print the resolved experiments and planned runs
    List,
    /// Write the built-in defaults as a configuration document
    Init {
        /// Destination file (stdout if not specified); `.toml` selects TOML
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the uavsweep CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success. An interrupted sweep returns
/// [`SupervisorError::Interrupted`] (see [`is_interrupted`]).
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the uavsweep CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Init { ref output, force }) => init_config(output.as_deref(), force),
        Some(Commands::List) => list_experiments(&cli),
        Some(Commands::Run) | None => {
            if cli.dry_run {
                list_experiments(&cli)
            } else {
                run_sweeps(&cli)
            }
        }
    }
}

/// Whether an error returned by [`run_with_cli`] is a user interruption.
pub fn is_interrupted(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<SupervisorError>(),
        Some(SupervisorError::Interrupted)
    )
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "uavsweep=debug"
    } else {
        "uavsweep=info"
    };
    // Already installed when called more than once in a process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filesystem locations derived from the CLI, all absolute
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedPaths {
    root: PathBuf,
    config: PathBuf,
    binary: PathBuf,
    output_dir: PathBuf,
}

impl ResolvedPaths {
    fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let root = cli
            .root
            .canonicalize()
            .with_context(|| format!("Project root not found: {}", cli.root.display()))?;

        let config = match &cli.config {
            Some(path) => absolute(path)?,
            None => root.join("scripts").join("experiments_config.json"),
        };
        let binary = match &cli.binary {
            Some(path) => absolute(path)?,
            None => root.join("PSP-UAV"),
        };
        let output_dir = match &cli.output_dir {
            Some(path) => absolute(path)?,
            None => root.join("experiments"),
        };

        Ok(Self {
            root,
            config,
            binary,
            output_dir,
        })
    }
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Cannot resolve path: {}", path.display()))
}

/// Resolve the configuration and keep the experiments selected on the command line.
fn load_config(cli: &Cli, paths: &ResolvedPaths) -> anyhow::Result<SweepConfig> {
    let config = SweepConfig::load(&paths.config)?.select(&cli.experiments)?;

    match &config.source {
        ConfigSource::File(path) => println!("Using configuration from: {}", path.display()),
        ConfigSource::BuiltIn => println!(
            "No config found at {}, using built-in defaults.",
            paths.config.display()
        ),
    }

    Ok(config)
}

/// Process-wide stop flag raised by Ctrl-C.
fn interrupt_flag() -> Arc<AtomicBool> {
    static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

    FLAG.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = flag.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            handler_flag.store(true, Ordering::SeqCst);
        }) {
            tracing::warn!("Could not install Ctrl-C handler: {}", e);
        }
        flag
    })
    .clone()
}

fn run_sweeps(cli: &Cli) -> anyhow::Result<()> {
    let stop = interrupt_flag();
    let paths = ResolvedPaths::from_cli(cli)?;
    let config = load_config(cli, &paths)?;

    verify_instances(&paths.root, &config.experiments)?;

    let simulator = Simulator::new(&paths.binary, &paths.root);
    if simulator.ensure_built(&split_command(&cli.build_command), &stop)? {
        println!("Built simulator: {}", paths.binary.display());
    }

    std::fs::create_dir_all(&paths.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            paths.output_dir.display()
        )
    })?;

    let parser = PatternSet::psp_uav().context("Invalid metric pattern")?;
    let executor = Executor::new(simulator, parser, stop);

    for experiment in &config.experiments {
        run_experiment(&executor, experiment, &paths.output_dir)?;
    }

    Ok(())
}

/// Run one experiment and write its report (and CSV when enabled).
fn run_experiment<P: MetricsParser>(
    executor: &Executor<P>,
    experiment: &Experiment,
    output_dir: &Path,
) -> anyhow::Result<()> {
    println!("\n=== Experiment: {} ===", experiment.name);

    let plan = build_plan(experiment);
    tracing::debug!("{} runs planned for '{}'", plan.run_count(), experiment.name);

    let start_time = Instant::now();
    let outcomes = executor.execute(experiment, &plan)?;
    let total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    let simulator = executor.simulator();
    let meta = build_report_meta(simulator.binary(), simulator.root());
    let report = build_report(meta, experiment.parameters(), outcomes, total_duration_ms);

    let paths = ReportPaths::new(output_dir, &report.meta.timestamp, &experiment.name);
    std::fs::write(&paths.text, format_text_report(&report))
        .with_context(|| format!("Failed to write report {}", paths.text.display()))?;
    println!("Report saved to: {}", paths.text.display());

    if experiment.export_csv {
        std::fs::write(&paths.csv, generate_csv_report(&report.outcomes))
            .with_context(|| format!("Failed to write CSV {}", paths.csv.display()))?;
        println!("CSV saved to: {}", paths.csv.display());
    }

    println!("{}", format_summary_line(&report.summary));
    Ok(())
}

fn list_experiments(cli: &Cli) -> anyhow::Result<()> {
    let paths = ResolvedPaths::from_cli(cli)?;
    let config = load_config(cli, &paths)?;

    println!("uavsweep Plan:");
    println!("├── binary: {}", paths.binary.display());

    let mut total: u64 = 0;
    for experiment in &config.experiments {
        let runs = experiment.run_count();
        total = total.saturating_add(runs);

        println!("├── experiment: {} ({} runs)", experiment.name, runs);
        for instance in &experiment.instances {
            let status = if paths.root.join(instance).exists() {
                "ok"
            } else {
                "missing"
            };
            println!(
                "│   ├── {} [{}] iterations={:?}",
                instance,
                status,
                experiment.iterations_for(instance)
            );
        }
        println!(
            "│   ├── drones={:?} ticks={:?} repeats={}",
            experiment.drones, experiment.ticks, experiment.repeats
        );
        println!(
            "│   └── export_data={} include_time_breakdown={} export_csv={}",
            experiment.export_data, experiment.include_time_breakdown, experiment.export_csv
        );
    }

    println!(
        "{} experiment(s), {} runs planned.",
        config.experiments.len(),
        total
    );
    Ok(())
}

fn init_config(output: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let Some(path) = output else {
        print!("{}", default_json());
        return Ok(());
    };

    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    let content = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => default_json(),
        DocumentFormat::Toml => default_toml(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration written to: {}", path.display());

    Ok(())
}
