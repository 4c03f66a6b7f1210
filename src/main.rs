use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

mod checker;
mod config;
mod graph;
mod ir;
mod program;
mod report;
mod sem;

use checker::Checker;
use config::Config;
use program::Program;
use report::Reporter;

/// deadreach - whole-package dead code detection
#[derive(Parser, Debug)]
#[command(name = "deadreach")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program snapshot to analyze (JSON, as produced by a frontend)
    snapshot: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Names to retain - never report as dead (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Treat this package as the program entry package
    #[arg(long)]
    entry_package: Option<String>,

    /// Render the entity graph through the logs while it is built
    #[arg(long)]
    debug_graph: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for report::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => report::ReportFormat::Terminal,
            OutputFormat::Json => report::ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose || cli.debug_graph, cli.quiet);

    info!("deadreach v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    let prog = Program::from_file(&cli.snapshot)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to load snapshot: {}", cli.snapshot.display()))?;

    info!(
        "loaded snapshot: {} packages, {} functions, {} objects",
        prog.packages.len(),
        prog.funcs.len(),
        prog.objs.len()
    );

    let checker = Checker::with_config(config);
    let unused = checker.check(&prog);

    let reporter = Reporter::new(cli.format.into(), cli.output);
    reporter.report(&prog, &unused)?;

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        let root = cli
            .snapshot
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Config::from_default_locations(&root)?
    };

    if !cli.retain.is_empty() {
        config.retain_patterns.extend(cli.retain.clone());
    }
    if cli.entry_package.is_some() {
        config.entry_package = cli.entry_package.clone();
    }
    if cli.debug_graph {
        config.debug_graph = true;
    }

    Ok(config)
}
