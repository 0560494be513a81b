//! whittle - oracle-driven C test-case reducer.
//!
//! Given a C file and an oracle script that exits 0 while the file stays
//! interesting, whittle repeatedly applies small syntactic edits (strip
//! qualifiers, fold ternaries, drop prototypes, peel bracket pairs,
//! rewrite sub-expressions) and keeps each one only if the oracle still
//! accepts the result and the program did not grow. It is meant to run
//! after a line-based delta pass has removed the obvious bulk.
//!
//! # Usage
//!
//! ```bash
//! # Everything the registry has
//! whittle interesting.sh prog.c --all
//!
//! # Just bracket peeling and ternary folding
//! whittle interesting.sh prog.c --brackets --ternary
//!
//! # Show the registry
//! whittle --list-methods
//! ```
//!
//! The oracle is invoked as `./interesting.sh` from its own directory,
//! with no arguments; it reads `prog.c` itself. `prog.c.orig` keeps the
//! untouched input and `prog.c.bak` always holds the last accepted
//! program, so an interrupted run loses nothing.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::ReducerConfig;
use whittle_core::ProgramBuffer;
use whittle_engine::{methods, FixpointDriver, OracleHarness, RunReport, RunStats};

/// CLI arguments for whittle.
#[derive(Parser, Debug)]
#[command(
    name = "whittle",
    about = "Shrink a C file while an oracle script keeps accepting it",
    version
)]
pub struct CliArgs {
    /// Oracle script; exits 0 while the file stays interesting.
    #[arg(value_name = "ORACLE")]
    oracle: Option<PathBuf>,

    /// The C file to reduce, in place.
    #[arg(value_name = "CFILE")]
    cfile: Option<PathBuf>,

    /// Enable every reduction method.
    #[arg(long)]
    all: bool,

    /// Whole-buffer whitespace cleanup.
    #[arg(long = "all_blanks", alias = "all-blanks")]
    all_blanks: bool,

    /// Collapse individual whitespace runs.
    #[arg(long)]
    blanks: bool,

    /// Rewrite transparent_crc calls to plain printfs.
    #[arg(long)]
    crc: bool,

    /// Move function definitions into their prototype slots.
    #[arg(long = "move_func", alias = "move-func")]
    move_func: bool,

    /// Record function prototypes for coordinated argument removal.
    #[arg(long = "del_args", alias = "del-args")]
    del_args: bool,

    /// Delete balanced brace runs, or just the braces.
    #[arg(long)]
    brackets: bool,

    /// Fold a ? b : c to one arm.
    #[arg(long)]
    ternary: bool,

    /// Delete balanced parenthesis runs, or just the parens.
    #[arg(long)]
    parens: bool,

    /// Apply the rewrite-rule catalogues.
    #[arg(long = "replace_regex", alias = "replace-regex")]
    replace_regex: bool,

    /// Shorten integer literals piecewise.
    #[arg(long = "shorten_ints", alias = "shorten-ints")]
    shorten_ints: bool,

    /// Reformat through the external pretty-printer.
    #[arg(long)]
    indent: bool,

    /// Path to a TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long)]
    json_logs: bool,

    /// Keep a delta_tmp_<trial>.c snapshot of every trial.
    #[arg(long)]
    keep_trials: bool,

    /// Write the final statistics as pretty JSON to this file.
    #[arg(long, value_name = "FILE")]
    report_json: Option<PathBuf>,

    /// Print the method registry and exit.
    #[arg(long)]
    list_methods: bool,
}

impl CliArgs {
    /// The method names selected by individual flags.
    fn selected_methods(&self) -> Vec<String> {
        [
            ("all_blanks", self.all_blanks),
            ("blanks", self.blanks),
            ("crc", self.crc),
            ("move_func", self.move_func),
            ("del_args", self.del_args),
            ("brackets", self.brackets),
            ("ternary", self.ternary),
            ("parens", self.parens),
            ("replace_regex", self.replace_regex),
            ("shorten_ints", self.shorten_ints),
            ("indent", self.indent),
        ]
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Initialize tracing/logging.
fn init_tracing(config: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = if let Some(ref config_path) = args.config {
        ReducerConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        ReducerConfig::default()
    };
    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    if args.list_methods {
        for method in methods::all_methods(config.tools.indent_tool()) {
            println!(
                "{:>14}  rank {:>2}  {}",
                method.name(),
                method.rank(),
                method.description()
            );
        }
        return Ok(());
    }

    let (Some(oracle), Some(cfile)) = (args.oracle.clone(), args.cfile.clone()) else {
        bail!("usage: whittle <oracle> <cfile> (--all | --<method>)...");
    };

    let selected = args.selected_methods();
    if !args.all && selected.is_empty() {
        bail!(
            "no reduction method selected; pass --all or one of: {}",
            methods::method_names()
                .iter()
                .map(|n| format!("--{n}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let mut buffer = ProgramBuffer::load(&cfile)
        .with_context(|| format!("failed to load {}", cfile.display()))?;
    let mut stats = RunStats::new(buffer.len());
    let mut harness = OracleHarness::new(&oracle, &cfile, &buffer, config.debug.keep_trials)?;

    // Fail fast when the oracle does not even accept the untouched input.
    harness.sanity_check("startup")?;

    let mut driver = FixpointDriver::new(methods::select(
        &selected,
        args.all,
        config.tools.indent_tool(),
    )?);

    info!(
        oracle = %oracle.display(),
        target = %cfile.display(),
        methods = ?driver.method_names(),
        len = buffer.len(),
        "starting reduction"
    );

    let passes = driver.run(&mut buffer, &mut harness, &mut stats)?;

    let report = RunReport::new(
        oracle.display().to_string(),
        cfile.display().to_string(),
        passes,
        stats,
    );
    print!("{}", report.render_text());

    if let Some(ref path) = args.report_json {
        report
            .write_json(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    Ok(())
}
