//! Refbuild library crate
//!
//! This crate provides the core functionality for the `refbuild` CLI, which
//! prepares a genome FASTA and GTF for an external reference builder
//! (`cellranger mkref` by default) and runs it. It is organized into small
//! modules: `validate` (argument checks), `workspace` (per-run directory),
//! `reporter` (reporter FASTA parsing and GTF synthesis), `stage` (copying and
//! appending inputs) and `command` (builder invocation). The binary
//! `src/main.rs` calls `refbuild_lib::run()` to execute the CLI.
//!
//! Public API
//!
//! - `run()`: CLI entrypoint used by the binary.
//! - `build_reference()`: the whole pipeline, without argument parsing or
//!   logger setup.
//!
//! See each module for detailed documentation on functions and behavior.

pub mod command;
pub mod error;
pub mod reporter;
pub mod stage;
pub mod validate;
pub mod workspace;

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::{Level, error, info};
use simple_logger::init_with_level;

use crate::command::{BuildCommand, DEFAULT_BUILDER};
use crate::error::Result;
use crate::validate::{RawArgs, ResourceBundle, validate};

/// Top-level CLI types and runner. Keep `main.rs` thin.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of threads handed to the builder
    threads: String,

    /// Memory budget in GB handed to the builder
    memory: String,

    /// Name of the reference to build
    genome_name: String,

    /// Genome FASTA
    genome_fasta: PathBuf,

    /// Annotation GTF
    annotation_gtf: PathBuf,

    /// Reporter FASTA to add to the reference
    #[arg(short = 'r', long = "reporters", value_name = "FASTA")]
    reporters: Option<PathBuf>,

    /// Builder command; the first word is the executable
    #[arg(
        long = "builder",
        env = "REFBUILD_BUILDER",
        default_value = DEFAULT_BUILDER,
        value_parser = parse_builder
    )]
    builder: String,

    /// Extra argument passed to the builder (repeatable)
    #[arg(long = "builder-arg", value_name = "ARG", allow_hyphen_values = true)]
    builder_args: Vec<String>,

    /// Parent directory for the workspace [default: system temp dir]
    #[arg(long = "workdir", value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Print the builder command instead of running it
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,

    /// Logging verbosity level
    #[arg(short = 'L', long = "level", default_value = "info")]
    level: Level,
}

fn parse_builder(s: &str) -> std::result::Result<String, String> {
    if s.trim().is_empty() {
        Err("builder command must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Everything `build_reference` needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub raw: RawArgs,
    pub builder: String,
    pub builder_args: Vec<String>,
    pub workdir: PathBuf,
    pub dry_run: bool,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Workspace allocated for this run
    pub workspace: PathBuf,
    /// Bundle the builder was (or would have been) given
    pub bundle: ResourceBundle,
    pub command: BuildCommand,
}

/// Validate, stage and build.
///
/// Validation happens before anything touches the disk, so a bad argument
/// never leaves a workspace behind. Every valid run gets a workspace; inputs
/// are only staged into it when a reporter FASTA is supplied, otherwise the
/// builder reads the originals. With `dry_run` the command is assembled but
/// not executed.
pub fn build_reference(config: &RunConfig) -> Result<RunOutcome> {
    let bundle = validate(config.raw.clone())?;

    let workspace = workspace::allocate(&config.workdir)?;
    info!("workspace: {}", workspace.display());

    let bundle = if bundle.reporter_fasta.is_some() {
        let (staged, report) = stage::inject_reporters(&bundle, &workspace)?;
        info!(
            "staged {} reporter(s): {} FASTA bytes, {} GTF bytes appended",
            report.reporters, report.fasta_bytes_appended, report.gtf_bytes_appended
        );
        staged
    } else {
        bundle
    };

    let command = BuildCommand::from_bundle(&config.builder, &config.builder_args, &bundle)?;
    if !config.dry_run {
        command.run()?;
        info!("reference '{}' built", bundle.genome_name);
    }

    Ok(RunOutcome {
        workspace,
        bundle,
        command,
    })
}

fn init_logging(level: Level) -> anyhow::Result<()> {
    init_with_level(level).context("failed to initialise logging")
}

/// Run the Refbuild CLI.
///
/// Parses arguments, sets up logging and runs [`build_reference`]. Errors are
/// logged to stderr and cause the process to exit with code 1.
///
/// Example:
///
/// ```no_run
/// refbuild_lib::run(); // called from src/main.rs
/// ```
pub fn run() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.level) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }

    let dry_run = cli.dry_run;
    let config = RunConfig {
        raw: RawArgs {
            threads: cli.threads,
            memory: cli.memory,
            genome_name: cli.genome_name,
            genome_fasta: cli.genome_fasta,
            annotation_gtf: cli.annotation_gtf,
            reporter_fasta: cli.reporters,
        },
        builder: cli.builder,
        builder_args: cli.builder_args,
        workdir: cli.workdir.unwrap_or_else(std::env::temp_dir),
        dry_run,
    };

    let outcome = build_reference(&config)
        .with_context(|| format!("failed to build reference '{}'", config.raw.genome_name))
        .unwrap_or_else(|e| {
            error!("{:#}", e);
            std::process::exit(1);
        });

    if dry_run {
        println!("{}", outcome.command);
    }
    println!("workspace: {}", outcome.workspace.display());
}
