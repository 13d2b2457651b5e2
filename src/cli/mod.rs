//! CLI module - Command line interface definitions and handlers

pub mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::classifier::{detect_keystore_type, FormatClassifier};
use crate::config::{generate_sample_config, Config, ReportFormat};
use crate::source::ByteSource;
use report::{ExamineReport, FileReport};

/// Keysniff - identify keystores, certificates, CSRs, CRLs and key files
///
/// Looks only at file contents; extensions are ignored. Nothing is decrypted
/// and no passwords are needed.
#[derive(Parser, Debug)]
#[command(name = "keysniff")]
#[command(version)]
#[command(about = "Identify cryptographic files from their bytes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the format of files or directories
    Examine(ExamineArgs),

    /// Print the keystore type of a file (JKS, PKCS12, BKS, ...)
    Keystore(KeystoreArgs),

    /// Manage the config file
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct ExamineArgs {
    /// Files or directories to examine
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Descend into directories
    #[arg(long, short)]
    pub recursive: bool,

    /// Report format
    #[arg(long, short, value_enum)]
    pub format: Option<ReportFormat>,

    /// Show what each detection was based on
    #[arg(long, short)]
    pub evidence: bool,

    /// Skip files larger than this many bytes (0 = no limit)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct KeystoreArgs {
    /// Keystore file
    #[arg(required = true)]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Write a commented config file if none exists
    Init,
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

/// Run `examine`. Returns false when any input could not be read.
pub fn run_examine(args: &ExamineArgs, config: &Config) -> Result<bool> {
    let recursive = args.recursive || config.detect.recursive;
    let limit = match args.max_size {
        Some(0) => None,
        Some(max) => Some(max),
        None => config.detect.input_limit(),
    };
    let format = args.format.unwrap_or(config.output.format);
    let show_evidence = args.evidence || config.output.show_evidence;
    if args.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    let files = collect_inputs(&args.paths, recursive, config.detect.skip_hidden);
    tracing::info!(files = files.len(), recursive, "examining inputs");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.detect.workers)
        .build()
        .context("Failed to build worker pool")?;

    let classifier = FormatClassifier::new();
    let files: Vec<FileReport> = pool.install(|| {
        files
            .par_iter()
            .map(|path| examine_one(&classifier, path, limit))
            .collect()
    });

    let report = ExamineReport::new(files);
    match format {
        ReportFormat::Human => print!("{}", report.render_human(show_evidence)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(report.failed() == 0)
}

fn examine_one(classifier: &FormatClassifier, path: &Path, limit: Option<u64>) -> FileReport {
    let source = match ByteSource::from_path(path, limit) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "skipping input");
            return FileReport::failed(path, err.to_string());
        }
    };

    match classifier.examine(source.as_bytes()) {
        Ok(outcome) => FileReport::classified(path, source.len() as u64, outcome),
        Err(err) => FileReport::failed(path, err.to_string()),
    }
}

/// Expand directories into the files under them
fn collect_inputs(paths: &[PathBuf], recursive: bool, skip_hidden: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            // Missing paths are kept so they show up as read failures
            files.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .max_depth(if recursive { usize::MAX } else { 1 });

        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(skip_hidden && is_hidden(e.file_name())))
        {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "failed to walk directory"),
            }
        }
    }

    files
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Run `keystore`. Returns false when the file is not a keystore.
pub fn run_keystore(args: &KeystoreArgs, config: &Config) -> Result<bool> {
    let source = ByteSource::from_path(&args.path, config.detect.input_limit())?;

    match detect_keystore_type(source.as_bytes()) {
        Some(variant) => {
            println!("{}", variant.jce_name());
            if variant.is_bouncy_castle() {
                tracing::info!(keystore = %variant, "format needs the Bouncy Castle provider");
            }
            Ok(true)
        }
        None => {
            eprintln!(
                "{} {} is not a recognised keystore",
                "✗".bright_red(),
                args.path.display()
            );
            Ok(false)
        }
    }
}

/// Run `config <action>`
pub fn run_config(args: &ConfigArgs, path: &Path, config: &Config) -> Result<()> {
    match args.action {
        ConfigAction::Init => {
            if Config::ensure_exists_at(path)? {
                println!("{} Wrote {}", "✓".bright_green(), path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
        ConfigAction::Show => {
            if path.exists() {
                print!("{}", toml::to_string_pretty(config)?);
            } else {
                print!("{}", generate_sample_config());
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}
