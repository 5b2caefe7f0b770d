mod report;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dirdelta_common::{load_config, AppConfig, ComparisonMode};
use dirdelta_core::{CompareOptions, ComparisonEngine};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dirdelta")]
#[command(author = "dirdelta Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Find new, removed and changed files between two directory trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare an original directory tree against a newer one
    Compare(CompareArgs),
}

#[derive(clap::Args)]
struct CompareArgs {
    /// Directory containing the original files (e.g. older OS version)
    #[arg(short = 'o', long = "path-to-original")]
    original: PathBuf,

    /// Directory containing the new files (e.g. newer OS version)
    #[arg(short = 'n', long = "path-to-new")]
    new: PathBuf,

    /// Read block size in bytes for hashing and byte comparison
    #[arg(short, long)]
    blocksize: Option<usize>,

    /// Comparison mode: quick (filecmp), hashed-common (common) or full-hash (sha256)
    #[arg(short, long, conflicts_with_all = ["filecmp", "common", "sha256"])]
    mode: Option<ComparisonMode>,

    /// Compare common files byte by byte (same as --mode quick)
    #[arg(long, conflicts_with_all = ["common", "sha256"])]
    filecmp: bool,

    /// Compare common files by sha256 hash (same as --mode hashed-common)
    #[arg(long, conflicts_with = "sha256")]
    common: bool,

    /// Compare every file of both trees by sha256 hash (same as --mode full-hash)
    #[arg(long)]
    sha256: bool,

    /// Relative path to leave out of content comparison (can be specified multiple times)
    #[arg(long = "skip")]
    skip: Vec<PathBuf>,

    /// Ignore patterns (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Follow symbolic links to directories
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Treat equal size and modification time as equal content in quick mode
    #[arg(long)]
    shallow: bool,

    /// Hash files on all cores
    #[arg(long)]
    parallel: bool,

    /// Save output to a JSON file
    #[arg(short = 's', long = "save-output")]
    outfile: Option<PathBuf>,

    /// Print the JSON report to stdout
    #[arg(long)]
    json: bool,

    /// Print the text report
    #[arg(short, long)]
    verbose: bool,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,
}

impl CompareArgs {
    fn selected_mode(&self) -> Option<ComparisonMode> {
        if self.filecmp {
            Some(ComparisonMode::Quick)
        } else if self.common {
            Some(ComparisonMode::HashedCommon)
        } else if self.sha256 {
            Some(ComparisonMode::FullHash)
        } else {
            self.mode
        }
    }

    /// Fold command-line overrides into the loaded configuration
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(mode) = self.selected_mode() {
            config.mode = mode;
        }
        if let Some(blocksize) = self.blocksize {
            config.blocksize = blocksize;
        }
        config.skip_files.extend(self.skip.iter().cloned());
        config.ignore_patterns.extend(self.ignore.iter().cloned());
        if self.follow_symlinks {
            config.follow_symlinks = true;
        }
        if self.shallow {
            config.shallow = true;
        }
        if self.parallel {
            config.parallel_hashing = true;
        }
    }
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => {
            if let Err(e) = run_compare(&args) {
                error!("Comparison failed with error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_compare(args: &CompareArgs) -> anyhow::Result<()> {
    if !args.verbose && !args.json && args.outfile.is_none() {
        bail!("No output defined, you might want to see something too? Use --verbose, --json or --save-output");
    }

    let loaded = load_config(false)?;
    if loaded.exists {
        info!("Using configuration from {}", loaded.path.display());
    }
    let mut config = loaded.config;
    args.apply_to(&mut config);

    let engine = ComparisonEngine::new(CompareOptions::from_config(&config));

    let spinner = progress_spinner(&args.original, &args.new);
    let result = engine.compare(&args.original, &args.new);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result?;

    if args.json {
        let report = report::build_json_report(&result);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.verbose {
        let use_color = !args.no_color && std::io::stdout().is_terminal();
        print!("{}", report::render_text(&result, use_color));
    }

    if let Some(outfile) = &args.outfile {
        info!("Saving results to {}...", outfile.display());
        let report = report::build_json_report(&result);
        let data = serde_json::to_string_pretty(&report)?;
        std::fs::write(outfile, data)
            .with_context(|| format!("Writing JSON output to {} failed", outfile.display()))?;
        info!("Results saved.");
    }

    Ok(())
}

fn progress_spinner(original: &Path, new: &Path) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(format!(
        "Comparing {} and {}",
        original.display(),
        new.display()
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}
