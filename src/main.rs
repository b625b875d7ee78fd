use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

mod config;
mod depfile;
mod merge;
mod report;
mod watch;
mod xml;

use config::MergeConfig;
use depfile::Depfile;
use merge::MergeEngine;
use report::Reporter;
use xml::{read_document, write_document, Document};

/// manifestmerge - merge library AndroidManifest.xml files into an application manifest
#[derive(Parser, Debug)]
#[command(name = "manifestmerge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the application's AndroidManifest.xml
    manifest: PathBuf,

    /// Library manifest to merge, in order (can be specified multiple times)
    #[arg(short, long)]
    library: Vec<PathBuf>,

    /// Output path for the merged manifest (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable merging; copy the application manifest through unchanged
    #[arg(long)]
    no_merge: bool,

    /// Do not insert per-library source comments into the output
    #[arg(long)]
    no_markers: bool,

    /// Diagnostics output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Write the diagnostics report to a file (json format)
    #[arg(long, value_name = "FILE")]
    report_file: Option<PathBuf>,

    /// Dependency file for incremental builds; the merge is skipped when
    /// no input changed since it was written
    #[arg(long, value_name = "FILE")]
    dep_file: Option<PathBuf>,

    /// Watch mode - re-run the merge whenever an input manifest changes
    #[arg(long)]
    watch: bool,

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

    init_logging(cli.verbose, cli.quiet);

    info!("manifestmerge v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    let success = if cli.watch {
        run_watch_mode(&config, &cli)?
    } else {
        run_merge(&config, &cli)?
    };

    if !success {
        std::process::exit(1);
    }
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

fn load_config(cli: &Cli) -> Result<MergeConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        MergeConfig::from_file(config_path)?
    } else {
        let root = cli
            .manifest
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        MergeConfig::from_default_locations(&root)?
    };

    // Override with CLI arguments
    if !cli.library.is_empty() {
        config.libraries = cli.library.clone();
    }
    if cli.no_merge {
        config.enabled = false;
    }
    if cli.no_markers {
        config.markers = false;
    }

    Ok(config)
}

fn run_watch_mode(config: &MergeConfig, cli: &Cli) -> Result<bool> {
    use watch::FileWatcher;

    let mut watched = vec![cli.manifest.clone()];
    watched.extend(config.libraries.iter().cloned());

    let config = config.clone();
    let cli_ref = cli;

    let watcher = FileWatcher::new();
    watcher
        .watch(&watched, move || {
            match run_merge(&config, cli_ref) {
                Ok(true) => {
                    println!("{}", "Merge complete. Waiting for changes...".green());
                }
                Ok(false) => {
                    println!("{}", "Merge finished with errors. Waiting for changes...".red());
                }
                Err(e) => {
                    eprintln!("{}: {}", "Merge error".red(), e);
                }
            }
            true // Continue watching
        })
        .map_err(|e| miette::miette!("Watch error: {}", e))?;

    Ok(true)
}

fn run_merge(config: &MergeConfig, cli: &Cli) -> Result<bool> {
    // The main manifest is always an input; libraries only when merging.
    let mut inputs = vec![cli.manifest.clone()];
    if config.enabled {
        inputs.extend(config.libraries.iter().cloned());
    }

    // Incremental gate: skip everything when nothing changed.
    if let (Some(dep_path), Some(output)) = (&cli.dep_file, &cli.output) {
        if let Ok(depfile) = Depfile::load(dep_path) {
            if depfile.is_up_to_date(output, &inputs) {
                if !cli.quiet {
                    println!("No changes in the manifest files.");
                }
                return Ok(true);
            }
        }
    }

    let main_source = std::fs::read_to_string(&cli.manifest)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", cli.manifest.display()))?;

    // Disabled or nothing to merge: plain copy-through.
    if !config.enabled || config.libraries.is_empty() {
        if !config.enabled {
            info!("Manifest merging disabled. Using the application manifest only.");
        } else {
            info!("No libraries. Using the application manifest only.");
        }
        write_output(cli, &main_source)?;
        record_depfile(cli, &inputs)?;
        return Ok(true);
    }

    info!(
        "Merging manifests from the application and {} libraries.",
        config.libraries.len()
    );

    let mut primary = read_document(cli.manifest.display().to_string(), &main_source)
        .into_diagnostic()?;

    let mut libraries: Vec<Document> = Vec::with_capacity(config.libraries.len());
    for path in &config.libraries {
        let source = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        libraries.push(read_document(path.display().to_string(), &source).into_diagnostic()?);
    }

    let mut engine = MergeEngine::new().with_markers(config.markers);
    let success = engine.merge(&mut primary, &libraries);

    let reporter = Reporter::new(cli.format.clone().into(), cli.report_file.clone());
    reporter.report(engine.report())?;

    write_output(cli, &write_document(&primary))?;

    if success {
        record_depfile(cli, &inputs)?;
    }

    Ok(success)
}

fn write_output(cli: &Cli, contents: &str) -> Result<()> {
    match &cli.output {
        Some(path) => {
            std::fs::write(path, contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            info!("Merged manifest written to {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}

fn record_depfile(cli: &Cli, inputs: &[PathBuf]) -> Result<()> {
    let (Some(dep_path), Some(output)) = (&cli.dep_file, &cli.output) else {
        return Ok(());
    };
    Depfile::capture(output, inputs)
        .and_then(|d| d.save(dep_path))
        .into_diagnostic()
        .wrap_err("Failed to write dependency file")?;
    Ok(())
}
