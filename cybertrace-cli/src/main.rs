//! CyberTrace CLI
//!
//! Thin shell around the extraction pipeline: reads plain text from a
//! file, stdin, or an inline argument, runs one extraction per document,
//! and prints or saves the JSON result. Batch mode fans files out to
//! worker threads; each file gets its own isolated pipeline invocation.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cybertrace_core::{ExtractionOptions, ExtractionReport, Extractor, Taxonomy};

#[derive(Parser)]
#[command(name = "cybertrace")]
#[command(author, version, about = "CyberTrace: threat intelligence extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Taxonomy JSON file overriding the bundled vocabulary
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,
}

/// Category toggles shared by `extract` and `batch`.
#[derive(Args, Clone, Copy)]
struct SelectionArgs {
    /// Extract every intelligence category
    #[arg(short = 'a', long)]
    all: bool,

    /// Extract indicators of compromise
    #[arg(short = 'i', long)]
    iocs: bool,

    /// Extract malware names and details
    #[arg(short = 'm', long)]
    malware: bool,

    /// Extract MITRE ATT&CK tactics and techniques
    #[arg(short = 't', long)]
    ttps: bool,

    /// Extract threat actors
    #[arg(long)]
    actors: bool,

    /// Extract targeted entities
    #[arg(long)]
    entities: bool,
}

impl SelectionArgs {
    fn to_options(self) -> ExtractionOptions {
        let mut options = ExtractionOptions {
            all: self.all,
            iocs: self.iocs,
            malware: self.malware,
            ttps: self.ttps,
            actors: self.actors,
            entities: self.entities,
        };
        let any = options.all
            || options.iocs
            || options.malware
            || options.ttps
            || options.actors
            || options.entities;
        if !any {
            options.all = true;
        }
        // Malware context implies the related entity categories.
        if options.malware && !options.all {
            options.actors = true;
            options.entities = true;
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract intelligence from one document
    Extract {
        /// Input text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Inline text to analyze instead of a file
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process every file in a directory, one isolated extraction each
    Batch {
        /// Directory of plain-text reports
        dir: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Combined JSON output file (default: batch_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of worker threads
        #[arg(long, default_value = "4")]
        workers: usize,
    },

    /// Show a summary of the loaded taxonomy
    Taxonomy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let taxonomy = load_taxonomy(cli.taxonomy.as_deref())?;

    match cli.command {
        Commands::Extract { input, text, selection, output } => {
            run_extract(&Extractor::new(taxonomy), input, text, selection.to_options(), output)
        }
        Commands::Batch { dir, selection, output, workers } => {
            run_batch(&Extractor::new(taxonomy), &dir, selection.to_options(), output, workers)
        }
        Commands::Taxonomy => {
            show_taxonomy(&taxonomy);
            Ok(())
        }
    }
}

fn load_taxonomy(path: Option<&Path>) -> Result<Arc<Taxonomy>> {
    let taxonomy = match path {
        Some(path) => Taxonomy::from_path(path)
            .with_context(|| format!("loading taxonomy from {}", path.display()))?,
        None => Taxonomy::bundled().context("loading bundled taxonomy")?,
    };
    info!(version = %taxonomy.version, "taxonomy loaded");
    Ok(Arc::new(taxonomy))
}

fn run_extract(
    extractor: &Extractor,
    input: Option<PathBuf>,
    text: Option<String>,
    options: ExtractionOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let text = match (input, text) {
        (Some(path), _) => fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        (None, Some(inline)) => inline,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
            buffer
        }
    };

    let report = extractor.extract(&text, &options);
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
            println!("📄 Result saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_batch(
    extractor: &Extractor,
    dir: &Path,
    options: ExtractionOptions,
    output: Option<PathBuf>,
    workers: usize,
) -> Result<()> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    anyhow::ensure!(!files.is_empty(), "no files found in {}", dir.display());

    info!(files = files.len(), workers, "starting batch extraction");
    let reports = process_batch(extractor, &files, &options, workers.max(1));

    let output_path = output.unwrap_or_else(|| {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
        PathBuf::from(format!("batch_{timestamp}.json"))
    });
    let json = serde_json::to_string_pretty(&reports)?;
    fs::write(&output_path, &json)
        .with_context(|| format!("writing {}", output_path.display()))?;

    let failed = reports.values().filter(|r| r.is_error()).count();
    println!(
        "✅ Processed {} files ({} failed)\n📄 Results saved to: {}",
        reports.len(),
        failed,
        output_path.display()
    );
    Ok(())
}

/// Fan the files out to scoped worker threads. Each file is one isolated
/// pipeline invocation: a failure (unreadable file, blank content) becomes
/// that file's error report and never disturbs its neighbors.
fn process_batch(
    extractor: &Extractor,
    files: &[PathBuf],
    options: &ExtractionOptions,
    workers: usize,
) -> BTreeMap<String, ExtractionReport> {
    let (sender, receiver) = mpsc::channel::<(String, ExtractionReport)>();

    std::thread::scope(|scope| {
        for chunk in files.chunks(files.len().div_ceil(workers)) {
            let sender = sender.clone();
            scope.spawn(move || {
                for path in chunk {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    let report = match fs::read_to_string(path) {
                        Ok(text) => extractor.extract(&text, options),
                        Err(e) => {
                            warn!(file = %name, error = %e, "failed to read input file");
                            ExtractionReport::error(format!("failed to read input: {e}"))
                        }
                    };
                    let _ = sender.send((name, report));
                }
            });
        }
    });
    drop(sender);

    receiver.iter().collect()
}

fn show_taxonomy(taxonomy: &Taxonomy) {
    println!("Taxonomy version: {}", taxonomy.version);
    println!("  Tactics:      {}", taxonomy.tactics.len());
    println!("  Techniques:   {}", taxonomy.techniques.len());
    println!("  Malware:      {}", taxonomy.malware.len());
    println!("  Actors:       {}", taxonomy.actors.len());
    println!("  Sectors:      {}", taxonomy.sectors.len());
    println!("  Countries:    {}", taxonomy.countries.len());
    println!("  Regions:      {}", taxonomy.regions.len());
    println!("  Malware tags: {}", taxonomy.malware_tags.len());
}
