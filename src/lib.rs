//! Codescan: locate and decode QR codes and barcodes in images.
//!
//! Every image is routed to one of two strategies. QR images are decoded
//! directly. Barcode images are decoded first and, when nothing decodes,
//! located by a fallback chain: a localizer model, then ground-truth
//! annotations. Each box records which of these produced it.
//!
//! # Modules
//!
//! - [`model`]: symbol results, per-image outcomes, boxes
//! - [`collab`]: the decoder, localizer, ground-truth and loader seams
//! - [`detect`]: strategies, the fallback chain and the type router
//! - [`batch`]: batch runner with per-image failure isolation
//! - [`report`]: summaries over a batch
//! - [`sink`]: JSON and CSV report writers
//! - [`visualize`]: annotated image copies
//! - [`config`]: YAML configuration
//! - [`discover`]: image discovery
//! - [`error`]: error types for codescan operations

pub mod batch;
pub mod collab;
pub mod config;
pub mod detect;
pub mod discover;
pub mod error;
pub mod model;
pub mod report;
pub mod sink;
pub mod visualize;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use batch::BatchRunner;
use collab::{
    FsImageLoader, ImageLoader, LabelLayout, StandardDecoder, YoloAnnotations, YoloPredictions,
};
use config::ScanConfig;
use detect::{Detector, TypeHint};
use model::{Outcome, Status};
use report::Report;

pub use error::ScanError;

/// The codescan CLI application.
#[derive(Parser)]
#[command(name = "codescan")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan one image, or every image under a directory.
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(clap::Args)]
struct ScanArgs {
    /// Image file, or directory of images for batch mode.
    input: PathBuf,

    /// Code type ('qr', 'barcode', or 'auto').
    #[arg(long = "type", default_value = "auto")]
    code_type: String,

    /// Report file; '.json' writes JSON, anything else CSV.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Root of a label tree mirroring the input (default: sibling .txt files).
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Root of precomputed localizer predictions ('class cx cy w h conf').
    #[arg(long)]
    predictions: Option<PathBuf>,

    /// Do not fall back to ground-truth annotations.
    #[arg(long)]
    no_annotations: bool,

    /// Save copies of the images with symbol boxes drawn on them.
    #[arg(long)]
    visualize: bool,

    /// Directory for visualizations.
    #[arg(long, default_value = "outputs/visualizations")]
    output_dir: PathBuf,

    /// YAML configuration file.
    #[arg(long, env = "CODESCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Worker threads for batch mode (overrides the config file).
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Log every fallback decision.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors; hide the progress bar.
    #[arg(short, long)]
    quiet: bool,
}

/// Run the codescan CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ScanError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan(args)) => {
            init_logging(args.verbose, args.quiet);
            run_scan(args)
        }
        None => {
            println!("codescan {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Locate and decode QR codes and barcodes in images.");
            println!();
            println!("Run 'codescan --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    // A subscriber may already be installed when run() is embedded.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the scan subcommand.
fn run_scan(args: ScanArgs) -> Result<(), ScanError> {
    let hint: TypeHint = args.code_type.parse()?;

    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs;
    }
    if args.no_annotations {
        config.detection.use_annotations = false;
    }
    config.validate()?;

    if !args.input.exists() {
        return Err(ScanError::InvalidArgument(format!(
            "input path '{}' does not exist",
            args.input.display()
        )));
    }
    let input_root = if args.input.is_dir() {
        args.input.clone()
    } else {
        args.input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    };

    let loader = FsImageLoader;
    let decoder = StandardDecoder::default();
    let ground_truth = config.detection.use_annotations.then(|| {
        let layout = match &args.annotations {
            Some(labels_root) => LabelLayout::Mirrored {
                images_root: input_root.clone(),
                labels_root: labels_root.clone(),
            },
            None => LabelLayout::discover(&args.input),
        };
        YoloAnnotations::new(layout)
    });
    let localizer = args.predictions.as_ref().map(|labels_root| {
        YoloPredictions::new(LabelLayout::Mirrored {
            images_root: input_root.clone(),
            labels_root: labels_root.clone(),
        })
    });

    let mut detector = Detector::new(&decoder).with_config(&config.detection);
    if let Some(localizer) = &localizer {
        detector = detector.with_localizer(localizer);
    }
    if let Some(ground_truth) = &ground_truth {
        detector = detector.with_ground_truth(ground_truth);
    }
    let runner = BatchRunner::new(&loader, detector).with_jobs(config.batch.jobs);

    let report = if args.input.is_dir() {
        scan_directory(&runner, &args, &config, hint)?
    } else {
        scan_single(&runner, &args, hint)
    };

    if let Some(output) = &args.output {
        sink::write_report(output, &report)?;
        println!("Results saved to {}", output.display());
    }

    if args.visualize {
        save_visualizations(&loader, &report, &input_root, &args.output_dir, &config)?;
    }

    // A lone image that failed is a failed run; in batch mode failures are
    // part of the report.
    if !args.input.is_dir() {
        if let Some(outcome) = report.outcomes().first() {
            if outcome.status() == Status::Error {
                return Err(ScanError::ScanFailed {
                    image: outcome.image_id().clone(),
                    detail: outcome.error_detail().unwrap_or("unknown error").to_string(),
                });
            }
        }
    }

    Ok(())
}

fn scan_single(runner: &BatchRunner<'_>, args: &ScanArgs, hint: TypeHint) -> Report {
    let outcome = runner.process_image(&args.input, hint);
    print_outcome(&outcome);
    Report::new(vec![outcome])
}

fn scan_directory(
    runner: &BatchRunner<'_>,
    args: &ScanArgs,
    config: &ScanConfig,
    hint: TypeHint,
) -> Result<Report, ScanError> {
    let images = discover::discover_images(&args.input, &config.input)?;
    if images.is_empty() {
        warn!("No images found under {}", args.input.display());
    }

    let bar = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(images.len() as u64)
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let report = runner.run_with_progress(&images, hint, &|outcome: &Outcome| {
        bar.set_message(outcome.image_id().to_string());
        bar.inc(1);
    })?;
    bar.finish_and_clear();

    print!("{report}");
    Ok(report)
}

fn print_outcome(outcome: &Outcome) {
    match outcome.status() {
        // Reported once, through the returned error.
        Status::Error => {}
        Status::NoSymbolFound => println!("No codes found."),
        Status::Success => {
            for symbol in outcome.symbols() {
                println!(
                    "[{}] source={} payload={} box={}",
                    symbol.symbol_type(),
                    symbol.source(),
                    symbol.payload().unwrap_or("-"),
                    symbol.bbox()
                );
            }
        }
    }
}

fn save_visualizations(
    loader: &dyn ImageLoader,
    report: &Report,
    input_root: &Path,
    output_dir: &Path,
    config: &ScanConfig,
) -> Result<(), ScanError> {
    let mut saved = 0usize;
    for outcome in report.outcomes() {
        if outcome.symbols().is_empty() {
            continue;
        }
        let input = outcome.image_id().path();
        let pixels = match loader.load(input) {
            Ok(pixels) => pixels,
            Err(err) => {
                warn!("Skipping visualization: {err}");
                continue;
            }
        };
        visualize::save_visualization(
            input,
            &pixels,
            outcome,
            input_root,
            output_dir,
            &config.visualization.suffix,
            config.visualization.box_thickness,
        )?;
        saved += 1;
    }
    info!("Saved {saved} visualization(s) to {}", output_dir.display());
    Ok(())
}
