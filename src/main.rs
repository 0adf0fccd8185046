//! coverzip - command line front end
//!
//! Reads a zip of `audio_XXX.mp3` / `cover_XXX.png` files, embeds each cover
//! into its MP3 and writes the result as a new zip.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::watch;

use coverzip::core::OutputCompression;
use coverzip::logging::init_logging;
use coverzip::{Pipeline, PipelineConfig, ProcessingStatus};

/// Default download name for the processed archive
const DEFAULT_OUTPUT_NAME: &str = "processed_audio.zip";

#[derive(Parser, Debug)]
#[command(name = "coverzip", version, about = "Embed PNG covers into MP3 files inside a zip archive")]
struct Cli {
    /// Zip archive with audio_XXX.mp3 and cover_XXX.png files (000-999)
    input: PathBuf,

    /// Where to write the processed archive
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel embed workers
    #[arg(long)]
    workers: Option<usize>,

    /// Store output entries without compression
    #[arg(long)]
    store: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print metadata of the first files before embedding
    #[arg(long)]
    preview: bool,

    /// Show debug output in the terminal
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            compression: if self.store {
                OutputCompression::Stored
            } else {
                OutputCompression::Deflated
            },
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_file_name(DEFAULT_OUTPUT_NAME))
    }
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("zip"))
}

/// Log status changes until the run reaches a terminal phase
async fn follow_status(mut rx: watch::Receiver<ProcessingStatus>) {
    let mut last_progress = None;
    while rx.changed().await.is_ok() {
        let status = rx.borrow_and_update().clone();
        if last_progress != Some((status.phase, status.processed_count)) {
            log::info!(
                "[{:>3}%] {}/{} {}",
                status.progress,
                status.processed_count,
                status.total_count,
                status.current_label
            );
            last_progress = Some((status.phase, status.processed_count));
        }
        if status.phase.is_terminal() {
            break;
        }
    }
}

fn print_preview(pipeline: &Pipeline) {
    for entry in pipeline.preview() {
        println!(
            "{}  {} - {} [{}] {}{}",
            entry.filename,
            entry.artist.as_deref().unwrap_or("Unknown Artist"),
            entry.title.as_deref().unwrap_or("Unknown Title"),
            entry.duration.as_deref().unwrap_or("-:--"),
            if entry.has_cover { "cover found" } else { "no cover" },
            if entry.has_embedded_cover { ", replaces existing art" } else { "" },
        );
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if !has_zip_extension(&cli.input) {
        return Err("Choose a ZIP archive".to_string());
    }

    let bytes = std::fs::read(&cli.input)
        .map_err(|e| format!("Failed to read {}: {}", cli.input.display(), e))?;

    let pipeline = Pipeline::new(cli.pipeline_config());
    log::debug!(
        "Using {} embed workers, {:?} output",
        pipeline.config().worker_count(),
        pipeline.config().compression
    );
    let follower = tokio::spawn(follow_status(pipeline.subscribe()));

    let result = pipeline.process(bytes).await;
    let _ = follower.await;

    if cli.preview {
        print_preview(&pipeline);
    }

    let output = result.map_err(|e| e.user_message())?;

    let output_path = cli.output_path();
    std::fs::write(&output_path, &output.archive)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;

    if let Some(report_path) = &cli.report {
        output
            .report
            .save(report_path)
            .map_err(|e| format!("Failed to write report {}: {}", report_path.display(), e))?;
    }

    println!(
        "Processed {} files, {} with covers -> {}",
        output.report.total_count,
        output.embedded_count,
        output_path.display()
    );
    if output.report.failed_count > 0 {
        println!(
            "{} files kept their original tags (cover could not be embedded)",
            output.report.failed_count
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{}", message);
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}
