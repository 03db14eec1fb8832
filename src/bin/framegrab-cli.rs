use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framegrab::{
    CaptureStage, FfmpegLogLevel, FrameSampler, FrameSequence, InspectionReport, ProgressCallback,
    ProgressInfo, SamplerOptions, VideoSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framegrab probe open.webm --json\n  framegrab sample open.webm --out frames --frames 10 --progress\n  framegrab report --open open.webm --closed closed.webm --technician \"Ana Souza\" --serial SN-0042 --contract CT-17 --out inspection\n  framegrab completions zsh > _framegrab";

#[derive(Debug, Parser)]
#[command(
    name = "framegrab",
    version,
    about = "Sample labelled still frames from recorded inspection videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output for every written file.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while sampling.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow writing into existing output directories and files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Clone, Parser)]
struct SamplingArgs {
    /// Number of frames to sample.
    #[arg(long, default_value_t = framegrab::DEFAULT_FRAME_COUNT)]
    frames: usize,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 80)]
    quality: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print metadata and the effective duration of a video.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framegrab probe open.webm\n  framegrab probe open.webm --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sample labelled frames into a directory.
    #[command(
        about = "Sample labelled frames",
        after_help = "Examples:\n  framegrab sample open.webm --out frames\n  framegrab sample closed.mp4 --out frames --frames 6 --quality 60 --json"
    )]
    Sample {
        /// Input video path.
        input: PathBuf,
        /// Output directory for `frame_NN.jpg` files.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        sampling: SamplingArgs,
        /// Print a JSON summary instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Sample both inspection videos and write a report.
    #[command(
        about = "Build an inspection report",
        after_help = "Writes <out>/open/frame_NN.jpg, <out>/closed/frame_NN.jpg and <out>/report.json."
    )]
    Report {
        /// Video recorded with the equipment open.
        #[arg(long)]
        open: PathBuf,
        /// Video recorded with the equipment closed.
        #[arg(long)]
        closed: PathBuf,
        /// Technician name.
        #[arg(long)]
        technician: String,
        /// Equipment serial number.
        #[arg(long)]
        serial: String,
        /// Service contract reference.
        #[arg(long)]
        contract: String,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        sampling: SamplingArgs,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(label: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.green} {prefix} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_prefix(label.to_string());
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        match info.current_timestamp {
            Some(timestamp) => self.bar.set_message(format!(
                "{} kept, at {}",
                info.frames_kept,
                framegrab::format_timestamp(timestamp)
            )),
            None => self.bar.finish_with_message(format!("{} kept", info.frames_kept)),
        }
    }
}

fn sampler_for(
    global: &GlobalOptions,
    sampling: &SamplingArgs,
    label: &str,
) -> Result<FrameSampler, Box<dyn std::error::Error>> {
    if sampling.frames == 0 {
        return Err("--frames must be greater than 0".into());
    }
    if !(1..=100).contains(&sampling.quality) {
        return Err("--quality must be between 1 and 100".into());
    }

    let mut options = SamplerOptions::new()
        .with_frame_count(sampling.frames)
        .with_jpeg_quality(sampling.quality);
    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new(label)?));
    }
    Ok(FrameSampler::new(options))
}

fn prepare_directory(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if !overwrite {
            return Err(format!(
                "output directory already exists: {} (use --overwrite)",
                path.display()
            )
            .into());
        }
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("writing into existing directory {}", path.display()).yellow()
        );
    }
    fs::create_dir_all(path)?;
    Ok(())
}

fn frame_file_name(index: u32) -> String {
    format!("frame_{index:02}.jpg")
}

fn write_sequence(
    sequence: &FrameSequence,
    directory: &Path,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    prepare_directory(directory, global.overwrite)?;
    for frame in sequence {
        let path = directory.join(frame_file_name(frame.index()));
        if path.exists() && !global.overwrite {
            return Err(format!("output file already exists: {} (use --overwrite)", path.display()).into());
        }
        frame.save(&path)?;
        if global.verbose {
            eprintln!(
                "saved frame {} ({:.3}s) -> {}",
                frame.index(),
                frame.timestamp_seconds(),
                path.display()
            );
        }
    }
    Ok(())
}

fn warn_if_short(sequence: &FrameSequence, label: &str) {
    let metadata = sequence.metadata();
    if sequence.is_empty() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{label}: no usable frames could be captured").yellow()
        );
    } else if metadata.skipped_timestamps > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "{label}: {} of {} timestamps produced no frame",
                metadata.skipped_timestamps, metadata.requested_frames
            )
            .yellow()
        );
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Some(level) = cli.global.log_level {
        framegrab::set_ffmpeg_log_level(level);
    }

    match cli.command {
        Commands::Probe { input, json } => {
            let source = VideoSource::from_path(&input)?;
            let metadata = source.metadata().clone();
            let mut decoder = source.open_decoder()?;
            let resolved = framegrab::resolve_duration(&mut decoder, &SamplerOptions::new());
            if json {
                let payload = json!({
                    "metadata": metadata,
                    "effective_duration_seconds": resolved.duration.as_secs_f64(),
                    "duration_source": resolved.source,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {} [{}]", metadata.format, metadata.codec);
                println!("Size: {} bytes", metadata.byte_size);
                println!("Resolution: {}x{}", metadata.width, metadata.height);
                if let Some(fps) = metadata.frames_per_second {
                    println!("Frame rate: {fps:.2} fps");
                }
                if metadata.has_valid_duration() {
                    println!("Declared duration: {:.3}s", metadata.declared_duration);
                } else {
                    println!("Declared duration: {}", "unknown".yellow());
                }
                println!(
                    "Effective duration: {:.3}s ({:?})",
                    resolved.duration.as_secs_f64(),
                    resolved.source
                );
            }
        }
        Commands::Sample {
            input,
            out,
            sampling,
            json,
        } => {
            let sampler = sampler_for(&cli.global, &sampling, "sample")?;
            let mut source = VideoSource::from_path(&input)?;
            let sequence = sampler.sample(&source);
            source.release();
            let sequence = sequence?;

            write_sequence(&sequence, &out, &cli.global)?;
            warn_if_short(&sequence, &input.display().to_string());

            if json {
                let frames: Vec<_> = sequence
                    .iter()
                    .map(|frame| {
                        json!({
                            "index": frame.index(),
                            "timestamp_seconds": frame.timestamp_seconds(),
                            "file": frame_file_name(frame.index()),
                            "bytes": frame.jpeg_bytes().len(),
                        })
                    })
                    .collect();
                let payload = json!({
                    "metadata": sequence.metadata(),
                    "frames": frames,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Sampled {} of {} frame(s) over {:.1}s to {}",
                        sequence.len(),
                        sequence.metadata().requested_frames,
                        sequence.metadata().duration_seconds,
                        out.display()
                    )
                    .green()
                );
            }
        }
        Commands::Report {
            open,
            closed,
            technician,
            serial,
            contract,
            out,
            sampling,
        } => {
            prepare_directory(&out, cli.global.overwrite)?;
            let mut report = InspectionReport::new(technician, serial, contract);

            for (stage, input) in [(CaptureStage::Open, &open), (CaptureStage::Closed, &closed)] {
                let sampler = sampler_for(&cli.global, &sampling, stage.as_str())?;
                let mut source = VideoSource::from_path(input)?;
                let sequence = sampler.sample(&source);
                source.release();
                let sequence = sequence?;

                write_sequence(&sequence, &out.join(stage.as_str()), &cli.global)?;
                warn_if_short(&sequence, stage.as_str());
                report = report.with_stage(stage, &sequence);
            }

            let report_path = out.join("report.json");
            fs::write(&report_path, report.to_json()?)?;
            if cli.global.verbose {
                eprintln!("saved report -> {}", report_path.display());
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Report written to {} ({} frame(s))", out.display(), report.frames).green()
            );
            println!("Archive name: {}", report.archive_file_name());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framegrab", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
