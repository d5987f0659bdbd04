use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use leaps_video::{
    ErrorKind, GenerateOptions, LeapsError, SlideDeck, TtsBackendKind,
    logging::{LoggingConfig, init_logging},
    slide::model::MAX_SLIDES,
};

#[derive(Parser, Debug)]
#[command(name = "leaps-video", version, about = "Generate narrated slideshow videos")]
struct Cli {
    /// Log as JSON lines instead of text.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    /// Default log filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a deck to MP4 (requires `ffmpeg` and a speech backend on PATH).
    Render(RenderArgs),
    /// Render one slide as a PNG.
    Frame(FrameArgs),
    /// Write a deck file with default slides.
    Template(TemplateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input deck JSON.
    #[arg(long)]
    deck: PathBuf,

    /// Output MP4 path.
    #[arg(long, default_value = leaps_video::OUTPUT_FILE_NAME)]
    out: PathBuf,

    /// Refuse to replace an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Speech backend.
    #[arg(long, value_enum, default_value_t = TtsBackendKind::Espeak)]
    tts: TtsBackendKind,

    /// Font for slides that do not name one.
    #[arg(long, default_value = leaps_video::DEFAULT_FONT_FILE)]
    font: PathBuf,

    /// Extra directory to load fonts from (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Directory for transient audio files.
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input deck JSON.
    #[arg(long)]
    deck: PathBuf,

    /// Slide number (1-based).
    #[arg(long, default_value_t = 1)]
    slide: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font for slides that do not name one.
    #[arg(long, default_value = leaps_video::DEFAULT_FONT_FILE)]
    font: PathBuf,

    /// Extra directory to load fonts from (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct TemplateArgs {
    /// Number of slides.
    #[arg(
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SLIDES as u64)
    )]
    slides: u64,

    /// Output deck JSON path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let result = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Template(args) => cmd_template(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LeapsError>().map(LeapsError::kind) {
        Some(ErrorKind::Configuration) => 2,
        Some(ErrorKind::Synthesis) => 3,
        Some(ErrorKind::Render) => 4,
        Some(ErrorKind::Encoding) => 5,
        Some(ErrorKind::Other) | None => 1,
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let deck = SlideDeck::load(&args.deck)?;
    let options = GenerateOptions {
        out_path: args.out,
        overwrite: !args.no_overwrite,
        default_font: Some(args.font),
        font_dirs: args.font_dirs,
        temp_dir: args.temp_dir,
        ..GenerateOptions::default()
    };
    let engine = leaps_video::create_engine(args.tts);

    let artifact = leaps_video::generate(&deck, &options, engine.as_ref())?;
    eprintln!(
        "wrote {} ({} frames, {:.2}s, {} bytes, {})",
        artifact.path.display(),
        artifact.frame_count,
        artifact.duration_sec,
        artifact.bytes.len(),
        artifact.media_type
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let deck = SlideDeck::load(&args.deck)?;
    let slide = args
        .slide
        .checked_sub(1)
        .and_then(|i| deck.slides.get(i))
        .ok_or_else(|| {
            LeapsError::configuration(format!(
                "slide {} out of range (deck has {} slides)",
                args.slide,
                deck.len()
            ))
        })?;

    let options = GenerateOptions {
        default_font: Some(args.font),
        font_dirs: args.font_dirs,
        ..GenerateOptions::default()
    };
    let frame = leaps_video::render_slide_preview(slide, &options)?;
    frame.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_template(args: TemplateArgs) -> anyhow::Result<()> {
    let deck = SlideDeck::template(args.slides as usize);
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&deck).context("serialize deck")?;
    std::fs::write(&args.out, json)
        .with_context(|| format!("write deck '{}'", args.out.display()))?;

    eprintln!("wrote {} ({} slides)", args.out.display(), deck.len());
    Ok(())
}
