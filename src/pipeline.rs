use std::path::PathBuf;

use crate::{
    assets::{
        fonts::{DEFAULT_FONT_FILE, FontResolver},
        temp::TempAssetManager,
    },
    audio::mix::{build_audio_manifest, mix_manifest, write_mix_to_f32le_file},
    encode::{
        ffmpeg::{FfmpegSink, FfmpegSinkOpts},
        sink::{AudioInputConfig, FrameSink},
    },
    foundation::{
        core::{Fps, Resolution},
        error::{LeapsError, LeapsResult},
    },
    render::{FrameRGBA, SlideRenderer},
    slide::model::{SlideDeck, SlideDescriptor},
    timeline::{TimedClip, Timeline, assemble},
    voice::{engine::SpeechEngine, synth::synthesize},
};

/// File name offered for download.
pub const OUTPUT_FILE_NAME: &str = "leaps_video.mp4";
/// Media type of the produced container.
pub const OUTPUT_MEDIA_TYPE: &str = "video/mp4";

/// Options for one generate run.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub resolution: Resolution,
    pub fps: Fps,
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Font for slides without their own. A missing font falls back to the system default.
    pub default_font: Option<PathBuf>,
    /// Directories searched for fonts in addition to the system font directories.
    pub font_dirs: Vec<PathBuf>,
    /// Directory for transient audio files. Defaults to the system temp directory.
    pub temp_dir: Option<PathBuf>,
    /// Background color used to flatten alpha before encoding (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::FULL_HD,
            fps: Fps::VIDEO,
            out_path: PathBuf::from(OUTPUT_FILE_NAME),
            overwrite: true,
            default_font: Some(PathBuf::from(DEFAULT_FONT_FILE)),
            font_dirs: Vec::new(),
            temp_dir: None,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Counters from a finished run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderSummary {
    pub slides: usize,
    pub frame_count: u64,
    /// Sum of the effective clip durations.
    pub duration_sec: f64,
    /// Effective duration of each clip, in deck order.
    pub clip_durations_sec: Vec<f64>,
    /// Transient files deleted at the end of the run.
    pub temp_files_released: usize,
}

/// The finished video, ready to be saved or offered for download.
#[derive(Clone, Debug)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub media_type: String,
    pub duration_sec: f64,
    pub frame_count: u64,
}

/// Run the whole pipeline and encode an MP4 with the system `ffmpeg`.
///
/// Blocks until the file is complete. On failure no output file is left at `options.out_path`
/// by this run, and every transient file is removed.
pub fn generate(
    deck: &SlideDeck,
    options: &GenerateOptions,
    engine: &dyn SpeechEngine,
) -> LeapsResult<VideoArtifact> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: options.out_path.clone(),
        overwrite: options.overwrite,
        bg_rgba: options.bg_rgba,
    });
    let summary = generate_with_sink(deck, options, engine, &mut sink)?;

    let bytes = std::fs::read(&options.out_path).map_err(|e| {
        LeapsError::encoding(format!(
            "failed to read back finished video '{}': {e}",
            options.out_path.display()
        ))
    })?;

    Ok(VideoArtifact {
        path: options.out_path.clone(),
        bytes,
        file_name: OUTPUT_FILE_NAME.to_string(),
        media_type: OUTPUT_MEDIA_TYPE.to_string(),
        duration_sec: summary.duration_sec,
        frame_count: summary.frame_count,
    })
}

/// Run the whole pipeline, streaming frames into `sink`.
///
/// Slides are processed one at a time in deck order. The first failure aborts the run.
#[tracing::instrument(skip_all, fields(slides = deck.len(), backend = engine.name()))]
pub fn generate_with_sink(
    deck: &SlideDeck,
    options: &GenerateOptions,
    engine: &dyn SpeechEngine,
    sink: &mut dyn FrameSink,
) -> LeapsResult<RenderSummary> {
    options.resolution.validate()?;
    Fps::new(options.fps.num, options.fps.den)?;
    deck.validate(options.resolution)?;

    let mut temps = match &options.temp_dir {
        Some(dir) => TempAssetManager::in_dir(dir),
        None => TempAssetManager::new(),
    };

    let result = run(deck, options, engine, sink, &mut temps);
    let released = temps.cleanup();
    tracing::debug!(released, "temp assets released");

    match result {
        Ok(mut summary) => {
            summary.temp_files_released = released;
            tracing::info!(
                frames = summary.frame_count,
                duration_sec = summary.duration_sec,
                "video generated"
            );
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(error = %err, "video generation failed");
            Err(err)
        }
    }
}

fn run(
    deck: &SlideDeck,
    options: &GenerateOptions,
    engine: &dyn SpeechEngine,
    sink: &mut dyn FrameSink,
    temps: &mut TempAssetManager,
) -> LeapsResult<RenderSummary> {
    let mut renderer = slide_renderer(options);
    let mut clips = Vec::with_capacity(deck.len());
    for (i, slide) in deck.slides.iter().enumerate() {
        let clip = process_slide(i, slide, options, engine, &mut renderer, temps)
            .map_err(|e| e.with_prefix(format_args!("slide {}", i + 1)))?;
        clips.push(clip);
    }

    let timeline = Timeline::new(clips, options.fps)?;
    let clip_durations_sec: Vec<f64> = timeline.clips().iter().map(|c| c.duration_sec).collect();

    let manifest = build_audio_manifest(&timeline);
    let audio = if manifest.segments.is_empty() {
        None
    } else {
        let mixed = mix_manifest(&manifest);
        let path = temps.allocate("leaps_mix_", ".f32le")?;
        write_mix_to_f32le_file(&mixed, &path)?;
        Some(AudioInputConfig {
            path,
            sample_rate: manifest.sample_rate,
            channels: manifest.channels,
        })
    };

    let frame_count = timeline.concatenate(sink, audio)?;

    Ok(RenderSummary {
        slides: deck.len(),
        frame_count,
        duration_sec: timeline.duration_sec(),
        clip_durations_sec,
        temp_files_released: 0,
    })
}

#[tracing::instrument(skip(slide, options, engine, renderer, temps), fields(kind = ?slide.kind))]
fn process_slide(
    index: usize,
    slide: &SlideDescriptor,
    options: &GenerateOptions,
    engine: &dyn SpeechEngine,
    renderer: &mut SlideRenderer,
    temps: &mut TempAssetManager,
) -> LeapsResult<TimedClip> {
    let voiceover = synthesize(engine, slide.narration(), &slide.voice_language, temps)?;
    let frame = renderer.render(slide, options.resolution)?;
    let clip = assemble(frame, voiceover, slide.duration, slide.fade_duration)?;
    tracing::info!(
        voiceover_sec = clip.voiceover.duration_sec,
        duration_sec = clip.duration_sec,
        "slide ready"
    );
    Ok(clip)
}

/// Render a single slide still, as the first step of the pipeline would.
pub fn render_slide_preview(
    slide: &SlideDescriptor,
    options: &GenerateOptions,
) -> LeapsResult<FrameRGBA> {
    options.resolution.validate()?;
    slide.validate(options.resolution)?;
    slide_renderer(options).render(slide, options.resolution)
}

fn slide_renderer(options: &GenerateOptions) -> SlideRenderer {
    let fonts = options
        .font_dirs
        .iter()
        .fold(FontResolver::new(), |fonts, dir| fonts.with_font_dir(dir.clone()));
    SlideRenderer::with_resolver(fonts, options.default_font.clone())
}
