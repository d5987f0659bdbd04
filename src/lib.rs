//! LEAPS video generator: turns a deck of slides into a narrated MP4 slideshow.
//!
//! # Pipeline overview
//!
//! For each slide, in deck order:
//!
//! 1. **Synthesize**: narration text -> voiceover audio file with a measured duration
//! 2. **Render**: slide descriptor -> fixed-resolution still frame (CPU, `vello_cpu` + `parley`)
//! 3. **Assemble**: frame + voiceover -> timed clip lasting `max(declared, voiceover)` with
//!    fade-in and fade-out
//!
//! Then the clips are concatenated at 24 fps, their voiceovers are mixed into one soundtrack,
//! and frames plus audio are streamed to the system `ffmpeg` binary for MP4 output.
//!
//! Every transient file is tracked by a [`TempAssetManager`] and removed on every exit path.
#![forbid(unsafe_code)]

pub mod assets;
pub mod audio;
pub mod encode;
pub mod foundation;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod slide;
pub mod timeline;
pub mod voice;

pub use assets::fonts::{DEFAULT_FONT_FILE, FontResolver, LoadedFont, TextLayoutEngine};
pub use assets::temp::TempAssetManager;
pub use encode::{
    AudioInputConfig, FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig,
    is_ffmpeg_on_path,
};
pub use foundation::core::{Fps, FrameIndex, FrameRange, Resolution, Rgb8};
pub use foundation::error::{ErrorKind, LeapsError, LeapsResult};
pub use pipeline::{
    GenerateOptions, OUTPUT_FILE_NAME, OUTPUT_MEDIA_TYPE, RenderSummary, VideoArtifact, generate,
    generate_with_sink, render_slide_preview,
};
pub use render::{FrameRGBA, SlideRenderer};
pub use slide::model::{Background, SlideDeck, SlideDescriptor, SlideKind, TextPosition};
pub use timeline::{TimedClip, Timeline, assemble};
pub use voice::{
    AudioPcm, EspeakEngine, GttsEngine, SUPPORTED_LANGUAGES, SpeechEngine, TtsBackendKind,
    VoiceoverAsset, create_engine, synthesize,
};
