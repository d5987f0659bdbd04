use std::path::PathBuf;

use crate::{
    assets::temp::TempAssetManager,
    foundation::error::{LeapsError, LeapsResult},
    voice::{
        engine::SpeechEngine,
        media::{AudioPcm, decode_audio_file},
    },
};

/// Synthesized narration for one slide, backed by a transient file owned by the run's
/// [`TempAssetManager`].
#[derive(Clone, Debug)]
pub struct VoiceoverAsset {
    pub path: PathBuf,
    pub pcm: AudioPcm,
    /// Measured from the decoded audio, never estimated from text.
    pub duration_sec: f64,
}

/// Speak `text` in `language` with `engine` and measure the result.
///
/// The output file is registered with `temps` before the backend runs, so it is released even
/// when synthesis or decoding fails.
#[tracing::instrument(skip(engine, text, temps), fields(backend = engine.name(), chars = text.chars().count()))]
pub fn synthesize(
    engine: &dyn SpeechEngine,
    text: &str,
    language: &str,
    temps: &mut TempAssetManager,
) -> LeapsResult<VoiceoverAsset> {
    if !engine.supports(language) {
        return Err(LeapsError::synthesis(format!(
            "unsupported voice language '{language}' for backend {}",
            engine.name()
        )));
    }

    let suffix = format!(".{}", engine.file_extension());
    let path = temps.allocate("leaps_voice_", &suffix)?;
    engine.synthesize_to_file(text, language, &path)?;

    let pcm = decode_audio_file(&path)?;
    let duration_sec = pcm.duration_sec();
    tracing::debug!(path = %path.display(), duration_sec, "voiceover synthesized");

    Ok(VoiceoverAsset {
        path,
        pcm,
        duration_sec,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/voice/synth.rs"]
mod tests;
