use crate::{
    foundation::error::{LeapsError, LeapsResult},
    render::FrameRGBA,
    voice::VoiceoverAsset,
};

/// One slide's still frame bound to its narration for a fixed stretch of the timeline.
#[derive(Clone, Debug)]
pub struct TimedClip {
    pub frame: FrameRGBA,
    pub voiceover: VoiceoverAsset,
    /// Minimum on-screen time requested by the slide.
    pub declared_duration_sec: f64,
    /// `max(declared, voiceover)`.
    pub duration_sec: f64,
    /// Length of both the fade-in and the fade-out.
    pub fade_sec: f64,
}

/// Bind `frame` and `voiceover` into a clip lasting `max(declared, voiceover duration)`.
///
/// Fades are not clamped against the clip length. A fade longer than half the clip makes the
/// fade-in and fade-out overlap, so the clip never reaches full brightness.
pub fn assemble(
    frame: FrameRGBA,
    voiceover: VoiceoverAsset,
    declared_duration_sec: f64,
    fade_sec: f64,
) -> LeapsResult<TimedClip> {
    if !declared_duration_sec.is_finite() || declared_duration_sec < 0.0 {
        return Err(LeapsError::configuration(format!(
            "declared duration must be finite and >= 0, got {declared_duration_sec}"
        )));
    }
    if !fade_sec.is_finite() || fade_sec < 0.0 {
        return Err(LeapsError::configuration(format!(
            "fade duration must be finite and >= 0, got {fade_sec}"
        )));
    }
    if !voiceover.duration_sec.is_finite() || voiceover.duration_sec < 0.0 {
        return Err(LeapsError::configuration(format!(
            "voiceover duration must be finite and >= 0, got {}",
            voiceover.duration_sec
        )));
    }

    let duration_sec = declared_duration_sec.max(voiceover.duration_sec);
    if duration_sec <= 0.0 {
        return Err(LeapsError::configuration(
            "clip would have zero duration (no declared duration and silent voiceover)",
        ));
    }

    tracing::debug!(
        declared = declared_duration_sec,
        voiceover = voiceover.duration_sec,
        effective = duration_sec,
        "clip assembled"
    );

    Ok(TimedClip {
        frame,
        voiceover,
        declared_duration_sec,
        duration_sec,
        fade_sec,
    })
}

impl TimedClip {
    /// Brightness factor in [0, 1] at `t` seconds into the clip.
    ///
    /// Product of the fade-in ramp `t / fade` and the fade-out ramp `(duration - t) / fade`,
    /// each capped at 1.
    pub fn opacity_at(&self, t: f64) -> f32 {
        if self.fade_sec <= 0.0 {
            return 1.0;
        }
        let fade_in = (t / self.fade_sec).clamp(0.0, 1.0);
        let fade_out = ((self.duration_sec - t) / self.fade_sec).clamp(0.0, 1.0);
        (fade_in * fade_out) as f32
    }

    /// `true` when the voiceover, not the declared duration, sets the clip length.
    pub fn is_audio_governed(&self) -> bool {
        self.voiceover.duration_sec > self.declared_duration_sec
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clip.rs"]
mod tests;
