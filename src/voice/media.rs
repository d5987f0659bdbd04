use std::path::Path;

use crate::foundation::error::{LeapsError, LeapsResult};

/// Sample rate of the mixed soundtrack handed to the encoder.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Decoded audio as interleaved f32 samples in [-1, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }
}

/// Decode a synthesized voiceover file.
///
/// WAV files are read in-process. Anything else goes through the system `ffmpeg` and comes back
/// as 48 kHz stereo.
pub fn decode_audio_file(path: &Path) -> LeapsResult<AudioPcm> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if is_wav {
        decode_wav(path)
    } else {
        decode_with_ffmpeg(path, MIX_SAMPLE_RATE)
    }
}

fn decode_wav(path: &Path) -> LeapsResult<AudioPcm> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        LeapsError::synthesis(format!(
            "failed to open voiceover wav '{}': {e}",
            path.display()
        ))
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(LeapsError::synthesis("voiceover wav declares zero channels"));
    }

    let read_err = |e: hound::Error| {
        LeapsError::synthesis(format!(
            "failed to read voiceover wav '{}': {e}",
            path.display()
        ))
    };
    let interleaved_f32: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (hound::SampleFormat::Int, bits @ 8..=32) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(read_err)?
        }
        (format, bits) => {
            return Err(LeapsError::synthesis(format!(
                "unsupported wav sample format {format:?} with {bits} bits"
            )));
        }
    };

    Ok(AudioPcm {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32,
    })
}

fn decode_with_ffmpeg(path: &Path, sample_rate: u32) -> LeapsResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            LeapsError::synthesis(format!("failed to run ffmpeg for voiceover decode: {e}"))
        })?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(LeapsError::synthesis(format!(
            "ffmpeg voiceover decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(LeapsError::synthesis(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/voice/media.rs"]
mod tests;
