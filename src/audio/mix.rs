use std::path::Path;

use crate::{
    foundation::{
        core::Fps,
        error::{LeapsError, LeapsResult},
    },
    timeline::Timeline,
    voice::{AudioPcm, MIX_SAMPLE_RATE},
};

/// One voiceover placed on the timeline.
#[derive(Clone, Debug)]
pub struct AudioSegment<'a> {
    pub timeline_start_sample: u64,
    /// Exclusive. Audio past this point is cut.
    pub timeline_end_sample: u64,
    pub source: &'a AudioPcm,
}

/// Everything needed to render the run's soundtrack.
#[derive(Clone, Debug)]
pub struct AudioManifest<'a> {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    pub segments: Vec<AudioSegment<'a>>,
}

/// Place each clip's voiceover at the start of the clip.
///
/// A voiceover shorter than its clip is followed by silence until the next clip starts. Clip
/// boundaries are rounded to whole frames, so a voiceover may run up to a frame past its clip;
/// that tail is kept and mixed over the next clip, or extends the soundtrack after the last one.
pub fn build_audio_manifest(timeline: &Timeline) -> AudioManifest<'_> {
    let fps = timeline.fps();
    let sample_rate = MIX_SAMPLE_RATE;
    let segments: Vec<AudioSegment<'_>> = timeline
        .clips()
        .iter()
        .zip(timeline.clip_ranges())
        .filter(|(clip, _)| clip.voiceover.pcm.frames() > 0)
        .map(|(clip, range)| {
            let start = frame_to_sample(range.start.0, fps, sample_rate);
            let voiced = resampled_len(&clip.voiceover.pcm, sample_rate);
            AudioSegment {
                timeline_start_sample: start,
                timeline_end_sample: frame_to_sample(range.end.0, fps, sample_rate)
                    .max(start + voiced),
                source: &clip.voiceover.pcm,
            }
        })
        .collect();

    let video_samples = frame_to_sample(timeline.total_frames(), fps, sample_rate);
    let total_samples = segments
        .iter()
        .map(|s| s.timeline_end_sample)
        .fold(video_samples, u64::max);

    AudioManifest {
        sample_rate,
        channels: 2,
        total_samples,
        segments,
    }
}

/// Number of `sample_rate` samples needed to play all of `pcm`, rounded up.
pub fn resampled_len(pcm: &AudioPcm, sample_rate: u32) -> u64 {
    if pcm.sample_rate == 0 {
        return 0;
    }
    let num = u128::from(pcm.frames() as u64) * u128::from(sample_rate);
    let den = u128::from(pcm.sample_rate);
    num.div_ceil(den) as u64
}

/// Render the manifest to interleaved samples, resampling each source linearly.
pub fn mix_manifest(manifest: &AudioManifest<'_>) -> Vec<f32> {
    let channels = usize::from(manifest.channels.max(1));
    let mut out = vec![0.0f32; manifest.total_samples as usize * channels];

    for seg in &manifest.segments {
        let src = &seg.source.interleaved_f32;
        let src_channels = usize::from(seg.source.channels);
        let src_frames = seg.source.frames();
        if src_frames == 0 || seg.source.sample_rate == 0 {
            continue;
        }
        let step = f64::from(seg.source.sample_rate) / f64::from(manifest.sample_rate);
        let end = seg.timeline_end_sample.min(manifest.total_samples);

        for dst_sample in seg.timeline_start_sample..end {
            let src_pos = (dst_sample - seg.timeline_start_sample) as f64 * step;
            let src_frame0 = src_pos.floor() as usize;
            if src_frame0 >= src_frames {
                break;
            }
            let src_frame1 = (src_frame0 + 1).min(src_frames - 1);
            let frac = (src_pos - src_frame0 as f64) as f32;

            let (l, r) = if src_channels == 1 {
                let v0 = src[src_frame0];
                let v1 = src[src_frame1];
                let v = v0 + ((v1 - v0) * frac);
                (v, v)
            } else {
                let i0 = src_frame0 * src_channels;
                let i1 = src_frame1 * src_channels;
                (
                    src[i0] + ((src[i1] - src[i0]) * frac),
                    src[i0 + 1] + ((src[i1 + 1] - src[i0 + 1]) * frac),
                )
            };

            let dst_idx = dst_sample as usize * channels;
            out[dst_idx] += l;
            if channels > 1 {
                out[dst_idx + 1] += r;
            }
        }
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> LeapsResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        LeapsError::encoding(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

/// Sample index at the start of timeline frame `frame`, rounded to nearest.
pub fn frame_to_sample(frame: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame) * u128::from(fps.den) * u128::from(sample_rate);
    let den = u128::from(fps.num.max(1));
    ((num + den / 2) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
