use std::borrow::Cow;

use crate::{
    encode::sink::{AudioInputConfig, FrameSink, SinkConfig},
    foundation::{
        core::{Fps, FrameIndex, FrameRange},
        error::{LeapsError, LeapsResult},
    },
    render::FrameRGBA,
    timeline::clip::TimedClip,
};

/// Clips laid end to end at a fixed frame rate.
///
/// Clip `i` covers frames `[round(S(i-1) * fps), round(S(i) * fps))` where `S(i)` is the sum of the
/// first `i + 1` clip durations. Rounding the running total keeps the whole timeline within half
/// a frame of the summed durations.
#[derive(Debug)]
pub struct Timeline {
    clips: Vec<TimedClip>,
    ranges: Vec<FrameRange>,
    fps: Fps,
    width: u32,
    height: u32,
}

impl Timeline {
    pub fn new(clips: Vec<TimedClip>, fps: Fps) -> LeapsResult<Self> {
        let fps = Fps::new(fps.num, fps.den)?;
        if clips.is_empty() {
            return Err(LeapsError::configuration(
                "timeline needs at least one clip",
            ));
        }

        // Compose layout: the canvas fits the largest clip on each axis.
        let width = clips.iter().map(|c| c.frame.width).max().unwrap_or(0);
        let height = clips.iter().map(|c| c.frame.height).max().unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(LeapsError::configuration("timeline clips have empty frames"));
        }

        let mut ranges = Vec::with_capacity(clips.len());
        let mut elapsed = 0.0f64;
        let mut start = 0u64;
        for clip in &clips {
            elapsed += clip.duration_sec;
            let end = fps.secs_to_frames_round(elapsed).max(start);
            ranges.push(FrameRange::new(FrameIndex(start), FrameIndex(end))?);
            start = end;
        }

        Ok(Self {
            clips,
            ranges,
            fps,
            width,
            height,
        })
    }

    pub fn clips(&self) -> &[TimedClip] {
        &self.clips
    }

    pub fn clip_ranges(&self) -> &[FrameRange] {
        &self.ranges
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn total_frames(&self) -> u64 {
        self.ranges.last().map(|r| r.end.0).unwrap_or(0)
    }

    /// Sum of the clips' effective durations.
    pub fn duration_sec(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_sec).sum()
    }

    /// Length of the encoded video, a whole number of frames.
    pub fn encoded_duration_sec(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames())
    }

    /// Stream every frame of the timeline into `sink`, then finish it.
    ///
    /// On any failure the sink is aborted so it leaves no output behind. Returns the number of
    /// frames written.
    #[tracing::instrument(skip_all, fields(clips = self.clips.len(), frames = self.total_frames()))]
    pub fn concatenate(
        &self,
        sink: &mut dyn FrameSink,
        audio: Option<AudioInputConfig>,
    ) -> LeapsResult<u64> {
        sink.begin(SinkConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            audio,
        })?;

        let result = self
            .push_all(sink)
            .and_then(|written| sink.end().map(|()| written));
        if result.is_err() {
            sink.abort();
        }
        result
    }

    fn push_all(&self, sink: &mut dyn FrameSink) -> LeapsResult<u64> {
        let mut written = 0u64;
        let mut faded = FrameRGBA {
            width: self.width,
            height: self.height,
            data: vec![0u8; self.width as usize * self.height as usize * 4],
            premultiplied: true,
        };

        for (clip_idx, (clip, range)) in self.clips.iter().zip(&self.ranges).enumerate() {
            let base = compose_onto_canvas(&clip.frame, self.width, self.height);
            tracing::debug!(
                clip = clip_idx,
                start = range.start.0,
                end = range.end.0,
                "writing clip frames"
            );

            for idx in range.frames() {
                let local_t = self.fps.frames_to_secs(idx.0 - range.start.0);
                let opacity = clip.opacity_at(local_t);
                if opacity >= 1.0 {
                    sink.push_frame(idx, &base)?;
                } else {
                    fade_toward_black(&mut faded.data, &base.data, opacity);
                    faded.premultiplied = base.premultiplied;
                    sink.push_frame(idx, &faded)?;
                }
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Center `frame` on an opaque black canvas of `width` x `height`, cropping what does not fit.
pub fn compose_onto_canvas(frame: &FrameRGBA, width: u32, height: u32) -> Cow<'_, FrameRGBA> {
    if frame.width == width && frame.height == height {
        return Cow::Borrowed(frame);
    }

    let mut out = FrameRGBA::solid(width, height, [0, 0, 0, 255]);
    out.premultiplied = frame.premultiplied;

    let off_x = (i64::from(width) - i64::from(frame.width)).div_euclid(2);
    let off_y = (i64::from(height) - i64::from(frame.height)).div_euclid(2);
    for sy in 0..i64::from(frame.height) {
        let dy = sy + off_y;
        if dy < 0 || dy >= i64::from(height) {
            continue;
        }
        let sx0 = (-off_x).max(0);
        let sx1 = i64::from(frame.width).min(i64::from(width) - off_x);
        if sx0 >= sx1 {
            continue;
        }
        let src_row = sy as usize * frame.width as usize * 4;
        let dst_row = dy as usize * width as usize * 4;
        let src = src_row + sx0 as usize * 4..src_row + sx1 as usize * 4;
        let dst_start = dst_row + (sx0 + off_x) as usize * 4;
        out.data[dst_start..dst_start + src.len()].copy_from_slice(&frame.data[src]);
    }
    Cow::Owned(out)
}

fn fade_toward_black(dst: &mut [u8], src: &[u8], opacity: f32) {
    let k = u32::from((opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        for c in 0..3 {
            d[c] = ((u32::from(s[c]) * k + 127) / 255) as u8;
        }
        d[3] = s[3];
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/concat.rs"]
mod tests;
