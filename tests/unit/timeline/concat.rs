use std::path::PathBuf;

use super::*;
use crate::{
    encode::sink::InMemorySink,
    timeline::clip::assemble,
    voice::{AudioPcm, VoiceoverAsset},
};

fn voiceover(duration_sec: f64) -> VoiceoverAsset {
    VoiceoverAsset {
        path: PathBuf::from("voice.wav"),
        pcm: AudioPcm {
            sample_rate: 100,
            channels: 1,
            interleaved_f32: vec![0.0; (duration_sec * 100.0).round() as usize],
        },
        duration_sec,
    }
}

fn clip(declared: f64, voice: f64, fade: f64, rgba: [u8; 4]) -> TimedClip {
    assemble(FrameRGBA::solid(8, 4, rgba), voiceover(voice), declared, fade).unwrap()
}

#[test]
fn frame_ranges_follow_running_total() {
    let timeline = Timeline::new(
        vec![
            clip(4.0, 2.1, 1.0, [255, 0, 0, 255]),
            clip(1.0, 3.5, 1.0, [0, 255, 0, 255]),
            clip(1.02, 0.0, 0.0, [0, 0, 255, 255]),
        ],
        Fps::VIDEO,
    )
    .unwrap();

    let ranges: Vec<(u64, u64)> = timeline
        .clip_ranges()
        .iter()
        .map(|r| (r.start.0, r.end.0))
        .collect();
    // 4.0 -> 96, 7.5 -> 180, 8.52 -> 204.48 -> 204
    assert_eq!(ranges, vec![(0, 96), (96, 180), (180, 204)]);
    assert_eq!(timeline.total_frames(), 204);
}

#[test]
fn total_duration_is_within_one_frame_of_sum() {
    let durations = [1.01, 2.37, 3.333, 1.5, 4.999];
    let clips = durations
        .iter()
        .map(|&d| clip(d, 0.0, 0.5, [10, 10, 10, 255]))
        .collect();
    let timeline = Timeline::new(clips, Fps::VIDEO).unwrap();
    let sum: f64 = durations.iter().sum();
    assert!((timeline.duration_sec() - sum).abs() < 1e-9);
    assert!((timeline.encoded_duration_sec() - sum).abs() <= 1.0 / 24.0);
}

#[test]
fn concatenate_writes_every_frame_with_fades() {
    let timeline = Timeline::new(vec![clip(1.0, 0.0, 0.5, [200, 100, 50, 255])], Fps::VIDEO)
        .unwrap();
    let mut sink = InMemorySink::new();
    let written = timeline.concatenate(&mut sink, None).unwrap();

    assert_eq!(written, 24);
    assert!(sink.is_finished());
    let frames = sink.frames();
    assert_eq!(frames.len(), 24);
    assert!(frames.iter().enumerate().all(|(i, (idx, _))| idx.0 == i as u64));

    // Frame 0 is black, the middle is full brightness, the ramp climbs in between.
    assert_eq!(frames[0].1.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(frames[12].1.pixel(0, 0), Some([200, 100, 50, 255]));
    let mid_ramp = frames[6].1.pixel(0, 0).unwrap();
    assert!(mid_ramp[0] > 0 && mid_ramp[0] < 200);
    let last = frames[23].1.pixel(0, 0).unwrap();
    assert!(last[0] < 40);
}

#[test]
fn zero_fade_frames_are_the_slide_frame() {
    let timeline =
        Timeline::new(vec![clip(1.0, 0.0, 0.0, [9, 8, 7, 255])], Fps::VIDEO).unwrap();
    let mut sink = InMemorySink::new();
    timeline.concatenate(&mut sink, None).unwrap();
    assert!(
        sink.frames()
            .iter()
            .all(|(_, f)| f == &FrameRGBA::solid(8, 4, [9, 8, 7, 255]))
    );
}

#[test]
fn mixed_sizes_are_centered_on_largest_canvas() {
    let big = assemble(
        FrameRGBA::solid(8, 4, [255, 255, 255, 255]),
        voiceover(0.0),
        1.0,
        0.0,
    )
    .unwrap();
    let small = assemble(
        FrameRGBA::solid(4, 2, [255, 0, 0, 255]),
        voiceover(0.0),
        1.0,
        0.0,
    )
    .unwrap();
    let timeline = Timeline::new(vec![big, small], Fps::VIDEO).unwrap();
    assert_eq!(timeline.canvas_size(), (8, 4));

    let mut sink = InMemorySink::new();
    timeline.concatenate(&mut sink, None).unwrap();
    let padded = &sink.frames()[24].1;
    assert_eq!((padded.width, padded.height), (8, 4));
    assert_eq!(padded.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(padded.pixel(2, 1), Some([255, 0, 0, 255]));
    assert_eq!(padded.pixel(5, 2), Some([255, 0, 0, 255]));
    assert_eq!(padded.pixel(6, 2), Some([0, 0, 0, 255]));
}

#[test]
fn oversized_frames_are_cropped_when_composed() {
    let frame = FrameRGBA::solid(6, 6, [1, 2, 3, 255]);
    let out = compose_onto_canvas(&frame, 4, 4);
    assert_eq!((out.width, out.height), (4, 4));
    assert!(out.data.chunks_exact(4).all(|px| px == [1, 2, 3, 255]));
}

#[test]
fn empty_timeline_is_rejected() {
    let err = Timeline::new(Vec::new(), Fps::VIDEO).unwrap_err();
    assert!(matches!(err, LeapsError::Configuration(_)));
}

struct FailingSink {
    pushed: usize,
    aborted: bool,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> LeapsResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> LeapsResult<()> {
        self.pushed += 1;
        if self.pushed == 5 {
            return Err(LeapsError::encoding("disk full"));
        }
        Ok(())
    }

    fn end(&mut self) -> LeapsResult<()> {
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[test]
fn sink_failure_aborts_sink() {
    let timeline =
        Timeline::new(vec![clip(1.0, 0.0, 0.0, [0, 0, 0, 255])], Fps::VIDEO).unwrap();
    let mut sink = FailingSink {
        pushed: 0,
        aborted: false,
    };
    let err = timeline.concatenate(&mut sink, None).unwrap_err();
    assert!(matches!(err, LeapsError::Encoding(_)));
    assert!(sink.aborted);
}
