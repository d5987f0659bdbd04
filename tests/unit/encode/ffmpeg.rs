use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::VIDEO,
        audio: None,
    }
}

#[test]
fn transparent_premultiplied_pixel_shows_backdrop() {
    let mut dst = vec![0u8; 4];
    composite_opaque(&mut dst, &[0, 0, 0, 0], true, [10, 20, 30, 255]);
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn opaque_pixels_pass_through() {
    let src = vec![1u8, 2, 3, 255, 90, 80, 70, 255];
    let mut dst = vec![0u8; 8];
    composite_opaque(&mut dst, &src, false, [10, 20, 30, 255]);
    assert_eq!(dst, src);
}

#[test]
fn straight_alpha_blends_over_backdrop() {
    let mut dst = vec![0u8; 4];
    composite_opaque(&mut dst, &[255, 0, 0, 128], false, [0, 0, 255, 255]);
    assert_eq!(dst, vec![128, 0, 127, 255]);
}

#[test]
fn staging_file_is_hidden_sibling() {
    let p = staging_path(Path::new("out/dir/leaps_video.mp4"));
    assert_eq!(p, PathBuf::from("out/dir/.leaps_video.mp4.partial"));
}

#[test]
fn encoder_arguments_follow_config() {
    let mut with_audio = cfg(64, 36);
    with_audio.audio = Some(crate::encode::sink::AudioInputConfig {
        path: PathBuf::from("mix.f32le"),
        sample_rate: 48_000,
        channels: 2,
    });
    let cmd = encoder_command(&with_audio, Path::new(".x.mp4.partial"));
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();
    assert!(pos("64x36") < pos("pipe:0"));
    assert!(pos("24/1") < pos("pipe:0"));
    assert_eq!(args[pos("-ar") + 1], "48000");
    assert!(!args.contains(&"-shortest".to_string()));
    assert_eq!(args.last().map(String::as_str), Some(".x.mp4.partial"));

    let silent = encoder_command(&cfg(64, 36), Path::new("o"));
    assert!(silent.get_args().any(|a| a == "-an"));
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.path().join("a.mp4")));
    let err = sink.begin(cfg(63, 36)).unwrap_err();
    assert!(matches!(err, LeapsError::Configuration(_)));
}

#[test]
fn existing_output_without_overwrite_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a.mp4");
    std::fs::write(&out, b"keep me").unwrap();
    let mut opts = FfmpegSinkOpts::new(&out);
    opts.overwrite = false;
    let err = FfmpegSink::new(opts).begin(cfg(64, 36)).unwrap_err();
    assert!(matches!(err, LeapsError::Configuration(_)));
    assert_eq!(std::fs::read(&out).unwrap(), b"keep me");
}

#[test]
fn push_before_begin_is_encoding_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("never.mp4"));
    let frame = FrameRGBA::solid(2, 2, [0, 0, 0, 255]);
    let err = sink.push_frame(FrameIndex(0), &frame).unwrap_err();
    assert!(matches!(err, LeapsError::Encoding(_)));
}

#[test]
fn abort_leaves_no_output() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("aborted.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(64, 36)).unwrap();
    let frame = FrameRGBA::solid(64, 36, [40, 40, 40, 255]);
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.abort();

    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn finished_output_replaces_staging_file() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("done.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(64, 36)).unwrap();
    let frame = FrameRGBA::solid(64, 36, [200, 10, 10, 255]);
    for i in 0..12 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    let err = sink.push_frame(FrameIndex(5), &frame).unwrap_err();
    assert!(matches!(err, LeapsError::Encoding(_)));
    sink.end().unwrap();

    assert!(out.is_file());
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    assert!(!staging_path(&out).exists());
}

#[cfg(unix)]
#[test]
fn encoder_exit_mid_stream_reports_its_log() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("early.mp4");
    let staging = staging_path(&out);
    std::fs::write(&staging, b"").unwrap();

    // Stands in for an ffmpeg that rejects its input and quits without reading stdin.
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo 'Invalid data found when processing input' >&2; exit 3"]);
    let (width, height) = (640, 360);
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.opaque = vec![0; width as usize * height as usize * 4];
    sink.session = Some(Session {
        encoder: Encoder::spawn(cmd).unwrap(),
        staging: staging.clone(),
        width,
        height,
        prev: None,
    });

    // Frames are larger than a pipe buffer, so a write fails once the process is gone.
    let frame = FrameRGBA::solid(width, height, [0, 0, 0, 255]);
    let err = (0..64)
        .find_map(|i| sink.push_frame(FrameIndex(i), &frame).err())
        .unwrap();

    assert!(matches!(err, LeapsError::Encoding(_)));
    let msg = err.to_string();
    assert!(msg.contains("Invalid data found when processing input"), "{msg}");
    assert!(msg.contains("exited early"), "{msg}");
    assert!(!staging.exists());
    assert!(!out.exists());
}
