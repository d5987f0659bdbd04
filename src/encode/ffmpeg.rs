use std::{
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, ExitStatus, Stdio},
    thread::JoinHandle,
};

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::{
        core::FrameIndex,
        error::{LeapsError, LeapsResult},
    },
    render::FrameRGBA,
};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Backdrop for translucent pixels (RGBA8, straight alpha; alpha is ignored).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// MP4 sink piping raw RGBA frames into the system `ffmpeg`.
///
/// The encoder writes to a hidden staging file next to `out_path`, which is renamed into place
/// once `ffmpeg` exits cleanly. Aborting, failing, or dropping an unfinished sink deletes the
/// staging file.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    session: Option<Session>,
    opaque: Vec<u8>,
}

struct Session {
    encoder: Encoder,
    staging: PathBuf,
    width: u32,
    height: u32,
    prev: Option<FrameIndex>,
}

struct Encoder {
    child: Child,
    stdin: Option<ChildStdin>,
    log: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl Encoder {
    fn spawn(mut cmd: Command) -> LeapsResult<Self> {
        tracing::debug!(command = ?cmd, "starting encoder");
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LeapsError::encoding(format!("could not start ffmpeg: {e}")))?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(LeapsError::encoding("ffmpeg stdin pipe unavailable"));
        };
        let log = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });
        Ok(Self {
            child,
            stdin: Some(stdin),
            log,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(bytes),
            None => Err(std::io::ErrorKind::BrokenPipe.into()),
        }
    }

    /// Close stdin and wait for the encoder; returns its exit status and collected stderr.
    fn wait(mut self) -> LeapsResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| LeapsError::encoding(format!("waiting on ffmpeg: {e}")))?;
        let log = match self.log.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LeapsError::encoding("ffmpeg log reader panicked"))?
                .map_err(|e| LeapsError::encoding(format!("reading ffmpeg log: {e}")))?,
            None => Vec::new(),
        };
        Ok((status, String::from_utf8_lossy(&log).trim().to_string()))
    }

    fn kill(mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.log.take() {
            let _ = handle.join();
        }
    }
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            session: None,
            opaque: Vec::new(),
        }
    }

    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    fn discard(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.encoder.kill();
        remove_staging(&session.staging);
    }

    /// Tear down a session whose encoder stopped reading, keeping its diagnostics.
    fn encoder_died(&mut self, write_err: &std::io::Error) -> LeapsError {
        let Some(session) = self.session.take() else {
            return LeapsError::encoding(format!("ffmpeg stopped accepting frames: {write_err}"));
        };
        let detail = match session.encoder.wait() {
            Ok((status, log)) if log.is_empty() => format!("ffmpeg exited early ({status})"),
            Ok((status, log)) => format!("ffmpeg exited early ({status}): {log}"),
            Err(e) => e.to_string(),
        };
        remove_staging(&session.staging);
        LeapsError::encoding(format!("{detail} [frame write: {write_err}]"))
    }

    fn finish(&mut self) -> LeapsResult<()> {
        let session = self
            .session
            .take()
            .ok_or_else(|| LeapsError::encoding("end called before begin"))?;
        let staging = session.staging;

        let (status, log) = match session.encoder.wait() {
            Ok(done) => done,
            Err(e) => {
                remove_staging(&staging);
                return Err(e);
            }
        };
        if !status.success() {
            remove_staging(&staging);
            return Err(LeapsError::encoding(format!("ffmpeg failed ({status}): {log}")));
        }

        if let Err(e) = std::fs::rename(&staging, &self.opts.out_path) {
            remove_staging(&staging);
            return Err(LeapsError::encoding(format!(
                "move encoded video to '{}': {e}",
                self.opts.out_path.display()
            )));
        }
        tracing::debug!(path = %self.opts.out_path.display(), "mp4 finalized");
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> LeapsResult<()> {
        check_config(&cfg)?;
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(LeapsError::configuration(format!(
                "refusing to replace existing '{}'",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(LeapsError::encoding(
                "`ffmpeg` not found on PATH; install it to write MP4 files",
            ));
        }
        self.discard();

        let staging = staging_path(&self.opts.out_path);
        let encoder = Encoder::spawn(encoder_command(&cfg, &staging))?;

        self.opaque.resize(cfg.width as usize * cfg.height as usize * 4, 0);
        self.session = Some(Session {
            encoder,
            staging,
            width: cfg.width,
            height: cfg.height,
            prev: None,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LeapsResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| LeapsError::encoding("push_frame called before begin"))?;
        if let Some(prev) = session.prev
            && idx.0 <= prev.0
        {
            return Err(LeapsError::encoding(format!(
                "frame {} arrived after frame {}",
                idx.0, prev.0
            )));
        }
        if (frame.width, frame.height) != (session.width, session.height) {
            return Err(LeapsError::encoding(format!(
                "frame is {}x{} but the encoder expects {}x{}",
                frame.width, frame.height, session.width, session.height
            )));
        }
        if frame.data.len() != self.opaque.len() {
            return Err(LeapsError::encoding(format!(
                "frame holds {} bytes, expected {}",
                frame.data.len(),
                self.opaque.len()
            )));
        }

        composite_opaque(
            &mut self.opaque,
            &frame.data,
            frame.premultiplied,
            self.opts.bg_rgba,
        );
        if let Err(e) = session.encoder.write(&self.opaque) {
            return Err(self.encoder_died(&e));
        }
        session.prev = Some(idx);
        Ok(())
    }

    fn end(&mut self) -> LeapsResult<()> {
        self.finish()
    }

    fn abort(&mut self) {
        self.discard();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.discard();
    }
}

fn check_config(cfg: &SinkConfig) -> LeapsResult<()> {
    if cfg.fps.num == 0 || cfg.fps.den == 0 {
        return Err(LeapsError::configuration(format!(
            "invalid frame rate {}/{}",
            cfg.fps.num, cfg.fps.den
        )));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(LeapsError::configuration(format!(
            "invalid video size {}x{}",
            cfg.width, cfg.height
        )));
    }
    // yuv420p subsamples chroma by two in both directions.
    if cfg.width % 2 != 0 || cfg.height % 2 != 0 {
        return Err(LeapsError::configuration(format!(
            "video size {}x{} must have even sides for MP4 output",
            cfg.width, cfg.height
        )));
    }
    if let Some(audio) = &cfg.audio
        && (audio.sample_rate == 0 || audio.channels == 0)
    {
        return Err(LeapsError::configuration(format!(
            "invalid soundtrack format: {} Hz, {} channels",
            audio.sample_rate, audio.channels
        )));
    }
    Ok(())
}

fn encoder_command(cfg: &SinkConfig, staging: &Path) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);

    // Video from stdin; rate and size must precede `-i` for rawvideo.
    cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba"])
        .args(["-s", &format!("{}x{}", cfg.width, cfg.height)])
        .args(["-r", &format!("{}/{}", cfg.fps.num, cfg.fps.den)])
        .args(["-i", "pipe:0"]);

    match &cfg.audio {
        Some(audio) => {
            cmd.args(["-f", "f32le"])
                .args(["-ar", &audio.sample_rate.to_string()])
                .args(["-ac", &audio.channels.to_string()])
                .arg("-i")
                .arg(&audio.path)
                // No `-shortest`: a voiceover may end a fraction of a frame after the video.
                .args(["-map", "0:v:0", "-map", "1:a:0", "-c:a", "aac"]);
        }
        None => {
            cmd.arg("-an");
        }
    }

    cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-movflags", "+faststart"])
        // Staging name has no extension.
        .args(["-f", "mp4"])
        .arg(staging);
    cmd
}

/// `.name.partial` beside `out_path`, so the final rename never crosses filesystems.
fn staging_path(out_path: &Path) -> PathBuf {
    let name = out_path
        .file_name()
        .map_or_else(|| "video.mp4".into(), |n| n.to_string_lossy());
    out_path.with_file_name(format!(".{name}.partial"))
}

fn remove_staging(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "discarded unfinished video"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove unfinished video"),
    }
}

/// Write `src` composited over `bg` into `dst` with every alpha set to 255.
///
/// Both buffers are RGBA8 of equal length.
fn composite_opaque(dst: &mut [u8], src: &[u8], premultiplied: bool, bg: [u8; 4]) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let alpha = u32::from(px[3]);
        let rest = 255 - alpha;
        for ch in 0..3 {
            let fg = if premultiplied {
                u32::from(px[ch])
            } else {
                scale255(u32::from(px[ch]), alpha)
            };
            out[ch] = (fg + scale255(u32::from(bg[ch]), rest)).min(255) as u8;
        }
        out[3] = 255;
    }
}

/// `a * b / 255`, rounded.
fn scale255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> LeapsResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir).map_err(|e| {
            LeapsError::encoding(format!("create output directory '{}': {e}", dir.display()))
        }),
        _ => Ok(()),
    }
}

/// `true` when `ffmpeg -version` runs successfully.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
