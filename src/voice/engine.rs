use std::{
    io::Write as _,
    path::Path,
    process::{Command, Stdio},
};

use crate::foundation::error::{LeapsError, LeapsResult};

/// Voice language codes a deck may use.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "fr", "de"];

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// Text-to-speech backend. Implementations write one audio file per call.
pub trait SpeechEngine {
    /// Backend name for logs and error messages.
    fn name(&self) -> &str;

    /// Extension (without dot) of the files this backend writes.
    fn file_extension(&self) -> &str;

    fn supports(&self, language: &str) -> bool {
        is_supported_language(language)
    }

    /// Synthesize `text` spoken in `language` into `out_path`, overwriting it.
    ///
    /// Text is passed through untouched, including empty strings.
    fn synthesize_to_file(&self, text: &str, language: &str, out_path: &Path) -> LeapsResult<()>;
}

/// Selectable speech backends.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TtsBackendKind {
    /// Local `espeak-ng`.
    #[default]
    Espeak,
    /// Google Translate TTS through `gtts-cli`.
    Gtts,
}

pub fn create_engine(kind: TtsBackendKind) -> Box<dyn SpeechEngine> {
    match kind {
        TtsBackendKind::Espeak => Box::new(EspeakEngine::default()),
        TtsBackendKind::Gtts => Box::new(GttsEngine::default()),
    }
}

/// `espeak-ng` writing WAV output.
#[derive(Clone, Debug)]
pub struct EspeakEngine {
    program: String,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
        }
    }
}

impl EspeakEngine {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn file_extension(&self) -> &str {
        "wav"
    }

    fn synthesize_to_file(&self, text: &str, language: &str, out_path: &Path) -> LeapsResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", language, "-w"]).arg(out_path).arg("--stdin");
        run_with_stdin(self.name(), cmd, text)
    }
}

/// `gtts-cli` writing MP3 output. Needs network access.
#[derive(Clone, Debug)]
pub struct GttsEngine {
    program: String,
}

impl Default for GttsEngine {
    fn default() -> Self {
        Self {
            program: "gtts-cli".to_string(),
        }
    }
}

impl GttsEngine {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SpeechEngine for GttsEngine {
    fn name(&self) -> &str {
        "gtts"
    }

    fn file_extension(&self) -> &str {
        "mp3"
    }

    fn synthesize_to_file(&self, text: &str, language: &str, out_path: &Path) -> LeapsResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-", "--lang", language, "--output"]).arg(out_path);
        run_with_stdin(self.name(), cmd, text)
    }
}

fn run_with_stdin(backend: &str, mut cmd: Command, text: &str) -> LeapsResult<()> {
    tracing::debug!(backend, command = ?cmd, "running speech backend");
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| LeapsError::synthesis(format!("failed to start {backend}: {e}")))?;

    // A backend that exits early closes its stdin; its exit status reports the real failure.
    if let Some(mut stdin) = child.stdin.take()
        && let Err(e) = stdin.write_all(text.as_bytes())
        && e.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(LeapsError::synthesis(format!(
            "failed to pass text to {backend}: {e}"
        )));
    }

    let out = child
        .wait_with_output()
        .map_err(|e| LeapsError::synthesis(format!("failed to wait for {backend}: {e}")))?;
    if !out.status.success() {
        return Err(LeapsError::synthesis(format!(
            "{backend} exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/voice/engine.rs"]
mod tests;
