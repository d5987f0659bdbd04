/// Convenience result type used across the crate.
pub type LeapsResult<T> = Result<T, LeapsError>;

/// Top-level error taxonomy for a slideshow run.
///
/// Every variant aborts the whole run; nothing is recovered locally.
#[derive(thiserror::Error, Debug)]
pub enum LeapsError {
    /// Invalid deck contents or run options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Text-to-speech backend failure (unsupported language, missing backend, bad output).
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Background decode failure or unrecoverable drawing failure.
    #[error("render error: {0}")]
    Render(String),

    /// Final video write failure.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a [`LeapsError`], used for exit codes and reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`LeapsError::Configuration`].
    Configuration,
    /// See [`LeapsError::Synthesis`].
    Synthesis,
    /// See [`LeapsError::Render`].
    Render,
    /// See [`LeapsError::Encoding`].
    Encoding,
    /// See [`LeapsError::Other`].
    Other,
}

impl LeapsError {
    /// Build a [`LeapsError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`LeapsError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`LeapsError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LeapsError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Prepend `prefix: ` to the message, keeping the error kind.
    pub fn with_prefix(self, prefix: impl std::fmt::Display) -> Self {
        match self {
            Self::Configuration(msg) => Self::Configuration(format!("{prefix}: {msg}")),
            Self::Synthesis(msg) => Self::Synthesis(format!("{prefix}: {msg}")),
            Self::Render(msg) => Self::Render(format!("{prefix}: {msg}")),
            Self::Encoding(msg) => Self::Encoding(format!("{prefix}: {msg}")),
            Self::Other(err) => Self::Other(err.context(prefix.to_string())),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Synthesis(_) => ErrorKind::Synthesis,
            Self::Render(_) => ErrorKind::Render,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
