use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::{
    core::{Resolution, Rgb8},
    error::{LeapsError, LeapsResult},
};

/// Most slides a single deck may hold.
pub const MAX_SLIDES: usize = 20;
/// Allowed `duration` range in seconds.
pub const DURATION_RANGE_SECS: (f64, f64) = (1.0, 60.0);
/// Allowed `fade_duration` range in seconds.
pub const FADE_RANGE_SECS: (f64, f64) = (0.0, 5.0);
/// Allowed `text_size` range in pixels.
pub const TEXT_SIZE_RANGE_PX: (f32, f32) = (10.0, 200.0);

/// Role of a slide in the deck. Only [`SlideKind::Image`] slides may carry a background image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    #[default]
    Default,
    Image,
    End,
}

/// Visual source behind the slide text. The two sources are mutually exclusive.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    Color { color: Rgb8 },
    Image { path: PathBuf },
}

impl Default for Background {
    fn default() -> Self {
        Self::Color { color: Rgb8::BLACK }
    }
}

/// Where the text box's top-left corner goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TextPositionRepr", into = "TextPositionRepr")]
pub enum TextPosition {
    /// Center the laid out text box in the frame.
    #[default]
    Centered,
    /// Top-left of the text box at these pixel coordinates. Text may be clipped.
    Explicit { x: i64, y: i64 },
}

impl TextPosition {
    /// Legacy numeric form: either coordinate set to -1 means centered.
    pub fn from_legacy(x: i64, y: i64) -> Self {
        if x == -1 || y == -1 {
            Self::Centered
        } else {
            Self::Explicit { x, y }
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum TextPositionRepr {
    Keyword(String),
    Legacy([i64; 2]),
    Point { x: i64, y: i64 },
}

impl TryFrom<TextPositionRepr> for TextPosition {
    type Error = LeapsError;

    fn try_from(value: TextPositionRepr) -> Result<Self, Self::Error> {
        match value {
            TextPositionRepr::Keyword(k) => match k.trim().to_ascii_lowercase().as_str() {
                "center" | "centered" | "centre" => Ok(Self::Centered),
                other => Err(LeapsError::configuration(format!(
                    "unknown text_position '{other}' (expected \"center\" or {{x, y}})"
                ))),
            },
            TextPositionRepr::Point { x, y } => Ok(Self::Explicit { x, y }),
            TextPositionRepr::Legacy([x, y]) => Ok(Self::from_legacy(x, y)),
        }
    }
}

impl From<TextPosition> for TextPositionRepr {
    fn from(value: TextPosition) -> Self {
        match value {
            TextPosition::Centered => Self::Keyword("center".to_string()),
            TextPosition::Explicit { x, y } => Self::Point { x, y },
        }
    }
}

/// One slide, as configured by the user. Built once per run and never mutated.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlideDescriptor {
    pub kind: SlideKind,
    pub text: String,
    /// Narration; falls back to `text` when blank.
    pub voiceover_text: String,
    pub voice_language: String,
    pub background: Background,
    pub text_size: f32,
    pub text_color: Rgb8,
    pub text_position: TextPosition,
    /// Font file for this slide; the run's default font is used when absent.
    pub font: Option<PathBuf>,
    /// Minimum seconds on screen.
    pub duration: f64,
    /// Seconds of fade-in and of fade-out.
    pub fade_duration: f64,
}

impl Default for SlideDescriptor {
    fn default() -> Self {
        Self {
            kind: SlideKind::Default,
            text: String::new(),
            voiceover_text: String::new(),
            voice_language: "en".to_string(),
            background: Background::default(),
            text_size: 48.0,
            text_color: Rgb8::WHITE,
            text_position: TextPosition::Centered,
            font: None,
            duration: 4.0,
            fade_duration: 1.0,
        }
    }
}

impl SlideDescriptor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Text handed to the speech backend.
    pub fn narration(&self) -> &str {
        if self.voiceover_text.trim().is_empty() {
            &self.text
        } else {
            &self.voiceover_text
        }
    }

    pub fn has_visible_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn validate(&self, resolution: Resolution) -> LeapsResult<()> {
        check_range("duration", self.duration, DURATION_RANGE_SECS)?;
        check_range("fade_duration", self.fade_duration, FADE_RANGE_SECS)?;
        if !self.text_size.is_finite()
            || self.text_size < TEXT_SIZE_RANGE_PX.0
            || self.text_size > TEXT_SIZE_RANGE_PX.1
        {
            return Err(LeapsError::configuration(format!(
                "text_size must be within [{}, {}], got {}",
                TEXT_SIZE_RANGE_PX.0, TEXT_SIZE_RANGE_PX.1, self.text_size
            )));
        }

        if let TextPosition::Explicit { x, y } = self.text_position
            && (!(0..=i64::from(resolution.width)).contains(&x)
                || !(0..=i64::from(resolution.height)).contains(&y))
        {
            return Err(LeapsError::configuration(format!(
                "text_position ({x}, {y}) lies outside the {}x{} frame",
                resolution.width, resolution.height
            )));
        }

        if matches!(self.background, Background::Image { .. }) && self.kind != SlideKind::Image {
            return Err(LeapsError::configuration(
                "background images are only allowed on 'image' slides",
            ));
        }

        Ok(())
    }
}

fn check_range(field: &str, value: f64, (lo, hi): (f64, f64)) -> LeapsResult<()> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(LeapsError::configuration(format!(
            "{field} must be within [{lo}, {hi}] seconds, got {value}"
        )));
    }
    Ok(())
}

/// Ordered list of slides for one run.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlideDeck {
    pub slides: Vec<SlideDescriptor>,
}

impl SlideDeck {
    pub fn new(slides: Vec<SlideDescriptor>) -> Self {
        Self { slides }
    }

    /// Deck with `count` default slides.
    pub fn template(count: usize) -> Self {
        Self {
            slides: (0..count).map(|_| SlideDescriptor::default()).collect(),
        }
    }

    /// Load a JSON deck. Relative background image paths resolve against the deck's directory.
    pub fn load(path: &Path) -> LeapsResult<Self> {
        let f = File::open(path).with_context(|| format!("open deck '{}'", path.display()))?;
        let mut deck: SlideDeck = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| LeapsError::configuration(format!("parse deck JSON: {e}")))?;

        let root = path.parent().unwrap_or_else(|| Path::new("."));
        deck.resolve_paths(root);
        Ok(deck)
    }

    pub fn resolve_paths(&mut self, root: &Path) {
        for slide in &mut self.slides {
            if let Background::Image { path } = &mut slide.background
                && path.is_relative()
            {
                *path = root.join(&*path);
            }
            if let Some(font) = &mut slide.font
                && font.is_relative()
                && root.join(&*font).is_file()
            {
                *font = root.join(&*font);
            }
        }
    }

    pub fn validate(&self, resolution: Resolution) -> LeapsResult<()> {
        if self.slides.is_empty() {
            return Err(LeapsError::configuration("deck must contain at least one slide"));
        }
        if self.slides.len() > MAX_SLIDES {
            return Err(LeapsError::configuration(format!(
                "deck holds {} slides; at most {MAX_SLIDES} are supported",
                self.slides.len()
            )));
        }
        for (i, slide) in self.slides.iter().enumerate() {
            slide
                .validate(resolution)
                .map_err(|e| e.with_prefix(format_args!("slide {}", i + 1)))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/slide/model.rs"]
mod tests;
