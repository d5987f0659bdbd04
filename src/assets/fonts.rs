use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::foundation::{
    core::Rgb8,
    error::{LeapsError, LeapsResult},
};

/// Font requested when neither the slide nor the run names one.
pub const DEFAULT_FONT_FILE: &str = "DejaVuSans-Bold.ttf";

/// Raw font data plus where it came from.
#[derive(Clone)]
pub struct LoadedFont {
    /// Stable identity used for caching (file path or system face description).
    pub key: String,
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a font collection.
    pub index: u32,
    /// `true` when the requested font could not be loaded and the default face was used.
    pub is_fallback: bool,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("key", &self.key)
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .field("is_fallback", &self.is_fallback)
            .finish()
    }
}

/// Resolves font requests to font bytes, falling back to the system's default sans-serif face
/// instead of failing.
///
/// A request is tried as a file path first, then as the file name of an installed system font.
pub struct FontResolver {
    db: Option<usvg::fontdb::Database>,
    extra_dirs: Vec<PathBuf>,
    cache: HashMap<Option<PathBuf>, LoadedFont>,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FontResolver {
    pub fn new() -> Self {
        Self {
            db: None,
            extra_dirs: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Also load every font found under `dir`, so bare file names can name fonts kept there.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_dirs.push(dir.into());
        self.db = None;
        self
    }

    pub fn resolve(&mut self, requested: Option<&Path>) -> LeapsResult<LoadedFont> {
        let cache_key = requested.map(Path::to_path_buf);
        if let Some(font) = self.cache.get(&cache_key) {
            return Ok(font.clone());
        }

        let loaded = match requested {
            Some(path) => match self.load_requested(path) {
                Some(font) => font,
                None => {
                    tracing::warn!(
                        font = %path.display(),
                        "font could not be loaded, falling back to default face"
                    );
                    self.load_fallback()?
                }
            },
            None => self.load_fallback()?,
        };

        self.cache.insert(cache_key, loaded.clone());
        Ok(loaded)
    }

    fn load_requested(&mut self, path: &Path) -> Option<LoadedFont> {
        if path.is_file() {
            match std::fs::read(path) {
                Ok(bytes) => {
                    return Some(LoadedFont {
                        key: path.display().to_string(),
                        bytes: Arc::new(bytes),
                        index: 0,
                        is_fallback: false,
                    });
                }
                Err(e) => {
                    tracing::debug!(font = %path.display(), error = %e, "font file unreadable");
                }
            }
        }

        let file_name = path.file_name()?.to_os_string();
        let db = self.database();
        let id = db.faces().find_map(|face| match &face.source {
            usvg::fontdb::Source::File(p) | usvg::fontdb::Source::SharedFile(p, _)
                if p.file_name() == Some(file_name.as_os_str()) =>
            {
                Some(face.id)
            }
            _ => None,
        })?;
        face_to_font(db, id, false)
    }

    fn load_fallback(&mut self) -> LeapsResult<LoadedFont> {
        let db = self.database();
        let query = usvg::fontdb::Query {
            families: &[usvg::fontdb::Family::SansSerif],
            ..Default::default()
        };
        let id = db
            .query(&query)
            .or_else(|| db.faces().next().map(|face| face.id))
            .ok_or_else(|| {
                LeapsError::render("no usable font: requested font missing and no system fonts")
            })?;
        face_to_font(db, id, true)
            .ok_or_else(|| LeapsError::render("failed to read default font face data"))
    }

    fn database(&mut self) -> &usvg::fontdb::Database {
        let extra_dirs = &self.extra_dirs;
        self.db.get_or_insert_with(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            for dir in extra_dirs {
                db.load_fonts_dir(dir);
            }
            db
        })
    }
}

fn face_to_font(
    db: &usvg::fontdb::Database,
    id: usvg::fontdb::ID,
    is_fallback: bool,
) -> Option<LoadedFont> {
    let family = db
        .face(id)
        .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_else(|| "unknown".to_string());
    db.with_face_data(id, |data, index| LoadedFont {
        key: format!("system:{family}#{index}"),
        bytes: Arc::new(data.to_vec()),
        index,
        is_fallback,
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgb8> for TextBrushRgba8 {
    fn from(c: Rgb8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Shape and lay out plain text (explicit newlines only, no wrapping).
    pub fn layout_plain(
        &mut self,
        text: &str,
        font: &LoadedFont,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> LeapsResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LeapsError::render("text size must be finite and > 0"));
        }

        let family_name = self.register(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    fn register(&mut self, font: &LoadedFont) -> LeapsResult<String> {
        if let Some(name) = self.families.get(&font.key) {
            return Ok(name.clone());
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| LeapsError::render("no font families registered from font bytes"))?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LeapsError::render("registered font family has no name"))?
            .to_string();
        self.families.insert(font.key.clone(), family_name.clone());
        Ok(family_name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
