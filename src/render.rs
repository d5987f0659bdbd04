use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{LeapsError, LeapsResult};

pub mod cpu;

pub use cpu::{InkBounds, SlideRenderer, text_origin};

/// A rendered still frame. Row-major, tightly packed RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Solid opaque frame.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let [r, g, b, _] = rgba;
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&[r, g, b, 255]);
        }
        Self {
            width,
            height,
            data,
            premultiplied: true,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Write the frame as a straight-alpha PNG.
    pub fn save_png(&self, path: &Path) -> LeapsResult<()> {
        let mut data = self.data.clone();
        if self.premultiplied {
            for px in data.chunks_exact_mut(4) {
                let a = px[3];
                if a != 0 && a != 255 {
                    for c in &mut px[..3] {
                        *c = ((u16::from(*c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255)
                            as u8;
                    }
                }
            }
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| LeapsError::render("frame buffer size does not match dimensions"))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory '{}'", parent.display()))?;
        }
        img.save(path)
            .with_context(|| format!("write frame png '{}'", path.display()))?;
        Ok(())
    }
}
