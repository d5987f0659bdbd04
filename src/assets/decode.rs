use std::path::Path;

use image::imageops::FilterType;

use crate::foundation::{
    core::Resolution,
    error::{LeapsError, LeapsResult},
};

/// Background raster ready for compositing: opaque RGBA8, row-major, tightly packed.
///
/// Opaque pixels are identical in straight and premultiplied form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

/// Read and decode a background image file, then stretch it to `resolution`.
pub fn load_background(path: &Path, resolution: Resolution) -> LeapsResult<PreparedImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        LeapsError::render(format!(
            "failed to read background image '{}': {e}",
            path.display()
        ))
    })?;
    decode_background(&bytes, resolution).map_err(|e| match e {
        LeapsError::Render(msg) => LeapsError::render(format!("'{}': {msg}", path.display())),
        other => other,
    })
}

/// Decode image bytes into the 3-channel color model and resize them, ignoring the source
/// aspect ratio, to exactly `resolution`.
pub fn decode_background(bytes: &[u8], resolution: Resolution) -> LeapsResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| LeapsError::render(format!("decode background image: {e}")))?;
    let rgb = dyn_img.to_rgb8();

    let rgb = if rgb.dimensions() == (resolution.width, resolution.height) {
        rgb
    } else {
        image::imageops::resize(
            &rgb,
            resolution.width,
            resolution.height,
            FilterType::CatmullRom,
        )
    };

    Ok(PreparedImage {
        width: resolution.width,
        height: resolution.height,
        rgba8: rgb_to_opaque_rgba8(rgb.as_raw()),
    })
}

fn rgb_to_opaque_rgba8(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
