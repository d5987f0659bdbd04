use std::io::Cursor;

use super::*;
use crate::foundation::core::Rgb8;

fn small() -> Resolution {
    Resolution::new(160, 90).unwrap()
}

fn font_available() -> bool {
    FontResolver::new().resolve(None).is_ok()
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
}

fn ink_bounds(frame: &FrameRGBA, bg: [u8; 4]) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..frame.height {
        for x in 0..frame.width {
            let px = frame.pixel(x, y).unwrap();
            if px == bg {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

#[test]
fn centered_origin_math() {
    let canvas = Resolution::new(1920, 1080).unwrap();
    assert_eq!(
        text_origin(TextPosition::Centered, canvas, InkBounds::from_extent(200.0, 100.0)),
        (860, 490)
    );
    assert_eq!(
        text_origin(TextPosition::Centered, canvas, InkBounds::from_extent(200.4, 99.2)),
        (859, 490)
    );
    // Wider than the canvas: negative origin, text clipped on both sides.
    assert_eq!(
        text_origin(TextPosition::Centered, canvas, InkBounds::from_extent(2000.0, 10.0)),
        (-40, 535)
    );
}

#[test]
fn centered_origin_offsets_by_ink_position() {
    let canvas = Resolution::new(1920, 1080).unwrap();
    // Ink 3 px right of and 12 px below the layout origin.
    let ink = InkBounds {
        left: 3,
        top: 12,
        right: 203,
        bottom: 72,
    };
    let (x, y) = text_origin(TextPosition::Centered, canvas, ink);
    assert_eq!((x + ink.left, y + ink.top), (860, 510));
    assert_eq!(1920 - (x + ink.right), 860);
    assert_eq!(1080 - (y + ink.bottom), 510);
}

#[test]
fn explicit_origin_passes_through() {
    let canvas = Resolution::new(1920, 1080).unwrap();
    assert_eq!(
        text_origin(
            TextPosition::Explicit { x: 1900, y: 5 },
            canvas,
            InkBounds::from_extent(300.0, 80.0)
        ),
        (1900, 5)
    );
}

#[test]
fn solid_background_fills_frame() {
    let mut renderer = SlideRenderer::new(None);
    let mut slide = SlideDescriptor::new("");
    slide.background = Background::Color {
        color: Rgb8::new(30, 60, 90),
    };
    let frame = renderer.render(&slide, small()).unwrap();
    assert_eq!((frame.width, frame.height), (160, 90));
    assert_eq!(frame.data.len(), 160 * 90 * 4);
    assert!(
        frame
            .data
            .chunks_exact(4)
            .all(|px| close([px[0], px[1], px[2], px[3]], [30, 60, 90, 255]))
    );
}

#[test]
fn blank_text_is_pixel_identical_to_background() {
    let mut renderer = SlideRenderer::new(None);
    let background = Background::Color {
        color: Rgb8::new(200, 10, 10),
    };
    let mut empty = SlideDescriptor::new("");
    empty.background = background.clone();
    let mut spaces = SlideDescriptor::new("  \t\n ");
    spaces.background = background;

    let a = renderer.render(&empty, small()).unwrap();
    let b = renderer.render(&spaces, small()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn image_background_is_stretched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bg.png");
    let img = image::RgbImage::from_pixel(37, 211, image::Rgb([12, 140, 220]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(&path, bytes).unwrap();

    let mut slide = SlideDescriptor::new("");
    slide.background = Background::Image { path };
    let frame = SlideRenderer::new(None).render(&slide, small()).unwrap();
    assert_eq!((frame.width, frame.height), (160, 90));
    for (x, y) in [(0, 0), (80, 45), (159, 89)] {
        assert!(close(frame.pixel(x, y).unwrap(), [12, 140, 220, 255]));
    }
}

#[test]
fn missing_background_image_is_render_error() {
    let mut slide = SlideDescriptor::new("Hi");
    slide.background = Background::Image {
        path: PathBuf::from("definitely/missing.png"),
    };
    let err = SlideRenderer::new(None).render(&slide, small()).unwrap_err();
    assert!(matches!(err, LeapsError::Render(_)));
}

/// Left, right, top and bottom margins between the ink and the frame edges.
fn margins(frame: &FrameRGBA) -> (u32, u32, u32, u32) {
    let (x0, y0, x1, y1) = ink_bounds(frame, [0, 0, 0, 255]).expect("text drawn");
    (x0, frame.width - 1 - x1, y0, frame.height - 1 - y1)
}

#[test]
fn centered_text_ink_is_centered_within_a_pixel() {
    if !font_available() {
        return;
    }
    let res = Resolution::new(640, 360).unwrap();
    for (text, size) in [("Hello", 48.0), ("Welcome to LEAPS", 40.0), ("gyp", 120.0)] {
        let mut slide = SlideDescriptor::new(text);
        slide.text_size = size;
        let frame = SlideRenderer::new(None).render(&slide, res).unwrap();

        let (left, right, top, bottom) = margins(&frame);
        assert!(left.abs_diff(right) <= 1, "{text:?}: left {left} right {right}");
        assert!(top.abs_diff(bottom) <= 1, "{text:?}: top {top} bottom {bottom}");
    }
}

#[test]
fn explicit_text_starts_at_given_corner() {
    if !font_available() {
        return;
    }
    let res = Resolution::new(320, 180).unwrap();
    let mut slide = SlideDescriptor::new("Hi");
    slide.text_size = 24.0;
    slide.text_position = TextPosition::Explicit { x: 200, y: 120 };
    let frame = SlideRenderer::new(None).render(&slide, res).unwrap();

    let (x0, y0, _, _) = ink_bounds(&frame, [0, 0, 0, 255]).expect("text drawn");
    assert!(x0 >= 198, "ink starts at x {x0}");
    assert!(y0 >= 120, "ink starts at y {y0}");
}

#[test]
fn text_partly_off_canvas_still_renders() {
    if !font_available() {
        return;
    }
    let res = Resolution::new(160, 90).unwrap();
    let mut slide = SlideDescriptor::new("Clipped text");
    slide.text_position = TextPosition::Explicit { x: 150, y: 80 };
    let frame = SlideRenderer::new(None).render(&slide, res).unwrap();
    assert_eq!(frame.data.len(), 160 * 90 * 4);
}

#[test]
fn unknown_font_falls_back() {
    if !font_available() {
        return;
    }
    let mut slide = SlideDescriptor::new("Fallback");
    slide.font = Some(PathBuf::from("NoSuchFont-Regular.ttf"));
    let frame = SlideRenderer::new(None).render(&slide, small()).unwrap();
    assert!(ink_bounds(&frame, [0, 0, 0, 255]).is_some());
}
