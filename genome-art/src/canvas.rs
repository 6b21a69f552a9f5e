//! Pixel-level drawing helpers over an RGBA buffer.

use image::{Rgba, RgbaImage};

/// Alpha-blend a color onto one pixel. Out-of-bounds coordinates are
/// ignored so shapes may overlap the canvas edge.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        let src = color.0[channel] as f32;
        let dst = pixel.0[channel] as f32;
        pixel.0[channel] = (dst + (src - dst) * alpha).round() as u8;
    }
    pixel.0[3] = 255;
}

/// Fill a circle with a soft edge.
pub fn fill_circle(
    canvas: &mut RgbaImage,
    cx: f32,
    cy: f32,
    radius: f32,
    color: Rgba<u8>,
    alpha: f32,
) {
    if radius <= 0.0 {
        return;
    }
    let x_min = (cx - radius).floor() as i64;
    let x_max = (cx + radius).ceil() as i64;
    let y_min = (cy - radius).floor() as i64;
    let y_max = (cy + radius).ceil() as i64;

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= radius {
                // Fade over the outermost pixel for a soft edge.
                let edge = (radius - dist).min(1.0);
                blend_pixel(canvas, x, y, color, alpha * edge);
            }
        }
    }
}

/// Fill an axis-aligned rectangle given corner coordinates.
pub fn fill_rect(
    canvas: &mut RgbaImage,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    color: Rgba<u8>,
    alpha: f32,
) {
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (y0, y1) = (y0.min(y1), y0.max(y1));
    for y in y0.floor() as i64..y1.ceil() as i64 {
        for x in x0.floor() as i64..x1.ceil() as i64 {
            blend_pixel(canvas, x, y, color, alpha);
        }
    }
}

/// Draw a line by sampling along the segment.
pub fn draw_line(
    canvas: &mut RgbaImage,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    thickness: f32,
    color: Rgba<u8>,
    alpha: f32,
) {
    let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
    let steps = (length * 2.0).ceil().max(1.0) as usize;
    let radius = (thickness / 2.0).max(0.5);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = x0 + (x1 - x0) * t;
        let y = y0 + (y1 - y0) * t;
        fill_circle(canvas, x, y, radius, color, alpha);
    }
}
