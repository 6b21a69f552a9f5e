//! Grid layout: square lattice sized `ceil(sqrt(len))`.

use genome::Nucleotide;
use image::RgbaImage;

use super::weight_at;
use crate::canvas::fill_circle;
use crate::palette;
use crate::rng::Lcg64;

/// Cells per side for a sequence of `len` positions.
pub(crate) fn side(len: usize) -> usize {
    (len as f64).sqrt().ceil() as usize
}

pub(crate) fn draw(
    canvas: &mut RgbaImage,
    positions: &[Option<Nucleotide>],
    weights: Option<&[f32]>,
    rng: &mut Lcg64,
) {
    if positions.is_empty() {
        return;
    }

    let side = side(positions.len());
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let cell = width.min(height) * 0.9 / side as f32;
    let x_offset = (width - cell * side as f32) / 2.0;
    let y_offset = (height - cell * side as f32) / 2.0;

    for (i, position) in positions.iter().enumerate() {
        let row = i / side;
        let col = i % side;
        let weight = weight_at(weights, i);

        let cx = x_offset + (col as f32 + 0.5) * cell + rng.range(-0.05, 0.05) * cell;
        let cy = y_offset + (row as f32 + 0.5) * cell + rng.range(-0.05, 0.05) * cell;
        let radius = cell * 0.38 * (0.5 + 0.5 * weight);

        fill_circle(
            canvas,
            cx,
            cy,
            radius,
            palette::color_or_unknown(*position),
            0.5 + 0.5 * weight,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::BACKGROUND;

    #[test]
    fn test_side_is_ceil_sqrt() {
        assert_eq!(side(1), 1);
        assert_eq!(side(4), 2);
        assert_eq!(side(10), 4);
        assert_eq!(side(16), 4);
        assert_eq!(side(17), 5);
        assert_eq!(side(37), 7);
    }

    #[test]
    fn test_draws_every_position() {
        let mut canvas = RgbaImage::from_pixel(100, 100, BACKGROUND);
        let positions: Vec<_> = (0..10).map(|i| Some(Nucleotide::from_index(i))).collect();
        draw(&mut canvas, &positions, None, &mut Lcg64::new(3));
        assert!(canvas.pixels().any(|p| p.0 != BACKGROUND.0));
    }

    #[test]
    fn test_empty_sequence_leaves_background() {
        let mut canvas = RgbaImage::from_pixel(32, 32, BACKGROUND);
        draw(&mut canvas, &[], None, &mut Lcg64::new(3));
        assert!(canvas.pixels().all(|p| p.0 == BACKGROUND.0));
    }
}
