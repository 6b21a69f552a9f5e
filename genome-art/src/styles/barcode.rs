//! Barcode layout: full-height stripes, one per position.

use genome::Nucleotide;
use image::RgbaImage;

use super::weight_at;
use crate::canvas::fill_rect;
use crate::palette;
use crate::rng::Lcg64;

pub(crate) fn draw(
    canvas: &mut RgbaImage,
    positions: &[Option<Nucleotide>],
    weights: Option<&[f32]>,
    rng: &mut Lcg64,
) {
    if positions.is_empty() {
        return;
    }

    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let stripe = width / positions.len() as f32;
    let margin_y = height * 0.06;

    for (i, position) in positions.iter().enumerate() {
        let weight = weight_at(weights, i);
        let x0 = i as f32 * stripe;
        let inset = rng.range(0.0, 0.02) * height;

        fill_rect(
            canvas,
            x0,
            margin_y + inset,
            x0 + stripe,
            height - margin_y - inset,
            palette::color_or_unknown(*position),
            0.45 + 0.55 * weight,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::BACKGROUND;

    #[test]
    fn test_stripes_cover_the_width() {
        let mut canvas = RgbaImage::from_pixel(80, 40, BACKGROUND);
        let positions: Vec<_> = (0..8).map(|i| Some(Nucleotide::from_index(i))).collect();
        draw(&mut canvas, &positions, None, &mut Lcg64::new(4));

        // A pixel from the first and the last stripe both changed.
        assert_ne!(canvas.get_pixel(2, 20).0, BACKGROUND.0);
        assert_ne!(canvas.get_pixel(77, 20).0, BACKGROUND.0);
    }

    #[test]
    fn test_empty_sequence_leaves_background() {
        let mut canvas = RgbaImage::from_pixel(16, 16, BACKGROUND);
        draw(&mut canvas, &[], None, &mut Lcg64::new(4));
        assert!(canvas.pixels().all(|p| p.0 == BACKGROUND.0));
    }
}
