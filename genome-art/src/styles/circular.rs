//! Circular layout: positions around a ring with radial ticks.

use genome::Nucleotide;
use image::RgbaImage;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::weight_at;
use crate::canvas::{draw_line, fill_circle};
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
    let cx = width / 2.0;
    let cy = height / 2.0;
    let ring = width.min(height) * 0.36;
    let base_radius = (ring * TAU / positions.len() as f32 * 0.3).clamp(1.5, ring * 0.15);

    for (i, position) in positions.iter().enumerate() {
        // Start at twelve o'clock and walk clockwise.
        let angle = i as f32 / positions.len() as f32 * TAU - FRAC_PI_2;
        let weight = weight_at(weights, i);
        let wobble = rng.range(-0.02, 0.02) * ring;

        let dot_r = ring + wobble;
        let x = cx + angle.cos() * dot_r;
        let y = cy + angle.sin() * dot_r;

        let color = palette::color_or_unknown(*position);
        let tick_inner = ring * (0.82 - 0.12 * weight);
        draw_line(
            canvas,
            cx + angle.cos() * tick_inner,
            cy + angle.sin() * tick_inner,
            cx + angle.cos() * (ring - base_radius),
            cy + angle.sin() * (ring - base_radius),
            1.0,
            color,
            0.35,
        );

        fill_circle(
            canvas,
            x,
            y,
            base_radius * (0.55 + 0.45 * weight),
            color,
            0.5 + 0.5 * weight,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::BACKGROUND;

    #[test]
    fn test_draws_a_ring() {
        let mut canvas = RgbaImage::from_pixel(120, 120, BACKGROUND);
        let positions: Vec<_> = (0..24).map(|i| Some(Nucleotide::from_index(i))).collect();
        draw(&mut canvas, &positions, None, &mut Lcg64::new(9));
        // Center stays background, the ring does not.
        assert_eq!(canvas.get_pixel(60, 60).0, BACKGROUND.0);
        assert!(canvas.pixels().any(|p| p.0 != BACKGROUND.0));
    }

    #[test]
    fn test_single_position_does_not_panic() {
        let mut canvas = RgbaImage::from_pixel(48, 48, BACKGROUND);
        draw(&mut canvas, &[None], None, &mut Lcg64::new(9));
    }
}
