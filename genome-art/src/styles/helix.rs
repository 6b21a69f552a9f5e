//! Double-helix layout: two complementary strands with connecting rungs.

use genome::Nucleotide;
use image::RgbaImage;
use std::f32::consts::{PI, TAU};

use super::weight_at;
use crate::canvas::{draw_line, fill_circle};
use crate::palette;
use crate::rng::Lcg64;

const TURNS: f32 = 3.0;
const RUNG_EVERY: usize = 4;

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
    let margin = width * 0.06;
    let center_y = height / 2.0;
    let amplitude = height * 0.28;
    let base_radius = (width / positions.len() as f32 * 0.45).clamp(2.0, height * 0.04);
    let span = (positions.len().max(2) - 1) as f32;

    for (i, position) in positions.iter().enumerate() {
        let t = i as f32 / span;
        let x = margin + t * (width - 2.0 * margin);
        let phase = t * TURNS * TAU;
        let y_front = center_y + phase.sin() * amplitude;
        let y_back = center_y + (phase + PI).sin() * amplitude;

        let weight = weight_at(weights, i);
        let radius = base_radius * (0.55 + 0.45 * weight);
        let jitter_x = rng.range(-1.5, 1.5);
        let jitter_y = rng.range(-1.5, 1.5);

        if i % RUNG_EVERY == 0 {
            draw_line(
                canvas,
                x,
                y_front,
                x,
                y_back,
                base_radius * 0.3,
                palette::UNKNOWN,
                0.25,
            );
        }

        let front = palette::color_or_unknown(*position);
        let back = palette::color_or_unknown(position.map(palette::complement));

        // Back strand first so the front strand overlaps it.
        fill_circle(canvas, x - jitter_x, y_back - jitter_y, radius * 0.8, back, 0.6 * weight.max(0.3));
        fill_circle(canvas, x + jitter_x, y_front + jitter_y, radius, front, 0.9);
    }
}
