//! Fixed colors per symbol class.

use genome::Nucleotide;
use image::Rgba;

/// Canvas background.
pub const BACKGROUND: Rgba<u8> = Rgba([16, 20, 24, 255]);

/// Color for positions outside the alphabet (seed text and the like).
pub const UNKNOWN: Rgba<u8> = Rgba([120, 126, 134, 255]);

/// Fixed color for a symbol class.
pub fn color(nucleotide: Nucleotide) -> Rgba<u8> {
    match nucleotide {
        Nucleotide::A => Rgba([76, 175, 80, 255]),   // green
        Nucleotide::C => Rgba([33, 150, 243, 255]),  // blue
        Nucleotide::G => Rgba([255, 193, 7, 255]),   // amber
        Nucleotide::T => Rgba([244, 67, 54, 255]),   // red
    }
}

/// Color for an optional position, gray when unrecognized.
pub fn color_or_unknown(nucleotide: Option<Nucleotide>) -> Rgba<u8> {
    nucleotide.map(color).unwrap_or(UNKNOWN)
}

/// Watson-Crick complement, used by the helix style's second strand.
pub fn complement(nucleotide: Nucleotide) -> Nucleotide {
    match nucleotide {
        Nucleotide::A => Nucleotide::T,
        Nucleotide::T => Nucleotide::A,
        Nucleotide::C => Nucleotide::G,
        Nucleotide::G => Nucleotide::C,
    }
}
