//! Genome Art - Deterministic Sequence Visualization
//!
//! Renders a nucleotide sequence into a PNG artifact using one of four
//! layout styles:
//!
//! - **Helix**: two complementary strands with connecting rungs
//! - **Grid**: square lattice sized `ceil(sqrt(len))`
//! - **Circular**: positions around a ring with radial ticks
//! - **Barcode**: full-height stripes, one per position
//!
//! Every style maps a symbol class to a fixed color and an optional
//! per-position weight to size and intensity. Cosmetic noise comes from an
//! explicit linear congruential generator seeded by the caller, never the
//! platform's ambient random source, so identical
//! `(sequence, style, seed, dimensions)` always produce identical bytes.

pub mod canvas;
pub mod error;
pub mod palette;
pub mod renderer;
pub mod rng;
pub mod styles;

pub use error::{RenderError, Result};
pub use renderer::{RenderOptions, RenderStyle, RenderedArtifact, Renderer};
pub use rng::Lcg64;
