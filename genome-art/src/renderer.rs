//! The renderer: style dispatch, PNG encoding, artifact placement.

use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use genome::{Nucleotide, Sequence};

use crate::error::{RenderError, Result};
use crate::palette::BACKGROUND;
use crate::rng::Lcg64;
use crate::styles;

/// Available layout styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStyle {
    Helix,
    Grid,
    Circular,
    Barcode,
}

impl RenderStyle {
    /// All styles in canonical order.
    pub const ALL: [RenderStyle; 4] = [
        RenderStyle::Helix,
        RenderStyle::Grid,
        RenderStyle::Circular,
        RenderStyle::Barcode,
    ];

    /// Lowercase style name.
    pub fn name(self) -> &'static str {
        match self {
            RenderStyle::Helix => "helix",
            RenderStyle::Grid => "grid",
            RenderStyle::Circular => "circular",
            RenderStyle::Barcode => "barcode",
        }
    }
}

impl FromStr for RenderStyle {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "helix" => Ok(RenderStyle::Helix),
            "grid" => Ok(RenderStyle::Grid),
            "circular" => Ok(RenderStyle::Circular),
            "barcode" => Ok(RenderStyle::Barcode),
            other => Err(RenderError::UnknownStyle(other.to_string())),
        }
    }
}

impl std::fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Options for one render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Seed for cosmetic noise
    pub seed: u64,
    /// Optional per-position weights (sampling probabilities)
    pub weights: Option<Vec<f32>>,
    /// Explicit artifact location; auto-generated under the renderer's
    /// output directory when absent
    pub output: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            seed: 0,
            weights: None,
            output: None,
        }
    }
}

impl RenderOptions {
    /// Options for the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set the noise seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set per-position weights.
    pub fn with_weights(mut self, weights: Vec<f32>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set an explicit artifact location.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// A written artifact.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    /// Where the PNG was written
    pub path: PathBuf,
    /// The encoded PNG bytes
    pub bytes: Vec<u8>,
}

/// Renders sequences into PNG artifacts.
pub struct Renderer {
    output_dir: PathBuf,
}

impl Renderer {
    /// Create a renderer writing auto-named artifacts under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render `sequence` in `style`.
    ///
    /// Identical `(sequence, style, seed, dimensions)` produce identical
    /// bytes: the pixel buffer is a pure function of those inputs and PNG
    /// encoding is deterministic.
    pub fn render(
        &self,
        sequence: &Sequence,
        style: RenderStyle,
        options: &RenderOptions,
    ) -> Result<RenderedArtifact> {
        if options.width == 0 || options.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: options.width,
                height: options.height,
            });
        }

        let mut canvas = RgbaImage::from_pixel(options.width, options.height, BACKGROUND);
        let positions: Vec<Option<Nucleotide>> = sequence.nucleotides().collect();
        let weights = options.weights.as_deref();
        let mut rng = Lcg64::new(options.seed);

        match style {
            RenderStyle::Helix => styles::helix::draw(&mut canvas, &positions, weights, &mut rng),
            RenderStyle::Grid => styles::grid::draw(&mut canvas, &positions, weights, &mut rng),
            RenderStyle::Circular => {
                styles::circular::draw(&mut canvas, &positions, weights, &mut rng)
            }
            RenderStyle::Barcode => {
                styles::barcode::draw(&mut canvas, &positions, weights, &mut rng)
            }
        }

        let mut bytes = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        let path = match &options.output {
            Some(path) => path.clone(),
            None => self
                .output_dir
                .join(format!("{}-{}.png", &sequence.hash()[..16], style)),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &bytes)?;

        debug!(
            style = %style,
            positions = positions.len(),
            path = %path.display(),
            "Rendered sequence artifact"
        );

        Ok(RenderedArtifact { path, bytes })
    }
}
