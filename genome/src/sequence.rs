//! The [`Sequence`] type and the nucleotide alphabet.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One of the four nucleotide symbol classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
}

impl Nucleotide {
    /// All nucleotides in canonical order.
    pub const ALL: [Nucleotide; 4] = [Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T];

    /// Parse a nucleotide from a character, case-insensitive.
    ///
    /// Returns `None` for characters outside the alphabet; callers decide
    /// whether unrecognized positions are skipped or rendered neutrally.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Nucleotide::A),
            'C' => Some(Nucleotide::C),
            'G' => Some(Nucleotide::G),
            'T' => Some(Nucleotide::T),
            _ => None,
        }
    }

    /// Canonical uppercase character for this nucleotide.
    pub fn to_char(self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
        }
    }

    /// Position in [`Nucleotide::ALL`].
    pub fn index(self) -> usize {
        match self {
            Nucleotide::A => 0,
            Nucleotide::C => 1,
            Nucleotide::G => 2,
            Nucleotide::T => 3,
        }
    }

    /// Nucleotide for an arbitrary index, wrapping modulo 4.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }
}

impl std::fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// An immutable nucleotide sequence with its content hash.
///
/// The `start_seed` is the caller-supplied prefix and is kept verbatim;
/// the generated remainder is always over the four-letter alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    bases: String,
    start_seed: String,
    hash: String,
}

impl Sequence {
    /// Build a sequence from a seed prefix and a generated suffix.
    pub fn new(start_seed: impl Into<String>, suffix: &str) -> Self {
        let start_seed = start_seed.into();
        let bases = format!("{}{}", start_seed, suffix);
        let hash = digest_hex(&bases);
        Self {
            bases,
            start_seed,
            hash,
        }
    }

    /// Build a sequence that is all bases, no seed prefix.
    pub fn from_bases(bases: impl Into<String>) -> Self {
        Self::new("", &bases.into())
    }

    /// The full base string, seed prefix included.
    pub fn bases(&self) -> &str {
        &self.bases
    }

    /// The caller-supplied seed prefix.
    pub fn start_seed(&self) -> &str {
        &self.start_seed
    }

    /// Hex-encoded SHA-256 of the full base string.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Number of positions in the sequence.
    pub fn len(&self) -> usize {
        self.bases.chars().count()
    }

    /// Whether the sequence has no positions.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Per-position nucleotides; `None` for characters outside the alphabet.
    pub fn nucleotides(&self) -> impl Iterator<Item = Option<Nucleotide>> + '_ {
        self.bases.chars().map(Nucleotide::from_char)
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bases)
    }
}

/// Hex-encoded SHA-256 digest of a string.
pub(crate) fn digest_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
