//! Asset metadata assembly and keyed-union updates.

use serde::{Deserialize, Serialize};

use genome::{analyze, Nucleotide, Sequence};

use crate::ledger::Platform;

/// One trait on an asset. `trait_type` is unique within a metadata
/// document after any merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// The metadata document submitted with an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub attributes: Vec<Attribute>,
    /// Content hash of the underlying sequence
    pub sequence_ref: String,
    /// Location of the rendered artifact (local path before upload,
    /// storage URI after)
    pub visualization_ref: String,
    /// Royalty in basis points
    pub royalty_basis_points: u16,
    pub external_url: Option<String>,
    pub platform: Platform,
}

/// Caller-supplied fields that are not derived from the sequence.
#[derive(Debug, Clone)]
pub struct AssetDetails {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub royalty_basis_points: u16,
    pub external_url: Option<String>,
    pub platform: Platform,
}

/// Partial metadata for an update operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_url: Option<String>,
    pub royalty_basis_points: Option<u16>,
    /// Merged into the existing attributes by `trait_type`
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Builds and updates asset metadata documents.
pub struct MetadataAssembler;

impl MetadataAssembler {
    /// Merge sequence, artifact reference and caller attributes into one
    /// document. Sequence-derived attributes are appended through the
    /// keyed union, so a caller attribute with the same `trait_type` is
    /// replaced by the derived value.
    pub fn build(
        sequence: &Sequence,
        visualization_ref: &str,
        base_attributes: &[Attribute],
        details: &AssetDetails,
    ) -> AssetMetadata {
        let report = analyze(sequence);
        let derived = [
            Attribute::new("Sequence Length", sequence.len().to_string()),
            Attribute::new("GC Content", format!("{:.1}%", report.gc_content)),
            Attribute::new(
                "Dominant Base",
                dominant_base(sequence).map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
            ),
        ];

        AssetMetadata {
            name: details.name.clone(),
            symbol: details.symbol.clone(),
            description: details.description.clone(),
            attributes: merge_attributes(base_attributes, &derived),
            sequence_ref: sequence.hash().to_string(),
            visualization_ref: visualization_ref.to_string(),
            royalty_basis_points: details.royalty_basis_points,
            external_url: details.external_url.clone(),
            platform: details.platform,
        }
    }

    /// Apply an update: scalar fields are replaced only when provided;
    /// attribute lists merge by `trait_type` key, a new attribute with an
    /// existing key replacing the old one.
    pub fn update(existing: &AssetMetadata, new_fields: &MetadataUpdate) -> AssetMetadata {
        let mut updated = existing.clone();
        if let Some(name) = &new_fields.name {
            updated.name = name.clone();
        }
        if let Some(description) = &new_fields.description {
            updated.description = description.clone();
        }
        if let Some(external_url) = &new_fields.external_url {
            updated.external_url = Some(external_url.clone());
        }
        if let Some(royalty) = new_fields.royalty_basis_points {
            updated.royalty_basis_points = royalty;
        }
        updated.attributes = merge_attributes(&existing.attributes, &new_fields.attributes);
        updated
    }
}

/// Keyed union of attribute lists: `incoming` replaces entries of
/// `existing` with the same `trait_type`, other entries are preserved,
/// and genuinely new traits are appended in order.
fn merge_attributes(existing: &[Attribute], incoming: &[Attribute]) -> Vec<Attribute> {
    let mut merged: Vec<Attribute> = existing.to_vec();
    for attribute in incoming {
        match merged
            .iter_mut()
            .find(|a| a.trait_type == attribute.trait_type)
        {
            Some(slot) => *slot = attribute.clone(),
            None => merged.push(attribute.clone()),
        }
    }
    merged
}

fn dominant_base(sequence: &Sequence) -> Option<Nucleotide> {
    let report = analyze(sequence);
    Nucleotide::ALL
        .into_iter()
        .filter(|&n| report.count(n) > 0)
        .max_by_key(|&n| report.count(n))
}
