//! Developer technical notes stage.

use parcel_analyst::Analyst;
use parcel_shared::{AssetContext, DeveloperNotes};
use tracing::instrument;

use super::{Fallback, resolve};

/// Persona for the developer-notes call.
pub const NOTES_ROLE: &str = "a development manager writing technical notes for the project team";

impl Fallback for DeveloperNotes {
    fn fallback() -> Self {
        Self {
            zoning: "Zoning review unavailable.".into(),
            construction: "Construction review unavailable.".into(),
            infrastructure: "Infrastructure review unavailable.".into(),
            regulatory_flags: Vec::new(),
            recommendations: vec!["Commission a local zoning and permitting review.".into()],
        }
    }
}

fn example() -> DeveloperNotes {
    DeveloperNotes {
        zoning: "Current zoning and what it allows".into(),
        construction: "Build or refurbishment considerations".into(),
        infrastructure: "Utilities, access and services".into(),
        regulatory_flags: vec!["Permit or compliance item".into()],
        recommendations: vec!["Concrete next step".into()],
    }
}

fn prompt(asset: &AssetContext) -> String {
    let mut p = format!(
        "Write technical development notes for this asset.\n\
         Asset: {name} (id {id})\n\
         Location: {location}\n\
         Type: {asset_type}\n\
         Status: {status}\n",
        name = asset.name,
        id = asset.id,
        location = asset.location,
        asset_type = asset.asset_type,
        status = asset.status,
    );
    if let Some(size) = &asset.size {
        p.push_str(&format!("Size: {} {}\n", size.amount, size.unit));
    }
    if !asset.description.is_empty() {
        p.push_str(&format!("Description: {}\n", asset.description));
    }
    p.push_str(
        "\nCover zoning, construction, infrastructure, regulatory flags and recommendations.",
    );
    p
}

/// Ask the analyst for zoning/construction/infrastructure notes.
#[instrument(skip_all, fields(asset = %asset.name))]
pub async fn generate_developer_notes<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
) -> DeveloperNotes {
    let result = analyst
        .generate_json(NOTES_ROLE, &prompt(asset), &example())
        .await;
    resolve("developer_notes", result)
}
