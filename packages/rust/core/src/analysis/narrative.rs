//! Investor narrative stage.

use parcel_analyst::Analyst;
use parcel_shared::{AssetContext, ValuationNarrative, ValuationResult};
use tracing::instrument;

use super::{Fallback, money, resolve};

/// Persona for the narrative call.
pub const NARRATIVE_ROLE: &str =
    "an investment writer drafting the narrative for a tokenized real estate offering";

impl Fallback for ValuationNarrative {
    fn fallback() -> Self {
        Self {
            executive_summary: "Narrative unavailable.".into(),
            investment_thesis: "Not generated.".into(),
            market_context: "Not generated.".into(),
            risk_factors: Vec::new(),
            tokenization_angle: "Not generated.".into(),
        }
    }
}

fn example() -> ValuationNarrative {
    ValuationNarrative {
        executive_summary: "Two or three sentences".into(),
        investment_thesis: "Why this asset".into(),
        market_context: "Local market backdrop".into(),
        risk_factors: vec!["Key risk".into()],
        tokenization_angle: "Why fractional ownership suits it".into(),
    }
}

fn prompt(asset: &AssetContext, valuation: &ValuationResult) -> String {
    format!(
        "Write the valuation narrative for this asset.\n\
         Asset: {name} (id {id})\n\
         Location: {location}\n\
         Type: {asset_type}\n\
         Status: {status}\n\
         Valuation model: {model}\n\
         Central value: {central} (range {low} to {high})\n\
         Effective NOI: {noi}\n\
         Cap rate: {cap}%",
        name = asset.name,
        id = asset.id,
        location = asset.location,
        asset_type = asset.asset_type,
        status = asset.status,
        model = valuation.model_used,
        central = money(valuation.value_central),
        low = money(valuation.value_low),
        high = money(valuation.value_high),
        noi = money(valuation.metrics.noi_effective),
        cap = valuation.metrics.cap_rate_applied,
    )
}

/// Ask the analyst for the investor-facing narrative.
#[instrument(skip_all, fields(asset = %asset.name))]
pub async fn generate_narrative<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
    valuation: &ValuationResult,
) -> ValuationNarrative {
    let result = analyst
        .generate_json(NARRATIVE_ROLE, &prompt(asset, valuation), &example())
        .await;
    resolve("narrative", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_asset, sample_valuation};
    use parcel_analyst::NullAnalyst;

    #[test]
    fn prompt_embeds_value_range() {
        let p = prompt(&sample_asset(), &sample_valuation());
        assert!(p.contains("$5,309,091"));
        assert!(p.contains("$4,778,182 to $5,840,000"));
        assert!(p.contains("cap_rate"));
    }

    #[tokio::test]
    async fn failure_yields_placeholder_narrative() {
        let n = generate_narrative(&NullAnalyst, &sample_asset(), &sample_valuation()).await;
        assert_eq!(n.executive_summary, "Narrative unavailable.");
        assert!(n.risk_factors.is_empty());
    }
}
