//! Development economics stage.

use parcel_analyst::Analyst;
use parcel_shared::{AssetContext, ProjectEconomics, ValuationResult};
use tracing::instrument;

use super::{Fallback, money, resolve};

/// Persona for the economics call.
pub const ECONOMICS_ROLE: &str =
    "a real estate development economist preparing a cost and return budget";

impl Fallback for ProjectEconomics {
    fn fallback() -> Self {
        Self {
            total_project_cost: 0.0,
            land_cost: 0.0,
            construction_cost: 0.0,
            soft_costs: 0.0,
            projected_revenue: 0.0,
            projected_profit: 0.0,
            profit_margin: 0.0,
            roi: 0.0,
            break_even_years: 0.0,
            summary: "Analysis failed".into(),
        }
    }
}

fn example() -> ProjectEconomics {
    ProjectEconomics {
        total_project_cost: 2_500_000.0,
        land_cost: 600_000.0,
        construction_cost: 1_500_000.0,
        soft_costs: 400_000.0,
        projected_revenue: 3_100_000.0,
        projected_profit: 600_000.0,
        profit_margin: 24.0,
        roi: 24.0,
        break_even_years: 6.5,
        summary: "Two sentences on cost structure and returns.".into(),
    }
}

fn prompt(asset: &AssetContext, valuation: &ValuationResult) -> String {
    format!(
        "Estimate the project economics for this asset.\n\
         Asset: {name} (id {id})\n\
         Location: {location}\n\
         Type: {asset_type}\n\
         Status: {status}\n\
         Effective NOI: {noi} per year\n\
         Applied cap rate: {cap}%\n\
         Indicative value: {value}\n\n\
         Give total project cost broken into land, construction and soft costs, \
         projected revenue or exit value, profit, profit margin (% of total cost), \
         ROI (%) and break-even in years. Amounts in {currency}.",
        name = asset.name,
        id = asset.id,
        location = asset.location,
        asset_type = asset.asset_type,
        status = asset.status,
        noi = money(valuation.metrics.noi_effective),
        cap = valuation.metrics.cap_rate_applied,
        value = money(valuation.value_central),
        currency = valuation.currency,
    )
}

/// Ask the analyst for a development budget and return profile.
#[instrument(skip_all, fields(asset = %asset.name))]
pub async fn generate_economics<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
    valuation: &ValuationResult,
) -> ProjectEconomics {
    let result = analyst
        .generate_json(ECONOMICS_ROLE, &prompt(asset, valuation), &example())
        .await;
    resolve("economics", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_asset, sample_valuation};
    use parcel_analyst::{NullAnalyst, ScriptedAnalyst};

    #[test]
    fn prompt_embeds_noi_and_cap_rate() {
        let p = prompt(&sample_asset(), &sample_valuation());
        assert!(p.contains("Harbor Lofts"));
        assert!(p.contains("Porto"));
        assert!(p.contains("Income Property"));
        assert!(p.contains("Existing asset"));
        assert!(p.contains("$292,000"));
        assert!(p.contains("5.5%"));
    }

    #[tokio::test]
    async fn parses_analyst_answer() {
        let analyst = ScriptedAnalyst::new().with_json(
            ECONOMICS_ROLE,
            serde_json::to_value(example()).unwrap(),
        );
        let econ = generate_economics(&analyst, &sample_asset(), &sample_valuation()).await;
        assert_eq!(econ, example());
    }

    #[tokio::test]
    async fn failure_yields_zeroed_economics() {
        let econ = generate_economics(&NullAnalyst, &sample_asset(), &sample_valuation()).await;
        assert_eq!(econ.total_project_cost, 0.0);
        assert_eq!(econ.profit_margin, 0.0);
        assert_eq!(econ.summary, "Analysis failed");
    }

    #[tokio::test]
    async fn malformed_answer_yields_fallback() {
        let analyst = ScriptedAnalyst::new()
            .with_json(ECONOMICS_ROLE, serde_json::json!({ "profitMargin": "lots" }));
        let econ = generate_economics(&analyst, &sample_asset(), &sample_valuation()).await;
        assert_eq!(econ, ProjectEconomics::fallback());
    }
}
