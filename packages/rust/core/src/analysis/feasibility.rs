//! Feasibility scoring stage. Runs after economics, on its output.

use parcel_analyst::Analyst;
use parcel_shared::{AssetContext, FeasibilityReport, ProjectEconomics, RiskLevel};
use tracing::instrument;

use super::{Fallback, money, resolve};

/// Persona for the feasibility call.
pub const FEASIBILITY_ROLE: &str =
    "a real estate investment committee member scoring project feasibility";

impl Fallback for FeasibilityReport {
    fn fallback() -> Self {
        Self {
            score: 0,
            risk_level: RiskLevel::High,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            verdict: "Error".into(),
        }
    }
}

fn example() -> FeasibilityReport {
    FeasibilityReport {
        score: 70,
        risk_level: RiskLevel::Medium,
        strengths: vec!["Short strength".into()],
        weaknesses: vec!["Short weakness".into()],
        verdict: "One-line verdict".into(),
    }
}

fn prompt(asset: &AssetContext, economics: &ProjectEconomics) -> String {
    format!(
        "Score the feasibility of this project from 0 to 100 \
         and rate its risk as Low, Medium or High.\n\
         Asset: {name}\n\
         Location: {location}\n\
         Type: {asset_type}\n\
         Status: {status}\n\
         Profit margin: {margin:.1}%\n\
         ROI: {roi:.1}%\n\
         Total project cost: {cost}\n\
         Break-even: {break_even:.1} years\n\
         Economics summary: {summary}\n\n\
         List the main strengths and weaknesses and give a short verdict.",
        name = asset.name,
        location = asset.location,
        asset_type = asset.asset_type,
        status = asset.status,
        margin = economics.profit_margin,
        roi = economics.roi,
        cost = money(economics.total_project_cost),
        break_even = economics.break_even_years,
        summary = economics.summary,
    )
}

/// Score feasibility from the project economics.
#[instrument(skip_all, fields(asset = %asset.name, profit_margin = economics.profit_margin))]
pub async fn generate_feasibility<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
    economics: &ProjectEconomics,
) -> FeasibilityReport {
    let result = analyst
        .generate_json(FEASIBILITY_ROLE, &prompt(asset, economics), &example())
        .await;
    resolve("feasibility", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_asset;
    use parcel_analyst::{NullAnalyst, ScriptedAnalyst};

    fn economics(margin: f64) -> ProjectEconomics {
        ProjectEconomics {
            profit_margin: margin,
            summary: "Lean budget".into(),
            ..ProjectEconomics::fallback()
        }
    }

    #[test]
    fn prompt_embeds_profit_margin() {
        let p = prompt(&sample_asset(), &economics(18.4));
        assert!(p.contains("Profit margin: 18.4%"));
        assert!(p.contains("Lean budget"));
    }

    #[tokio::test]
    async fn failure_yields_error_verdict() {
        let report = generate_feasibility(&NullAnalyst, &sample_asset(), &economics(10.0)).await;
        assert_eq!(report.score, 0);
        assert_eq!(report.risk_level, RiskLevel::High);
        assert!(report.strengths.is_empty());
        assert!(report.weaknesses.is_empty());
        assert_eq!(report.verdict, "Error");
    }

    #[tokio::test]
    async fn fractional_and_oversized_scores_keep_the_analysis() {
        for (score, expected) in [
            (serde_json::json!(78.5), 79),
            (serde_json::json!(78.0), 78),
            (serde_json::json!(300), 100),
        ] {
            let analyst = ScriptedAnalyst::new().with_json(
                FEASIBILITY_ROLE,
                serde_json::json!({
                    "score": score,
                    "riskLevel": "Low",
                    "strengths": ["a"],
                    "verdict": "Go"
                }),
            );
            let report = generate_feasibility(&analyst, &sample_asset(), &economics(30.0)).await;
            assert_eq!(report.score, expected);
            assert_eq!(report.verdict, "Go");
            assert_eq!(report.strengths, vec!["a"]);
        }
    }

    #[tokio::test]
    async fn score_is_capped() {
        let analyst = ScriptedAnalyst::new().with_json(
            FEASIBILITY_ROLE,
            serde_json::json!({
                "score": 140,
                "riskLevel": "low",
                "verdict": "Go"
            }),
        );
        let report = generate_feasibility(&analyst, &sample_asset(), &economics(30.0)).await;
        assert_eq!(report.score, 100);
        assert_eq!(report.risk_level, RiskLevel::Low);
        assert!(report.strengths.is_empty());
    }
}
