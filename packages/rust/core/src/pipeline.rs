//! End-to-end workflow: assumptions → valuation → analyses → report.

use std::time::Instant;

use chrono::Utc;
use parcel_analyst::Analyst;
use parcel_shared::{
    AssetContext, AssumptionPolicy, FullValuationReport, ReportId, ValuationAssumptions,
};
use tracing::{info, instrument, warn};

use crate::analysis::{
    generate_developer_notes, generate_economics, generate_feasibility, generate_narrative, money,
};
use crate::assumptions::build_assumptions;
use crate::valuation::{compute_valuation, price_per_unit};

/// Persona for the investor memo.
pub const MEMO_ROLE: &str = "an investor relations writer summarising a valuation report";

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when an analysis stage has resolved (with a real or fallback value).
    fn stage_done(&self, stage: &str);
    /// Called when the report is assembled.
    fn done(&self, report: &FullValuationReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn stage_done(&self, _stage: &str) {}
    fn done(&self, _report: &FullValuationReport) {}
}

/// Run the full workflow for one asset.
///
/// 1. Build assumptions (estimate + policy overlay)
/// 2. Compute the valuation
/// 3. Economics, developer notes and narrative, concurrently
/// 4. Feasibility, once economics is known
/// 5. Assemble the report
///
/// No analysis failure can fail the run; degraded stages carry fallback values.
#[instrument(skip_all, fields(asset = %asset.name))]
pub async fn run_full_workflow<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
    policy: &AssumptionPolicy,
    progress: &dyn ProgressReporter,
) -> FullValuationReport {
    info!(asset_id = %asset.id, "starting valuation workflow");

    progress.phase("Building assumptions");
    let assumptions = build_assumptions(analyst, asset, policy).await;

    run_with_assumptions(analyst, asset, assumptions, progress).await
}

/// Run steps 2–5 against an existing assumption snapshot.
///
/// Used to revalue after the user edits assumptions. Always produces a new report.
#[instrument(skip_all, fields(asset = %asset.name, model = %assumptions.model))]
pub async fn run_with_assumptions<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
    assumptions: ValuationAssumptions,
    progress: &dyn ProgressReporter,
) -> FullValuationReport {
    let start = Instant::now();

    // --- Valuation ---
    progress.phase("Computing valuation");
    let mut valuation = compute_valuation(&assumptions);
    valuation.metrics.price_per_unit = price_per_unit(&valuation, asset.size.as_ref());
    info!(
        value_central = valuation.value_central,
        value_low = valuation.value_low,
        value_high = valuation.value_high,
        "valuation computed"
    );

    // --- Independent analyses ---
    progress.phase("Running analyses");
    let (economics, developer_notes, narrative) = tokio::join!(
        async {
            let economics = generate_economics(analyst, asset, &valuation).await;
            progress.stage_done("economics");
            economics
        },
        async {
            let notes = generate_developer_notes(analyst, asset).await;
            progress.stage_done("developer notes");
            notes
        },
        async {
            let narrative = generate_narrative(analyst, asset, &valuation).await;
            progress.stage_done("narrative");
            narrative
        },
    );

    // --- Feasibility ---
    progress.phase("Scoring feasibility");
    let feasibility = generate_feasibility(analyst, asset, &economics).await;
    progress.stage_done("feasibility");

    let report = FullValuationReport {
        id: ReportId::new(),
        asset: asset.clone(),
        assumptions,
        valuation,
        economics,
        feasibility,
        developer_notes,
        narrative,
        generated_at: Utc::now(),
    };

    progress.done(&report);

    info!(
        report_id = %report.id,
        score = report.feasibility.score,
        risk = %report.feasibility.risk_level,
        elapsed_ms = start.elapsed().as_millis(),
        "valuation workflow complete"
    );

    report
}

// ---------------------------------------------------------------------------
// Investor memo
// ---------------------------------------------------------------------------

fn memo_prompt(report: &FullValuationReport) -> String {
    let v = &report.valuation;
    let f = &report.feasibility;
    format!(
        "Write one paragraph (at most 120 words) summarising this valuation for investors.\n\
         Asset: {} in {} ({}, {})\n\
         Central value: {} (range {} to {}), model {}\n\
         Feasibility: {}/100, {} risk. Verdict: {}\n\
         Executive summary: {}",
        report.asset.name,
        report.asset.location,
        report.asset.asset_type,
        report.asset.status,
        money(v.value_central),
        money(v.value_low),
        money(v.value_high),
        v.model_used,
        f.score,
        f.risk_level,
        f.verdict,
        report.narrative.executive_summary,
    )
}

/// Summary composed without the analyst.
fn local_summary(report: &FullValuationReport) -> String {
    let v = &report.valuation;
    let f = &report.feasibility;
    format!(
        "{} ({}) is valued at {} {} (range {} to {}) using the {} model. \
         Feasibility scores {}/100 with {} risk: {}.",
        report.asset.name,
        report.asset.location,
        money(v.value_central),
        v.currency,
        money(v.value_low),
        money(v.value_high),
        v.model_used,
        f.score,
        f.risk_level,
        f.verdict,
    )
}

/// Short investor memo paragraph for a finished report.
#[instrument(skip_all, fields(report_id = %report.id))]
pub async fn summarize_report<A: Analyst>(analyst: &A, report: &FullValuationReport) -> String {
    match analyst
        .generate_response(MEMO_ROLE, &memo_prompt(report))
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "memo unavailable, composing summary locally");
            local_summary(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::analysis::{ECONOMICS_ROLE, FEASIBILITY_ROLE, NARRATIVE_ROLE, NOTES_ROLE};
    use crate::assumptions::{AssumptionEdits, ESTIMATOR_ROLE, apply_edits};
    use crate::test_support::{land_asset, sample_asset};
    use parcel_analyst::{CallEvent, NullAnalyst, ScriptedAnalyst};
    use parcel_shared::{RiskLevel, ValuationModel};

    fn scripted() -> ScriptedAnalyst {
        ScriptedAnalyst::new()
            .with_json(
                ESTIMATOR_ROLE,
                serde_json::json!({ "discountRate": 8.0, "estTotalCost": 4800000 }),
            )
            .with_json(
                ECONOMICS_ROLE,
                serde_json::json!({
                    "totalProjectCost": 4800000,
                    "landCost": 1200000,
                    "constructionCost": 3000000,
                    "softCosts": 600000,
                    "projectedRevenue": 5700000,
                    "projectedProfit": 900000,
                    "profitMargin": 18.4,
                    "roi": 18.75,
                    "breakEvenYears": 6.5,
                    "summary": "Healthy margin on a stabilised asset."
                }),
            )
            .with_json(
                FEASIBILITY_ROLE,
                serde_json::json!({
                    "score": 72,
                    "riskLevel": "Medium",
                    "strengths": ["Stable occupancy"],
                    "weaknesses": ["Thin exit liquidity"],
                    "verdict": "Proceed"
                }),
            )
            .with_json(
                NOTES_ROLE,
                serde_json::json!({
                    "zoning": "Urban residential, as-of-right.",
                    "construction": "Light refurbishment only.",
                    "infrastructure": "Metro within 300 m.",
                    "regulatoryFlags": [],
                    "recommendations": ["Confirm short-let licensing."]
                }),
            )
            .with_json(
                NARRATIVE_ROLE,
                serde_json::json!({
                    "executiveSummary": "Stabilised loft building in central Porto.",
                    "investmentThesis": "Income with modest growth.",
                    "marketContext": "Tight rental supply.",
                    "riskFactors": ["Tourism cyclicality"],
                    "tokenizationAngle": "Fractional access to prime Porto income."
                }),
            )
    }

    fn position(events: &[CallEvent], wanted: &CallEvent) -> usize {
        events
            .iter()
            .position(|e| e == wanted)
            .unwrap_or_else(|| panic!("event not recorded: {wanted:?}"))
    }

    fn started(events: &[CallEvent], role: &str) -> usize {
        events
            .iter()
            .position(|e| matches!(e, CallEvent::Started { role: r, .. } if r == role))
            .unwrap_or_else(|| panic!("{role} never started"))
    }

    #[derive(Default)]
    struct RecordingProgress {
        log: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.log.lock().unwrap().push(format!("phase:{name}"));
        }
        fn stage_done(&self, stage: &str) {
            self.log.lock().unwrap().push(format!("stage:{stage}"));
        }
        fn done(&self, _report: &FullValuationReport) {
            self.log.lock().unwrap().push("done".into());
        }
    }

    #[tokio::test]
    async fn unavailable_analyst_still_yields_full_report() {
        let report = run_full_workflow(
            &NullAnalyst,
            &sample_asset(),
            &AssumptionPolicy::default(),
            &SilentProgress,
        )
        .await;

        assert_eq!(report.valuation.model_used, ValuationModel::CapRate);
        assert_eq!(report.assumptions.market_cap_rate, 5.5);
        // 292_000 / 0.055
        assert_eq!(report.valuation.value_central, 5_309_091.0);
        assert_eq!(report.valuation.metrics.price_per_unit, Some(139_713.0));
        assert_eq!(report.economics.summary, "Analysis failed");
        assert_eq!(report.feasibility.verdict, "Error");
        assert_eq!(report.feasibility.risk_level, RiskLevel::High);
        assert_eq!(report.narrative.executive_summary, "Narrative unavailable.");
        assert!(!report.developer_notes.recommendations.is_empty());
        assert_eq!(report.asset.name, "Harbor Lofts");
    }

    #[tokio::test]
    async fn land_concept_uses_dcf_light_tag() {
        let report = run_full_workflow(
            &NullAnalyst,
            &land_asset(),
            &AssumptionPolicy::default(),
            &SilentProgress,
        )
        .await;
        assert_eq!(report.valuation.model_used, ValuationModel::DcfLight);
        assert_eq!(report.assumptions.model, ValuationModel::DcfLight);
        assert!(report.valuation.metrics.price_per_unit.is_none());
    }

    #[tokio::test]
    async fn feasibility_waits_for_economics() {
        let analyst = scripted().with_delay(ECONOMICS_ROLE, Duration::from_millis(50));

        let report = run_full_workflow(
            &analyst,
            &sample_asset(),
            &AssumptionPolicy::default(),
            &SilentProgress,
        )
        .await;

        let events = analyst.events();
        let economics_done = position(
            &events,
            &CallEvent::Finished {
                role: ECONOMICS_ROLE.into(),
            },
        );

        assert!(started(&events, FEASIBILITY_ROLE) > economics_done);
        // The other two analyses ran while economics was still outstanding.
        assert!(started(&events, NOTES_ROLE) < economics_done);
        assert!(started(&events, NARRATIVE_ROLE) < economics_done);
        assert!(started(&events, ESTIMATOR_ROLE) < started(&events, ECONOMICS_ROLE));

        assert_eq!(report.feasibility.score, 72);
        let prompt = analyst.prompt_for(FEASIBILITY_ROLE).expect("feasibility was called");
        assert!(prompt.contains("Profit margin: 18.4%"));
    }

    #[tokio::test]
    async fn scripted_run_fills_every_stage() {
        let analyst = scripted();
        let progress = RecordingProgress::default();

        let report = run_full_workflow(
            &analyst,
            &sample_asset(),
            &AssumptionPolicy::default(),
            &progress,
        )
        .await;

        assert_eq!(report.economics.projected_profit, 900_000.0);
        assert_eq!(report.feasibility.risk_level, RiskLevel::Medium);
        assert_eq!(report.developer_notes.zoning, "Urban residential, as-of-right.");
        assert_eq!(report.narrative.risk_factors, vec!["Tourism cyclicality"]);
        assert_eq!(report.assumptions.discount_rate, 8.0);

        let log = progress.log.lock().unwrap().clone();
        assert_eq!(log.first().map(String::as_str), Some("phase:Building assumptions"));
        assert_eq!(log.last().map(String::as_str), Some("done"));
        assert!(log.contains(&"stage:feasibility".to_string()));
        assert_eq!(log.iter().filter(|l| l.starts_with("stage:")).count(), 4);
    }

    #[tokio::test]
    async fn revalue_uses_edited_snapshot() {
        let asset = sample_asset();
        let first =
            run_full_workflow(&NullAnalyst, &asset, &AssumptionPolicy::default(), &SilentProgress)
                .await;

        let edits = AssumptionEdits {
            market_cap_rate: Some(8.0),
            ..AssumptionEdits::default()
        };
        let edited = apply_edits(&first.assumptions, &edits);
        let second = run_with_assumptions(&NullAnalyst, &asset, edited, &SilentProgress).await;

        // 292_000 / 0.08
        assert_eq!(second.valuation.value_central, 3_650_000.0);
        assert_eq!(first.valuation.value_central, 5_309_091.0);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn summary_uses_analyst_text() {
        let analyst = ScriptedAnalyst::new().with_text(MEMO_ROLE, "A steady income play.");
        let report = run_full_workflow(
            &NullAnalyst,
            &sample_asset(),
            &AssumptionPolicy::default(),
            &SilentProgress,
        )
        .await;

        assert_eq!(summarize_report(&analyst, &report).await, "A steady income play.");
        let prompt = analyst.prompt_for(MEMO_ROLE).expect("memo requested");
        assert!(prompt.contains("Central value: $5,309,091"));
    }

    #[tokio::test]
    async fn summary_falls_back_to_local_text() {
        let report = run_full_workflow(
            &NullAnalyst,
            &sample_asset(),
            &AssumptionPolicy::default(),
            &SilentProgress,
        )
        .await;

        let summary = summarize_report(&NullAnalyst, &report).await;
        assert!(summary.starts_with("Harbor Lofts (Porto, Portugal) is valued at $5,309,091 USD"));
        assert!(summary.contains("cap_rate model"));
        assert!(summary.contains("0/100 with High risk: Error."));
    }
}
