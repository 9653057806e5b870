//! Assumption building: estimate, then policy overlay.
//!
//! 1. **Estimate**: one JSON call to the analyst. Fields it leaves out (or
//!    the whole answer, if the call fails) come from a fixed fallback.
//! 2. **Overlay**: with [`AssumptionPolicy::apply_overlay`] on, cap rate,
//!    income growth, vacancy and holding period are replaced by policy values.
//!
//! Every field's origin is recorded in `sources`.

use parcel_analyst::Analyst;
use parcel_shared::{
    AssetContext, AssumptionField, AssumptionPolicy, AssumptionSources, Financials, Provenance,
    ValuationAssumptions,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::analysis::money;
use crate::model::select_model;

/// Persona for the estimation call.
pub const ESTIMATOR_ROLE: &str =
    "a senior real estate valuation analyst estimating market assumptions";

// ---------------------------------------------------------------------------
// Fallback constants
// ---------------------------------------------------------------------------

/// Share of gross income assumed to survive operating costs.
const FALLBACK_NOI_MARGIN: f64 = 0.7;
const FALLBACK_NOI: f64 = 100_000.0;
const FALLBACK_CAP_RATE: f64 = 6.0;
const FALLBACK_DISCOUNT_RATE: f64 = 10.0;
const FALLBACK_GROWTH_INCOME: f64 = 2.0;
const FALLBACK_GROWTH_EXPENSES: f64 = 2.0;
const FALLBACK_EXIT_YIELD: f64 = 7.0;
const FALLBACK_VACANCY: f64 = 5.0;
const FALLBACK_TOTAL_COST: f64 = 2_000_000.0;
const FALLBACK_LAND_COST: f64 = 500_000.0;
const FALLBACK_HOLDING_PERIOD: u32 = 10;

// ---------------------------------------------------------------------------
// Raw estimate
// ---------------------------------------------------------------------------

/// The estimator's answer. Every field may be missing.
///
/// A field that is not a usable number (`"high"`, an object) reads as missing
/// so it falls back on its own without discarding the rest of the answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEstimate {
    #[serde(rename = "estimatedNOI", default, deserialize_with = "lenient_number")]
    pub estimated_noi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub discount_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub growth_rate_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub growth_rate_expenses: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub exit_yield: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub vacancy_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub est_total_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub est_land_cost: Option<f64>,
}

/// Read a number the way models tend to write one: `6.5`, `"6.5"`, `"6.5%"`
/// or `"$250,000"`. Anything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    Ok(number.filter(|v| v.is_finite()))
}

impl RawEstimate {
    /// The fixed estimate used when the analyst is unavailable.
    pub fn fallback(financials: &Financials) -> Self {
        Self {
            estimated_noi: Some(fallback_noi(financials)),
            market_cap_rate: Some(FALLBACK_CAP_RATE),
            discount_rate: Some(FALLBACK_DISCOUNT_RATE),
            growth_rate_income: Some(FALLBACK_GROWTH_INCOME),
            growth_rate_expenses: Some(FALLBACK_GROWTH_EXPENSES),
            exit_yield: Some(FALLBACK_EXIT_YIELD),
            vacancy_rate: Some(FALLBACK_VACANCY),
            est_total_cost: Some(FALLBACK_TOTAL_COST),
            est_land_cost: Some(FALLBACK_LAND_COST),
        }
    }
}

/// NOI assumed without an estimate: a share of gross income, or a flat default.
fn fallback_noi(financials: &Financials) -> f64 {
    financials
        .gross_income
        .map_or(FALLBACK_NOI, |gross| gross * FALLBACK_NOI_MARGIN)
}

/// Take `estimated` when present, otherwise `fallback`, and record where it came from.
fn pick(
    sources: &mut AssumptionSources,
    field: AssumptionField,
    estimated: Option<f64>,
    fallback: f64,
) -> f64 {
    match estimated.filter(|v| v.is_finite()) {
        Some(v) => {
            sources.insert(field, Provenance::AiEstimated);
            v
        }
        None => {
            sources.insert(field, Provenance::FallbackDefault);
            fallback
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

fn describe_amount(label: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{label}: {} per year", money(v)),
        None => format!("{label}: not provided"),
    }
}

fn estimation_prompt(asset: &AssetContext) -> String {
    let f = &asset.financials;
    let mut lines = vec![
        "Estimate realistic valuation assumptions for the asset below.".to_string(),
        format!("Name: {}", asset.name),
        format!("Location: {}", asset.location),
        format!("Asset type: {}", asset.asset_type),
        format!("Status: {}", asset.status),
    ];
    if !asset.description.is_empty() {
        lines.push(format!("Description: {}", asset.description));
    }
    if let Some(size) = &asset.size {
        lines.push(format!("Size: {} {}", size.amount, size.unit));
    }
    lines.push(describe_amount("Gross income", f.gross_income));
    lines.push(describe_amount("Operating expenses", f.opex));
    lines.push(describe_amount("NOI", f.noi));
    lines.push(match f.ask_price {
        Some(v) => format!("Asking price: {}", money(v)),
        None => "Asking price: not provided".to_string(),
    });
    lines.push(String::new());
    lines.push(
        "Rates are percentages (5.5 means 5.5%). Amounts are USD. \
         estTotalCost is the total project cost and estLandCost the land component."
            .to_string(),
    );
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Merge an estimate over the fallback into a complete snapshot (phase 1).
pub fn merge_estimate(asset: &AssetContext, estimate: &RawEstimate) -> ValuationAssumptions {
    let mut sources = AssumptionSources::new();

    let estimated_noi = match asset.financials.noi {
        Some(noi) => {
            sources.insert(AssumptionField::EstimatedNoi, Provenance::UserProvided);
            noi
        }
        None => pick(
            &mut sources,
            AssumptionField::EstimatedNoi,
            estimate.estimated_noi,
            fallback_noi(&asset.financials),
        ),
    };

    let growth_rate_income = pick(
        &mut sources,
        AssumptionField::GrowthRateIncome,
        estimate.growth_rate_income,
        FALLBACK_GROWTH_INCOME,
    );
    let growth_rate_expenses = pick(
        &mut sources,
        AssumptionField::GrowthRateExpenses,
        estimate.growth_rate_expenses,
        FALLBACK_GROWTH_EXPENSES,
    );
    let market_cap_rate = pick(
        &mut sources,
        AssumptionField::MarketCapRate,
        estimate.market_cap_rate,
        FALLBACK_CAP_RATE,
    );
    let discount_rate = pick(
        &mut sources,
        AssumptionField::DiscountRate,
        estimate.discount_rate,
        FALLBACK_DISCOUNT_RATE,
    );
    let exit_yield = pick(
        &mut sources,
        AssumptionField::ExitYield,
        estimate.exit_yield,
        FALLBACK_EXIT_YIELD,
    );
    let vacancy_rate = pick(
        &mut sources,
        AssumptionField::VacancyRate,
        estimate.vacancy_rate,
        FALLBACK_VACANCY,
    );
    let total_project_cost = pick(
        &mut sources,
        AssumptionField::TotalProjectCost,
        estimate.est_total_cost,
        FALLBACK_TOTAL_COST,
    );
    let land_cost = pick(
        &mut sources,
        AssumptionField::LandCost,
        estimate.est_land_cost,
        FALLBACK_LAND_COST,
    );
    sources.insert(AssumptionField::HoldingPeriod, Provenance::FallbackDefault);

    ValuationAssumptions {
        model: select_model(asset),
        estimated_noi,
        growth_rate_income,
        growth_rate_expenses,
        market_cap_rate,
        discount_rate,
        exit_yield,
        holding_period: FALLBACK_HOLDING_PERIOD,
        vacancy_rate,
        total_project_cost: Some(total_project_cost),
        land_cost: Some(land_cost),
        sources,
    }
}

/// Lay the policy values over a snapshot (phase 2). A disabled policy is a no-op.
pub fn apply_policy(
    assumptions: ValuationAssumptions,
    policy: &AssumptionPolicy,
) -> ValuationAssumptions {
    if !policy.apply_overlay {
        return assumptions;
    }

    let mut sources = assumptions.sources;
    for field in [
        AssumptionField::MarketCapRate,
        AssumptionField::GrowthRateIncome,
        AssumptionField::VacancyRate,
        AssumptionField::HoldingPeriod,
    ] {
        sources.insert(field, Provenance::PolicyDefault);
    }

    ValuationAssumptions {
        market_cap_rate: policy.market_cap_rate,
        growth_rate_income: policy.growth_rate_income,
        vacancy_rate: policy.vacancy_rate,
        holding_period: policy.holding_period,
        sources,
        ..assumptions
    }
}

/// Build the full assumption set for an asset.
///
/// Never fails: an unavailable analyst means fallback values throughout.
#[instrument(skip_all, fields(asset = %asset.name))]
pub async fn build_assumptions<A: Analyst>(
    analyst: &A,
    asset: &AssetContext,
    policy: &AssumptionPolicy,
) -> ValuationAssumptions {
    let prompt = estimation_prompt(asset);
    let example = RawEstimate::fallback(&asset.financials);

    let estimate = match analyst
        .generate_json(ESTIMATOR_ROLE, &prompt, &example)
        .await
    {
        Ok(estimate) => {
            debug!(?estimate, "estimate received");
            estimate
        }
        Err(e) => {
            warn!(error = %e, "estimation unavailable, using fallback assumptions");
            RawEstimate::default()
        }
    };

    let assumptions = apply_policy(merge_estimate(asset, &estimate), policy);
    info!(
        model = %assumptions.model,
        noi = assumptions.estimated_noi,
        cap_rate = assumptions.market_cap_rate,
        overlay = policy.apply_overlay,
        "assumptions built"
    );
    assumptions
}

// ---------------------------------------------------------------------------
// User edits
// ---------------------------------------------------------------------------

/// A user's changes to an assumption snapshot. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssumptionEdits {
    #[serde(rename = "estimatedNOI", default)]
    pub estimated_noi: Option<f64>,
    #[serde(default)]
    pub growth_rate_income: Option<f64>,
    #[serde(default)]
    pub growth_rate_expenses: Option<f64>,
    #[serde(default)]
    pub market_cap_rate: Option<f64>,
    #[serde(default)]
    pub discount_rate: Option<f64>,
    #[serde(default)]
    pub exit_yield: Option<f64>,
    #[serde(default)]
    pub holding_period: Option<u32>,
    #[serde(default)]
    pub vacancy_rate: Option<f64>,
    #[serde(default)]
    pub total_project_cost: Option<f64>,
    #[serde(default)]
    pub land_cost: Option<f64>,
}

impl AssumptionEdits {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Produce a new snapshot with `edits` applied and tagged `User Provided`.
///
/// `base` is left untouched.
pub fn apply_edits(base: &ValuationAssumptions, edits: &AssumptionEdits) -> ValuationAssumptions {
    let mut next = base.clone();

    fn set<T>(
        sources: &mut AssumptionSources,
        field: AssumptionField,
        slot: &mut T,
        edit: Option<T>,
    ) {
        if let Some(value) = edit {
            *slot = value;
            sources.insert(field, Provenance::UserProvided);
        }
    }

    let s = &mut next.sources;
    set(s, AssumptionField::EstimatedNoi, &mut next.estimated_noi, edits.estimated_noi);
    set(
        s,
        AssumptionField::GrowthRateIncome,
        &mut next.growth_rate_income,
        edits.growth_rate_income,
    );
    set(
        s,
        AssumptionField::GrowthRateExpenses,
        &mut next.growth_rate_expenses,
        edits.growth_rate_expenses,
    );
    set(s, AssumptionField::MarketCapRate, &mut next.market_cap_rate, edits.market_cap_rate);
    set(s, AssumptionField::DiscountRate, &mut next.discount_rate, edits.discount_rate);
    set(s, AssumptionField::ExitYield, &mut next.exit_yield, edits.exit_yield);
    set(s, AssumptionField::HoldingPeriod, &mut next.holding_period, edits.holding_period);
    set(s, AssumptionField::VacancyRate, &mut next.vacancy_rate, edits.vacancy_rate);
    set(
        s,
        AssumptionField::TotalProjectCost,
        &mut next.total_project_cost,
        edits.total_project_cost.map(Some),
    );
    set(s, AssumptionField::LandCost, &mut next.land_cost, edits.land_cost.map(Some));

    next
}
