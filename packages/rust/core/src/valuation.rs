//! Direct-capitalisation valuation.
//!
//! The formula is the same for every model tag: a `dcf_light` snapshot is
//! still valued as `NOI / cap rate`. The tag is carried through untouched.

use parcel_shared::{AssetSize, ValuationAssumptions, ValuationMetrics, ValuationResult};

/// Lowest cap rate (%) the calculator divides by.
pub const CAP_RATE_FLOOR: f64 = 0.1;

/// Half-width of the value band around the central estimate.
pub const VALUE_BAND: f64 = 0.10;

/// Reporting currency.
pub const CURRENCY: &str = "USD";

/// Value an assumption snapshot.
///
/// `valueLow`/`valueHigh` are always `round(central × 0.9)` / `round(central × 1.1)`.
/// A cap rate below [`CAP_RATE_FLOOR`] (including zero or negative) is clamped
/// rather than rejected.
pub fn compute_valuation(assumptions: &ValuationAssumptions) -> ValuationResult {
    let noi = assumptions.estimated_noi;
    let safe_cap_rate = assumptions.market_cap_rate.max(CAP_RATE_FLOOR);

    let value_central = (noi / (safe_cap_rate / 100.0)).round();
    let value_low = (value_central * (1.0 - VALUE_BAND)).round();
    let value_high = (value_central * (1.0 + VALUE_BAND)).round();

    // Equals the clamped cap rate up to rounding of the central value.
    let gross_yield = (value_central != 0.0).then(|| noi / value_central * 100.0);

    ValuationResult {
        model_used: assumptions.model,
        value_central,
        value_low,
        value_high,
        metrics: ValuationMetrics {
            noi_effective: noi,
            cap_rate_applied: assumptions.market_cap_rate,
            gross_yield,
            price_per_unit: None,
            irr: None,
        },
        currency: CURRENCY.to_string(),
    }
}

/// Central value divided by the asset's size (per sqm or per unit), rounded to
/// a whole currency unit.
pub fn price_per_unit(valuation: &ValuationResult, size: Option<&AssetSize>) -> Option<f64> {
    size.filter(|s| s.amount > 0.0)
        .map(|s| (valuation.value_central / s.amount).round())
}
