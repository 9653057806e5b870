//! Fixtures shared by unit tests across modules.

use parcel_shared::{
    AssetContext, AssetId, AssetSize, AssetStatus, AssetType, Financials, SizeUnit,
    ValuationMetrics, ValuationModel, ValuationResult,
};

pub(crate) fn sample_asset() -> AssetContext {
    AssetContext {
        id: AssetId::new(),
        name: "Harbor Lofts".into(),
        location: "Porto, Portugal".into(),
        asset_type: AssetType::IncomeProperty,
        status: AssetStatus::Existing,
        description: "Stabilised 38-unit residential block.".into(),
        financials: Financials {
            gross_income: Some(410_000.0),
            opex: Some(118_000.0),
            noi: Some(292_000.0),
            ask_price: Some(5_200_000.0),
        },
        size: Some(AssetSize {
            amount: 38.0,
            unit: SizeUnit::Units,
        }),
    }
}

pub(crate) fn land_asset() -> AssetContext {
    AssetContext {
        id: AssetId::new(),
        name: "Ridgeview Parcel".into(),
        location: "Boise, Idaho".into(),
        asset_type: AssetType::LandDevelopment,
        status: AssetStatus::Concept,
        description: "Greenfield plot zoned for mixed residential.".into(),
        financials: Financials::default(),
        size: None,
    }
}

pub(crate) fn sample_valuation() -> ValuationResult {
    ValuationResult {
        model_used: ValuationModel::CapRate,
        value_central: 5_309_091.0,
        value_low: 4_778_182.0,
        value_high: 5_840_000.0,
        metrics: ValuationMetrics {
            noi_effective: 292_000.0,
            cap_rate_applied: 5.5,
            gross_yield: Some(5.5),
            price_per_unit: None,
            irr: None,
        },
        currency: "USD".into(),
    }
}
