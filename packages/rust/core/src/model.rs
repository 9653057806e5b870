//! Valuation model selection.

use parcel_shared::{AssetContext, AssetStatus, AssetType, ValuationModel};

/// Pick the valuation model for an asset.
///
/// Only a stabilised income property is valued by direct capitalisation;
/// everything else is tagged `dcf_light`.
pub fn select_model(asset: &AssetContext) -> ValuationModel {
    match (asset.asset_type, asset.status) {
        (AssetType::IncomeProperty, AssetStatus::Existing) => ValuationModel::CapRate,
        _ => ValuationModel::DcfLight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_shared::{AssetId, Financials};

    fn asset(asset_type: AssetType, status: AssetStatus) -> AssetContext {
        AssetContext {
            id: AssetId::new(),
            name: "Test".into(),
            location: "Nowhere".into(),
            asset_type,
            status,
            description: String::new(),
            financials: Financials::default(),
            size: None,
        }
    }

    #[test]
    fn existing_income_property_uses_cap_rate() {
        let a = asset(AssetType::IncomeProperty, AssetStatus::Existing);
        assert_eq!(select_model(&a), ValuationModel::CapRate);
    }

    #[test]
    fn land_concept_uses_dcf_light() {
        let a = asset("Land / Development".parse().unwrap(), "Concept phase".parse().unwrap());
        assert_eq!(select_model(&a), ValuationModel::DcfLight);
    }

    #[test]
    fn every_other_combination_uses_dcf_light() {
        let types = [
            AssetType::IncomeProperty,
            AssetType::LandDevelopment,
            AssetType::MixedUse,
            AssetType::HospitalityResort,
            AssetType::IndustrialWarehouse,
            AssetType::Other,
        ];
        let statuses = [
            AssetStatus::Existing,
            AssetStatus::UnderRenovation,
            AssetStatus::GroundUpDevelopment,
            AssetStatus::Concept,
            AssetStatus::Conversion,
        ];

        for t in types {
            for s in statuses {
                let expected = if t == AssetType::IncomeProperty && s == AssetStatus::Existing {
                    ValuationModel::CapRate
                } else {
                    ValuationModel::DcfLight
                };
                assert_eq!(select_model(&asset(t, s)), expected, "{t} / {s}");
            }
        }
    }
}
