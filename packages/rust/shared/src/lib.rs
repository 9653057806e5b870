//! Shared types, error model, and configuration for Parcel.
//!
//! This crate is the foundation depended on by all other Parcel crates.
//! It provides:
//! - [`ParcelError`]: the unified error type
//! - Domain types ([`AssetContext`], [`ValuationAssumptions`], [`ValuationResult`],
//!   [`FullValuationReport`] and the four analysis outputs)
//! - Configuration ([`AppConfig`], [`AssumptionPolicy`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalystConfig, AppConfig, AssumptionPolicy, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{ParcelError, Result};
pub use types::{
    AssetContext, AssetId, AssetSize, AssetStatus, AssetType, AssumptionField, AssumptionSources,
    DeveloperNotes, FeasibilityReport, Financials, FullValuationReport, ProjectEconomics,
    Provenance, ReportId, RiskLevel, SizeUnit, ValuationAssumptions, ValuationMetrics,
    ValuationModel, ValuationNarrative, ValuationResult,
};
