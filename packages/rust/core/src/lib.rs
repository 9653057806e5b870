//! Valuation & feasibility pipeline for Parcel.
//!
//! This crate ties together model selection, assumption building, the
//! cap-rate valuation and the four analysis stages into one end-to-end
//! workflow ([`pipeline::run_full_workflow`]).

pub mod analysis;
pub mod assumptions;
pub mod model;
pub mod pipeline;
pub mod valuation;

pub use assumptions::{AssumptionEdits, apply_edits, build_assumptions};
pub use model::select_model;
pub use pipeline::{
    ProgressReporter, SilentProgress, run_full_workflow, run_with_assumptions, summarize_report,
};
pub use valuation::compute_valuation;

#[cfg(test)]
pub(crate) mod test_support;
