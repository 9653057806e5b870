//! Analysis stages layered on top of the valuation.
//!
//! Each stage builds a prompt, makes exactly one structured call to the
//! analyst and parses the answer. A failed call never escapes a stage: the
//! error is logged and the stage's [`Fallback`] value is returned instead.

mod economics;
mod feasibility;
mod narrative;
mod notes;

use parcel_shared::Result;
use tracing::{debug, warn};

pub use economics::{ECONOMICS_ROLE, generate_economics};
pub use feasibility::{FEASIBILITY_ROLE, generate_feasibility};
pub use narrative::{NARRATIVE_ROLE, generate_narrative};
pub use notes::{NOTES_ROLE, generate_developer_notes};

/// Degraded-but-valid value a stage returns when the analyst is unavailable.
pub trait Fallback {
    fn fallback() -> Self;
}

/// Unwrap a stage result, substituting the fallback on error.
pub fn resolve<T: Fallback>(stage: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => {
            debug!(stage, "analysis stage complete");
            value
        }
        Err(e) => {
            warn!(stage, error = %e, "analysis unavailable, using fallback");
            T::fallback()
        }
    }
}

/// Format a currency amount as `$1,234,567`.
pub fn money(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
