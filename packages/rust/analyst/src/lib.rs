//! The analytical collaborator: structured-JSON and free-text completions.
//!
//! [`Analyst`] is the only external capability the valuation pipeline
//! consumes. Every failure comes back as an `Err`; the pipeline decides what
//! to substitute.
//!
//! Implementations:
//! - [`OpenRouterClient`]: HTTP client for an OpenAI-compatible chat API
//! - [`NullAnalyst`]: always unavailable (offline runs)
//! - [`ScriptedAnalyst`]: canned answers per role, with call recording

mod extract;
mod openrouter;
mod scripted;

use std::future::Future;

use parcel_shared::{ParcelError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use extract::extract_json;
pub use openrouter::OpenRouterClient;
pub use scripted::{CallEvent, ScriptedAnalyst};

/// Text/JSON generation facility.
///
/// `role` is the persona the model should adopt (sent as the system message),
/// `prompt` carries the asset and valuation data.
pub trait Analyst: Send + Sync {
    /// Ask for a JSON object shaped like `example` and parse it into `T`.
    fn generate_json<T>(
        &self,
        role: &str,
        prompt: &str,
        example: &T,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: Serialize + DeserializeOwned + Send + Sync;

    /// Free-text completion.
    fn generate_response(&self, role: &str, prompt: &str)
    -> impl Future<Output = Result<String>> + Send;
}

/// An analyst that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalyst;

impl Analyst for NullAnalyst {
    async fn generate_json<T>(&self, role: &str, _prompt: &str, _example: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        Err(ParcelError::Estimation(format!("offline: no analyst for '{role}'")))
    }

    async fn generate_response(&self, role: &str, _prompt: &str) -> Result<String> {
        Err(ParcelError::Estimation(format!("offline: no analyst for '{role}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_analyst_always_fails() {
        let analyst = NullAnalyst;
        let json: Result<serde_json::Value> = analyst
            .generate_json("estimator", "value this", &serde_json::json!({}))
            .await;
        assert!(matches!(json, Err(ParcelError::Estimation(_))));

        let text = analyst.generate_response("writer", "summarize").await;
        assert!(text.unwrap_err().to_string().contains("offline"));
    }
}
