//! Deterministic [`Analyst`] that answers from a script.
//!
//! Answers are keyed by role. A role without a scripted answer fails like an
//! unavailable endpoint would. Every call is recorded so tests can assert on
//! ordering and prompt contents.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use parcel_shared::{ParcelError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Analyst;

/// One entry in the call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Started { role: String, prompt: String },
    Finished { role: String },
}

/// Scripted analyst for tests and demos.
#[derive(Debug, Default)]
pub struct ScriptedAnalyst {
    json: HashMap<String, serde_json::Value>,
    text: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    events: Mutex<Vec<CallEvent>>,
}

impl ScriptedAnalyst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer JSON requests for `role` with `value`.
    pub fn with_json(mut self, role: &str, value: serde_json::Value) -> Self {
        self.json.insert(role.to_string(), value);
        self
    }

    /// Answer free-text requests for `role` with `text`.
    pub fn with_text(mut self, role: &str, text: &str) -> Self {
        self.text.insert(role.to_string(), text.to_string());
        self
    }

    /// Sleep for `delay` before answering `role`.
    pub fn with_delay(mut self, role: &str, delay: Duration) -> Self {
        self.delays.insert(role.to_string(), delay);
        self
    }

    /// Snapshot of every call so far, in order.
    pub fn events(&self) -> Vec<CallEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Roles in the order their calls started.
    pub fn started_roles(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CallEvent::Started { role, .. } => Some(role),
                CallEvent::Finished { .. } => None,
            })
            .collect()
    }

    /// Prompt of the first call made with `role`.
    pub fn prompt_for(&self, role: &str) -> Option<String> {
        self.events().into_iter().find_map(|e| match e {
            CallEvent::Started { role: r, prompt } if r == role => Some(prompt),
            _ => None,
        })
    }

    fn record(&self, event: CallEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    async fn begin(&self, role: &str, prompt: &str) {
        self.record(CallEvent::Started {
            role: role.to_string(),
            prompt: prompt.to_string(),
        });
        if let Some(delay) = self.delays.get(role) {
            tokio::time::sleep(*delay).await;
        }
    }

    fn finish(&self, role: &str) {
        self.record(CallEvent::Finished {
            role: role.to_string(),
        });
    }
}

impl Analyst for ScriptedAnalyst {
    async fn generate_json<T>(&self, role: &str, prompt: &str, _example: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.begin(role, prompt).await;
        let result = match self.json.get(role) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ParcelError::parse(format!("scripted answer for '{role}': {e}"))),
            None => Err(ParcelError::Estimation(format!(
                "no scripted answer for '{role}'"
            ))),
        };
        self.finish(role);
        result
    }

    async fn generate_response(&self, role: &str, prompt: &str) -> Result<String> {
        self.begin(role, prompt).await;
        let result = self
            .text
            .get(role)
            .cloned()
            .ok_or_else(|| ParcelError::Estimation(format!("no scripted answer for '{role}'")));
        self.finish(role);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_scripted_roles() {
        let analyst = ScriptedAnalyst::new()
            .with_json("scorer", serde_json::json!({ "score": 80 }))
            .with_text("writer", "Looks solid.");

        let v: serde_json::Value = analyst
            .generate_json("scorer", "score please", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(v["score"], 80);

        let t = analyst.generate_response("writer", "memo").await.unwrap();
        assert_eq!(t, "Looks solid.");
    }

    #[tokio::test]
    async fn unscripted_role_fails() {
        let analyst = ScriptedAnalyst::new();
        let r: Result<serde_json::Value> = analyst
            .generate_json("nobody", "p", &serde_json::json!({}))
            .await;
        assert!(matches!(r, Err(ParcelError::Estimation(_))));
    }

    #[tokio::test]
    async fn records_start_and_finish() {
        let analyst = ScriptedAnalyst::new().with_text("writer", "ok");
        let _ = analyst.generate_response("writer", "first prompt").await;

        assert_eq!(
            analyst.events(),
            vec![
                CallEvent::Started {
                    role: "writer".into(),
                    prompt: "first prompt".into()
                },
                CallEvent::Finished {
                    role: "writer".into()
                },
            ]
        );
        assert_eq!(analyst.prompt_for("writer").as_deref(), Some("first prompt"));
        assert_eq!(analyst.started_roles(), vec!["writer".to_string()]);
    }
}
