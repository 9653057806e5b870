//! Analyst selection for the CLI.

use parcel_analyst::{Analyst, NullAnalyst, OpenRouterClient};
use parcel_shared::{AppConfig, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

/// The analyst a command runs against: the configured endpoint, or none at all.
pub(crate) enum CliAnalyst {
    Online(OpenRouterClient),
    Offline(NullAnalyst),
}

impl CliAnalyst {
    /// Resolve from config. `offline` skips the API key check entirely.
    pub(crate) fn from_config(config: &AppConfig, offline: bool) -> Result<Self> {
        if offline {
            info!("offline run, every analysis will use fallbacks");
            return Ok(Self::Offline(NullAnalyst));
        }
        let client = OpenRouterClient::from_app_config(config)?;
        info!(model = client.model(), "using analyst endpoint");
        Ok(Self::Online(client))
    }
}

impl Analyst for CliAnalyst {
    async fn generate_json<T>(&self, role: &str, prompt: &str, example: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match self {
            Self::Online(client) => client.generate_json(role, prompt, example).await,
            Self::Offline(null) => null.generate_json(role, prompt, example).await,
        }
    }

    async fn generate_response(&self, role: &str, prompt: &str) -> Result<String> {
        match self {
            Self::Online(client) => client.generate_response(role, prompt).await,
            Self::Offline(null) => null.generate_response(role, prompt).await,
        }
    }
}
