//! Remote breed vocabulary source.

use crate::breeds::BreedError;
use crate::config::CoreConfig;
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Read-only provider of the complete breed vocabulary.
pub trait BreedSource: Send + Sync {
    /// Returns every breed name in one call. Names are not normalized.
    fn fetch_breeds(&self) -> Result<Vec<String>, BreedError>;
}

impl<S: BreedSource + ?Sized> BreedSource for Arc<S> {
    fn fetch_breeds(&self) -> Result<Vec<String>, BreedError> {
        (**self).fetch_breeds()
    }
}

/// TheCatAPI `/v1/breeds` client.
pub struct TheCatApiSource {
    agent: ureq::Agent,
    url: String,
    api_key: Option<String>,
}

impl TheCatApiSource {
    /// Builds a client whose every call is bounded by `timeout`.
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            url: url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            config.breeds_url.clone(),
            config.thecatapi_key.clone(),
            config.upstream_timeout(),
        )
    }
}

impl BreedSource for TheCatApiSource {
    fn fetch_breeds(&self) -> Result<Vec<String>, BreedError> {
        let mut request = self.agent.get(self.url.as_str());
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("x-api-key", key);
        }

        // Non-2xx statuses and timeouts both arrive as `ureq::Error`.
        let body = request
            .call()
            .map_err(|err| BreedError::UpstreamUnavailable(err.to_string()))?
            .into_body()
            .read_to_string()
            .map_err(|err| BreedError::UpstreamUnavailable(err.to_string()))?;

        let names = parse_breed_names(&body)?;
        debug!(
            "event=breed_fetch module=breeds status=ok count={}",
            names.len()
        );
        Ok(names)
    }
}

/// Extracts breed labels from a `[{"name": ...}, ...]` payload.
///
/// Entries that are not objects or lack a non-empty string `name` are skipped.
pub fn parse_breed_names(body: &str) -> Result<Vec<String>, BreedError> {
    let items: Vec<Value> = serde_json::from_str(body).map_err(|err| {
        BreedError::UpstreamUnavailable(format!("malformed breed payload: {err}"))
    })?;

    Ok(items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .collect())
}
