use setup_sync::{ModelBinding, RemoteError, RemoteRecord, RemoteSource, SessionHandle};

use crate::payload::{file_stem, parse_records};

/// Configuration for an HTTP snapshot endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl HttpRemoteConfig {
    /// Take the base URL and token from the session. `None` when the session
    /// has no server URL.
    pub fn from_session(session: &SessionHandle) -> Option<Self> {
        Some(Self {
            base_url: session.server_url()?.to_owned(),
            token: session.token().map(str::to_owned),
        })
    }
}

/// Fetches model snapshots over HTTP from
/// `{base_url}/{database}/{model_stem}.json`.
pub struct HttpRemote {
    config: HttpRemoteConfig,
    client: reqwest::Client,
    label: String,
}

impl HttpRemote {
    pub fn new(config: HttpRemoteConfig) -> Self {
        let label = config.base_url.clone();
        Self {
            config,
            client: reqwest::Client::new(),
            label,
        }
    }

    fn url_for(&self, binding: &ModelBinding) -> String {
        format!(
            "{}/{}/{}.json",
            self.config.base_url.trim_end_matches('/'),
            binding.database,
            file_stem(&binding.model)
        )
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("User-Agent", "setup-sync")
            .header("Accept", "application/json");

        if let Some(token) = &self.config.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        req
    }
}

#[async_trait::async_trait]
impl RemoteSource for HttpRemote {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch_records(
        &self,
        binding: &ModelBinding,
    ) -> Result<Vec<RemoteRecord>, RemoteError> {
        let url = self.url_for(binding);
        tracing::debug!(model = %binding.model, %url, "fetching snapshot");

        let response = self
            .build_request(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                model: binding.model.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        parse_records(&binding.model, &body)
    }
}
