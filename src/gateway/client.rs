use reqwest::Client;
use tracing::{error, info, warn};

use super::MigrationGateway;
use super::error::GatewayError;
use super::types::{GatewayConfig, GatewayResult, MigrationRequest, SkipReason};

/// Gateway that POSTs migration requests to the new product API.
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpGateway {
    /// Connect and response deadlines both come from `config.timeout`.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl MigrationGateway for HttpGateway {
    async fn migrate(&self, request: &MigrationRequest) -> GatewayResult {
        if !self.config.enabled {
            info!(
                client_id = request.id,
                "external migration is disabled, skipping API call"
            );
            return GatewayResult::Skipped(SkipReason::Disabled);
        }

        let url = self.config.api_url.trim();
        if url.is_empty() {
            warn!(
                client_id = request.id,
                "new product API URL is not configured, skipping external migration"
            );
            return GatewayResult::Skipped(SkipReason::Unconfigured);
        }

        info!(client_id = request.id, url, "calling new product API");
        let response = match self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(client_id = request.id, error = %err, "error calling new product API");
                return GatewayResult::Rejected(format!(
                    "Failed to migrate client to new product: {err}"
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(client_id = request.id, %status, "new product API refused migration");
            return GatewayResult::Rejected(format!(
                "Failed to migrate client to new product. Status: {status}"
            ));
        }

        // The request deadline also covers the body; a stalled body is not a confirmation.
        match response.text().await {
            Ok(body) => {
                info!(
                    client_id = request.id,
                    response = %body,
                    "new product API confirmed migration"
                );
                GatewayResult::Confirmed
            }
            Err(err) => {
                error!(client_id = request.id, error = %err, "error reading new product API response");
                GatewayResult::Rejected(format!(
                    "Failed to migrate client to new product: {err}"
                ))
            }
        }
    }
}
