//! HTTP client for the docker-flow-proxy API

use flowcert_core::ProxyEndpointConfig;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::error::{ProxyError, Result};

#[derive(Debug, Clone)]
pub struct ProxyApiClient {
    client: Client,
    base_url: String,
}

impl ProxyApiClient {
    pub fn new(config: &ProxyEndpointConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `<base>/v<version>/docker-flow-proxy<path>`
    pub fn url(&self, version: u32, path: &str) -> String {
        format!("{}/v{}/docker-flow-proxy{}", self.base_url, version, path)
    }

    /// Upload a certificate and ask the proxy to distribute it to every replica
    pub async fn put_certificate(
        &self,
        version: u32,
        cert_name: &str,
        body: Vec<u8>,
    ) -> Result<()> {
        let url = self.url(version, "/cert");
        debug!(url = %url, cert = %cert_name, bytes = body.len(), "Sending certificate to proxy");

        let response = self
            .client
            .put(&url)
            .query(&[("certName", cert_name), ("distribute", "true")])
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(())
    }

    /// Call the proxy's reconfigure endpoint with a query string passed through verbatim
    pub async fn reconfigure(&self, version: u32, raw_query: &str) -> Result<StatusCode> {
        let mut url = self.url(version, "/reconfigure");
        if !raw_query.is_empty() {
            url.push('?');
            url.push_str(raw_query);
        }

        let response = self.client.get(&url).send().await?;
        Ok(response.status())
    }
}
