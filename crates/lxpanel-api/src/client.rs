//! Container Manager API client.

use async_trait::async_trait;
use lxpanel_common::{ManagerConfig, PanelError, PanelResult, Protocol};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::envelope::Envelope;
use crate::form::{
    AddIpv6Form, AddPortForm, AddProxyForm, DeleteIpv6Form, DeletePortForm, DeleteProxyForm,
};
use crate::types::{ForwardingRule, Ipv6Binding, PortAvailability, ProxyBinding};

/// Operations the panels need from the Container Manager.
///
/// Every method maps to one HTTP call. Mutations return the manager's
/// message on success; a non-success code becomes [`PanelError::Remote`]
/// and a transport failure [`PanelError::Network`].
#[async_trait]
pub trait ManagerApi: Send + Sync {
    /// `GET /api/natlist`.
    ///
    /// Rows that cannot be read are skipped; the rest are returned.
    async fn nat_rules(&self, hostname: &str) -> PanelResult<Vec<ForwardingRule>>;

    /// `GET /api/nat/check`.
    ///
    /// A non-success envelope is reported as an unavailable port, carrying
    /// the manager's reason.
    async fn check_nat_port(
        &self,
        hostname: &str,
        protocol: Protocol,
        port: u16,
    ) -> PanelResult<PortAvailability>;

    /// `POST /api/addport`.
    async fn add_port(&self, form: &AddPortForm) -> PanelResult<String>;

    /// `POST /api/delport`.
    async fn delete_port(&self, form: &DeletePortForm) -> PanelResult<String>;

    /// `GET /api/ipv6/list`.
    async fn ipv6_bindings(&self, hostname: &str) -> PanelResult<Vec<Ipv6Binding>>;

    /// `POST /api/ipv6/add`.
    async fn add_ipv6(&self, form: &AddIpv6Form) -> PanelResult<String>;

    /// `POST /api/ipv6/delete`.
    async fn delete_ipv6(&self, form: &DeleteIpv6Form) -> PanelResult<String>;

    /// `GET /api/proxy/list`.
    async fn proxies(&self, hostname: &str) -> PanelResult<Vec<ProxyBinding>>;

    /// `GET /api/proxy/check`.
    async fn check_proxy_domain(&self, domain: &str) -> PanelResult<serde_json::Value>;

    /// `POST /api/proxy/add`.
    async fn add_proxy(&self, form: &AddProxyForm) -> PanelResult<String>;

    /// `POST /api/proxy/delete`.
    async fn delete_proxy(&self, form: &DeleteProxyForm) -> PanelResult<String>;
}

/// [`ManagerApi`] over HTTPS.
pub struct HttpManager {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpManager {
    /// Create a client from connection settings.
    pub fn new(config: &ManagerConfig) -> PanelResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| PanelError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T, Q>(&self, path: &str, query: &Q) -> PanelResult<Envelope<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| PanelError::Network {
                message: format!("Failed to request {path}: {e}"),
            })?;

        Self::decode(path, response).await
    }

    async fn post_form<T, F>(&self, path: &str, form: &F) -> PanelResult<Envelope<T>>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .form(form)
            .send()
            .await
            .map_err(|e| PanelError::Network {
                message: format!("Failed to request {path}: {e}"),
            })?;

        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> PanelResult<Envelope<T>> {
        let status = response.status();
        let body = response.text().await.map_err(|e| PanelError::Network {
            message: format!("Failed to read response of {path}: {e}"),
        })?;

        tracing::debug!(path, status = %status, len = body.len(), "Response");

        serde_json::from_str(&body).map_err(|e| {
            PanelError::Serialization(format!("Invalid response from {path} ({status}): {e}"))
        })
    }

    async fn mutate<F>(&self, path: &str, form: &F) -> PanelResult<String>
    where
        F: Serialize + ?Sized + Sync,
    {
        let envelope: Envelope<serde_json::Value> = self.post_form(path, form).await?;
        Ok(envelope.into_success()?.msg)
    }
}

#[async_trait]
impl ManagerApi for HttpManager {
    async fn nat_rules(&self, hostname: &str) -> PanelResult<Vec<ForwardingRule>> {
        let envelope: Envelope<Vec<serde_json::Value>> =
            self.get("/api/natlist", &[("hostname", hostname)]).await?;
        let rows = envelope.into_success()?.data.unwrap_or_default();

        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value(row) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(hostname, index, error = %e, "Skipping unreadable NAT rule");
                    None
                }
            })
            .collect())
    }

    async fn check_nat_port(
        &self,
        hostname: &str,
        protocol: Protocol,
        port: u16,
    ) -> PanelResult<PortAvailability> {
        let port = port.to_string();
        let envelope: Envelope<PortAvailability> = self
            .get(
                "/api/nat/check",
                &[
                    ("hostname", hostname),
                    ("protocol", protocol.as_str()),
                    ("port", port.as_str()),
                ],
            )
            .await?;

        if envelope.is_success() {
            return envelope.data.ok_or_else(|| {
                PanelError::Serialization("Availability check returned no data".to_string())
            });
        }

        let reason = envelope
            .data
            .and_then(|d| d.reason)
            .filter(|r| !r.is_empty())
            .unwrap_or(envelope.msg);
        Ok(PortAvailability::unavailable(reason))
    }

    async fn add_port(&self, form: &AddPortForm) -> PanelResult<String> {
        self.mutate("/api/addport", form).await
    }

    async fn delete_port(&self, form: &DeletePortForm) -> PanelResult<String> {
        self.mutate("/api/delport", form).await
    }

    async fn ipv6_bindings(&self, hostname: &str) -> PanelResult<Vec<Ipv6Binding>> {
        let envelope: Envelope<Vec<Ipv6Binding>> =
            self.get("/api/ipv6/list", &[("hostname", hostname)]).await?;
        Ok(envelope.into_success()?.data.unwrap_or_default())
    }

    async fn add_ipv6(&self, form: &AddIpv6Form) -> PanelResult<String> {
        self.mutate("/api/ipv6/add", form).await
    }

    async fn delete_ipv6(&self, form: &DeleteIpv6Form) -> PanelResult<String> {
        self.mutate("/api/ipv6/delete", form).await
    }

    async fn proxies(&self, hostname: &str) -> PanelResult<Vec<ProxyBinding>> {
        let envelope: Envelope<Vec<ProxyBinding>> =
            self.get("/api/proxy/list", &[("hostname", hostname)]).await?;
        Ok(envelope.into_success()?.data.unwrap_or_default())
    }

    async fn check_proxy_domain(&self, domain: &str) -> PanelResult<serde_json::Value> {
        let envelope: Envelope<serde_json::Value> =
            self.get("/api/proxy/check", &[("domain", domain)]).await?;
        Ok(envelope
            .into_success()?
            .data
            .unwrap_or(serde_json::Value::Null))
    }

    async fn add_proxy(&self, form: &AddProxyForm) -> PanelResult<String> {
        self.mutate("/api/proxy/add", form).await
    }

    async fn delete_proxy(&self, form: &DeleteProxyForm) -> PanelResult<String> {
        self.mutate("/api/proxy/delete", form).await
    }
}
