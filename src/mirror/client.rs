use crate::models::MirrorId;
use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Per-client transport settings.
///
/// Certificate relaxation lives here instead of in process-wide state, so it
/// only ever applies to the client built from this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportConfig {
    pub accept_invalid_certs: bool,
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn accepting_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

/// Thin JSON-over-POST client shared by the mirror adapters.
pub struct MirrorHttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    mirror: MirrorId,
    transport: TransportConfig,
}

impl MirrorHttpClient {
    pub fn new(mirror: MirrorId, base_url: String, transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            client: transport.build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            mirror,
            transport,
        })
    }

    /// Settings the underlying client was built with.
    pub fn transport(&self) -> TransportConfig {
        self.transport
    }

    /// POST `request` as JSON and return the raw response body.
    ///
    /// Transport failures and non-2xx statuses are errors; the body is not
    /// interpreted here.
    pub async fn post_text<Req: Serialize>(&self, path: &str, request: &Req) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to mirror {}: {}", self.mirror, e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!(
                "Mirror {} error (status {}): {}",
                self.mirror,
                status,
                error_text
            );
            return Err(Error::MirrorStatus {
                mirror: self.mirror,
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response.text().await?)
    }

    /// POST `request` and decode the body into the mirror's response shape.
    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let body = self.post_text(path, request).await?;
        self.decode(&body)
    }

    /// Validating decode: any shape mismatch fails closed.
    pub fn decode<Resp: DeserializeOwned>(&self, body: &str) -> Result<Resp> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                "Failed to parse mirror {} response: {}\nBody: {}",
                self.mirror,
                e,
                body
            );
            Error::ResponseParseFailed {
                mirror: self.mirror,
                source: e,
            }
        })
    }
}
