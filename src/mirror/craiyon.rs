use super::client::{MirrorHttpClient, TransportConfig};
use super::types::{CraiyonRequest, ImagesResponse};
use super::MirrorAdapter;
use crate::models::MirrorId;
use crate::Result;
use async_trait::async_trait;

const GENERATE_PATH: &str = "/v3";
const MODEL_VERSION: &str = "c4ue22fb7kb6wlac";

/// Craiyon returns bare image names; they are served from a separate host.
pub struct CraiyonMirror {
    http: MirrorHttpClient,
    image_host: String,
}

impl CraiyonMirror {
    pub fn new(base_url: String, image_host: String, transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            http: MirrorHttpClient::new(MirrorId::Craiyon, base_url, transport)?,
            image_host: image_host.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MirrorAdapter for CraiyonMirror {
    fn id(&self) -> MirrorId {
        MirrorId::Craiyon
    }

    fn transport(&self) -> Option<TransportConfig> {
        Some(self.http.transport())
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        let request = CraiyonRequest {
            prompt,
            version: MODEL_VERSION,
            token: None,
            model: "art",
            negative_prompt: "",
        };

        let response: ImagesResponse = self.http.post(GENERATE_PATH, &request).await?;

        Ok(response
            .images
            .iter()
            .map(|image| format!("{}/{}", self.image_host, image))
            .collect())
    }
}
