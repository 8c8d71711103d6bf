use super::client::{MirrorHttpClient, TransportConfig};
use super::types::{PicturesRequest, PicturesResponse};
use super::MirrorAdapter;
use crate::models::MirrorId;
use crate::Result;
use async_trait::async_trait;

const GENERATE_PATH: &str = "/api/generateImage";

/// Default mirror. Returns the service's image URLs untouched.
pub struct PicturesMirror {
    http: MirrorHttpClient,
}

impl PicturesMirror {
    pub fn new(base_url: String, transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            http: MirrorHttpClient::new(MirrorId::Pictures, base_url, transport)?,
        })
    }
}

#[async_trait]
impl MirrorAdapter for PicturesMirror {
    fn id(&self) -> MirrorId {
        MirrorId::Pictures
    }

    fn transport(&self) -> Option<TransportConfig> {
        Some(self.http.transport())
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        let request = PicturesRequest {
            caption_input: prompt,
            caption_model: "default",
        };

        let response: PicturesResponse = self.http.post(GENERATE_PATH, &request).await?;
        Ok(response.imgs)
    }
}
