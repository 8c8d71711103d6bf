//! Image-generation mirror integration
//!
//! Each mirror is a third-party service with its own request and response
//! shape. Adapters hide those shapes behind [`MirrorAdapter`], returning an
//! ordered list of image URIs.

pub mod client;
pub mod craiyon;
pub mod mime;
pub mod mock;
pub mod pictures;
pub mod svgio;
pub mod types;

pub use client::{MirrorHttpClient, TransportConfig};
pub use craiyon::CraiyonMirror;
pub use mock::MockMirror;
pub use pictures::PicturesMirror;
pub use svgio::SvgIoMirror;

use crate::models::MirrorId;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MirrorAdapter: Send + Sync {
    fn id(&self) -> MirrorId;

    /// Transport of the adapter's HTTP client, if it has one.
    fn transport(&self) -> Option<TransportConfig> {
        None
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<String>>;
}

/// Reduce a prompt to what svg.io accepts: line breaks become spaces, and
/// anything other than ASCII word characters and spaces is dropped.
pub fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .replace("\r\n", " ")
        .replace('\n', " ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ' ')
        .collect()
}
