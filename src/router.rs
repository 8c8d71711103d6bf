//! Mirror selection.

use crate::mirror::{
    CraiyonMirror, MirrorAdapter, PicturesMirror, SvgIoMirror, TransportConfig,
};
use crate::models::{Config, MirrorId};
use crate::Result;
use tracing::debug;

/// Dispatches a prompt to one of the three mirrors. Pure dispatch: errors
/// propagate untouched and nothing is cached here.
pub struct MirrorRouter {
    pictures: Box<dyn MirrorAdapter>,
    craiyon: Box<dyn MirrorAdapter>,
    svgio: Box<dyn MirrorAdapter>,
}

impl MirrorRouter {
    pub fn new(
        pictures: Box<dyn MirrorAdapter>,
        craiyon: Box<dyn MirrorAdapter>,
        svgio: Box<dyn MirrorAdapter>,
    ) -> Self {
        Self {
            pictures,
            craiyon,
            svgio,
        }
    }

    /// Build the real HTTP adapters from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = TransportConfig::default().with_timeout(config.mirror_timeout);

        Ok(Self::new(
            Box::new(PicturesMirror::new(
                config.pictures_base_url.clone(),
                transport,
            )?),
            Box::new(CraiyonMirror::new(
                config.craiyon_base_url.clone(),
                config.craiyon_image_host.clone(),
                transport,
            )?),
            Box::new(SvgIoMirror::new(config.svgio_base_url.clone(), transport)?),
        ))
    }

    pub fn adapter(&self, mirror: MirrorId) -> &dyn MirrorAdapter {
        match mirror {
            MirrorId::Pictures => self.pictures.as_ref(),
            MirrorId::Craiyon => self.craiyon.as_ref(),
            MirrorId::SvgIo => self.svgio.as_ref(),
        }
    }

    pub async fn route(&self, mirror: i64, prompt: &str) -> Result<Vec<String>> {
        let adapter = self.adapter(MirrorId::from_raw(mirror));
        debug!("Routing mirror {} to adapter {}", mirror, adapter.id());
        adapter.generate(prompt).await
    }
}
