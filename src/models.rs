//! Data models and structures
//!
//! Defines the mirror identifiers, the cached result type, and the runtime
//! configuration read from the environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Ordered list of image URIs (data URIs or https URLs). Empty is valid.
pub type ImageResult = Vec<String>;

/// Storage key the cache snapshot is written under.
pub const IMAGE_URLS_DATA_KEY: &str = "imageUrls";

/// Command name the generator registers on the host's command bus.
pub const GENERATE_IMAGES_COMMAND: &str = "verseImageGenerator.generateImages";

/// Selects which backing service handles a request.
///
/// Every integer maps to a mirror: anything other than 1 or 2 is the
/// default mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MirrorId {
    #[default]
    Pictures = 0,
    Craiyon = 1,
    SvgIo = 2,
}

impl MirrorId {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => MirrorId::Craiyon,
            2 => MirrorId::SvgIo,
            _ => MirrorId::Pictures,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MirrorId::Pictures => "chat-gpt.pictures",
            MirrorId::Craiyon => "craiyon",
            MirrorId::SvgIo => "svg.io",
        }
    }
}

impl From<Option<i64>> for MirrorId {
    fn from(raw: Option<i64>) -> Self {
        raw.map(MirrorId::from_raw).unwrap_or_default()
    }
}

impl fmt::Display for MirrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", *self as i64, self.name())
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub pictures_base_url: String,
    pub craiyon_base_url: String,
    pub craiyon_image_host: String,
    pub svgio_base_url: String,
    pub mirror_timeout: Option<Duration>,
    pub storage_dir: PathBuf,
    pub execution_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pictures_base_url: "https://chat-gpt.pictures".to_string(),
            craiyon_base_url: "https://api.craiyon.com".to_string(),
            craiyon_image_host: "https://img.craiyon.com".to_string(),
            svgio_base_url: "https://api.svg.io:10003".to_string(),
            mirror_timeout: None,
            storage_dir: PathBuf::from(".verse-image-generator"),
            execution_token: "verse-image-generator".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let mirror_timeout = match std::env::var("MIRROR_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout_secs(&raw)?),
            Err(_) => defaults.mirror_timeout,
        };

        Ok(Self {
            pictures_base_url: std::env::var("PICTURES_BASE_URL")
                .unwrap_or(defaults.pictures_base_url),
            craiyon_base_url: std::env::var("CRAIYON_BASE_URL")
                .unwrap_or(defaults.craiyon_base_url),
            craiyon_image_host: std::env::var("CRAIYON_IMAGE_HOST")
                .unwrap_or(defaults.craiyon_image_host),
            svgio_base_url: std::env::var("SVGIO_BASE_URL").unwrap_or(defaults.svgio_base_url),
            mirror_timeout,
            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            execution_token: std::env::var("EXECUTION_TOKEN")
                .unwrap_or(defaults.execution_token),
        })
    }
}

fn parse_timeout_secs(raw: &str) -> crate::Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| {
            crate::Error::Config(format!(
                "MIRROR_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                raw
            ))
        })
}
