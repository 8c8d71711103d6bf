//! Prompt-to-image generation through interchangeable third-party mirrors
//!
//! A prompt is sent to one of several image-generation services, and the
//! resulting image URIs are cached per prompt and persisted so repeated
//! requests are free across restarts.

pub mod cache;
pub mod error;
pub mod generator;
pub mod host;
pub mod mirror;
pub mod models;
pub mod router;
pub mod storage;

pub use error::{Error, Result};
