//! Request/response payloads for each mirror.
//!
//! Response structs double as the validating schema: a body that does not
//! match is rejected rather than read field-by-field.

use serde::{Deserialize, Serialize};

/// Request body for chat-gpt.pictures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PicturesRequest<'a> {
    pub caption_input: &'a str,
    pub caption_model: &'a str,
}

/// chat-gpt.pictures response: image URLs under `imgs`.
#[derive(Debug, Deserialize)]
pub struct PicturesResponse {
    pub imgs: Vec<String>,
}

/// Request body for craiyon's v3 endpoint.
#[derive(Debug, Serialize)]
pub struct CraiyonRequest<'a> {
    pub prompt: &'a str,
    pub version: &'a str,
    pub token: Option<String>,
    pub model: &'a str,
    pub negative_prompt: &'a str,
}

/// Craiyon and svg.io share this shape: a list of image identifiers.
#[derive(Debug, Deserialize)]
pub struct ImagesResponse {
    pub images: Vec<String>,
}

/// Request body for svg.io.
#[derive(Debug, Serialize)]
pub struct SvgIoRequest<'a> {
    pub prompt: &'a str,
}
