//! Data URIs for svg.io payloads.
//!
//! svg.io answers with bare base64 strings. The upstream service labelled
//! every one `image/png`; we look at the decoded head and label vector and
//! raster payloads by what they are, keeping `image/png` when unsure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Base64 characters decoded for sniffing. 24 characters give 18 bytes,
/// room for a short XML prolog or leading whitespace before `<svg`.
const HEAD_CHARS: usize = 24;

const FALLBACK_MIME: &str = "image/png";

const MAGIC: &[(&[u8], &str)] = &[
    (b"\x89PNG", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF8", "image/gif"),
];

const MARKUP: &[&[u8]] = &[b"<svg", b"<?xml", b"<!DOCTYPE svg"];

fn sniff_mime(head: &[u8]) -> &'static str {
    if let Some(&(_, mime)) = MAGIC.iter().find(|(magic, _)| head.starts_with(magic)) {
        return mime;
    }
    if head.starts_with(b"RIFF") && head.get(8..12) == Some(b"WEBP".as_slice()) {
        return "image/webp";
    }

    let text = head
        .strip_prefix(b"\xEF\xBB\xBF".as_slice())
        .unwrap_or(head);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    if MARKUP.iter().any(|tag| text[start..].starts_with(tag)) {
        return "image/svg+xml";
    }

    FALLBACK_MIME
}

/// Wrap a base64 image payload as a data URI. The payload is passed through
/// untouched; only its head is decoded to pick the mime type.
pub fn base64_data_uri(payload: &str) -> String {
    let take = payload.len().min(HEAD_CHARS) / 4 * 4;
    let head = payload
        .get(..take)
        .and_then(|prefix| STANDARD.decode(prefix).ok())
        .unwrap_or_default();

    let mime = sniff_mime(&head);
    if mime == FALLBACK_MIME && !head.starts_with(b"\x89PNG") {
        tracing::debug!("Could not identify svg.io payload, labelling it {}", mime);
    }

    format!("data:{};base64,{}", mime, payload)
}
