use super::client::{MirrorHttpClient, TransportConfig};
use super::mime::base64_data_uri;
use super::types::{ImagesResponse, SvgIoRequest};
use super::{sanitize_prompt, MirrorAdapter};
use crate::models::MirrorId;
use crate::Result;
use async_trait::async_trait;
use futures_util::future::join_all;

const GENERATE_PATH: &str = "/api/createimg/ai";

/// Each svg.io request yields few images, so the same prompt is sent this
/// many times concurrently.
pub const FAN_OUT: usize = 3;

/// svg.io mirror. Its host serves a certificate that does not verify, so
/// this adapter owns a client with verification turned off; no other
/// adapter shares it.
pub struct SvgIoMirror {
    http: MirrorHttpClient,
}

impl SvgIoMirror {
    pub fn new(base_url: String, transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            http: MirrorHttpClient::new(
                MirrorId::SvgIo,
                base_url,
                transport.accepting_invalid_certs(),
            )?,
        })
    }
}

#[async_trait]
impl MirrorAdapter for SvgIoMirror {
    fn id(&self) -> MirrorId {
        MirrorId::SvgIo
    }

    fn transport(&self) -> Option<TransportConfig> {
        Some(self.http.transport())
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        let sanitized = sanitize_prompt(prompt);
        let request = SvgIoRequest { prompt: &sanitized };

        tracing::debug!("Fanning out {} svg.io requests", FAN_OUT);
        let bodies = join_all((0..FAN_OUT).map(|_| self.http.post_text(GENERATE_PATH, &request)))
            .await
            .into_iter()
            .collect::<Result<Vec<String>>>()?;

        self.collect_images(&bodies)
    }
}

impl SvgIoMirror {
    /// Decode every body, keeping request order and each response's own
    /// image order. Any body that does not decode fails the whole batch.
    fn collect_images(&self, bodies: &[String]) -> Result<Vec<String>> {
        let mut images = Vec::new();
        for body in bodies {
            let response: ImagesResponse = self.http.decode(body)?;
            images.extend(response.images.iter().map(|image| base64_data_uri(image)));
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUg==";

    fn svg_b64(label: &str) -> String {
        STANDARD.encode(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><title>{}</title></svg>"#,
            label
        ))
    }

    fn images_body(images: &[String]) -> String {
        serde_json::json!({ "images": images }).to_string()
    }

    fn make_mirror(server: &MockServer) -> SvgIoMirror {
        SvgIoMirror::new(server.uri(), TransportConfig::default()).unwrap()
    }

    #[test]
    fn test_collect_images_keeps_request_then_response_order() {
        let mirror = SvgIoMirror::new("https://svg.test".to_string(), TransportConfig::default())
            .unwrap();
        let bodies = vec![
            images_body(&[svg_b64("a1"), svg_b64("a2")]),
            images_body(&[PNG_B64.to_string()]),
            images_body(&[svg_b64("c1")]),
        ];

        let images = mirror.collect_images(&bodies).unwrap();

        assert_eq!(
            images,
            vec![
                format!("data:image/svg+xml;base64,{}", svg_b64("a1")),
                format!("data:image/svg+xml;base64,{}", svg_b64("a2")),
                format!("data:image/png;base64,{}", PNG_B64),
                format!("data:image/svg+xml;base64,{}", svg_b64("c1")),
            ]
        );
    }

    #[test]
    fn test_collect_images_fails_on_any_bad_body() {
        let mirror = SvgIoMirror::new("https://svg.test".to_string(), TransportConfig::default())
            .unwrap();
        let bodies = vec![
            images_body(&[svg_b64("a1")]),
            "<html>busy</html>".to_string(),
            images_body(&[svg_b64("c1")]),
        ];

        let err = mirror.collect_images(&bodies).unwrap_err();
        assert!(matches!(
            err,
            Error::ResponseParseFailed {
                mirror: MirrorId::SvgIo,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_fans_out_and_concatenates_every_response() {
        let server = MockServer::start().await;
        let served = AtomicUsize::new(0);

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_json(serde_json::json!({ "prompt": "Hello world 1" })))
            .respond_with(move |_: &Request| {
                let n = served.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200).set_body_string(images_body(&[
                    svg_b64(&format!("r{}a", n)),
                    svg_b64(&format!("r{}b", n)),
                ]))
            })
            .expect(FAN_OUT as u64)
            .mount(&server)
            .await;

        let images = make_mirror(&server)
            .generate("Hello,\nworld! #1")
            .await
            .unwrap();

        // Responses may be served in any order, but each one's images stay
        // together and nothing is dropped or repeated.
        assert_eq!(images.len(), 2 * FAN_OUT);
        let mut served_pairs: Vec<(String, String)> = images
            .chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        served_pairs.sort();

        let mut expected: Vec<(String, String)> = (0..FAN_OUT)
            .map(|n| {
                (
                    format!("data:image/svg+xml;base64,{}", svg_b64(&format!("r{}a", n))),
                    format!("data:image/svg+xml;base64,{}", svg_b64(&format!("r{}b", n))),
                )
            })
            .collect();
        expected.sort();
        assert_eq!(served_pairs, expected);
    }

    #[tokio::test]
    async fn test_one_unparseable_response_fails_whole_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "images": [PNG_B64] })),
            )
            .mount(&server)
            .await;

        let err = make_mirror(&server).generate("a lamb").await.unwrap_err();
        assert!(matches!(
            err,
            Error::ResponseParseFailed {
                mirror: MirrorId::SvgIo,
                ..
            }
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), FAN_OUT);
    }

    #[tokio::test]
    async fn test_server_error_is_network_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = make_mirror(&server).generate("a lamb").await.unwrap_err();
        assert!(err.is_network());
    }
}
