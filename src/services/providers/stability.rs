use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::Form;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

use super::{
    non_empty_key, truncate_body, ImageProvider, ProviderError, ProviderKind, SynthesisRequest,
};

/// Aspect ratios accepted by the Stable Image endpoints.
const ASPECT_RATIOS: [(&str, f64); 9] = [
    ("1:1", 1.0),
    ("16:9", 16.0 / 9.0),
    ("9:16", 9.0 / 16.0),
    ("21:9", 21.0 / 9.0),
    ("9:21", 9.0 / 21.0),
    ("3:2", 3.0 / 2.0),
    ("2:3", 2.0 / 3.0),
    ("4:5", 4.0 / 5.0),
    ("5:4", 5.0 / 4.0),
];

/// Client for Stability AI's Stable Image generation API.
///
/// Requests are multipart forms; the image comes back inline, either as the
/// raw body or as base64 inside a JSON envelope.
pub struct StabilityProvider {
    http: Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct JsonImage {
    image: Option<String>,
    finish_reason: Option<String>,
}

impl StabilityProvider {
    pub fn new(api_base: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    /// `hd` maps to the Ultra model, everything else to Core.
    fn endpoint(&self, quality: &str) -> String {
        let model = if quality.trim().eq_ignore_ascii_case("hd") {
            "ultra"
        } else {
            "core"
        };
        format!("{}/v2beta/stable-image/generate/{model}", self.api_base)
    }

    fn aspect_ratio(width: u32, height: u32) -> &'static str {
        if width == 0 || height == 0 {
            return "1:1";
        }
        let ratio = width as f64 / height as f64;
        let mut best = ASPECT_RATIOS[0];
        for candidate in ASPECT_RATIOS {
            if (ratio - candidate.1).abs() < (ratio - best.1).abs() {
                best = candidate;
            }
        }
        best.0
    }

    fn malformed(message: impl Into<String>) -> ProviderError {
        ProviderError::MalformedPayload {
            provider: ProviderKind::Stability,
            message: message.into(),
        }
    }

    fn decode_json(payload: JsonImage) -> Result<Vec<u8>, ProviderError> {
        if let Some(reason) = payload.finish_reason.as_deref() {
            if reason.eq_ignore_ascii_case("CONTENT_FILTERED") {
                return Err(Self::malformed("image was content filtered"));
            }
        }
        let encoded = payload
            .image
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Self::malformed("JSON response missing image bytes"))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Self::malformed(format!("image base64 decode failed: {e}")))
    }
}

#[async_trait]
impl ImageProvider for StabilityProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stability
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ProviderError> {
        let api_key = non_empty_key(&self.api_key)
            .ok_or(ProviderError::MissingCredential("STABILITY_API_KEY"))?;

        let endpoint = self.endpoint(&request.quality);
        let form = Form::new()
            .text("prompt", request.prompt.clone())
            .text(
                "aspect_ratio",
                Self::aspect_ratio(request.width, request.height),
            )
            .text("output_format", "png");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .header(header::ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                context: format!("Stability request failed ({endpoint})"),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: ProviderKind::Stability,
                status: status.as_u16(),
                body: truncate_body(&body, 512),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.starts_with("image/") {
            let bytes = response
                .bytes()
                .await
                .map_err(|source| ProviderError::Network {
                    context: "failed reading Stability image bytes".to_string(),
                    source,
                })?;
            Ok(bytes.to_vec())
        } else {
            let payload: JsonImage = response
                .json()
                .await
                .map_err(|e| Self::malformed(e.to_string()))?;
            Self::decode_json(payload)
        }
    }
}
