use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    non_empty_key, truncate_body, ImageProvider, ProviderError, ProviderKind, SynthesisRequest,
};

const MODEL: &str = "dall-e-3";

/// Client for the OpenAI image generation endpoint.
///
/// The generation call returns a short-lived URL which is then downloaded.
pub struct DalleProvider {
    http: Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize, PartialEq)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: String,
    quality: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
    b64_json: Option<String>,
}

impl DalleProvider {
    pub fn new(api_base: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/images/generations", self.api_base)
    }

    /// DALL-E 3 only knows `standard` and `hd`.
    fn normalize_quality(quality: &str) -> &'static str {
        if quality.trim().eq_ignore_ascii_case("hd") {
            "hd"
        } else {
            "standard"
        }
    }

    fn build_request(request: &SynthesisRequest) -> GenerationRequest<'_> {
        GenerationRequest {
            model: MODEL,
            prompt: &request.prompt,
            n: 1,
            size: format!("{}x{}", request.width, request.height),
            quality: Self::normalize_quality(&request.quality),
            response_format: "url",
        }
    }

    fn malformed(message: impl Into<String>) -> ProviderError {
        ProviderError::MalformedPayload {
            provider: ProviderKind::Dalle,
            message: message.into(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                context: "DALL-E image download failed".to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: ProviderKind::Dalle,
                status: status.as_u16(),
                body: truncate_body(&body, 512),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ProviderError::Network {
                context: "DALL-E image download failed".to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageProvider for DalleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dalle
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ProviderError> {
        let api_key =
            non_empty_key(&self.api_key).ok_or(ProviderError::MissingCredential("OPENAI_API_KEY"))?;

        let endpoint = self.endpoint();
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                context: format!("DALL-E request failed ({endpoint})"),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: ProviderKind::Dalle,
                status: status.as_u16(),
                body: truncate_body(&body, 512),
            });
        }

        let payload: GenerationResponse = response
            .json()
            .await
            .map_err(|e| Self::malformed(e.to_string()))?;
        let image = payload
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Self::malformed("response contained no images"))?;

        match (image.url, image.b64_json) {
            (Some(url), _) if !url.trim().is_empty() => self.download(url.trim()).await,
            (_, Some(b64)) => base64::engine::general_purpose::STANDARD
                .decode(b64.trim())
                .map_err(|e| Self::malformed(format!("image base64 decode failed: {e}"))),
            _ => Err(Self::malformed("image entry has neither url nor b64_json")),
        }
    }
}
