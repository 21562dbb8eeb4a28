use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, ClientBuilder, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::OcrConfig;
use crate::error::{Result, YomiError};

pub const OCR: &str = "ocr";

/// What the pipeline needs from an OCR engine.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<String>;
}

// Request/response of a manga-ocr HTTP service
#[derive(Debug, Serialize)]
struct RecognizeRequest {
    image_data: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: String,
}

pub struct HttpRecognizer {
    client: Client,
    endpoint: Url,
}

impl HttpRecognizer {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| YomiError::unavailable(OCR, format!("invalid endpoint {}: {}", endpoint, e)))?;
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| YomiError::unavailable(OCR, e))?;

        Ok(HttpRecognizer { client, endpoint })
    }
}

#[async_trait]
impl TextRecognizer for HttpRecognizer {
    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        let request = RecognizeRequest {
            image_data: STANDARD.encode(image),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| YomiError::unavailable(OCR, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(YomiError::unavailable(
                OCR,
                format!("service answered {}: {}", status, body),
            ));
        }

        let recognized: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| YomiError::unavailable(OCR, format!("unreadable response: {}", e)))?;

        Ok(recognized.text.trim().to_string())
    }
}

/// Decodes the base64 image sent by the extension, with or without a data URL header.
pub fn decode_image_payload(image_data: &str) -> Result<Vec<u8>> {
    let payload = match image_data.split_once(',') {
        Some((_, data)) => data,
        None => image_data,
    }
    .trim();

    if payload.is_empty() {
        return Err(YomiError::MalformedInput("image payload is empty".to_string()));
    }

    STANDARD
        .decode(payload)
        .map_err(|e| YomiError::MalformedInput(format!("invalid base64 image: {}", e)))
}

enum RecognizerSource {
    Http(OcrConfig),
    Provided,
}

pub struct OcrAdapter {
    source: RecognizerSource,
    recognizer: OnceCell<Arc<dyn TextRecognizer>>,
}

impl OcrAdapter {
    pub fn from_config(config: &OcrConfig) -> Self {
        OcrAdapter {
            source: RecognizerSource::Http(config.clone()),
            recognizer: OnceCell::new(),
        }
    }

    pub fn with_recognizer(recognizer: Arc<dyn TextRecognizer>) -> Self {
        OcrAdapter {
            source: RecognizerSource::Provided,
            recognizer: OnceCell::new_with(Some(recognizer)),
        }
    }

    async fn recognizer(&self) -> Result<&Arc<dyn TextRecognizer>> {
        self.recognizer
            .get_or_try_init(|| async {
                match &self.source {
                    RecognizerSource::Http(config) => {
                        let endpoint = config
                            .endpoint
                            .as_deref()
                            .ok_or_else(|| YomiError::unavailable(OCR, "no OCR endpoint configured"))?;
                        let recognizer = HttpRecognizer::new(endpoint, config.request_timeout_seconds)?;
                        info!("OCR service at {}", endpoint);
                        Ok::<_, YomiError>(Arc::new(recognizer) as Arc<dyn TextRecognizer>)
                    }
                    RecognizerSource::Provided => {
                        Err(YomiError::unavailable(OCR, "no recognizer was provided"))
                    }
                }
            })
            .await
    }

    pub async fn extract_text(&self, image: &[u8]) -> Result<String> {
        let text = self.recognizer().await?.extract_text(image).await?;
        debug!("recognized {} chars from {} byte image", text.chars().count(), image.len());
        Ok(text)
    }

    pub fn is_available(&self) -> bool {
        if self.recognizer.initialized() {
            return true;
        }
        match &self.source {
            RecognizerSource::Http(config) => config
                .endpoint
                .as_deref()
                .is_some_and(|endpoint| Url::parse(endpoint).is_ok()),
            RecognizerSource::Provided => false,
        }
    }
}
