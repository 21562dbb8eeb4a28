use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dictionary::{DICTIONARY, DictionaryAdapter};
use crate::enrich::Enricher;
use crate::error::Result;
use crate::models::{HealthResponse, ImageRequest, OcrResponse, ParsedSentence, ProcessingFailure};
use crate::ocr::{self, OCR, OcrAdapter};
use crate::tokenizer::{PARSER, TokenizerAdapter};

/// Stateless request handlers over the shared, lazily loaded collaborators.
pub struct Service {
    tokenizer: TokenizerAdapter,
    dictionary: DictionaryAdapter,
    ocr: OcrAdapter,
    concurrent_lookups: usize,
}

impl Service {
    pub fn new(
        tokenizer: TokenizerAdapter,
        dictionary: DictionaryAdapter,
        ocr: OcrAdapter,
        concurrent_lookups: usize,
    ) -> Self {
        Service {
            tokenizer,
            dictionary,
            ocr,
            concurrent_lookups,
        }
    }

    // Nothing is loaded here; each collaborator initializes on first use
    pub fn from_config(config: &Config) -> Self {
        Service::new(
            TokenizerAdapter::from_config(&config.tokenizer),
            DictionaryAdapter::from_config(&config.dictionary),
            OcrAdapter::from_config(&config.ocr),
            config.processing.concurrent_lookups,
        )
    }

    /// Tokenize then enrich, with typed errors.
    pub async fn analyze_text(&self, text: &str) -> Result<ParsedSentence> {
        if text.is_empty() {
            return Ok(ParsedSentence::empty());
        }

        let tokens = self.tokenizer.tokenize(text).await?;
        let tokens = Enricher::new(&self.dictionary, self.concurrent_lookups)
            .enrich(tokens)
            .await?;

        debug!("analyzed {:?} into {} tokens", text, tokens.len());
        Ok(ParsedSentence {
            original_text: text.to_string(),
            tokens,
        })
    }

    async fn read_image(&self, request: &ImageRequest) -> Result<String> {
        let image = ocr::decode_image_payload(&request.image_data)?;
        self.ocr.extract_text(&image).await
    }

    pub async fn process_text(&self, text: &str) -> std::result::Result<ParsedSentence, ProcessingFailure> {
        self.analyze_text(text)
            .await
            .map_err(|e| failure("Processing failed", e))
    }

    // OCR -> tokenize -> enrich
    pub async fn process_image(
        &self,
        request: &ImageRequest,
    ) -> std::result::Result<ParsedSentence, ProcessingFailure> {
        let pipeline = async {
            let text = self.read_image(request).await?;
            self.analyze_text(&text).await
        };
        pipeline.await.map_err(|e| failure("Processing failed", e))
    }

    pub async fn recognize(&self, request: &ImageRequest) -> std::result::Result<OcrResponse, ProcessingFailure> {
        self.read_image(request)
            .await
            .map(|text| OcrResponse { text })
            .map_err(|e| failure("OCR processing failed", e))
    }

    /// Availability of each collaborator; never loads anything.
    pub fn health(&self) -> HealthResponse {
        let services = BTreeMap::from([
            (OCR.to_string(), self.ocr.is_available()),
            (PARSER.to_string(), self.tokenizer.is_available()),
            (DICTIONARY.to_string(), self.dictionary.is_available()),
        ]);
        for (name, available) in &services {
            if !available {
                warn!("{} is not available", name);
            }
        }

        HealthResponse {
            status: "healthy".to_string(),
            services,
        }
    }

    pub async fn shutdown(&self) {
        self.dictionary.close().await;
        info!("service shut down");
    }
}

fn failure(context: &str, error: crate::error::YomiError) -> ProcessingFailure {
    warn!("{}: {}", context, error);
    ProcessingFailure {
        detail: format!("{}: {}", context, error),
    }
}
