use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// One lexical sense group for a word
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    #[serde(rename = "word")]
    pub headword: String,
    pub reading: String,
    #[serde(rename = "meanings")]
    pub glosses: Vec<String>,
    #[serde(rename = "part_of_speech")]
    pub pos_tags: Vec<String>,
}

// One morphological unit of the sentence
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub base_form: String,
    pub reading: String,
    pub pos: String,
    #[serde(rename = "pos_english")]
    pub pos_display: String,
    #[serde(rename = "dictionary_entries", default)]
    pub sense_entries: Vec<DictionaryEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ParsedSentence {
    pub original_text: String,
    pub tokens: Vec<Token>,
}

impl ParsedSentence {
    pub fn empty() -> Self {
        ParsedSentence::default()
    }

    /// Concatenation of every token surface, in order.
    pub fn reconstructed_text(&self) -> String {
        self.tokens.iter().map(|t| t.surface.as_str()).collect()
    }
}

// Image payload sent by the browser extension
#[derive(Debug, Deserialize, Clone)]
pub struct ImageRequest {
    /// Base64 image, optionally prefixed with a `data:image/...;base64,` header.
    pub image_data: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OcrResponse {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub services: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProcessingFailure {
    pub detail: String,
}

impl std::fmt::Display for ProcessingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for ProcessingFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentence_serializes_to_empty_shape() {
        let json = serde_json::to_value(ParsedSentence::empty()).unwrap();
        assert_eq!(json, serde_json::json!({ "original_text": "", "tokens": [] }));
    }

    #[test]
    fn token_uses_extension_field_names() {
        let token = Token {
            surface: "食べ".to_string(),
            base_form: "食べる".to_string(),
            reading: "たべ".to_string(),
            pos: "動詞".to_string(),
            pos_display: "Verb".to_string(),
            sense_entries: vec![DictionaryEntry {
                headword: "食べる".to_string(),
                reading: "たべる".to_string(),
                glosses: vec!["to eat".to_string()],
                pos_tags: vec!["Ichidan verb".to_string()],
            }],
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["pos_english"], "Verb");
        assert_eq!(json["dictionary_entries"][0]["word"], "食べる");
        assert_eq!(json["dictionary_entries"][0]["meanings"][0], "to eat");
        assert_eq!(json["dictionary_entries"][0]["part_of_speech"][0], "Ichidan verb");
    }

    #[test]
    fn image_request_deserializes() {
        let req: ImageRequest =
            serde_json::from_str(r#"{"image_data": "data:image/png;base64,AAAA"}"#).unwrap();
        assert_eq!(req.image_data, "data:image/png;base64,AAAA");
    }
}
