use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

// config.toml layout; every section may be omitted
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub tokenizer: TokenizerConfig,
    pub dictionary: DictionaryConfig,
    pub ocr: OcrConfig,
    pub processing: ProcessingConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TokenizerConfig {
    /// vibrato-rkyv system dictionary. A `.zst` file is decompressed and cached on first load.
    pub dictionary_path: String,
    /// Position of the lemma in the comma-separated feature string (UniDic: 7).
    pub lemma_field: usize,
    /// Position of the kana reading in the feature string (UniDic-cwj: 20, IPADIC: 7).
    pub reading_field: usize,
    pub ignore_space: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            dictionary_path: "unidic-cwj/system.dic".to_string(),
            lemma_field: 7,
            reading_field: 20,
            ignore_space: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DictionaryConfig {
    pub db_file: String,
    pub max_connections: u32,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        DictionaryConfig {
            db_file: "jamdict.db".to_string(),
            max_connections: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    pub endpoint: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            endpoint: None,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProcessingConfig {
    /// How many tokens of one sentence are looked up at the same time.
    pub concurrent_lookups: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig { concurrent_lookups: 4 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub text_file: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            text_file: "input.txt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub vocabulary_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            vocabulary_file: "vocabulary.csv".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Config> {
        Config::from_path("config.toml")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config file {}: {}", path.display(), e))?;
        Config::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("invalid config file: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.tokenizer.lemma_field, 7);
        assert_eq!(config.tokenizer.reading_field, 20);
        assert_eq!(config.dictionary.db_file, "jamdict.db");
        assert_eq!(config.processing.concurrent_lookups, 4);
        assert!(config.ocr.endpoint.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml_str(
            r#"
            [tokenizer]
            dictionary_path = "ipadic/system.dic.zst"
            lemma_field = 6
            reading_field = 7

            [ocr]
            endpoint = "http://127.0.0.1:5001/ocr"
            "#,
        )
        .unwrap();
        assert_eq!(config.tokenizer.dictionary_path, "ipadic/system.dic.zst");
        assert_eq!(config.tokenizer.reading_field, 7);
        assert_eq!(config.tokenizer.lemma_field, 6);
        assert!(!config.tokenizer.ignore_space);
        assert_eq!(config.ocr.endpoint.as_deref(), Some("http://127.0.0.1:5001/ocr"));
        assert_eq!(config.ocr.request_timeout_seconds, 30);
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = Config::from_path("/nonexistent/yomigo.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/yomigo.toml"));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(Config::from_toml_str("[processing]\nconcurrent_lookups = \"many\"").is_err());
    }
}
