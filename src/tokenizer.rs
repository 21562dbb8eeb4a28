use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};
use vibrato_rkyv::{CacheStrategy, Dictionary, LoadMode, Tokenizer};

use crate::config::TokenizerConfig;
use crate::error::{Result, YomiError};
use crate::kana;
use crate::models::Token;
use crate::pos;

pub const PARSER: &str = "parser";

const POS_DEPTH: usize = 4;

/// One unit of analyzer output, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisUnit {
    pub surface: String,
    pub lemma: Option<String>,
    pub reading: Option<String>,
    /// Comma separated, coarsest category first (`動詞,一般,*,*`).
    pub pos_tag: Option<String>,
}

/// What the tokenizer needs from a morphological analyzer.
pub trait MorphologicalAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<Vec<AnalysisUnit>>;
}

// vibrato-rkyv backed analyzer; the tokenizer is shared, workers are per call
pub struct VibratoAnalyzer {
    tokenizer: Tokenizer,
    lemma_field: usize,
    reading_field: usize,
}

impl VibratoAnalyzer {
    pub fn load(config: &TokenizerConfig) -> Result<Self> {
        let path = Path::new(&config.dictionary_path);
        if !path.is_file() {
            return Err(YomiError::unavailable(
                PARSER,
                format!("dictionary file {} not found", path.display()),
            ));
        }

        let dict = if path.extension().is_some_and(|ext| ext == "zst") {
            Dictionary::from_zstd(path, CacheStrategy::Local)
        } else {
            Dictionary::from_path(path, LoadMode::Validate)
        }
        .map_err(|e| YomiError::unavailable(PARSER, e))?;

        let tokenizer = Tokenizer::new(dict)
            .ignore_space(config.ignore_space)
            .map_err(|e| YomiError::unavailable(PARSER, e))?;

        Ok(VibratoAnalyzer {
            tokenizer,
            lemma_field: config.lemma_field,
            reading_field: config.reading_field,
        })
    }
}

impl MorphologicalAnalyzer for VibratoAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<AnalysisUnit>> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize();

        Ok(worker
            .token_iter()
            .map(|t| unit_from_feature(t.surface(), t.feature(), self.lemma_field, self.reading_field))
            .collect())
    }
}

// Splits a MeCab-style feature string into the fields the adapter uses
pub fn unit_from_feature(
    surface: &str,
    feature: &str,
    lemma_field: usize,
    reading_field: usize,
) -> AnalysisUnit {
    let fields: Vec<&str> = feature.split(',').collect();
    let field = |i: usize| {
        fields
            .get(i)
            .filter(|f| !f.is_empty() && **f != "*")
            .map(|f| f.to_string())
    };

    let pos_tag = if feature.is_empty() {
        None
    } else {
        Some(fields.iter().take(POS_DEPTH).copied().collect::<Vec<_>>().join(","))
    };

    AnalysisUnit {
        surface: surface.to_string(),
        lemma: field(lemma_field),
        reading: field(reading_field),
        pos_tag,
    }
}

enum AnalyzerSource {
    Vibrato(TokenizerConfig),
    Provided,
}

/// Tokenizer adapter: lazily loads the analyzer once and normalizes its output.
pub struct TokenizerAdapter {
    source: AnalyzerSource,
    analyzer: OnceCell<Arc<dyn MorphologicalAnalyzer>>,
}

impl TokenizerAdapter {
    pub fn from_config(config: &TokenizerConfig) -> Self {
        TokenizerAdapter {
            source: AnalyzerSource::Vibrato(config.clone()),
            analyzer: OnceCell::new(),
        }
    }

    pub fn with_analyzer(analyzer: Arc<dyn MorphologicalAnalyzer>) -> Self {
        TokenizerAdapter {
            source: AnalyzerSource::Provided,
            analyzer: OnceCell::new_with(Some(analyzer)),
        }
    }

    async fn analyzer(&self) -> Result<&Arc<dyn MorphologicalAnalyzer>> {
        self.analyzer
            .get_or_try_init(|| async {
                match &self.source {
                    AnalyzerSource::Vibrato(config) => {
                        let config = config.clone();
                        info!("loading tokenizer dictionary {}", config.dictionary_path);
                        let analyzer = tokio::task::spawn_blocking(move || VibratoAnalyzer::load(&config))
                            .await
                            .map_err(|e| YomiError::unavailable(PARSER, e))??;
                        info!("tokenizer ready");
                        Ok::<_, YomiError>(Arc::new(analyzer) as Arc<dyn MorphologicalAnalyzer>)
                    }
                    AnalyzerSource::Provided => {
                        Err(YomiError::unavailable(PARSER, "no analyzer was provided"))
                    }
                }
            })
            .await
    }

    pub async fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let units = self.analyzer().await?.analyze(text)?;
        let tokens = align_units(text, units)?;
        debug!("tokenized {} chars into {} tokens", text.chars().count(), tokens.len());
        Ok(tokens)
    }

    /// Cheap check that never loads the dictionary.
    pub fn is_available(&self) -> bool {
        if self.analyzer.initialized() {
            return true;
        }
        match &self.source {
            AnalyzerSource::Vibrato(config) => Path::new(&config.dictionary_path).is_file(),
            AnalyzerSource::Provided => false,
        }
    }
}

// Walks the input alongside the units so the surfaces always rebuild the text.
// Stretches the analyzer skipped become gap tokens.
fn align_units(text: &str, units: Vec<AnalysisUnit>) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(units.len());
    let mut cursor = 0;

    for unit in units {
        if unit.surface.is_empty() {
            continue;
        }

        let rest = &text[cursor..];
        let offset = rest.find(unit.surface.as_str()).ok_or_else(|| {
            YomiError::Analyzer(format!(
                "surface {:?} does not occur after byte {}",
                unit.surface, cursor
            ))
        })?;

        if offset > 0 {
            tokens.push(gap_token(&rest[..offset]));
        }
        cursor += offset + unit.surface.len();
        tokens.push(token_from_unit(unit));
    }

    if cursor < text.len() {
        tokens.push(gap_token(&text[cursor..]));
    }

    Ok(tokens)
}

fn token_from_unit(unit: AnalysisUnit) -> Token {
    let tag = unit
        .pos_tag
        .as_deref()
        .and_then(|tag| tag.split(',').next())
        .filter(|p| !p.is_empty())
        .unwrap_or(pos::UNKNOWN_POS)
        .to_string();
    let base_form = match unit.lemma {
        Some(lemma) if !lemma.is_empty() => lemma,
        _ => unit.surface.clone(),
    };
    let reading = unit.reading.map(|r| kana::to_hiragana(&r)).unwrap_or_default();

    Token {
        pos_display: pos::to_display_label(&tag).to_string(),
        surface: unit.surface,
        base_form,
        reading,
        pos: tag,
        sense_entries: Vec::new(),
    }
}

fn gap_token(surface: &str) -> Token {
    let tag = if surface.chars().all(char::is_whitespace) {
        pos::WHITESPACE
    } else {
        pos::UNKNOWN_POS
    };

    Token {
        surface: surface.to_string(),
        base_form: surface.to_string(),
        reading: String::new(),
        pos: tag.to_string(),
        pos_display: pos::to_display_label(tag).to_string(),
        sense_entries: Vec::new(),
    }
}
