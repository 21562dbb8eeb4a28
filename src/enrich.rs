use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::dictionary::DictionaryAdapter;
use crate::error::Result;
use crate::models::Token;
use crate::pos;

pub const MAX_ENTRIES_PER_TOKEN: usize = 3;

/// Attaches dictionary senses to tokens.
pub struct Enricher<'a> {
    dictionary: &'a DictionaryAdapter,
    concurrency: usize,
}

impl<'a> Enricher<'a> {
    pub fn new(dictionary: &'a DictionaryAdapter, concurrency: usize) -> Self {
        Enricher {
            dictionary,
            concurrency: concurrency.max(1),
        }
    }

    // Tokens are independent, so lookups run `concurrency` at a time; `buffered` keeps input order
    pub async fn enrich(&self, tokens: Vec<Token>) -> Result<Vec<Token>> {
        let total = tokens.len();
        let enriched: Result<Vec<Token>> = stream::iter(tokens)
            .map(|token| self.enrich_token(token))
            .buffered(self.concurrency)
            .collect::<Vec<Result<Token>>>()
            .await
            .into_iter()
            .collect();

        debug!("enriched {} tokens", total);
        enriched
    }

    async fn enrich_token(&self, mut token: Token) -> Result<Token> {
        if pos::is_grammar_word(&token.pos) {
            token.sense_entries = Vec::new();
            return Ok(token);
        }

        // always the dictionary form: 食べ is looked up as 食べる
        let mut entries = self.dictionary.lookup(&token.base_form, None).await?;
        entries.truncate(MAX_ENTRIES_PER_TOKEN);
        token.sense_entries = entries;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{LexicalDatabase, RawEntry, RawGloss, RawSense};
    use crate::error::YomiError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // Answers every query with `per_query` entries and records what was asked
    struct RecordingDatabase {
        per_query: usize,
        queries: Mutex<Vec<String>>,
    }

    impl RecordingDatabase {
        fn new(per_query: usize) -> Arc<Self> {
            Arc::new(RecordingDatabase {
                per_query,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LexicalDatabase for RecordingDatabase {
        async fn find_entries(&self, query: &str) -> Result<Vec<RawEntry>> {
            self.queries.lock().unwrap().push(query.to_string());
            // later characters answer sooner, so completion order differs from input order
            let delay = 20u64.saturating_sub(query.chars().count() as u64 * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            Ok((0..self.per_query)
                .map(|i| RawEntry {
                    kanji_forms: vec![query.to_string()],
                    kana_forms: vec![format!("よみ{}", i)],
                    senses: vec![RawSense {
                        glosses: vec![RawGloss {
                            text: format!("{} sense {}", query, i),
                            lang: None,
                        }],
                        pos: vec!["noun".to_string()],
                    }],
                })
                .collect())
        }
    }

    struct BrokenDatabase;

    #[async_trait]
    impl LexicalDatabase for BrokenDatabase {
        async fn find_entries(&self, _query: &str) -> Result<Vec<RawEntry>> {
            Err(YomiError::unavailable("dictionary", "disk went away"))
        }
    }

    fn token(surface: &str, base_form: &str, pos: &str) -> Token {
        Token {
            surface: surface.to_string(),
            base_form: base_form.to_string(),
            reading: String::new(),
            pos: pos.to_string(),
            pos_display: pos::to_display_label(pos).to_string(),
            sense_entries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn looks_up_base_form_not_surface() {
        let db = RecordingDatabase::new(1);
        let adapter = DictionaryAdapter::with_database(db.clone());
        let tokens = Enricher::new(&adapter, 1)
            .enrich(vec![token("食べ", "食べる", "動詞")])
            .await
            .unwrap();

        assert_eq!(db.queries(), vec!["食べる"]);
        assert_eq!(tokens[0].sense_entries[0].headword, "食べる");
    }

    #[tokio::test]
    async fn grammar_words_are_never_looked_up() {
        let db = RecordingDatabase::new(2);
        let adapter = DictionaryAdapter::with_database(db.clone());
        let tokens = Enricher::new(&adapter, 4)
            .enrich(vec![
                token("猫", "猫", "名詞"),
                token("が", "が", "助詞"),
                token("。", "。", "補助記号"),
                token("★", "★", "記号"),
                token(" ", " ", "空白"),
            ])
            .await
            .unwrap();

        assert_eq!(db.queries(), vec!["猫"]);
        assert_eq!(tokens[0].sense_entries.len(), 2);
        assert!(tokens[1..].iter().all(|t| t.sense_entries.is_empty()));
    }

    #[tokio::test]
    async fn caps_entries_per_token() {
        let adapter = DictionaryAdapter::with_database(RecordingDatabase::new(7));
        let tokens = Enricher::new(&adapter, 1)
            .enrich(vec![token("上", "上", "名詞")])
            .await
            .unwrap();

        let readings: Vec<&str> = tokens[0].sense_entries.iter().map(|e| e.reading.as_str()).collect();
        assert_eq!(readings, vec!["よみ0", "よみ1", "よみ2"]);
    }

    #[tokio::test]
    async fn concurrent_lookups_keep_token_order() {
        let adapter = DictionaryAdapter::with_database(RecordingDatabase::new(1));
        let input = vec![
            token("あ", "あ", "感動詞"),
            token("いい", "いい", "形容詞"),
            token("うみだ", "うみだ", "名詞"),
            token("えいがかん", "えいがかん", "名詞"),
        ];
        let sequential = Enricher::new(&adapter, 1).enrich(input.clone()).await.unwrap();
        let concurrent = Enricher::new(&adapter, 4).enrich(input).await.unwrap();

        assert_eq!(sequential, concurrent);
        let surfaces: Vec<&str> = concurrent.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["あ", "いい", "うみだ", "えいがかん"]);
        assert_eq!(concurrent[2].sense_entries[0].glosses, vec!["うみだ sense 0"]);
    }

    #[tokio::test]
    async fn lookup_failure_is_propagated() {
        let adapter = DictionaryAdapter::with_database(Arc::new(BrokenDatabase));
        let err = Enricher::new(&adapter, 2)
            .enrich(vec![token("が", "が", "助詞"), token("猫", "猫", "名詞")])
            .await
            .unwrap_err();
        assert!(matches!(err, YomiError::DependencyUnavailable { .. }));
    }

    #[tokio::test]
    async fn no_tokens_no_lookups() {
        let db = RecordingDatabase::new(1);
        let adapter = DictionaryAdapter::with_database(db.clone());
        assert!(Enricher::new(&adapter, 0).enrich(Vec::new()).await.unwrap().is_empty());
        assert!(db.queries().is_empty());
    }
}
