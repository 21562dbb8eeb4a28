use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::DictionaryConfig;
use crate::error::{Result, YomiError};
use crate::kana;
use crate::models::DictionaryEntry;

pub const DICTIONARY: &str = "dictionary";

pub const MAX_GLOSSES: usize = 5;
pub const MAX_POS_TAGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawGloss {
    pub text: String,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSense {
    pub glosses: Vec<RawGloss>,
    pub pos: Vec<String>,
}

/// An entry as the lexical database stores it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub kanji_forms: Vec<String>,
    pub kana_forms: Vec<String>,
    pub senses: Vec<RawSense>,
}

/// What the lookup adapter needs from a lexical database.
#[async_trait]
pub trait LexicalDatabase: Send + Sync {
    /// Entries whose kanji or kana form equals `query`, in database order.
    async fn find_entries(&self, query: &str) -> Result<Vec<RawEntry>>;

    async fn close(&self) {}
}

// JMdict stored in the SQLite layout written by jamdict
pub struct JamdictDatabase {
    pool: SqlitePool,
}

impl JamdictDatabase {
    pub async fn open(config: &DictionaryConfig) -> Result<Self> {
        let db_path = Path::new(&config.db_file);
        if !db_path.is_file() {
            return Err(YomiError::unavailable(
                DICTIONARY,
                format!("database file {} not found", db_path.display()),
            ));
        }

        info!("opening JMdict database {}", db_path.display());
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| YomiError::unavailable(DICTIONARY, e))?;

        Ok(JamdictDatabase { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        JamdictDatabase { pool }
    }

    /// Creates the jamdict tables this crate reads, for building small dictionaries.
    pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        for statement in [
            "CREATE TABLE IF NOT EXISTS Entry (idseq INTEGER NOT NULL PRIMARY KEY)",
            "CREATE TABLE IF NOT EXISTS Kanji (ID INTEGER PRIMARY KEY AUTOINCREMENT, idseq INTEGER, text TEXT)",
            "CREATE TABLE IF NOT EXISTS Kana (ID INTEGER PRIMARY KEY AUTOINCREMENT, idseq INTEGER, text TEXT, nokanji BOOLEAN)",
            "CREATE TABLE IF NOT EXISTS Sense (ID INTEGER PRIMARY KEY AUTOINCREMENT, idseq INTEGER)",
            "CREATE TABLE IF NOT EXISTS pos (sid INTEGER, text TEXT)",
            "CREATE TABLE IF NOT EXISTS SenseGloss (sid INTEGER, lang TEXT, gend TEXT, text TEXT)",
        ] {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| YomiError::unavailable(DICTIONARY, e))?;
        }
        Ok(())
    }

    pub async fn insert_entry(pool: &SqlitePool, idseq: i64, entry: &RawEntry) -> Result<()> {
        let db_err = |e: sqlx::Error| YomiError::unavailable(DICTIONARY, e);
        let mut tx = pool.begin().await.map_err(db_err)?;

        sqlx::query("INSERT INTO Entry (idseq) VALUES (?)")
            .bind(idseq)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for kanji in &entry.kanji_forms {
            sqlx::query("INSERT INTO Kanji (idseq, text) VALUES (?, ?)")
                .bind(idseq)
                .bind(kanji)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        for kana in &entry.kana_forms {
            sqlx::query("INSERT INTO Kana (idseq, text, nokanji) VALUES (?, ?, 0)")
                .bind(idseq)
                .bind(kana)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        for sense in &entry.senses {
            let sid = sqlx::query("INSERT INTO Sense (idseq) VALUES (?)")
                .bind(idseq)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .last_insert_rowid();

            for gloss in &sense.glosses {
                sqlx::query("INSERT INTO SenseGloss (sid, lang, text) VALUES (?, ?, ?)")
                    .bind(sid)
                    .bind(gloss.lang.as_deref())
                    .bind(&gloss.text)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }

            for pos in &sense.pos {
                sqlx::query("INSERT INTO pos (sid, text) VALUES (?, ?)")
                    .bind(sid)
                    .bind(pos)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn load_entry(&self, idseq: i64) -> std::result::Result<RawEntry, sqlx::Error> {
        let kanji_forms = sqlx::query_scalar::<_, String>(
            "SELECT text FROM Kanji WHERE idseq = ? ORDER BY ID",
        )
        .bind(idseq)
        .fetch_all(&self.pool)
        .await?;

        let kana_forms = sqlx::query_scalar::<_, String>(
            "SELECT text FROM Kana WHERE idseq = ? ORDER BY ID",
        )
        .bind(idseq)
        .fetch_all(&self.pool)
        .await?;

        let sense_ids = sqlx::query_scalar::<_, i64>(
            "SELECT ID FROM Sense WHERE idseq = ? ORDER BY ID",
        )
        .bind(idseq)
        .fetch_all(&self.pool)
        .await?;

        let mut senses = Vec::with_capacity(sense_ids.len());
        for sid in sense_ids {
            let glosses = sqlx::query_as::<_, (Option<String>, String)>(
                "SELECT lang, text FROM SenseGloss WHERE sid = ? ORDER BY rowid",
            )
            .bind(sid)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(lang, text)| RawGloss { text, lang })
            .collect();

            let pos = sqlx::query_scalar::<_, String>(
                "SELECT text FROM pos WHERE sid = ? ORDER BY rowid",
            )
            .bind(sid)
            .fetch_all(&self.pool)
            .await?;

            senses.push(RawSense { glosses, pos });
        }

        Ok(RawEntry {
            kanji_forms,
            kana_forms,
            senses,
        })
    }
}

#[async_trait]
impl LexicalDatabase for JamdictDatabase {
    async fn find_entries(&self, query: &str) -> Result<Vec<RawEntry>> {
        let db_err = |e: sqlx::Error| YomiError::unavailable(DICTIONARY, e);

        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT idseq FROM Kanji WHERE text = ?
            UNION
            SELECT idseq FROM Kana WHERE text = ?
            ORDER BY idseq
            "#,
        )
        .bind(query)
        .bind(query)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut entries = Vec::with_capacity(ids.len());
        for idseq in ids {
            entries.push(self.load_entry(idseq).await.map_err(db_err)?);
        }
        Ok(entries)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_english(gloss: &RawGloss) -> bool {
    matches!(gloss.lang.as_deref(), None | Some("eng") | Some("en"))
}

/// Turns raw database entries into display entries.
///
/// Entries without an English gloss, or without a kana form matching
/// `reading_filter`, are dropped. Database order is kept.
pub fn normalize_entries(
    term: &str,
    raw: Vec<RawEntry>,
    reading_filter: Option<&str>,
) -> Vec<DictionaryEntry> {
    let reading_filter = reading_filter.filter(|r| !r.is_empty());
    raw.into_iter()
        .filter_map(|entry| normalize_entry(term, entry, reading_filter))
        .collect()
}

fn normalize_entry(term: &str, entry: RawEntry, reading_filter: Option<&str>) -> Option<DictionaryEntry> {
    if let Some(wanted) = reading_filter {
        if !entry.kana_forms.iter().any(|k| kana::same_reading(k, wanted)) {
            return None;
        }
    }

    let headword = entry
        .kanji_forms
        .first()
        .or_else(|| entry.kana_forms.first())
        .cloned()
        .unwrap_or_else(|| term.to_string());
    let reading = entry.kana_forms.first().cloned().unwrap_or_default();

    let mut glosses = Vec::new();
    let mut pos_tags: Vec<String> = Vec::new();
    for sense in entry.senses {
        glosses.extend(sense.glosses.into_iter().filter(is_english).map(|g| g.text));
        for pos in sense.pos {
            if !pos_tags.contains(&pos) {
                pos_tags.push(pos);
            }
        }
    }

    if glosses.is_empty() {
        return None;
    }
    glosses.truncate(MAX_GLOSSES);
    pos_tags.truncate(MAX_POS_TAGS);

    Some(DictionaryEntry {
        headword,
        reading,
        glosses,
        pos_tags,
    })
}

enum DatabaseSource {
    Jamdict(DictionaryConfig),
    Provided,
}

/// Dictionary lookup adapter over a lazily opened lexical database.
pub struct DictionaryAdapter {
    source: DatabaseSource,
    database: OnceCell<Arc<dyn LexicalDatabase>>,
}

impl DictionaryAdapter {
    pub fn from_config(config: &DictionaryConfig) -> Self {
        DictionaryAdapter {
            source: DatabaseSource::Jamdict(config.clone()),
            database: OnceCell::new(),
        }
    }

    pub fn with_database(database: Arc<dyn LexicalDatabase>) -> Self {
        DictionaryAdapter {
            source: DatabaseSource::Provided,
            database: OnceCell::new_with(Some(database)),
        }
    }

    async fn database(&self) -> Result<&Arc<dyn LexicalDatabase>> {
        self.database
            .get_or_try_init(|| async {
                match &self.source {
                    DatabaseSource::Jamdict(config) => {
                        let database = JamdictDatabase::open(config).await?;
                        info!("JMdict database ready");
                        Ok::<_, YomiError>(Arc::new(database) as Arc<dyn LexicalDatabase>)
                    }
                    DatabaseSource::Provided => {
                        Err(YomiError::unavailable(DICTIONARY, "no database was provided"))
                    }
                }
            })
            .await
    }

    pub async fn lookup(&self, term: &str, reading_filter: Option<&str>) -> Result<Vec<DictionaryEntry>> {
        let raw = self.database().await?.find_entries(term).await?;
        let found = raw.len();
        let entries = normalize_entries(term, raw, reading_filter);
        debug!("lookup {:?}: {} raw, {} kept", term, found, entries.len());
        Ok(entries)
    }

    /// Cheap check that never opens the database.
    pub fn is_available(&self) -> bool {
        if self.database.initialized() {
            return true;
        }
        match &self.source {
            DatabaseSource::Jamdict(config) => Path::new(&config.db_file).is_file(),
            DatabaseSource::Provided => false,
        }
    }

    pub async fn close(&self) {
        if let Some(database) = self.database.get() {
            database.close().await;
        }
    }
}
