use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, YomiError};
use crate::models::ParsedSentence;

const HEADER: [&str; 6] = ["surface", "base_form", "reading", "pos", "word", "meanings"];

// One row per token that found a dictionary entry, using its first entry
pub fn write_vocabulary<W: Write>(sentence: &ParsedSentence, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(csv_error)?;

    let mut rows = 0;
    for token in &sentence.tokens {
        let Some(entry) = token.sense_entries.first() else {
            continue;
        };
        csv_writer
            .write_record([
                token.surface.as_str(),
                token.base_form.as_str(),
                entry.reading.as_str(),
                token.pos_display.as_str(),
                entry.headword.as_str(),
                entry.glosses.join("; ").as_str(),
            ])
            .map_err(csv_error)?;
        rows += 1;
    }

    csv_writer.flush()?;
    Ok(rows)
}

pub fn write_vocabulary_file(sentence: &ParsedSentence, path: impl AsRef<Path>) -> Result<usize> {
    let file = File::create(path)?;
    write_vocabulary(sentence, file)
}

fn csv_error(e: csv::Error) -> YomiError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => YomiError::Io(io),
        other => YomiError::MalformedInput(format!("csv export failed: {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DictionaryEntry, Token};

    fn sentence() -> ParsedSentence {
        let entry = DictionaryEntry {
            headword: "食べる".to_string(),
            reading: "たべる".to_string(),
            glosses: vec!["to eat".to_string(), "to live on, e.g. a salary".to_string()],
            pos_tags: vec!["Ichidan verb".to_string()],
        };
        ParsedSentence {
            original_text: "食べた".to_string(),
            tokens: vec![
                Token {
                    surface: "食べ".to_string(),
                    base_form: "食べる".to_string(),
                    reading: "たべ".to_string(),
                    pos: "動詞".to_string(),
                    pos_display: "Verb".to_string(),
                    sense_entries: vec![entry],
                },
                Token {
                    surface: "た".to_string(),
                    base_form: "た".to_string(),
                    reading: "た".to_string(),
                    pos: "助動詞".to_string(),
                    pos_display: "Auxiliary".to_string(),
                    sense_entries: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn writes_tokens_with_entries() {
        let mut out = Vec::new();
        let rows = write_vocabulary(&sentence(), &mut out).unwrap();
        assert_eq!(rows, 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "surface,base_form,reading,pos,word,meanings\n食べ,食べる,たべる,Verb,食べる,\"to eat; to live on, e.g. a salary\"\n"
        );
    }

    #[test]
    fn empty_sentence_writes_only_header() {
        let mut out = Vec::new();
        assert_eq!(write_vocabulary(&ParsedSentence::empty(), &mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "surface,base_form,reading,pos,word,meanings\n");
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.csv");
        write_vocabulary_file(&sentence(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("surface,"));
        assert!(content.contains("食べる"));
    }
}
