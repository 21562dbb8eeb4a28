//! Part-of-speech labels of the UniDic/MeCab taxonomy.

/// Returned when the analyzer gives no part-of-speech tag at all.
pub const UNKNOWN_POS: &str = "不明";

pub const PARTICLE: &str = "助詞";
pub const SYMBOL: &str = "記号";
pub const PUNCTUATION: &str = "補助記号";
pub const WHITESPACE: &str = "空白";

const DISPLAY_LABELS: [(&str, &str); 14] = [
    ("名詞", "Noun"),
    ("動詞", "Verb"),
    ("形容詞", "Adjective"),
    ("副詞", "Adverb"),
    (PARTICLE, "Particle"),
    ("助動詞", "Auxiliary"),
    ("接続詞", "Conjunction"),
    ("感動詞", "Interjection"),
    ("連体詞", "Pre-noun adjectival"),
    ("接頭辞", "Prefix"),
    ("接尾辞", "Suffix"),
    (SYMBOL, "Symbol"),
    (PUNCTUATION, "Punctuation"),
    (WHITESPACE, "Whitespace"),
];

const GRAMMAR_WORDS: [&str; 4] = [PARTICLE, PUNCTUATION, SYMBOL, WHITESPACE];

/// English label for a coarse POS tag; unmapped tags are returned as-is.
pub fn to_display_label(pos: &str) -> &str {
    DISPLAY_LABELS
        .iter()
        .find(|(tag, _)| *tag == pos)
        .map(|(_, label)| *label)
        .unwrap_or(pos)
}

/// Grammar words are never looked up in the dictionary.
pub fn is_grammar_word(pos: &str) -> bool {
    GRAMMAR_WORDS.contains(&pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_known_tag() {
        assert_eq!(to_display_label("名詞"), "Noun");
        assert_eq!(to_display_label("動詞"), "Verb");
        assert_eq!(to_display_label("連体詞"), "Pre-noun adjectival");
        assert_eq!(to_display_label("補助記号"), "Punctuation");
        assert_eq!(to_display_label("空白"), "Whitespace");
        for (tag, label) in DISPLAY_LABELS {
            assert_eq!(to_display_label(tag), label);
        }
    }

    #[test]
    fn unmapped_tags_pass_through() {
        assert_eq!(to_display_label("代名詞"), "代名詞");
        assert_eq!(to_display_label(UNKNOWN_POS), UNKNOWN_POS);
        assert_eq!(to_display_label(""), "");
    }

    #[test]
    fn grammar_words() {
        assert!(is_grammar_word("助詞"));
        assert!(is_grammar_word("補助記号"));
        assert!(is_grammar_word("記号"));
        assert!(is_grammar_word("空白"));
        assert!(!is_grammar_word("助動詞"));
        assert!(!is_grammar_word("名詞"));
    }
}
