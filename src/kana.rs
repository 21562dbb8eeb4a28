//! Kana script canonicalization.
//!
//! Analyzer readings arrive in katakana while JMdict kana forms are mostly
//! hiragana; both sides are folded to hiragana before they are shown or compared.

const KATAKANA_START: u32 = 0x30A1; // ァ
const KATAKANA_END: u32 = 0x30F6; // ヶ
const KATAKANA_TO_HIRAGANA: u32 = 0x60;

pub fn to_hiragana(text: &str) -> String {
    text.chars().map(katakana_char_to_hiragana).collect()
}

fn katakana_char_to_hiragana(c: char) -> char {
    let code = c as u32;
    if (KATAKANA_START..=KATAKANA_END).contains(&code) {
        char::from_u32(code - KATAKANA_TO_HIRAGANA).unwrap_or(c)
    } else {
        c
    }
}

/// True when both readings spell the same sound once folded to hiragana.
pub fn same_reading(a: &str, b: &str) -> bool {
    a.chars()
        .map(katakana_char_to_hiragana)
        .eq(b.chars().map(katakana_char_to_hiragana))
}
