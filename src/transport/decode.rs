//! Byte-to-text decoding with mojibake repair
//!
//! Source sites are inconsistent about declared versus actual encoding, so
//! response bodies are decoded here rather than trusting `Content-Type`.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid token pattern"));

/// Windows-1252 code points for bytes 0x80..=0x9F (`None` where undefined)
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Decode a response body into normalized text
///
/// Strict UTF-8 is tried first. Invalid input is decoded with replacement
/// characters and passed through [`repair_mojibake`]. Every whitespace run is
/// collapsed to a single space before the text reaches the HTML parser.
pub fn decode_body(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => repair_mojibake(&String::from_utf8_lossy(bytes)),
    };
    collapse_whitespace(&text)
}

/// Replace every run of whitespace with a single space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Fix tokens whose UTF-8 bytes were previously decoded as Windows-1252
///
/// `KrakÃ³w` becomes `Kraków` and `â€™` becomes `’`. Tokens that do not
/// round-trip to valid UTF-8 are left untouched.
pub fn repair_mojibake(text: &str) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            repair_token(token).unwrap_or_else(|| token.to_string())
        })
        .into_owned()
}

fn repair_token(token: &str) -> Option<String> {
    // Only tokens carrying a would-be UTF-8 lead byte (Â..ô) are candidates
    if !token.chars().any(|c| ('\u{00C2}'..='\u{00F4}').contains(&c)) {
        return None;
    }

    let bytes = token
        .chars()
        .map(cp1252_byte)
        .collect::<Option<Vec<u8>>>()?;

    match String::from_utf8(bytes) {
        Ok(fixed) if fixed != token => Some(fixed),
        _ => None,
    }
}

fn cp1252_byte(c: char) -> Option<u8> {
    if let Some(pos) = CP1252_HIGH.iter().position(|&m| m == Some(c)) {
        return Some(0x80 + pos as u8);
    }
    u8::try_from(u32::from(c)).ok()
}
