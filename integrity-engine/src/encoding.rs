//! Latin-1 handling for TISS text.
//!
//! The standard mandates ISO-8859-1 on the wire and for the digest. Every character must map to
//! exactly one byte; anything above U+00FF is either rewritten by [`sanitize_encoding`] or
//! rejected by [`encode_latin1`].

use crate::error::{IntegrityError, IntegrityResult};
use std::collections::BTreeSet;

const LATIN1_MAX: u32 = 0xFF;

/// Replace common typographic characters with Latin-1 equivalents, then drop anything above
/// U+00FF.
pub fn sanitize_encoding(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push('-'),
            '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => out.push(' '),
            '\u{2122}' => out.push_str("(TM)"),
            '\u{00A9}' => out.push_str("(C)"),
            '\u{00AE}' => out.push_str("(R)"),
            '\u{20AC}' => out.push_str("EUR"),
            '\u{20A4}' => out.push_str("GBP"),
            c if u32::from(c) <= LATIN1_MAX => out.push(c),
            _ => {}
        }
    }
    out
}

/// Distinct code points above U+00FF, sorted ascending.
pub fn find_invalid(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| u32::from(*c) > LATIN1_MAX)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Encode as single-byte Latin-1. Fails instead of falling back to a multi-byte encoding.
pub fn encode_latin1(text: &str) -> IntegrityResult<Vec<u8>> {
    let invalid = find_invalid(text);
    if !invalid.is_empty() {
        return Err(IntegrityError::Encoding(invalid));
    }

    Ok(text
        .chars()
        .filter_map(|c| u8::try_from(u32::from(c)).ok())
        .collect())
}

/// Decode Latin-1 bytes. Every byte value is a valid code point, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
