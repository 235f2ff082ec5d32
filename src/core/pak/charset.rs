// pakdir/src/core/pak/charset.rs

//! Pak font code.
//!
//! Note names are stored in the console's 8-bit font code rather than ASCII.
//! Only digits, uppercase letters, space and a handful of punctuation marks
//! have a code; lowercase input is folded to uppercase.

use super::{PakError, PakResult};

/// Name terminator / padding
pub const TERMINATOR: u8 = 0x00;

const SPACE: u8 = 0x0F;
const DIGIT_BASE: u8 = 0x10;
const LETTER_BASE: u8 = 0x1A;
const PUNCT_BASE: u8 = 0x34;

/// Punctuation in code order starting at 0x34
const PUNCTUATION: [char; 14] = [
    '!', '"', '#', '\'', '*', '+', ',', '-', '.', '/', ':', '=', '?', '@',
];

/// Encode one character
pub fn encode_char(c: char) -> Option<u8> {
    let c = c.to_ascii_uppercase();
    match c {
        ' ' => Some(SPACE),
        '0'..='9' => Some(DIGIT_BASE + (c as u8 - b'0')),
        'A'..='Z' => Some(LETTER_BASE + (c as u8 - b'A')),
        _ => PUNCTUATION
            .iter()
            .position(|&p| p == c)
            .map(|i| PUNCT_BASE + i as u8),
    }
}

/// Decode one font code
pub fn decode_char(code: u8) -> Option<char> {
    match code {
        SPACE => Some(' '),
        0x10..=0x19 => Some((b'0' + (code - DIGIT_BASE)) as char),
        0x1A..=0x33 => Some((b'A' + (code - LETTER_BASE)) as char),
        0x34..=0x41 => Some(PUNCTUATION[(code - PUNCT_BASE) as usize]),
        _ => None,
    }
}

/// Encode `name` into `out`, padding the remainder with terminators
pub fn encode_name(name: &str, out: &mut [u8]) -> PakResult<()> {
    if name.chars().count() > out.len() {
        return Err(PakError::InvalidName(name.to_string()));
    }

    out.fill(TERMINATOR);
    for (slot, c) in out.iter_mut().zip(name.chars()) {
        *slot = encode_char(c).ok_or_else(|| PakError::InvalidName(name.to_string()))?;
    }
    Ok(())
}

/// Decode a terminator-padded font code field. Unknown codes are dropped.
pub fn decode_name(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&b| b != TERMINATOR)
        .filter_map(|&b| decode_char(b))
        .collect()
}
