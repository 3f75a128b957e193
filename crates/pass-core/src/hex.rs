//! Lowercase hex encoding and fixed-width decoding.
//!
//! Accepts an optional `0x` prefix and either case on input; always emits
//! lowercase without a prefix.

use crate::error::ParseError;

/// Encode bytes as lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode exactly `N` bytes from a hex string, with or without `0x`.
pub fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], ParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != N * 2 {
        return Err(ParseError::HexLength {
            expected: N * 2,
            actual: digits.len(),
            input: input.to_string(),
        });
    }
    let mut out = [0u8; N];
    for (i, chunk) in digits.as_bytes().chunks(2).enumerate() {
        let hi = nibble(chunk[0]).ok_or_else(|| ParseError::HexDigit(input.to_string()))?;
        let lo = nibble(chunk[1]).ok_or_else(|| ParseError::HexDigit(input.to_string()))?;
        out[i] = (hi << 4) | lo;
    }
    Ok(out)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
