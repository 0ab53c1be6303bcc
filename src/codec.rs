// src/codec.rs
//! Two-bits-per-symbol text codec over the alphabet `A C G T`.
//!
//! Used only to carry binary challenge material over a text channel. It is a
//! representation, not a cipher.

use thiserror::Error;

const SYMBOLS: [char; 4] = ['A', 'C', 'G', 'T'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },
}

fn symbol_bits(symbol: char) -> Option<u8> {
    match symbol {
        'A' => Some(0b00),
        'C' => Some(0b01),
        'G' => Some(0b10),
        'T' => Some(0b11),
        _ => None,
    }
}

/// Encode bytes as one symbol per 2-bit group, most significant bits first.
pub fn encode(data: &[u8]) -> String {
    let mut bits: Vec<u8> = data
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect();
    // whole bytes always give an even count; kept for the pairing rule
    if bits.len() % 2 != 0 {
        bits.push(0);
    }
    bits.chunks(2)
        .map(|pair| SYMBOLS[usize::from((pair[0] << 1) | pair[1])])
        .collect()
}

/// Decode, reporting the first symbol outside the alphabet.
///
/// Trailing bits that do not fill a whole byte are dropped.
pub fn try_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let groups = text
        .chars()
        .enumerate()
        .map(|(position, symbol)| {
            symbol_bits(symbol).ok_or(CodecError::InvalidSymbol { symbol, position })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    Ok(groups
        .chunks_exact(4)
        .map(|quad| quad.iter().fold(0u8, |acc, bits| (acc << 2) | bits))
        .collect())
}

/// Decode text produced by [`encode`]. Any invalid symbol yields an empty vector.
pub fn decode(text: &str) -> Vec<u8> {
    try_decode(text).unwrap_or_default()
}
