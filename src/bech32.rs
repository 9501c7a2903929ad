// Tanglekit
// Copyright (C) 2023-2024  Tanglekit contributors
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Bech32, the checksummed human-readable encoding of BIP-173.
//!
//! A Bech32 string is `hrp || '1' || data || checksum`: a human-readable part that identifies
//! the network, a separator, the payload in a 32-character alphabet (five bits per character),
//! and six checksum characters computed over everything. The checksum is a BCH code that
//! guarantees detection of up to four character errors; the alphabet excludes `1`, `b`, `i`
//! and `o`, which are too easy to confuse. Strings are at most 90 characters and entirely
//! lowercase; uppercase input is accepted only if *all* letters are uppercase, and mixed case
//! is rejected outright.
//!
//! Because these strings are meant to be typed by humans, decode errors point at the byte that
//! broke: [`SyntaxError::offset`] carries the zero-based position of the offending character,
//! or `None` for errors that have no single position (mixed case, a failed checksum). Callers
//! are expected to surface that position to the user; the demo binary prints a caret under it.
//!
//! The payload is bytes, not five-bit groups: [`encode`] spreads eight-bit bytes over five-bit
//! characters, and [`decode`] packs them back, rejecting incomplete or non-zero padding.

use core::fmt;

pub mod address;

/// The data-part alphabet, indexed by five-bit value.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Generator coefficients of the checksum BCH code.
const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

/// Maximum total length of a Bech32 string.
const MAX_LENGTH: usize = 90;
/// Length of the checksum, in characters.
const CHECKSUM_LENGTH: usize = 6;
/// Bounds of the human-readable part, in characters.
const HRP_MIN_LENGTH: usize = 1;
const HRP_MAX_LENGTH: usize = 83;

/// What exactly went wrong while reading or producing a Bech32 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SyntaxErrorKind {
    /// The string mixes uppercase and lowercase characters.
    #[display(fmt = "mixed case")]
    MixedCase,
    /// There is no `1` separator.
    #[display(fmt = "missing separator")]
    MissingSeparator,
    /// The human-readable part is empty or longer than 83 characters.
    #[display(fmt = "invalid human-readable part")]
    InvalidHrp,
    /// A character is outside of its allowed range.
    #[display(fmt = "invalid character")]
    InvalidCharacter,
    /// The string is longer than 90 characters, or the data part is too short to even hold
    /// the checksum.
    #[display(fmt = "invalid length")]
    InvalidLength,
    /// The checksum does not verify.
    #[display(fmt = "invalid checksum")]
    InvalidChecksum,
    /// The five-bit groups do not pack into bytes: the padding is incomplete or non-zero.
    #[display(fmt = "invalid padding")]
    InvalidPadding,
}

/// Error while reading or producing a Bech32 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxError {
    /// The kind of error.
    pub kind: SyntaxErrorKind,
    /// Zero-based byte offset of the offending character, when the error has one.
    pub offset: Option<usize>,
}

impl SyntaxError {
    fn global(kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError { kind, offset: None }
    }

    fn at(kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        SyntaxError { kind, offset: Some(offset) }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at index {}", self.kind, offset),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Encodes `data` as a Bech32 string with the given human-readable part.
///
/// The human-readable part must be lowercase, 1 to 83 characters of the visible ASCII range,
/// and short enough for the result to stay within 90 characters.
pub fn encode(hrp: &str, data: &[u8]) -> Result<String, SyntaxError> {
    if hrp.len() < HRP_MIN_LENGTH || hrp.len() > HRP_MAX_LENGTH {
        return Err(SyntaxError::global(SyntaxErrorKind::InvalidHrp));
    }
    for (i, b) in hrp.bytes().enumerate() {
        if !(33..=126).contains(&b) || b.is_ascii_uppercase() {
            return Err(SyntaxError::at(SyntaxErrorKind::InvalidCharacter, i));
        }
    }

    let values = convert_bits_8_to_5(data);
    let total = hrp.len() + 1 + values.len() + CHECKSUM_LENGTH;
    if total > MAX_LENGTH {
        return Err(SyntaxError::global(SyntaxErrorKind::InvalidLength));
    }

    let mut out = String::with_capacity(total);
    out.push_str(hrp);
    out.push('1');
    for &v in &values {
        out.push(CHARSET[v as usize] as char);
    }
    for &v in &create_checksum(hrp, &values) {
        out.push(CHARSET[v as usize] as char);
    }
    Ok(out)
}

/// Decodes a Bech32 string into its human-readable part and its payload bytes.
pub fn decode(s: &str) -> Result<(String, Vec<u8>), SyntaxError> {
    if s.len() > MAX_LENGTH {
        return Err(SyntaxError::global(SyntaxErrorKind::InvalidLength));
    }
    let has_lower = s.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = s.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(SyntaxError::global(SyntaxErrorKind::MixedCase));
    }
    let lowered = s.to_ascii_lowercase();

    let separator = match lowered.rfind('1') {
        Some(pos) => pos,
        None => return Err(SyntaxError::global(SyntaxErrorKind::MissingSeparator)),
    };
    let (hrp, data_part) = (&lowered[..separator], &lowered[separator + 1..]);

    if hrp.is_empty() {
        return Err(SyntaxError::at(SyntaxErrorKind::InvalidHrp, 0));
    }
    if hrp.len() > HRP_MAX_LENGTH {
        return Err(SyntaxError::at(SyntaxErrorKind::InvalidHrp, HRP_MAX_LENGTH));
    }
    for (i, b) in hrp.bytes().enumerate() {
        if !(33..=126).contains(&b) {
            return Err(SyntaxError::at(SyntaxErrorKind::InvalidCharacter, i));
        }
    }
    if data_part.len() < CHECKSUM_LENGTH {
        return Err(SyntaxError::global(SyntaxErrorKind::InvalidLength));
    }

    let mut values = Vec::with_capacity(data_part.len());
    for (i, b) in data_part.bytes().enumerate() {
        match CHARSET.iter().position(|&c| c == b) {
            Some(v) => values.push(v as u8),
            None => {
                return Err(SyntaxError::at(
                    SyntaxErrorKind::InvalidCharacter,
                    separator + 1 + i,
                ))
            }
        }
    }

    if !verify_checksum(hrp, &values) {
        return Err(SyntaxError::global(SyntaxErrorKind::InvalidChecksum));
    }

    let data = convert_bits_5_to_8(&values[..values.len() - CHECKSUM_LENGTH])
        .ok_or_else(|| SyntaxError::global(SyntaxErrorKind::InvalidPadding))?;
    Ok((hrp.to_owned(), data))
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for v in values {
        let top = chk >> 25;
        chk = (chk & 0x1ff_ffff) << 5 ^ u32::from(v);
        for (i, &g) in GENERATOR.iter().enumerate() {
            if top >> i & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk
}

/// The checksum input of the human-readable part: high bits, a zero, then low bits.
fn hrp_expand(hrp: &str) -> impl Iterator<Item = u8> + '_ {
    hrp.bytes()
        .map(|b| b >> 5)
        .chain(core::iter::once(0))
        .chain(hrp.bytes().map(|b| b & 0x1f))
}

fn verify_checksum(hrp: &str, values: &[u8]) -> bool {
    polymod(hrp_expand(hrp).chain(values.iter().copied())) == 1
}

fn create_checksum(hrp: &str, values: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let chk = polymod(
        hrp_expand(hrp)
            .chain(values.iter().copied())
            .chain(core::iter::repeat(0).take(CHECKSUM_LENGTH)),
    ) ^ 1;
    let mut out = [0; CHECKSUM_LENGTH];
    for (i, v) in out.iter_mut().enumerate() {
        *v = (chk >> (5 * (5 - i)) & 0x1f) as u8;
    }
    out
}

fn convert_bits_8_to_5(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity((data.len() * 8 + 4) / 5);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &b in data {
        acc = acc << 8 | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push((acc >> bits & 0x1f) as u8);
        }
    }
    if bits > 0 {
        out.push((acc << (5 - bits) & 0x1f) as u8);
    }
    out
}

/// Returns `None` when the padding is more than a byte's worth or not zero.
fn convert_bits_5_to_8(values: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(values.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &v in values {
        acc = acc << 5 | u32::from(v);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }
    if bits >= 5 || acc & ((1 << bits) - 1) != 0 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // the reference strings from BIP-173
    const VALID: &[&str] = &[
        "A12UEL5L",
        "a12uel5l",
        "an83characterlonghumanreadablepartthatcontainsthenumber1andtheexcludedcharactersbio1tt5tgs",
        "abcdef1qpzry9x8gf2tvdw0s3jn54khce6mua7lmqqqxw",
        "11qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqc8247j",
        "split1checkupstagehandshakeupstreamerranterredcaperred2y9e3w",
        "?1ezyfcl",
    ];

    #[test]
    fn reference_strings_decode() {
        for s in VALID {
            let result = decode(s);
            assert!(result.is_ok(), "{}: {:?}", s, result);
        }
    }

    #[test]
    fn decode_encode_round_trip() {
        for s in VALID {
            // strings whose data part is a whole number of bytes survive a round trip
            if let Ok((hrp, data)) = decode(s) {
                let encoded = encode(&hrp, &data).unwrap();
                assert_eq!(encoded, s.to_ascii_lowercase(), "{}", s);
            }
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let data: Vec<u8> = (0..33).collect();
        let encoded = encode("iota", &data).unwrap();
        assert!(encoded.starts_with("iota1"));
        let (hrp, decoded) = decode(&encoded).unwrap();
        assert_eq!(hrp, "iota");
        assert_eq!(decoded, data);
    }

    #[test]
    fn mixed_case_is_rejected_without_an_offset() {
        assert_eq!(
            decode("A12uel5l").unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::MixedCase)
        );
    }

    #[test]
    fn missing_separator() {
        assert_eq!(
            decode("pzry9x0s0muk").unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::MissingSeparator)
        );
    }

    #[test]
    fn empty_hrp_points_at_the_start() {
        for s in ["1pzry9x0s0muk", "10a06t8", "1qzzfhee"] {
            assert_eq!(
                decode(s).unwrap_err(),
                SyntaxError::at(SyntaxErrorKind::InvalidHrp, 0),
                "{}",
                s
            );
        }
    }

    #[test]
    fn invalid_hrp_character_carries_its_offset() {
        assert_eq!(
            decode("\x201nwldj5").unwrap_err(),
            SyntaxError::at(SyntaxErrorKind::InvalidCharacter, 0)
        );
        assert_eq!(
            decode("\x7f1axkwrx").unwrap_err(),
            SyntaxError::at(SyntaxErrorKind::InvalidCharacter, 0)
        );
    }

    #[test]
    fn invalid_data_character_carries_its_offset() {
        // 'b' is not part of the alphabet; it sits at offset 2
        assert_eq!(
            decode("x1b4n0q5v").unwrap_err(),
            SyntaxError::at(SyntaxErrorKind::InvalidCharacter, 2)
        );
    }

    #[test]
    fn too_long_and_too_short() {
        let too_long = format!("an84characterslonghumanreadablepartthatcontainsthenumber1andtheexcludedcharactersbio1{}", "569pvx");
        assert!(decode(&too_long).is_err());
        assert_eq!(
            decode("li1dgmt3").unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::InvalidLength)
        );
    }

    #[test]
    fn wrong_checksum_is_rejected() {
        assert_eq!(
            decode("a12uel5m").unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::InvalidChecksum)
        );
        // checksum computed over the uppercase hrp
        assert_eq!(
            decode("A1G7SGD8").unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::InvalidChecksum)
        );
    }

    #[test]
    fn encode_validates_the_hrp() {
        assert_eq!(
            encode("", &[0]).unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::InvalidHrp)
        );
        assert_eq!(
            encode("IOTA", &[0]).unwrap_err(),
            SyntaxError::at(SyntaxErrorKind::InvalidCharacter, 0)
        );
        assert!(encode(&"a".repeat(84), &[]).is_err());
    }

    #[test]
    fn encode_respects_the_length_limit() {
        assert!(encode("iota", &[0; 49]).is_ok());
        assert_eq!(
            encode("iota", &[0; 50]).unwrap_err(),
            SyntaxError::global(SyntaxErrorKind::InvalidLength)
        );
    }
}
