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

//! Five trits to one byte.
//!
//! A group of five balanced trits has a value in `[-121, 121]` and is stored as one signed
//! byte. Encoding zero-pads the final group; the byte values `122` through `134` (and their
//! negative counterparts) are unused, which is what makes decoding fallible.
//!
//! Because five trits do not align with the three-trit tryte, a tryte string encoded this way
//! carries up to four padding trits. [`decode_to_trytes`] enforces that this padding is zero,
//! so that the byte form of a tryte string stays unambiguous.

use crate::trinary::{self, Trit, TRITS_PER_TRYTE};

const TRITS_PER_BYTE: usize = 5;
/// Largest value representable by a five-trit group: `1 + 3 + 9 + 27 + 81`.
const MAX_GROUP_VALUE: i8 = 121;

/// Returns the byte-length of an encoding of `n` source trits.
pub fn encoded_len(n: usize) -> usize {
    (n + TRITS_PER_BYTE - 1) / TRITS_PER_BYTE
}

/// Returns the trit-length of a decoding of `n` source bytes.
pub fn decoded_len(n: usize) -> usize {
    n * TRITS_PER_BYTE
}

/// Encodes `src` into [`encoded_len`] bytes, zero-padding the last five-trit group.
pub fn encode(src: &[Trit]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(encoded_len(src.len()));
    for group in src.chunks(TRITS_PER_BYTE) {
        let mut v = 0i8;
        for &t in group.iter().rev() {
            v = v * 3 + t;
        }
        dst.push(v as u8);
    }
    dst
}

/// Encodes the tryte string `src` into bytes, zero-padding the corresponding trits to a
/// multiple of five.
pub fn encode_trytes(src: &str) -> Result<Vec<u8>, trinary::Error> {
    Ok(encode(&trinary::trytes_to_trits(src)?))
}

/// Error while decoding a t5b1 byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DecodeError {
    /// A byte value is outside of the valid five-trit group range.
    #[display(fmt = "invalid byte at index {}: {:#04x}", index, byte)]
    InvalidByte {
        /// Position of the offending byte in the input.
        index: usize,
        /// The offending byte.
        byte: u8,
    },
    /// The padding trits of the final group are not all zero.
    #[display(fmt = "non-zero padding")]
    NonZeroPadding,
}

/// Decodes `src` into [`decoded_len`] trits.
///
/// Fails when a byte has a magnitude larger than 121.
pub fn decode(src: &[u8]) -> Result<Vec<Trit>, DecodeError> {
    let mut dst = Vec::with_capacity(decoded_len(src.len()));
    for (index, &byte) in src.iter().enumerate() {
        let mut v = byte as i8;
        if !(-MAX_GROUP_VALUE..=MAX_GROUP_VALUE).contains(&v) {
            return Err(DecodeError::InvalidByte { index, byte });
        }
        for _ in 0..TRITS_PER_BYTE {
            let t = (v.rem_euclid(3) + 1).rem_euclid(3) - 1;
            dst.push(t);
            v = (v - t) / 3;
        }
    }
    Ok(dst)
}

/// Decodes `src` into a tryte string, dropping the final padding trits.
///
/// In addition to the conditions checked by [`decode`], this fails when the dropped padding
/// trits are not all zero.
pub fn decode_to_trytes(src: &[u8]) -> Result<String, DecodeError> {
    let trits = decode(src)?;
    let pad_len = trits.len() % TRITS_PER_TRYTE;
    if pad_len == 0 {
        return Ok(trinary::trits_to_trytes(&trits).unwrap());
    }
    let (trytes, padding) = trits.split_at(trits.len() - pad_len);
    if padding.iter().any(|&t| t != 0) {
        return Err(DecodeError::NonZeroPadding);
    }
    Ok(trinary::trits_to_trytes(trytes).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &[(&str, &[u8])] = &[
        ("", &[]),
        ("9NOPQRSTUVWXYZ9", &[0x94, 0x2c, 0xa2, 0x12, 0xea, 0xd1, 0xab, 0xa9, 0x00]),
        ("9ABCDEFGHIJKLM9", &[0x1b, 0x06, 0x25, 0xb4, 0xc5, 0x54, 0x40, 0x76, 0x04]),
        ("M", &[0x0d]),                 // 2 trit padding
        ("MM", &[0x79, 0x01]),          // 4 trit padding
        ("MMM", &[0x79, 0x28]),         // 1 trit padding
        ("MMMM", &[0x79, 0x79, 0x04]),  // 3 trit padding
        ("MMMMM", &[0x79, 0x79, 0x79]), // no padding
    ];

    #[test]
    fn encode_vectors() {
        for (trytes, bytes) in VECTORS {
            assert_eq!(encode_trytes(trytes).unwrap(), *bytes, "{}", trytes);
        }
    }

    #[test]
    fn decode_vectors() {
        for (trytes, bytes) in VECTORS {
            let trits = decode(bytes).unwrap();
            let expected =
                trinary::pad_trits(&trinary::trytes_to_trits(trytes).unwrap(), trits.len());
            assert_eq!(trits, expected, "{}", trytes);
        }
    }

    #[test]
    fn decode_to_trytes_vectors() {
        for (trytes, bytes) in VECTORS {
            assert_eq!(decode_to_trytes(bytes).unwrap(), *trytes, "{}", trytes);
        }
    }

    #[test]
    fn decode_rejects_invalid_bytes() {
        for bytes in [&[0x00, 0x7a], &[0x00, 0x80], &[0x00, 0x86]] {
            assert_eq!(
                decode(bytes),
                Err(DecodeError::InvalidByte { index: 1, byte: bytes[1] })
            );
            assert!(decode_to_trytes(bytes).is_err());
        }
    }

    #[test]
    fn decode_to_trytes_rejects_non_zero_padding() {
        for trits in [
            &[1, 1, 1, 0, 1][..],
            &[1, 1, 1, 0, -1],
            &[1, 1, 1, 1, 0],
            &[1, 1, 1, -1, 0],
        ] {
            let bytes = encode(trits);
            assert_eq!(decode_to_trytes(&bytes), Err(DecodeError::NonZeroPadding));
        }
    }

    #[test]
    fn round_trip_law() {
        // decode(encode(t)) restricted to the input length returns t
        let trits: Vec<Trit> =
            (0..52).map(|i| [(-1i8), 0, 1, 1, 0, -1, 0][i % 7]).collect();
        let decoded = decode(&encode(&trits)).unwrap();
        assert_eq!(&decoded[..trits.len()], &trits[..]);
    }
}
