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

//! One byte to six trits.
//!
//! Each input byte is reinterpreted as a signed value in `[-128, 127]` and written as a
//! two-tryte base-27 number, low tryte first. Six trits per byte is the densest whole-tryte
//! encoding of bytes; not every tryte pair decodes back to a byte, which is why decoding is
//! fallible.

use crate::trinary::{self, Trit};

/// Number of trits used to encode one byte.
const TRITS_PER_BYTE: usize = 6;

/// Returns the trit-length of an encoding of `n` source bytes.
pub fn encoded_len(n: usize) -> usize {
    n * TRITS_PER_BYTE
}

/// Returns the byte-length of a decoding of `n` source trits.
pub fn decoded_len(n: usize) -> usize {
    n / TRITS_PER_BYTE
}

/// Encodes `src` into [`encoded_len`] trits.
pub fn encode(src: &[u8]) -> Vec<Trit> {
    let mut dst = vec![0; encoded_len(src.len())];
    encode_into(&mut dst, src);
    dst
}

/// Encodes `src` into the first [`encoded_len`] trits of `dst`, returning the number of trits
/// written.
///
/// # Panic
///
/// Panics when `dst` is too short.
pub fn encode_into(dst: &mut [Trit], src: &[u8]) -> usize {
    assert!(dst.len() >= encoded_len(src.len()), "destination too short");
    for (group, &b) in dst.chunks_exact_mut(TRITS_PER_BYTE).zip(src.iter()) {
        // unbalance the signed byte so that both trytes come out of simple division
        let v = b as i8 as i16 + 13 * 27 + 13;
        let (quo, rem) = (v / 27, v % 27);
        encode_tryte(&mut group[..3], (rem - 13) as i8);
        encode_tryte(&mut group[3..], (quo - 13) as i8);
    }
    encoded_len(src.len())
}

/// Encodes `src` into a tryte string of `2 * len` characters.
pub fn encode_to_trytes(src: &[u8]) -> String {
    trinary::trits_to_trytes(&encode(src)).unwrap()
}

fn encode_tryte(dst: &mut [Trit], mut v: i8) {
    for t in dst.iter_mut() {
        *t = (v + 13) % 3 - 1;
        v = (v - *t) / 3;
    }
}

/// Error while decoding a b1t6 trit or tryte sequence.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DecodeError {
    /// The input length is not a multiple of six trits.
    #[display(fmt = "length must be a multiple of 6 trits")]
    InvalidLength,
    /// A group of six trits does not represent a byte.
    #[display(fmt = "invalid trits")]
    InvalidTrits,
}

/// Decodes `src` into [`decoded_len`] bytes.
///
/// Fails when the length is not a multiple of six or when a tryte pair falls outside of the
/// `i8` range.
pub fn decode(src: &[Trit]) -> Result<Vec<u8>, DecodeError> {
    if src.len() % TRITS_PER_BYTE != 0 {
        return Err(DecodeError::InvalidLength);
    }
    let mut dst = Vec::with_capacity(decoded_len(src.len()));
    for group in src.chunks_exact(TRITS_PER_BYTE) {
        let low = decode_tryte(&group[..3])?;
        let high = decode_tryte(&group[3..])?;
        let v = low as i16 + 27 * high as i16;
        if v < i8::MIN as i16 || v > i8::MAX as i16 {
            return Err(DecodeError::InvalidTrits);
        }
        dst.push(v as i8 as u8);
    }
    Ok(dst)
}

/// Decodes the tryte string `src` into `len / 2` bytes.
///
/// Fails when the length is odd, a character is not a tryte, or a tryte pair falls outside of
/// the `i8` range.
pub fn decode_trytes(src: &str) -> Result<Vec<u8>, DecodeError> {
    let trits = trinary::trytes_to_trits(src).map_err(|_| DecodeError::InvalidTrits)?;
    decode(&trits)
}

fn decode_tryte(trits: &[Trit]) -> Result<i8, DecodeError> {
    let mut v = 0i8;
    for &t in trits.iter().rev() {
        if !(-1..=1).contains(&t) {
            return Err(DecodeError::InvalidTrits);
        }
        v = v * 3 + t;
    }
    Ok(v)
}
