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

//! One byte to eight trits, one bit per trit.
//!
//! The trits of an encoding only ever take the values `0` and `1`; the least-significant bit of
//! the byte comes first. An earlier protocol generation used this encoding to append binary
//! nonces to trit streams before the denser [`b1t6`](crate::encoding::b1t6) replaced it.

use crate::trinary::Trit;

const TRITS_PER_BYTE: usize = 8;

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
        for (j, t) in group.iter_mut().enumerate() {
            *t = (b >> j & 1) as Trit;
        }
    }
    encoded_len(src.len())
}

/// Error while decoding a b1t8 trit sequence.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DecodeError {
    /// The input length is not a multiple of eight trits.
    #[display(fmt = "length must be a multiple of 8 trits")]
    InvalidLength,
    /// A trit is outside of `{0, 1}`.
    #[display(fmt = "invalid trit: {}", _0)]
    InvalidTrit(i8),
}

/// Decodes `src` into [`decoded_len`] bytes.
///
/// Fails when a trit is outside of `{0, 1}` or when the length is not a multiple of eight. An
/// invalid trit in a trailing incomplete group is reported as such, not as a length error.
pub fn decode(src: &[Trit]) -> Result<Vec<u8>, DecodeError> {
    let mut dst = Vec::with_capacity(decoded_len(src.len()));
    let mut chunks = src.chunks_exact(TRITS_PER_BYTE);
    for group in &mut chunks {
        let mut b = 0u8;
        for (j, &t) in group.iter().enumerate() {
            if !(0..=1).contains(&t) {
                return Err(DecodeError::InvalidTrit(t));
            }
            b |= (t as u8) << j;
        }
        dst.push(b);
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        // an invalid trit in the remainder is the earlier problem, report it first
        if let Some(&t) = rest.iter().find(|t| !(0..=1).contains(*t)) {
            return Err(DecodeError::InvalidTrit(t));
        }
        return Err(DecodeError::InvalidLength);
    }
    Ok(dst)
}
