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

//! The Curl-P-81 ternary sponge.
//!
//! Curl is a sponge construction over a state of 729 balanced trits: a *rate* of 243 trits that
//! is exchanged with the caller and a *capacity* of 486 trits that never leaves the state.
//! Absorbing replaces the rate with a 243-trit input block and scrambles the state; squeezing
//! reads the rate back out between scrambles. The scrambling transformation applies 81 rounds
//! of a two-input trit substitution box along a fixed index rotation.
//!
//! [`CurlP81`] keeps the state as one trit per byte and hashes a single input. The
//! [`bct`] submodule keeps the same state bit-sliced across two bit planes, which lets a single
//! machine-word operation advance one trit of many independent hashes at once; the
//! proof-of-work miner depends on that batched form. Both produce identical digests for
//! identical inputs.

use crate::trinary::Trit;

pub mod bct;

/// Number of trits in one rate block, and the length of a Curl digest.
pub const HASH_LENGTH: usize = 243;

/// Number of trits in the sponge state.
pub const STATE_SIZE: usize = 3 * HASH_LENGTH;

/// Number of rounds of one Curl-P-81 transformation.
const NUM_ROUNDS: usize = 81;

/// Output trit of the substitution box, indexed by `a + 4*b + 5` for input trits `a` and `b`.
///
/// The two unused slots (index 3 and 7) are never addressed because `a` is a valid trit.
const TRUTH_TABLE: [Trit; 11] = [1, 0, -1, 0, 1, -1, 0, 0, -1, 1, 0];

/// Direction in which trits currently flow through the sponge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpongeDirection {
    Absorbing,
    Squeezing,
}

/// Error returned when feeding the sponge with ill-formed input.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Error {
    /// The input length is not a positive multiple of 243 trits.
    #[display(fmt = "input length must be a non-zero multiple of {} trits", HASH_LENGTH)]
    InvalidLength,
    /// The sponge has already been squeezed; it must be reset before absorbing again.
    #[display(fmt = "absorb after squeeze")]
    AbsorbAfterSqueeze,
}

/// A Curl-P-81 sponge hashing a single input.
#[derive(Clone)]
pub struct CurlP81 {
    state: [Trit; STATE_SIZE],
    direction: SpongeDirection,
}

impl Default for CurlP81 {
    fn default() -> Self {
        Self::new()
    }
}

impl CurlP81 {
    /// Returns a sponge with an all-zero state, ready to absorb.
    pub fn new() -> CurlP81 {
        CurlP81 { state: [0; STATE_SIZE], direction: SpongeDirection::Absorbing }
    }

    /// Zeroes the state and returns the sponge to the absorbing direction.
    pub fn reset(&mut self) {
        self.state = [0; STATE_SIZE];
        self.direction = SpongeDirection::Absorbing;
    }

    /// Absorbs the given trits, which must be a non-zero multiple of 243 in length.
    pub fn absorb(&mut self, trits: &[Trit]) -> Result<(), Error> {
        if trits.is_empty() || trits.len() % HASH_LENGTH != 0 {
            return Err(Error::InvalidLength);
        }
        if self.direction != SpongeDirection::Absorbing {
            return Err(Error::AbsorbAfterSqueeze);
        }
        for block in trits.chunks_exact(HASH_LENGTH) {
            self.state[..HASH_LENGTH].copy_from_slice(block);
            self.transform();
        }
        Ok(())
    }

    /// Squeezes `trit_count` trits out of the sponge.
    ///
    /// The count does not have to be a multiple of 243; the final block is truncated.
    pub fn squeeze(&mut self, trit_count: usize) -> Vec<Trit> {
        self.direction = SpongeDirection::Squeezing;
        let mut out = Vec::with_capacity(trit_count);
        let mut remaining = trit_count;
        while remaining > 0 {
            let n = remaining.min(HASH_LENGTH);
            out.extend_from_slice(&self.state[..n]);
            self.transform();
            remaining -= n;
        }
        out
    }

    /// Convenience: absorbs `trits` into a fresh sponge and squeezes one 243-trit digest.
    pub fn digest(trits: &[Trit]) -> Result<Vec<Trit>, Error> {
        let mut c = CurlP81::new();
        c.absorb(trits)?;
        Ok(c.squeeze(HASH_LENGTH))
    }

    fn transform(&mut self) {
        let mut cur = self.state;
        let mut next = [0; STATE_SIZE];
        for _ in 0..NUM_ROUNDS {
            let mut p = 0;
            for i in 0..STATE_SIZE {
                let q = if p < 365 { p + 364 } else { p - 365 };
                next[i] = TRUTH_TABLE[(cur[p] + 4 * cur[q] + 5) as usize];
                p = q;
            }
            core::mem::swap(&mut cur, &mut next);
        }
        self.state = cur;
    }
}
