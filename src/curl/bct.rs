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

//! Batched Curl-P-81 over bit-sliced trits.
//!
//! Instead of one trit per byte, the state is kept as two parallel bit planes `l` and `h` of
//! 729 machine words each. Bit position `k` of the word pair `(l[i], h[i])` holds trit `i` of
//! lane `k`, encoded as:
//!
//! | trit | `l` bit | `h` bit |
//! |------|---------|---------|
//! | `-1` | 1       | 0       |
//! | `0`  | 1       | 1       |
//! | `+1` | 0       | 1       |
//!
//! The `(0, 0)` combination never occurs in a valid state. With this layout one word-wide
//! boolean operation advances the same trit of [`MAX_BATCH_SIZE`] independent hashes at once,
//! which is what makes the proof-of-work search affordable. The substitution box becomes four
//! boolean word operations; the index rotation is the same as in the byte-wise sponge, and for
//! equal inputs every lane produces exactly the digest of [`CurlP81`](crate::curl::CurlP81).

use super::{Error, SpongeDirection, HASH_LENGTH, NUM_ROUNDS, STATE_SIZE};
use crate::trinary::Trit;

/// Number of hashes processed by one batched sponge.
pub const MAX_BATCH_SIZE: usize = usize::BITS as usize;

/// A batched Curl-P-81 sponge processing up to [`MAX_BATCH_SIZE`] inputs in lock-step.
#[derive(Clone)]
pub struct BctCurlP81 {
    l: [usize; STATE_SIZE],
    h: [usize; STATE_SIZE],
    batch_len: usize,
    direction: SpongeDirection,
}

impl Default for BctCurlP81 {
    fn default() -> Self {
        Self::new()
    }
}

impl BctCurlP81 {
    /// Returns a batched sponge with all lanes in the all-zero-trit state.
    pub fn new() -> BctCurlP81 {
        BctCurlP81 {
            l: [!0; STATE_SIZE],
            h: [!0; STATE_SIZE],
            batch_len: 0,
            direction: SpongeDirection::Absorbing,
        }
    }

    /// Zeroes every lane and returns the sponge to the absorbing direction.
    pub fn reset(&mut self) {
        self.l = [!0; STATE_SIZE];
        self.h = [!0; STATE_SIZE];
        self.batch_len = 0;
        self.direction = SpongeDirection::Absorbing;
    }

    /// Absorbs one input per lane.
    ///
    /// All inputs must share the same length, which must be a non-zero multiple of 243 trits,
    /// and there must be no more than [`MAX_BATCH_SIZE`] of them. Unused lanes hash the
    /// all-zero input.
    pub fn absorb(&mut self, inputs: &[Vec<Trit>]) -> Result<(), Error> {
        if inputs.is_empty() || inputs.len() > MAX_BATCH_SIZE {
            return Err(Error::InvalidLength);
        }
        let trit_count = inputs[0].len();
        if trit_count == 0
            || trit_count % HASH_LENGTH != 0
            || inputs.iter().any(|i| i.len() != trit_count)
        {
            return Err(Error::InvalidLength);
        }
        if self.direction != SpongeDirection::Absorbing {
            return Err(Error::AbsorbAfterSqueeze);
        }
        self.batch_len = inputs.len();
        for block in 0..trit_count / HASH_LENGTH {
            for (lane, input) in inputs.iter().enumerate() {
                for (i, &t) in input[block * HASH_LENGTH..][..HASH_LENGTH].iter().enumerate() {
                    self.set_trit(i, lane, t);
                }
            }
            self.transform();
        }
        Ok(())
    }

    /// Squeezes `trit_count` trits out of every absorbed lane.
    ///
    /// Like the byte-wise sponge, the count does not have to be a multiple of 243.
    pub fn squeeze(&mut self, trit_count: usize) -> Vec<Vec<Trit>> {
        self.direction = SpongeDirection::Squeezing;
        let mut out = vec![Vec::with_capacity(trit_count); self.batch_len.max(1)];
        let mut remaining = trit_count;
        while remaining > 0 {
            let n = remaining.min(HASH_LENGTH);
            for (lane, hash) in out.iter_mut().enumerate() {
                for i in 0..n {
                    hash.push(self.trit(i, lane));
                }
            }
            self.transform();
            remaining -= n;
        }
        out
    }

    /// Copies the first 243 word pairs of the state into `l` and `h`.
    ///
    /// Right after an absorb these correspond to the first squeezed block of every lane, which
    /// lets a caller inspect all digests without leaving the bit-sliced form.
    ///
    /// # Panic
    ///
    /// Panics when the destination slices are shorter than 243 words.
    pub fn copy_state(&self, l: &mut [usize], h: &mut [usize]) {
        l[..HASH_LENGTH].copy_from_slice(&self.l[..HASH_LENGTH]);
        h[..HASH_LENGTH].copy_from_slice(&self.h[..HASH_LENGTH]);
    }

    fn set_trit(&mut self, i: usize, lane: usize, trit: Trit) {
        let bit = 1 << lane;
        match trit {
            -1 => {
                self.l[i] |= bit;
                self.h[i] &= !bit;
            }
            1 => {
                self.l[i] &= !bit;
                self.h[i] |= bit;
            }
            _ => {
                self.l[i] |= bit;
                self.h[i] |= bit;
            }
        }
    }

    fn trit(&self, i: usize, lane: usize) -> Trit {
        ((self.h[i] >> lane) & 1) as Trit - ((self.l[i] >> lane) & 1) as Trit
    }

    fn transform(&mut self) {
        let mut l_next = [0; STATE_SIZE];
        let mut h_next = [0; STATE_SIZE];
        for _ in 0..NUM_ROUNDS {
            let mut p = 0;
            for i in 0..STATE_SIZE {
                let q = if p < 365 { p + 364 } else { p - 365 };
                let (sl, sh) = s_box(self.l[p], self.h[p], self.l[q], self.h[q]);
                l_next[i] = sl;
                h_next[i] = sh;
                p = q;
            }
            core::mem::swap(&mut self.l, &mut l_next);
            core::mem::swap(&mut self.h, &mut h_next);
        }
    }
}

#[inline]
fn s_box(a_l: usize, a_h: usize, b_l: usize, b_h: usize) -> (usize, usize) {
    let tmp = a_l & (a_h ^ b_l);
    (!tmp, (a_l ^ b_h) | tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::CurlP81;
    use rand::{Rng as _, SeedableRng as _};

    fn random_trits(rng: &mut impl rand::Rng, n: usize) -> Vec<Trit> {
        (0..n).map(|_| rng.gen_range(-1i8..=1)).collect()
    }

    #[test]
    fn single_lane_matches_the_byte_wise_sponge() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        for _ in 0..10 {
            let input = random_trits(&mut rng, HASH_LENGTH);
            let mut bct = BctCurlP81::new();
            bct.absorb(&[input.clone()]).unwrap();
            assert_eq!(bct.squeeze(HASH_LENGTH)[0], CurlP81::digest(&input).unwrap());
        }
    }

    #[test]
    fn every_lane_matches_the_byte_wise_sponge() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(2);
        for &(input_len, squeeze_len) in &[
            (HASH_LENGTH, HASH_LENGTH),
            (3 * HASH_LENGTH, HASH_LENGTH),
            (HASH_LENGTH, 3 * HASH_LENGTH),
            (2 * HASH_LENGTH, 100),
        ] {
            let inputs: Vec<Vec<Trit>> =
                (0..MAX_BATCH_SIZE).map(|_| random_trits(&mut rng, input_len)).collect();

            let mut bct = BctCurlP81::new();
            bct.absorb(&inputs).unwrap();
            let hashes = bct.squeeze(squeeze_len);

            for (input, hash) in inputs.iter().zip(&hashes) {
                let mut c = CurlP81::new();
                c.absorb(input).unwrap();
                assert_eq!(*hash, c.squeeze(squeeze_len));
            }
        }
    }

    #[test]
    fn transform_equivalence_fuzz() {
        // drive both transforms over the same random states; this is the core equivalence the
        // miner relies on
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1000 {
            let input = random_trits(&mut rng, HASH_LENGTH);
            let mut bct = BctCurlP81::new();
            bct.absorb(&[input.clone()]).unwrap();

            let mut l = [0; HASH_LENGTH];
            let mut h = [0; HASH_LENGTH];
            bct.copy_state(&mut l, &mut h);
            let state_digest: Vec<Trit> = (0..HASH_LENGTH)
                .map(|i| ((h[i] & 1) as Trit) - ((l[i] & 1) as Trit))
                .collect();

            assert_eq!(state_digest, CurlP81::digest(&input).unwrap());
        }
    }

    #[test]
    fn absorb_rejects_bad_batches() {
        let mut bct = BctCurlP81::new();
        assert_eq!(bct.absorb(&[]), Err(Error::InvalidLength));
        assert_eq!(bct.absorb(&[vec![0; HASH_LENGTH - 1]]), Err(Error::InvalidLength));
        assert_eq!(
            bct.absorb(&[vec![0; HASH_LENGTH], vec![0; 2 * HASH_LENGTH]]),
            Err(Error::InvalidLength)
        );
    }
}
