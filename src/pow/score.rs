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

//! The score-targeted miner of the later protocol generation.
//!
//! Instead of counting trailing zeros, this variant reads the whole 243-trit Curl hash as an
//! integer: `int(h) = h[242]·3²⁴² + … + h[0]·3⁰ + 1` with `-1` digits mapped to `2`, so
//! `int(h) ∈ [1, 3²⁴³]`. The *difficulty* of a hash is `⌊3²⁴³ / int(h)⌋` and the score of a
//! message is its difficulty divided by its length. Higher is better; a hash ending in many
//! zero digits has a small integer value and therefore a large quotient, which is why the
//! trailing-zeros count of the parent module is the right cheap approximation.
//!
//! The miner exploits exactly that: a hash with `s` trailing zeros, `3^s ≥ len·target`, is
//! always good enough, so the bit-sliced trailing-zeros scan of the parent module serves as a
//! pre-filter, and only the rare boundary candidates (exactly `s-1` trailing zeros) pay for
//! the exact big-integer comparison against the precomputed worst acceptable hash.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, OnceLock};
use std::thread;

use blake2_rfc::blake2b::blake2b;
use num_bigint::BigUint;
use num_traits::ToPrimitive as _;

use super::{CancelHandle, Error, DIGEST_SIZE, NONCE_BYTES, NONCE_TRIT_OFFSET};
use crate::curl::bct::{BctCurlP81, MAX_BATCH_SIZE};
use crate::curl::HASH_LENGTH;
use crate::encoding::b1t6;
use crate::trinary::Trit;

/// Largest number of trits convertible inside one `u64`, i.e. `3⁴⁰ ≤ u64::MAX`.
const TRITS_PER_U64: usize = 40;

/// `3²⁴³`, the largest possible integer value of a hash.
fn max_hash() -> &'static BigUint {
    static MAX_HASH: OnceLock<BigUint> = OnceLock::new();
    MAX_HASH.get_or_init(|| BigUint::from(3u8).pow(HASH_LENGTH as u32))
}

/// A score-targeted proof-of-work miner.
#[derive(Debug, Clone)]
pub struct Miner {
    num_workers: usize,
}

impl Miner {
    /// Returns a miner running `num_workers` worker threads; zero means one.
    pub fn new(num_workers: usize) -> Miner {
        Miner { num_workers: num_workers.max(1) }
    }

    /// Searches a nonce that, appended to `data`, gives the message a score of at least
    /// `target_score`.
    ///
    /// # Panic
    ///
    /// Panics when `(len + 8) · target_score` overflows, in which case no feasible message
    /// exists anyway.
    pub fn mine(
        &self,
        data: &[u8],
        target_score: u64,
        cancel: &CancelHandle,
    ) -> Result<u64, Error> {
        // the zero target is satisfied by the zero nonce
        if target_score == 0 {
            return Ok(0);
        }

        let digest: [u8; DIGEST_SIZE] =
            blake2b(DIGEST_SIZE, &[], data).as_bytes().try_into().unwrap();
        let message_len = data.len() + NONCE_BYTES;
        let sufficient = sufficient_trailing_zeros(message_len, target_score);
        let target = Arc::new(target_hash(message_len, target_score));

        let done = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::sync_channel(self.num_workers);

        let stride = u64::MAX / self.num_workers as u64;
        let mut workers = Vec::with_capacity(self.num_workers);
        for index in 0..self.num_workers {
            let done = Arc::clone(&done);
            let cancel = cancel.clone();
            let sender = sender.clone();
            let target = Arc::clone(&target);
            workers.push(thread::spawn(move || {
                let start_nonce = index as u64 * stride;
                if let Some(nonce) =
                    worker(&digest, start_nonce, stride, sufficient, &target, &done, &cancel)
                {
                    done.store(true, Ordering::SeqCst);
                    let _ = sender.send(nonce);
                }
            }));
        }
        drop(sender);
        for handle in workers {
            let _ = handle.join();
        }

        match receiver.try_recv() {
            Ok(nonce) => Ok(nonce),
            Err(_) if cancel.is_cancelled() => Err(Error::Cancelled),
            Err(_) => Err(Error::Done),
        }
    }
}

/// The score of a full message (nonce included): `⌊3²⁴³ / int(hash)⌋ / len`, saturated to
/// `u64::MAX`.
///
/// # Panic
///
/// Panics when the message is shorter than the nonce.
pub fn score(message: &[u8]) -> u64 {
    assert!(message.len() >= NONCE_BYTES, "message misses the nonce");

    let data_len = message.len() - NONCE_BYTES;
    let digest: [u8; DIGEST_SIZE] =
        blake2b(DIGEST_SIZE, &[], &message[..data_len]).as_bytes().try_into().unwrap();
    let nonce = u64::from_le_bytes(message[data_len..].try_into().unwrap());

    let difficulty = difficulty(&digest, nonce);
    (difficulty / message.len() as u64).to_u64().unwrap_or(u64::MAX)
}

/// `⌊3²⁴³ / int(hash)⌋` of the Curl hash of the block built from `digest` and `nonce`.
fn difficulty(digest: &[u8; DIGEST_SIZE], nonce: u64) -> BigUint {
    let mut block = [0 as Trit; HASH_LENGTH];
    b1t6::encode_into(&mut block, digest);
    b1t6::encode_into(&mut block[NONCE_TRIT_OFFSET..], &nonce.to_le_bytes());

    let mut curl = crate::curl::CurlP81::new();
    curl.absorb(&block).expect("one Curl block always absorbs");
    let hash = curl.squeeze(HASH_LENGTH);

    max_hash() / hash_to_int(&hash)
}

/// The smallest `s` such that every hash with `s` trailing zeros is feasible, i.e.
/// `3^s ≥ len·target`.
fn sufficient_trailing_zeros(message_len: usize, target_score: u64) -> usize {
    let bound = (message_len as u64)
        .checked_mul(target_score)
        .expect("target score too large for the message length");

    let mut value = 1u64;
    for s in 0..=TRITS_PER_U64 {
        if value >= bound {
            return s;
        }
        value *= 3;
    }
    TRITS_PER_U64 + 1
}

/// The largest integer hash value that is still feasible: `⌊3²⁴³ / (len·target + 1)⌋`.
fn target_hash(message_len: usize, target_score: u64) -> BigUint {
    let bound = BigUint::from(message_len as u64) * target_score + 1u8;
    max_hash() / bound
}

/// Converts the 243-trit hash into its integer value, in 40-trit chunks to keep the
/// big-integer work small.
fn hash_to_int(hash: &[Trit]) -> BigUint {
    assert_eq!(hash.len(), HASH_LENGTH);
    static U64_RADIX: OnceLock<BigUint> = OnceLock::new();
    let radix = U64_RADIX.get_or_init(|| BigUint::from(3u8).pow(TRITS_PER_U64 as u32));

    // the top three trits do not fill a chunk
    let mut value = BigUint::from(
        trit_digit(hash[HASH_LENGTH - 1]) * 9
            + trit_digit(hash[HASH_LENGTH - 2]) * 3
            + trit_digit(hash[HASH_LENGTH - 3]),
    );
    for chunk_index in (0..HASH_LENGTH / TRITS_PER_U64).rev() {
        let chunk = &hash[chunk_index * TRITS_PER_U64..][..TRITS_PER_U64];
        let mut v: u64 = 0;
        for &t in chunk.iter().rev() {
            v = v * 3 + trit_digit(t);
        }
        if chunk_index == 0 {
            // the trailing +1 that keeps the value strictly positive
            v += 1;
        }
        value = value * radix + v;
    }
    value
}

fn trit_digit(t: Trit) -> u64 {
    if t == -1 {
        2
    } else {
        t as u64
    }
}

fn worker(
    digest: &[u8; DIGEST_SIZE],
    start_nonce: u64,
    stride: u64,
    sufficient: usize,
    target: &BigUint,
    done: &AtomicBool,
    cancel: &CancelHandle,
) -> Option<u64> {
    assert!(sufficient <= HASH_LENGTH, "trailing zeros target out of range");

    let mut curl = BctCurlP81::new();
    let mut l = [0; HASH_LENGTH];
    let mut h = [0; HASH_LENGTH];

    let mut blocks = vec![vec![0 as Trit; HASH_LENGTH]; MAX_BATCH_SIZE];
    for block in &mut blocks {
        b1t6::encode_into(block, digest);
    }

    let mut nonce = start_nonce;
    let mut remaining = stride;
    while remaining >= MAX_BATCH_SIZE as u64 {
        if done.load(Ordering::SeqCst) || cancel.is_cancelled() {
            return None;
        }

        for (lane, block) in blocks.iter_mut().enumerate() {
            let lane_nonce = nonce.wrapping_add(lane as u64);
            b1t6::encode_into(&mut block[NONCE_TRIT_OFFSET..], &lane_nonce.to_le_bytes());
        }

        curl.reset();
        curl.absorb(&blocks).expect("lane blocks always absorb");
        curl.copy_state(&mut l, &mut h);

        if let Some(lane) = check_state(&l, &h, sufficient, target) {
            return Some(nonce.wrapping_add(lane as u64));
        }

        nonce = nonce.wrapping_add(MAX_BATCH_SIZE as u64);
        remaining -= MAX_BATCH_SIZE as u64;
    }
    None
}

/// Finds a feasible lane: either one with `sufficient` trailing zeros, or one at exactly
/// `sufficient - 1` whose exact integer value stays below `target`.
fn check_state(
    l: &[usize; HASH_LENGTH],
    h: &[usize; HASH_LENGTH],
    sufficient: usize,
    target: &BigUint,
) -> Option<usize> {
    // lanes with a non-zero trit among the last sufficient-1 positions are hopeless
    let mut non_zero: usize = 0;
    for i in HASH_LENGTH - (sufficient - 1)..HASH_LENGTH {
        non_zero |= l[i] ^ h[i];
    }
    if non_zero == !0 {
        return None;
    }

    // a zero trit one position further makes the lane feasible outright
    let boundary = non_zero | (l[HASH_LENGTH - sufficient] ^ h[HASH_LENGTH - sufficient]);
    if boundary != !0 {
        return Some((!boundary).trailing_zeros() as usize);
    }

    // boundary lanes need the exact comparison
    let lanes = !non_zero;
    let lo = lanes.trailing_zeros() as usize;
    let hi = usize::BITS as usize - lanes.leading_zeros() as usize;
    for lane in lo..hi {
        if lanes >> lane & 1 != 0 && state_to_int(l, h, lane) <= *target {
            return Some(lane);
        }
    }
    None
}

fn state_to_int(l: &[usize; HASH_LENGTH], h: &[usize; HASH_LENGTH], lane: usize) -> BigUint {
    let mut trits = [0 as Trit; HASH_LENGTH];
    for (i, t) in trits.iter_mut().enumerate() {
        *t = ((h[i] >> lane) & 1) as Trit - ((l[i] >> lane) & 1) as Trit;
    }
    hash_to_int(&trits)
}
