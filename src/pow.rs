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

//! The Curl-based proof of work over arbitrary binary data.
//!
//! A message proves its work through the nonce in its last eight bytes: the BLAKE2b-256 digest
//! of everything before the nonce is spread over 192 trits with
//! [`b1t6`](crate::encoding::b1t6), the nonce over the next 48, and the resulting 243-trit
//! block is hashed with Curl-P-81. The number of trailing zero trits of that hash is the work:
//! a message passes a target of `t` when its hash ends in at least `t` zeros, and its
//! [`score()`] is `3^zeros / len`.
//!
//! [`Miner::mine`] searches the nonce space with a configurable number of worker threads.
//! Each worker owns a disjoint stride of the nonce space and hashes candidates in batches of
//! [`MAX_BATCH_SIZE`](crate::curl::bct::MAX_BATCH_SIZE) through the bit-sliced sponge,
//! checking the trailing zeros of all lanes at once on the bit planes without ever leaving the
//! sliced representation. A shared flag stops every worker as soon as one of them finds a
//! nonce or the caller's [`CancelHandle`] fires; a worker checks the flag once per batch, so
//! no worker outlives the decision by more than one batch.
//!
//! The [`mod@score`] submodule implements the score-targeted miner of the later protocol
//! generation on the same machinery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use blake2_rfc::blake2b::blake2b;

use crate::curl::bct::{BctCurlP81, MAX_BATCH_SIZE};
use crate::curl::{CurlP81, HASH_LENGTH};
use crate::encoding::b1t6;
use crate::trinary::{self, Trit};

pub mod score;

/// Number of message bytes holding the nonce.
pub const NONCE_BYTES: usize = 8;

/// Size, in bytes, of the PoW digest.
const DIGEST_SIZE: usize = 32;
/// Trit offset of the encoded nonce inside the Curl block.
const NONCE_TRIT_OFFSET: usize = 6 * DIGEST_SIZE;

/// Why mining stopped without a nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Error {
    /// The cancellation handle fired before a nonce was found.
    #[display(fmt = "canceled")]
    Cancelled,
    /// Every worker exhausted its share of the nonce space. With 64-bit nonces this does not
    /// happen outside of contrived targets.
    #[display(fmt = "done")]
    Done,
}

/// A handle that cancels a running [`Miner::mine`] call.
///
/// Cloning yields handles to the same cancellation state. Cancelling after the mining call
/// has returned has no effect.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Returns a fresh, un-fired handle.
    pub fn new() -> CancelHandle {
        CancelHandle::default()
    }

    /// Fires the handle; every miner polling it stops after its current batch.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the handle has fired.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A proof-of-work miner with a fixed worker count.
#[derive(Debug, Clone)]
pub struct Miner {
    num_workers: usize,
}

impl Miner {
    /// Returns a miner running `num_workers` worker threads; zero means one.
    pub fn new(num_workers: usize) -> Miner {
        Miner { num_workers: num_workers.max(1) }
    }

    /// Searches a nonce such that `data` followed by that nonce has at least `target_zeros`
    /// trailing zero trits in its Curl hash.
    ///
    /// `data` is the message *without* the trailing nonce bytes. The call blocks until a
    /// nonce is found or `cancel` fires.
    ///
    /// # Panic
    ///
    /// Panics when `target_zeros` exceeds the 243-trit hash length.
    pub fn mine(
        &self,
        data: &[u8],
        target_zeros: usize,
        cancel: &CancelHandle,
    ) -> Result<u64, Error> {
        assert!(target_zeros <= HASH_LENGTH, "target exceeds the hash length");

        let digest: [u8; DIGEST_SIZE] =
            blake2b(DIGEST_SIZE, &[], data).as_bytes().try_into().unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::sync_channel(self.num_workers);

        let stride = u64::MAX / self.num_workers as u64;
        let mut workers = Vec::with_capacity(self.num_workers);
        for index in 0..self.num_workers {
            let done = Arc::clone(&done);
            let cancel = cancel.clone();
            let sender = sender.clone();
            workers.push(thread::spawn(move || {
                let start_nonce = index as u64 * stride;
                if let Some(nonce) =
                    worker(&digest, start_nonce, stride, target_zeros, &done, &cancel)
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

/// The PoW score of a full message (nonce included): `3^zeros / len`.
///
/// # Panic
///
/// Panics when the message is shorter than the nonce.
pub fn score(message: &[u8]) -> f64 {
    assert!(message.len() >= NONCE_BYTES, "message misses the nonce");

    let data_len = message.len() - NONCE_BYTES;
    let digest: [u8; DIGEST_SIZE] =
        blake2b(DIGEST_SIZE, &[], &message[..data_len]).as_bytes().try_into().unwrap();
    let nonce = u64::from_le_bytes(message[data_len..].try_into().unwrap());

    let zeros = trailing_zeros(&digest, nonce);
    3f64.powi(zeros as i32) / message.len() as f64
}

/// Trailing zero trits of the Curl hash of the block built from `digest` and `nonce`.
fn trailing_zeros(digest: &[u8; DIGEST_SIZE], nonce: u64) -> usize {
    let mut block = [0 as Trit; HASH_LENGTH];
    b1t6::encode_into(&mut block, digest);
    b1t6::encode_into(&mut block[NONCE_TRIT_OFFSET..], &nonce.to_le_bytes());

    let mut curl = CurlP81::new();
    curl.absorb(&block).expect("one Curl block always absorbs");
    trinary::trailing_zeros(&curl.squeeze(HASH_LENGTH))
}

fn worker(
    digest: &[u8; DIGEST_SIZE],
    start_nonce: u64,
    stride: u64,
    target_zeros: usize,
    done: &AtomicBool,
    cancel: &CancelHandle,
) -> Option<u64> {
    let mut curl = BctCurlP81::new();
    let mut l = [0; HASH_LENGTH];
    let mut h = [0; HASH_LENGTH];

    // one Curl block per lane, prefilled with the digest trits
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
        // the first 243 state words are the digests of every lane
        curl.copy_state(&mut l, &mut h);

        if let Some(lane) = first_lane_with_trailing_zeros(&l, &h, target_zeros) {
            return Some(nonce.wrapping_add(lane as u64));
        }

        nonce = nonce.wrapping_add(MAX_BATCH_SIZE as u64);
        remaining -= MAX_BATCH_SIZE as u64;
    }
    None
}

/// Scans the bit planes for a lane whose hash ends in at least `target` zero trits.
///
/// A trit is zero exactly when its two plane bits are equal, so one XOR per trit position
/// accumulates "has a non-zero trit in the window" for all lanes at once.
fn first_lane_with_trailing_zeros(
    l: &[usize; HASH_LENGTH],
    h: &[usize; HASH_LENGTH],
    target: usize,
) -> Option<usize> {
    let mut non_zero: usize = 0;
    for i in HASH_LENGTH - target..HASH_LENGTH {
        non_zero |= l[i] ^ h[i];
    }
    if non_zero == !0 {
        return None;
    }
    Some((!non_zero).trailing_zeros() as usize)
}
