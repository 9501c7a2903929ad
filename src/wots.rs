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

//! Legacy Winternitz one-time signatures over Keccak-384 hash chains.
//!
//! The private key is 27 chains of 48 bytes each. Iterating a chain means hashing its state
//! with Keccak-384; the public key is the hash of every chain iterated the full 26 times. To
//! sign, the message is reduced to 27 base-27 digits, and chain `i` of the signature is the
//! private chain iterated `digit[i]` times; the verifier iterates the remaining `26 -
//! digit[i]` steps and compares against the public key.
//!
//! The digit reduction alone would leak: a low digit sum means short signer chains and long
//! verifier chains, letting a forger *extend* published chains. The digits are therefore
//! *normalized*: an 8-byte nonce is hashed along with the message and incremented until the
//! selected 27-digit fragment sums to exactly `13 * 27`, pinning the total work split between
//! signer and verifier. The nonce travels with the signature. Security levels 1 to 3 pick
//! fragment 0, 1 or 2 of the digest, each backed by its own key.
//!
//! One key must sign exactly one message. Publishing two signatures under the same key reveals
//! enough chain interiors to forge.

use num_bigint::BigUint;
use num_traits::ToPrimitive as _;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq as _;
use tiny_keccak::{Hasher as _, Keccak};
use zeroize::Zeroizing;

/// Size, in bytes, of one chain state and of the public key.
pub const HASH_SIZE: usize = 48;
/// Number of chains, and of digits in one digest fragment.
const CHAIN_COUNT: usize = 27;
/// Number of defined digest fragments (one per security level).
const FRAGMENT_COUNT: usize = 3;
/// Number of hash iterations from a private chain to its fully iterated end.
const CHAIN_LENGTH: usize = 26;

/// Size, in bytes, of private keys and signatures.
pub const PRIVATE_KEY_SIZE: usize = CHAIN_COUNT * HASH_SIZE;
/// Size, in bytes, of public keys.
pub const PUBLIC_KEY_SIZE: usize = HASH_SIZE;
/// Size, in bytes, of signatures.
pub const SIGNATURE_SIZE: usize = PRIVATE_KEY_SIZE;

/// A Winternitz private key: 27 uniformly random chains, wiped on drop.
pub struct PrivateKey(Zeroizing<[u8; PRIVATE_KEY_SIZE]>);

/// A Winternitz public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

/// A Winternitz signature: one 48-byte state per chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl PrivateKey {
    /// Samples a fresh private key from the given source of randomness.
    pub fn generate(rng: &mut (impl RngCore + CryptoRng)) -> PrivateKey {
        let mut key = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        rng.fill_bytes(&mut key[..]);
        PrivateKey(key)
    }

    /// Computes the corresponding public key: every chain iterated to its end, the
    /// concatenation hashed once more.
    pub fn public_key(&self) -> PublicKey {
        let mut digest = [0u8; PRIVATE_KEY_SIZE];
        for (out, chain) in digest.chunks_exact_mut(HASH_SIZE).zip(self.0.chunks_exact(HASH_SIZE))
        {
            out.copy_from_slice(chain);
            for _ in 0..CHAIN_LENGTH {
                keccak384_in_place(out);
            }
        }
        PublicKey(keccak384(&digest))
    }

    /// Signs the fragment `fragment_index` of the digest of `message`, returning the nonce
    /// that normalized the digest together with the signature.
    ///
    /// # Panic
    ///
    /// Panics when `fragment_index` is not below 3.
    pub fn sign(&self, fragment_index: usize, message: &[u8]) -> (u64, Signature) {
        assert!(fragment_index < FRAGMENT_COUNT, "fragment index out of range");

        // search the nonce that normalizes the selected fragment
        let mut nonce = 0u64;
        let digits = loop {
            let digits = message_digits(message, nonce, fragment_index);
            if is_normalized(&digits) {
                break digits;
            }
            nonce += 1;
        };

        let mut signature = vec![0u8; SIGNATURE_SIZE];
        for ((out, chain), &digit) in signature
            .chunks_exact_mut(HASH_SIZE)
            .zip(self.0.chunks_exact(HASH_SIZE))
            .zip(digits.iter())
        {
            out.copy_from_slice(chain);
            for _ in 0..digit {
                keccak384_in_place(out);
            }
        }
        (nonce, Signature(signature))
    }
}

impl PublicKey {
    /// The raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl Signature {
    /// The raw bytes of the signature.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Wraps raw signature bytes, checking only the length.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Signature> {
        (bytes.len() == SIGNATURE_SIZE).then_some(Signature(bytes))
    }

    /// The tryte rendering of the signature used on the legacy trit wire.
    pub fn to_trytes(&self) -> String {
        crate::encoding::b1t6::encode_to_trytes(&self.0)
    }

    /// Reads a signature back from its tryte rendering.
    pub fn from_trytes(trytes: &str) -> Option<Signature> {
        Signature::from_bytes(crate::encoding::b1t6::decode_trytes(trytes).ok()?)
    }
}

/// Reports whether `signature` with `nonce` is a valid signature of fragment
/// `fragment_index` of `message` under `public_key`.
///
/// The final comparison against the public key is constant-time.
///
/// # Panic
///
/// Panics when `fragment_index` is not below 3.
pub fn verify(
    public_key: &PublicKey,
    fragment_index: usize,
    message: &[u8],
    nonce: u64,
    signature: &Signature,
) -> bool {
    assert!(fragment_index < FRAGMENT_COUNT, "fragment index out of range");

    let digits = message_digits(message, nonce, fragment_index);
    if !is_normalized(&digits) {
        return false;
    }

    let mut digest = [0u8; SIGNATURE_SIZE];
    for ((out, chain), &digit) in digest
        .chunks_exact_mut(HASH_SIZE)
        .zip(signature.0.chunks_exact(HASH_SIZE))
        .zip(digits.iter())
    {
        out.copy_from_slice(chain);
        for _ in (digit as usize)..CHAIN_LENGTH {
            keccak384_in_place(out);
        }
    }
    keccak384(&digest)[..].ct_eq(&public_key.0[..]).into()
}

/// The base-27 digits of fragment `fragment_index` of `Keccak-384(message || nonce)`.
fn message_digits(message: &[u8], nonce: u64, fragment_index: usize) -> [u8; CHAIN_COUNT] {
    let mut keccak = Keccak::v384();
    keccak.update(message);
    keccak.update(&nonce.to_le_bytes());
    let mut digest = [0u8; HASH_SIZE];
    keccak.finalize(&mut digest);

    // interpret the digest as one big integer and peel off base-27 digits, least significant
    // first; the fragment picks a 27-digit window
    let mut value = BigUint::from_bytes_be(&digest);
    let mut digits = [0u8; CHAIN_COUNT];
    for _ in 0..fragment_index * CHAIN_COUNT {
        value /= 27u32;
    }
    for digit in digits.iter_mut() {
        *digit = (&value % 27u32).to_u8().expect("a base-27 digit fits in a byte");
        value /= 27u32;
    }
    digits
}

/// Whether the digit sum equals `13 * 27`, the midpoint that normalization targets.
fn is_normalized(digits: &[u8; CHAIN_COUNT]) -> bool {
    digits.iter().map(|&d| usize::from(d)).sum::<usize>() == 13 * CHAIN_COUNT
}

fn keccak384(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut out = [0u8; HASH_SIZE];
    let mut keccak = Keccak::v384();
    keccak.update(data);
    keccak.finalize(&mut out);
    out
}

fn keccak384_in_place(state: &mut [u8]) {
    let mut out = [0u8; HASH_SIZE];
    let mut keccak = Keccak::v384();
    keccak.update(state);
    keccak.finalize(&mut out);
    state.copy_from_slice(&out);
}
