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

//! Ed25519 signatures with consensus-grade verification rules.
//!
//! Signing follows RFC 8032 exactly. Verification, however, follows the ZIP-215 rules rather
//! than the RFC: the public key `A` and the commitment `R` are decoded *without* a canonicity
//! check, the scalar `S` alone must be canonical (this is the malleability barrier), and the
//! verification equation is checked after multiplying by the cofactor,
//! `[8](S·B − k·A − R) = 0`. ZIP-215 makes the accept/reject decision identical for every
//! verifier, including batched ones, which is what a consensus-critical caller needs; two
//! honest nodes disagreeing over one historic signature is how ledgers fork.
//!
//! The [`vrf`](crate::vrf) module layers a verifiable random function over the same keys, with
//! the opposite decoding stance; the asymmetry is deliberate, see there.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::{clamp_integer, Scalar};
use curve25519_dalek::traits::IsIdentity as _;
use rand::{CryptoRng, RngCore};
use sha2::{Digest as _, Sha512};
use zeroize::{Zeroize as _, Zeroizing};

/// Size, in bytes, of a public key.
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Size, in bytes, of a private key.
pub const PRIVATE_KEY_SIZE: usize = 64;
/// Size, in bytes, of a signature.
pub const SIGNATURE_SIZE: usize = 64;
/// Size, in bytes, of a private key seed, the RFC 8032 private key representation.
pub const SEED_SIZE: usize = 32;

/// An Ed25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wraps raw public key bytes. No validation happens here; an unusable key fails
    /// [`verify`] instead.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> PublicKey {
        PublicKey(bytes)
    }

    /// The raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An Ed25519 private key: the seed followed by the public key, wiped on drop.
#[derive(Clone)]
pub struct PrivateKey(Zeroizing<[u8; PRIVATE_KEY_SIZE]>);

impl PrivateKey {
    /// Generates a new private key from the given source of randomness.
    pub fn generate(rng: &mut (impl RngCore + CryptoRng)) -> PrivateKey {
        let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
        rng.fill_bytes(&mut seed[..]);
        PrivateKey::from_seed(&seed)
    }

    /// Computes the private key of a seed, the RFC 8032 private key representation.
    pub fn from_seed(seed: &[u8; SEED_SIZE]) -> PrivateKey {
        let mut h: [u8; 64] = Sha512::digest(seed).into();
        let s = Scalar::from_bytes_mod_order(clamp_integer(h[..32].try_into().unwrap()));
        let public = EdwardsPoint::mul_base(&s).compress();
        h.zeroize();

        let mut key = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        key[..SEED_SIZE].copy_from_slice(seed);
        key[SEED_SIZE..].copy_from_slice(public.as_bytes());
        PrivateKey(key)
    }

    /// The seed this key was computed from.
    pub fn seed(&self) -> Zeroizing<[u8; SEED_SIZE]> {
        Zeroizing::new(self.0[..SEED_SIZE].try_into().unwrap())
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0[SEED_SIZE..].try_into().unwrap())
    }

    /// Signs a message.
    ///
    /// The message is passed over twice, so it cannot be pre-hashed; there is deliberately no
    /// `Ed25519ph` entry point.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let (seed, public) = self.0.split_at(SEED_SIZE);

        let h: Zeroizing<[u8; 64]> = Zeroizing::new(Sha512::digest(seed).into());
        let s = Scalar::from_bytes_mod_order(clamp_integer(h[..32].try_into().unwrap()));
        let prefix = &h[32..];

        let r = Scalar::from_bytes_mod_order_wide(
            &Sha512::new().chain_update(prefix).chain_update(message).finalize().into(),
        );
        let big_r = EdwardsPoint::mul_base(&r).compress();

        let k = Scalar::from_bytes_mod_order_wide(
            &Sha512::new()
                .chain_update(big_r.as_bytes())
                .chain_update(public)
                .chain_update(message)
                .finalize()
                .into(),
        );
        let big_s = k * s + r;

        let mut signature = [0; SIGNATURE_SIZE];
        signature[..32].copy_from_slice(big_r.as_bytes());
        signature[32..].copy_from_slice(big_s.as_bytes());
        Signature(signature)
    }
}

/// An Ed25519 signature: the point `R` followed by the scalar `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Wraps raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Signature {
        Signature(bytes)
    }

    /// The raw bytes of the signature.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

/// Reports whether `signature` is a valid signature of `message` by `public_key`, using the
/// ZIP-215 validation rules.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let sig = &signature.0;
    // the upper three bits of S must be cleared for the canonical-scalar parse below to be
    // meaningful; rejecting them early also matches the wire format rule
    if sig[63] & 0xe0 != 0 {
        return false;
    }

    // ZIP-215: both decodings deliberately accept non-canonical encodings
    let minus_a = match CompressedEdwardsY(public_key.0).decompress() {
        Some(a) => -a,
        None => return false,
    };
    let big_r = match CompressedEdwardsY(sig[..32].try_into().unwrap()).decompress() {
        Some(r) => r,
        None => return false,
    };

    // S in [0, l) is the sole malleability check
    let big_s = match Option::<Scalar>::from(Scalar::from_canonical_bytes(
        sig[32..].try_into().unwrap(),
    )) {
        Some(s) => s,
        None => return false,
    };

    let k = Scalar::from_bytes_mod_order_wide(
        &Sha512::new()
            .chain_update(&sig[..32])
            .chain_update(public_key.0)
            .chain_update(message)
            .finalize()
            .into(),
    );

    // check [8](S·B - k·A - R) = 0
    let candidate = EdwardsPoint::vartime_double_scalar_mul_basepoint(&k, &minus_a, &big_s);
    (candidate - big_r).mul_by_cofactor().is_identity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;

    fn rng() -> rand_chacha::ChaCha8Rng {
        rand_chacha::ChaCha8Rng::seed_from_u64(25519)
    }

    #[test]
    fn rfc8032_test_1() {
        let seed: [u8; 32] =
            hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
                .unwrap()
                .try_into()
                .unwrap();
        let key = PrivateKey::from_seed(&seed);
        assert_eq!(
            hex::encode(key.public_key().as_bytes()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
        let signature = key.sign(b"");
        assert_eq!(
            hex::encode(signature.as_bytes()),
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e06522490155\
             5fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
        );
        assert!(verify(&key.public_key(), b"", &signature));
    }

    #[test]
    fn rfc8032_test_2() {
        let seed: [u8; 32] =
            hex::decode("4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb")
                .unwrap()
                .try_into()
                .unwrap();
        let key = PrivateKey::from_seed(&seed);
        assert_eq!(
            hex::encode(key.public_key().as_bytes()),
            "3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c"
        );
        let signature = key.sign(&[0x72]);
        assert_eq!(
            hex::encode(signature.as_bytes()),
            "92a009a9f0d4cab8720e820b5f642540a2b27b5416503f8fb3762223ebdb69da\
             085ac1e43e15996e458f3613d0f11d8c387b2eaeb4302aeeb00d291612bb0c00"
        );
        assert!(verify(&key.public_key(), &[0x72], &signature));
    }

    #[test]
    fn wrong_message_fails() {
        let key = PrivateKey::generate(&mut rng());
        let signature = key.sign(b"such message");
        assert!(verify(&key.public_key(), b"such message", &signature));
        assert!(!verify(&key.public_key(), b"other message", &signature));
    }

    #[test]
    fn adding_the_group_order_to_s_fails() {
        // the canonical-S rule is the only malleability barrier, make sure it holds
        const ORDER: [u8; 32] = [
            0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9,
            0xde, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x10,
        ];
        let key = PrivateKey::generate(&mut rng());
        let message = b"malleability";
        let signature = key.sign(message);

        let mut bytes = *signature.as_bytes();
        let mut carry = 0u16;
        for i in 0..32 {
            let sum = bytes[32 + i] as u16 + ORDER[i] as u16 + carry;
            bytes[32 + i] = sum as u8;
            carry = sum >> 8;
        }
        assert_eq!(carry, 0);
        let malleated = Signature::from_bytes(bytes);
        assert_ne!(signature, malleated);
        assert!(!verify(&key.public_key(), message, &malleated));
    }

    #[test]
    fn signature_upper_bits_must_be_zero() {
        let key = PrivateKey::generate(&mut rng());
        let message = b"upper bits";
        let mut bytes = *key.sign(message).as_bytes();
        bytes[63] |= 0x20;
        assert!(!verify(&key.public_key(), message, &Signature::from_bytes(bytes)));
    }

    #[test]
    fn generated_keys_round_trip_through_the_seed() {
        let key = PrivateKey::generate(&mut rng());
        let again = PrivateKey::from_seed(&key.seed());
        assert_eq!(key.public_key(), again.public_key());
    }

    #[test]
    fn agrees_with_an_independent_zip215_implementation() {
        let mut rng = rng();
        for _ in 0..16 {
            let key = PrivateKey::generate(&mut rng);
            let message = b"cross validation";

            // our signature verifies over there
            let signature = key.sign(message);
            let their_key =
                ed25519_zebra::VerificationKey::try_from(*key.public_key().as_bytes()).unwrap();
            assert!(their_key
                .verify(&ed25519_zebra::Signature::from(*signature.as_bytes()), message)
                .is_ok());

            // and their signature verifies over here
            let their_signing = ed25519_zebra::SigningKey::from(*key.seed());
            let their_signature: [u8; 64] = their_signing.sign(message).into();
            assert!(verify(
                &key.public_key(),
                message,
                &Signature::from_bytes(their_signature)
            ));
        }
    }
}
