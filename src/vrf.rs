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

//! ECVRF-EDWARDS25519-SHA512-TAI, the verifiable random function of
//! draft-irtf-cfrg-vrf-15.
//!
//! A VRF is a keyed hash whose output can be verified against the *public* key: the holder of
//! the private key computes `hash(alpha)` together with a proof, and anyone can check that the
//! hash is the unique correct output for this key and input. Keys are ordinary
//! [`ed25519`](crate::ed25519) keys; the input is mapped to a curve point by hashing with an
//! incrementing counter until a valid point appears ("try and increment"), the proof is a
//! Chaum-Pedersen style triple `(Γ, c, s)` of 80 bytes, and the 64-byte output hash is derived
//! from `Γ`.
//!
//! In contrast to ZIP-215 signature verification, every point that crosses this module's
//! boundary is decoded through a *strict* decoder that rejects non-canonical encodings, both
//! `y >= p` and the two sign-bit ambiguities (`y = 1` and `y = p - 1` with the
//! sign bit set). The draft requires full output uniqueness: a single VRF output must have
//! exactly one byte representation that verifies, so the representation games that ZIP-215
//! tolerates have to be ruled out here.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::{clamp_integer, Scalar};
use curve25519_dalek::traits::{IsIdentity as _, VartimeMultiscalarMul as _};
use sha2::{Digest as _, Sha512};
use zeroize::Zeroizing;

pub use crate::ed25519::{PrivateKey, PublicKey, SEED_SIZE};

/// Size, in bytes, of a serialized curve point.
const POINT_SIZE: usize = 32;
/// Size, in bytes, of the truncated challenge scalar.
const CHALLENGE_SIZE: usize = 16;
/// Size, in bytes, of a full scalar.
const SCALAR_SIZE: usize = 32;

/// Size, in bytes, of a serialized VRF proof.
pub const PROOF_SIZE: usize = POINT_SIZE + CHALLENGE_SIZE + SCALAR_SIZE;

/// Size, in bytes, of a VRF output hash.
pub const HASH_SIZE: usize = 64;

/// Suite identification octet of ECVRF-EDWARDS25519-SHA512-TAI.
const SUITE: u8 = 0x03;

const ENCODE_TO_CURVE_FRONT: u8 = 0x01;
const CHALLENGE_FRONT: u8 = 0x02;
const PROOF_TO_HASH_FRONT: u8 = 0x03;
const DOMAIN_SEPARATOR_BACK: u8 = 0x00;

/// The two encodings with a canonical `y` but an impossible sign bit: `y = 1` and `y = p - 1`,
/// both with the sign bit set. The lenient decoder accepts them as `x = 0` points; the strict
/// one must not.
const NON_CANONICAL_SIGN_BYTES: [[u8; 32]; 2] = [
    [
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x80,
    ],
    [
        0xec, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff,
    ],
];

/// Decodes a point, rejecting every non-canonical encoding.
///
/// This is `string_to_point` of RFC 8032 with the canonicity checks that the lenient
/// [`CompressedEdwardsY::decompress`] skips.
fn decode_point_canonical(bytes: &[u8; 32]) -> Option<EdwardsPoint> {
    if !is_canonical_y(bytes) {
        return None;
    }
    if bytes == &NON_CANONICAL_SIGN_BYTES[0] || bytes == &NON_CANONICAL_SIGN_BYTES[1] {
        return None;
    }
    CompressedEdwardsY(*bytes).decompress()
}

/// Whether the `y` coordinate of the encoding is below the field prime, using the
/// succeed-fast test from the "Taming the many EdDSAs" paper.
fn is_canonical_y(bytes: &[u8; 32]) -> bool {
    if bytes[0] < 237 {
        return true;
    }
    for i in 1..=30 {
        if bytes[i] != 255 {
            return true;
        }
    }
    bytes[31] | 128 != 255
}

/// Error while decoding a serialized proof.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DecodeProofError {
    /// The input is not exactly 80 bytes long.
    #[display(fmt = "invalid proof length: {}", _0)]
    InvalidLength(usize),
    /// The point `Γ` is not a canonical point encoding.
    #[display(fmt = "invalid point")]
    InvalidPoint,
    /// The scalar `s` is not canonical.
    #[display(fmt = "invalid scalar")]
    InvalidScalar,
}

/// A VRF proof: the triple `(Γ, c, s)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    gamma: EdwardsPoint,
    c: Scalar,
    s: Scalar,
}

impl Proof {
    /// The canonical 80-byte serialization `Γ(32) || c(16) || s(32)`.
    pub fn to_bytes(&self) -> [u8; PROOF_SIZE] {
        let mut out = [0; PROOF_SIZE];
        out[..POINT_SIZE].copy_from_slice(self.gamma.compress().as_bytes());
        out[POINT_SIZE..][..CHALLENGE_SIZE]
            .copy_from_slice(&self.c.as_bytes()[..CHALLENGE_SIZE]);
        out[POINT_SIZE + CHALLENGE_SIZE..].copy_from_slice(self.s.as_bytes());
        out
    }

    /// Deserializes a proof, enforcing canonical encodings throughout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Proof, DecodeProofError> {
        if bytes.len() != PROOF_SIZE {
            return Err(DecodeProofError::InvalidLength(bytes.len()));
        }
        let gamma = decode_point_canonical(bytes[..POINT_SIZE].try_into().unwrap())
            .ok_or(DecodeProofError::InvalidPoint)?;

        // the truncated challenge extends with zeros into a scalar that is always canonical
        let mut c_bytes = [0; SCALAR_SIZE];
        c_bytes[..CHALLENGE_SIZE].copy_from_slice(&bytes[POINT_SIZE..][..CHALLENGE_SIZE]);
        let c = Option::<Scalar>::from(Scalar::from_canonical_bytes(c_bytes))
            .expect("a 128-bit value is always below the group order");

        let s = Option::<Scalar>::from(Scalar::from_canonical_bytes(
            bytes[POINT_SIZE + CHALLENGE_SIZE..].try_into().unwrap(),
        ))
        .ok_or(DecodeProofError::InvalidScalar)?;

        Ok(Proof { gamma, c, s })
    }

    /// The VRF output hash corresponding to this proof.
    ///
    /// Only meaningful for proofs produced by [`prove`] or validated by [`verify`].
    pub fn hash(&self) -> [u8; HASH_SIZE] {
        let gamma = self.gamma.mul_by_cofactor();
        Sha512::new()
            .chain_update([SUITE, PROOF_TO_HASH_FRONT])
            .chain_update(gamma.compress().as_bytes())
            .chain_update([DOMAIN_SEPARATOR_BACK])
            .finalize()
            .into()
    }
}

/// Computes the VRF proof for the input `alpha`.
pub fn prove(private_key: &PrivateKey, alpha: &[u8]) -> Proof {
    let seed = private_key.seed();
    let public_key = private_key.public_key();

    // x is the clamped lower half of the expanded seed, exactly as in Ed25519 signing
    let hashed: Zeroizing<[u8; 64]> = Zeroizing::new(Sha512::digest(&seed[..]).into());
    let x = Scalar::from_bytes_mod_order(clamp_integer(hashed[..32].try_into().unwrap()));

    let h = encode_to_curve_tai(public_key.as_bytes(), alpha);
    let h_bytes = h.compress();

    let gamma = h * x;

    // k = nonce_generation(SK, h_string)
    let k_digest: Zeroizing<[u8; 64]> = Zeroizing::new(
        Sha512::new()
            .chain_update(&hashed[32..])
            .chain_update(h_bytes.as_bytes())
            .finalize()
            .into(),
    );
    let k = Scalar::from_bytes_mod_order_wide(&k_digest);

    let c = challenge(
        public_key.as_bytes(),
        h_bytes.as_bytes(),
        &gamma,
        &EdwardsPoint::mul_base(&k),
        &(h * k),
    );
    let s = k + c * x;

    Proof { gamma, c, s }
}

/// Computes the VRF output hash of a serialized proof.
///
/// This must only be run on proofs known to come out of [`prove`]; [`verify`] returns the
/// hash of untrusted proofs after checking them.
pub fn proof_to_hash(pi: &[u8]) -> Result<[u8; HASH_SIZE], DecodeProofError> {
    Ok(Proof::from_bytes(pi)?.hash())
}

/// Checks that `pi` proves `alpha` under `public_key` and returns the VRF output hash if so.
pub fn verify(public_key: &PublicKey, alpha: &[u8], pi: &[u8]) -> Option<[u8; HASH_SIZE]> {
    let y = decode_point_canonical(public_key.as_bytes())?;
    // validate_key: reject keys of small order
    if y.mul_by_cofactor().is_identity() {
        return None;
    }
    let proof = Proof::from_bytes(pi).ok()?;

    let h = encode_to_curve_tai(public_key.as_bytes(), alpha);

    // U = s·B - c·Y
    let u = EdwardsPoint::vartime_double_scalar_mul_basepoint(&-proof.c, &y, &proof.s);
    // V = s·H - c·Γ
    let v = EdwardsPoint::vartime_multiscalar_mul([proof.s, -proof.c], [h, proof.gamma]);

    let expected = challenge(
        public_key.as_bytes(),
        h.compress().as_bytes(),
        &proof.gamma,
        &u,
        &v,
    );
    if proof.c != expected {
        return None;
    }
    Some(proof.hash())
}

/// Hashes `alpha` to a prime-order curve point by trying successive counter values.
///
/// # Panic
///
/// The draft leaves the behavior after 256 failed attempts undefined; the probability of that
/// is `2⁻²⁵⁶`-ish, and this function panics if it ever happens.
fn encode_to_curve_tai(salt: &[u8; 32], alpha: &[u8]) -> EdwardsPoint {
    for ctr in 0u8..=255 {
        let digest: [u8; 64] = Sha512::new()
            .chain_update([SUITE, ENCODE_TO_CURVE_FRONT])
            .chain_update(salt)
            .chain_update(alpha)
            .chain_update([ctr, DOMAIN_SEPARATOR_BACK])
            .finalize()
            .into();
        if let Some(point) = decode_point_canonical(digest[..POINT_SIZE].try_into().unwrap()) {
            // only a prime-order H is usable
            let point = point.mul_by_cofactor();
            if !point.is_identity() {
                return point;
            }
        }
    }
    panic!("unable to hash the input to the curve");
}

/// The challenge scalar `c = hash(suite || 0x02 || P1..P5 || 0x00)`, truncated to 128 bits.
fn challenge(
    p1: &[u8; 32],
    p2: &[u8; 32],
    p3: &EdwardsPoint,
    p4: &EdwardsPoint,
    p5: &EdwardsPoint,
) -> Scalar {
    let digest: [u8; 64] = Sha512::new()
        .chain_update([SUITE, CHALLENGE_FRONT])
        .chain_update(p1)
        .chain_update(p2)
        .chain_update(p3.compress().as_bytes())
        .chain_update(p4.compress().as_bytes())
        .chain_update(p5.compress().as_bytes())
        .chain_update([DOMAIN_SEPARATOR_BACK])
        .finalize()
        .into();

    let mut truncated = [0; SCALAR_SIZE];
    truncated[..CHALLENGE_SIZE].copy_from_slice(&digest[..CHALLENGE_SIZE]);
    Option::<Scalar>::from(Scalar::from_canonical_bytes(truncated))
        .expect("a 128-bit value is always below the group order")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;

    fn keypair() -> (PublicKey, PrivateKey) {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(815);
        let private = PrivateKey::generate(&mut rng);
        (private.public_key(), private)
    }

    #[test]
    fn prove_verify_round_trip() {
        let (public, private) = keypair();
        let pi = prove(&private, b"Alice").to_bytes();
        assert_eq!(pi.len(), PROOF_SIZE);

        let beta = verify(&public, b"Alice", &pi).expect("proof must verify");
        assert_eq!(beta.len(), HASH_SIZE);
        assert_eq!(beta, proof_to_hash(&pi).unwrap());

        // a different input must not verify under the same proof
        assert!(verify(&public, b"Bob", &pi).is_none());
    }

    #[test]
    fn proofs_are_deterministic() {
        let (_, private) = keypair();
        assert_eq!(prove(&private, b"alpha"), prove(&private, b"alpha"));
        assert_ne!(
            prove(&private, b"alpha").to_bytes(),
            prove(&private, b"beta").to_bytes()
        );
    }

    #[test]
    fn proof_serialization_round_trip() {
        let (_, private) = keypair();
        let proof = prove(&private, b"serialize me");
        assert_eq!(Proof::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }

    #[test]
    fn tampered_proofs_fail() {
        let (public, private) = keypair();
        let pi = prove(&private, b"tamper").to_bytes();
        for i in [0usize, 31, 32, 47, 48, 79] {
            let mut bad = pi;
            bad[i] ^= 0x01;
            assert!(verify(&public, b"tamper", &bad).is_none(), "byte {}", i);
        }
        assert!(Proof::from_bytes(&pi[..79]).is_err());
    }

    #[test]
    fn challenge_upper_bytes_must_be_zero() {
        // c occupies a 16-byte slot; the scalar it expands to keeps the upper 16 bytes zero,
        // so flipping what would be a high byte of c changes s instead and must break the
        // proof. Serialization itself must stay 80 bytes with c truncated.
        let (_, private) = keypair();
        let proof = prove(&private, b"layout");
        let bytes = proof.to_bytes();
        let c_bytes = proof.c.as_bytes();
        assert!(c_bytes[CHALLENGE_SIZE..].iter().all(|&b| b == 0));
        assert_eq!(&bytes[32..48], &c_bytes[..CHALLENGE_SIZE]);
    }

    #[test]
    fn rejects_non_canonical_point_encodings() {
        // the 24 encodings with y >= p, in both sign variants, plus the two sign-bit
        // ambiguities; all of them decode fine under ZIP-215 rules and must fail here
        let non_canonical_y = [
            "EDFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "EEFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "F0FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "F1FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "F2FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "F3FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "F6FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "F7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "FBFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "FCFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "FDFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
        ];
        for encoding in non_canonical_y {
            for sign in [0x00u8, 0x80] {
                let mut bytes: [u8; 32] =
                    hex::decode(encoding).unwrap().try_into().unwrap();
                bytes[31] = (bytes[31] & 0x7f) | sign;
                assert!(decode_point_canonical(&bytes).is_none(), "{} {:02x}", encoding, sign);
                // every one of them is a curve point that the lenient decoder accepts
                assert!(CompressedEdwardsY(bytes).decompress().is_some());
            }
        }
        for bytes in &NON_CANONICAL_SIGN_BYTES {
            assert!(decode_point_canonical(bytes).is_none());
            // the lenient decoder accepts exactly these
            assert!(CompressedEdwardsY(*bytes).decompress().is_some());
        }
    }

    #[test]
    fn accepts_canonical_edge_encodings() {
        // y = 0 with positive sign, and y = p - 1 with positive sign, are canonical
        let zero = [0u8; 32];
        assert!(decode_point_canonical(&zero).is_some());
        let mut p_minus_one = [0xffu8; 32];
        p_minus_one[0] = 0xec;
        p_minus_one[31] = 0x7f;
        assert!(decode_point_canonical(&p_minus_one).is_some());
    }

    #[test]
    fn small_order_public_keys_are_rejected() {
        let (_, private) = keypair();
        let pi = prove(&private, b"alpha").to_bytes();
        // the identity encodes as y = 1, which has small order
        let mut identity = [0u8; 32];
        identity[0] = 0x01;
        assert!(verify(&PublicKey::from_bytes(identity), b"alpha", &pi).is_none());
    }
}
