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

//! SLIP-10 hierarchical-deterministic key derivation.
//!
//! From a master seed, SLIP-10 derives a tree of *extended keys*: a private scalar or public
//! point together with a 32-byte chain code. Children are addressed by 32-bit indexes
//! (see [`bip32path`](crate::bip32path)); an index at or above `2³¹` derives a *hardened*
//! child, which requires the parent private key. For the two short-Weierstrass curves the
//! non-hardened derivation also works on extended *public* keys, so that a watch-only holder
//! of the parent public key can compute the public half of a subtree. When the secp256k1 curve
//! is selected, the derivation is fully compatible with BIP-32.
//!
//! Every derivation step computes HMAC-SHA-512 over the parent material and splits the result
//! into a candidate key and the child chain code. A candidate can be invalid (the scalar may
//! fall outside `[1, n)`, or the shifted point may be the identity), in which case the step
//! re-runs the HMAC on alternative input rather than failing. These retries stay internal;
//! their probability is around `2⁻¹²⁷`, so no real derivation ever surfaces
//! [`Error::InvalidKey`].
//!
//! Ed25519 is the odd one out: every 32-byte string is a valid key, so there are no retries,
//! but only hardened derivation exists. Requesting a non-hardened child fails with
//! [`Error::NotHardened`].

use hmac::{Hmac, Mac as _};
use ripemd::Ripemd160;
use sha2::{Digest as _, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::bip32path::{Path, HARDENED};

mod nist256p1;
mod secp256k1;

/// Size, in bytes, of a chain code.
pub const CHAIN_CODE_SIZE: usize = 32;
/// Size, in bytes, of a serialized private key.
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size, in bytes, of a serialized public key.
pub const PUBLIC_KEY_SIZE: usize = 33;
/// Size, in bytes, of a key fingerprint.
pub const FINGERPRINT_SIZE: usize = 4;

/// Number of in-place retries of one derivation step before [`Error::InvalidKey`] is treated
/// as fatal. One retry triggering is already a once-in-a-lifetime event; 256 of them in a row
/// will not happen.
const MAX_RETRIES: usize = 256;

/// Curves for which SLIP-10 defines a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Secp256k1,
    Nist256p1,
    Ed25519,
}

impl Curve {
    /// The HMAC key used for master key generation.
    fn hmac_key(self) -> &'static [u8] {
        match self {
            Curve::Secp256k1 => b"Bitcoin seed",
            Curve::Nist256p1 => b"Nist256p1 seed",
            Curve::Ed25519 => b"ed25519 seed",
        }
    }

    /// The canonical name of the curve.
    pub fn name(self) -> &'static str {
        match self {
            Curve::Secp256k1 => "secp256k1",
            Curve::Nist256p1 => "nist256p1",
            Curve::Ed25519 => "ed25519",
        }
    }

    fn validate_private_key(self, buf: &[u8; PRIVATE_KEY_SIZE]) -> Result<(), Error> {
        match self {
            Curve::Secp256k1 => secp256k1::validate_private_key(buf),
            Curve::Nist256p1 => nist256p1::validate_private_key(buf),
            // every 32-byte string is a valid Ed25519 key
            Curve::Ed25519 => Ok(()),
        }
    }

    fn public_from_private(self, key: &[u8; PRIVATE_KEY_SIZE]) -> [u8; PUBLIC_KEY_SIZE] {
        match self {
            Curve::Secp256k1 => secp256k1::public_from_private(key),
            Curve::Nist256p1 => nist256p1::public_from_private(key),
            Curve::Ed25519 => {
                // serialized with a zero prefix to match the Weierstrass key size
                let private = crate::ed25519::PrivateKey::from_seed(key);
                let mut out = [0; PUBLIC_KEY_SIZE];
                out[1..].copy_from_slice(private.public_key().as_bytes());
                out
            }
        }
    }

    fn shift_private(
        self,
        key: &[u8; PRIVATE_KEY_SIZE],
        shift: &[u8; PRIVATE_KEY_SIZE],
    ) -> Result<[u8; PRIVATE_KEY_SIZE], Error> {
        match self {
            Curve::Secp256k1 => secp256k1::shift_private(key, shift),
            Curve::Nist256p1 => nist256p1::shift_private(key, shift),
            // no scalar addition, the intermediate key is the child key
            Curve::Ed25519 => Ok(*shift),
        }
    }

    fn shift_public(
        self,
        key: &[u8; PUBLIC_KEY_SIZE],
        shift: &[u8; PRIVATE_KEY_SIZE],
    ) -> Result<[u8; PUBLIC_KEY_SIZE], Error> {
        match self {
            Curve::Secp256k1 => secp256k1::shift_public(key, shift),
            Curve::Nist256p1 => nist256p1::shift_public(key, shift),
            Curve::Ed25519 => unreachable!("ed25519 public keys are never shifted"),
        }
    }
}

/// Error of a derivation step.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Error {
    /// The derived scalar or point is invalid. Retried internally; surfacing this to a caller
    /// means 256 retries in a row failed, which is cryptographically unreachable.
    #[display(fmt = "invalid key")]
    InvalidKey,
    /// A hardened child was requested from an extended public key.
    #[display(fmt = "cannot create hardened child from public parent key")]
    HardenedFromPublic,
    /// A non-hardened Ed25519 child was requested.
    #[display(fmt = "only hardened key generation supported")]
    NotHardened,
}

#[derive(Clone, Debug)]
enum Key {
    Private(Zeroizing<[u8; PRIVATE_KEY_SIZE]>),
    Public([u8; PUBLIC_KEY_SIZE]),
}

/// A SLIP-10 extended private or public key.
#[derive(Clone, Debug)]
pub struct ExtendedKey {
    curve: Curve,
    chain_code: [u8; CHAIN_CODE_SIZE],
    key: Key,
    /// Serialized public key of the parent, kept only for [`ExtendedKey::fingerprint`].
    parent: Option<[u8; PUBLIC_KEY_SIZE]>,
}

/// Creates the master extended private key for the curve from a seed.
pub fn master_key(seed: &[u8], curve: Curve) -> Result<ExtendedKey, Error> {
    let mut input = Zeroizing::new(seed.to_vec());
    for _ in 0..MAX_RETRIES {
        let i = Zeroizing::new(hmac_sha512(curve.hmac_key(), &[&input]));
        let (left, right) = split(&i);
        if curve.validate_private_key(&left).is_ok() {
            return Ok(ExtendedKey {
                curve,
                chain_code: right,
                key: Key::Private(Zeroizing::new(left)),
                parent: None,
            });
        }
        // invalid candidate: re-absorb the whole HMAC output as the new seed
        input = Zeroizing::new(i.to_vec());
    }
    Err(Error::InvalidKey)
}

/// Derives the extended private key at `path`, starting from the master key of `seed`.
pub fn derive_key_from_path(seed: &[u8], curve: Curve, path: &Path) -> Result<ExtendedKey, Error> {
    let mut key = master_key(seed, curve)?;
    for index in path {
        key = key.derive_child(index)?;
    }
    Ok(key)
}

impl ExtendedKey {
    /// The curve this key belongs to.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The chain code accompanying the key.
    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_SIZE] {
        &self.chain_code
    }

    /// Whether this is an extended private key.
    pub fn is_private(&self) -> bool {
        matches!(self.key, Key::Private(_))
    }

    /// The SLIP-10 serialization of the key itself: 32 bytes for a private key, 33 bytes for
    /// a public one.
    pub fn key_bytes(&self) -> Vec<u8> {
        match &self.key {
            Key::Private(key) => key.to_vec(),
            Key::Public(key) => key.to_vec(),
        }
    }

    /// The serialized public key: SEC1 compressed for the Weierstrass curves, `0x00` followed
    /// by the Ed25519 public key otherwise.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        match &self.key {
            Key::Private(key) => self.curve.public_from_private(key),
            Key::Public(key) => *key,
        }
    }

    /// The public view of this extended key: same chain code, public key material.
    ///
    /// Child derivation on the result is limited to non-hardened indexes.
    pub fn public_key(&self) -> ExtendedKey {
        ExtendedKey {
            curve: self.curve,
            chain_code: self.chain_code,
            key: Key::Public(self.public_key_bytes()),
            parent: self.parent,
        }
    }

    /// The Ed25519 key pair of an extended Ed25519 private key, `None` for any other key.
    pub fn ed25519_keypair(&self) -> Option<(crate::ed25519::PublicKey, crate::ed25519::PrivateKey)> {
        match (&self.key, self.curve) {
            (Key::Private(key), Curve::Ed25519) => {
                let private = crate::ed25519::PrivateKey::from_seed(key);
                Some((private.public_key(), private))
            }
            _ => None,
        }
    }

    /// First four bytes of `RIPEMD-160(SHA-256(serialized parent public key))`, or all zeros
    /// for a master key.
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_SIZE] {
        match &self.parent {
            None => [0; FINGERPRINT_SIZE],
            Some(parent) => {
                let digest = Ripemd160::digest(Sha256::digest(parent));
                digest[..FINGERPRINT_SIZE].try_into().unwrap()
            }
        }
    }

    /// Derives the extended child key with the given index.
    ///
    /// If this is an extended public key, the child is an extended public key as well.
    pub fn derive_child(&self, index: u32) -> Result<ExtendedKey, Error> {
        if self.curve == Curve::Ed25519 && index < HARDENED {
            return Err(Error::NotHardened);
        }

        let mut i = Zeroizing::new(if index >= HARDENED {
            let Key::Private(key) = &self.key else {
                return Err(Error::HardenedFromPublic);
            };
            hmac_sha512(&self.chain_code, &[&[0x00], &key[..], &index.to_be_bytes()])
        } else {
            hmac_sha512(&self.chain_code, &[&self.public_key_bytes(), &index.to_be_bytes()])
        });

        for _ in 0..MAX_RETRIES {
            let (left, right) = split(&i);
            match self.shift(&left) {
                Ok(key) => {
                    return Ok(ExtendedKey {
                        curve: self.curve,
                        chain_code: right,
                        key,
                        parent: Some(self.public_key_bytes()),
                    });
                }
                // invalid candidate: re-run the HMAC on the right half
                Err(Error::InvalidKey) => {
                    i = Zeroizing::new(hmac_sha512(
                        &self.chain_code,
                        &[&[0x01], &right, &index.to_be_bytes()],
                    ));
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::InvalidKey)
    }

    fn shift(&self, left: &[u8; PRIVATE_KEY_SIZE]) -> Result<Key, Error> {
        match &self.key {
            Key::Private(key) => self
                .curve
                .shift_private(key, left)
                .map(|key| Key::Private(Zeroizing::new(key))),
            Key::Public(key) => self.curve.shift_public(key, left).map(Key::Public),
        }
    }
}

fn hmac_sha512(key: &[u8], data: &[&[u8]]) -> [u8; 64] {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(key).expect("HMAC-SHA-512 accepts keys of any size");
    for part in data {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

fn split(i: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    (i[..32].try_into().unwrap(), i[32..].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(seed: &str, curve: Curve, path: &str) -> ExtendedKey {
        let seed = hex::decode(seed).unwrap();
        derive_key_from_path(&seed, curve, &path.parse().unwrap()).unwrap()
    }

    fn check(key: &ExtendedKey, chain: &str, private: &str, public: &str) {
        assert_eq!(hex::encode(key.chain_code()), chain, "chain code");
        assert_eq!(hex::encode(key.key_bytes()), private, "private key");
        assert_eq!(hex::encode(key.public_key_bytes()), public, "public key");
    }

    const SEED1: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn ed25519_vector_1() {
        let cases = [
            (
                "m",
                "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb",
                "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7",
                "00a4b2856bfec510abab89753fac1ac0e1112364e7d250545963f135f2a33188ed",
            ),
            (
                "m/0'",
                "8b59aa11380b624e81507a27fedda59fea6d0b779a778918a2fd3590e16e9c69",
                "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3",
                "008c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c",
            ),
            (
                "m/0'/1'",
                "a320425f77d1b5c2505a6b1b27382b37368ee640e3557c315416801243552f14",
                "b1d0bad404bf35da785a64ca1ac54b2617211d2777696fbffaf208f746ae84f2",
                "001932a5270f335bed617d5b935c80aedb1a35bd9fc1e31acafd5372c30f5c1187",
            ),
            (
                "m/0'/1'/2'",
                "2e69929e00b5ab250f49c3fb1c12f252de4fed2c1db88387094a0f8c4c9ccd6c",
                "92a5b23c0b8a99e37d07df3fb9966917f5d06e02ddbd909c7e184371463e9fc9",
                "00ae98736566d30ed0e9d2f4486a64bc95740d89c7db33f52121f8ea8f76ff0fc1",
            ),
            (
                "m/0'/1'/2'/2'",
                "8f6d87f93d750e0efccda017d662a1b31a266e4a6f5993b15f5c1f07f74dd5cc",
                "30d1dc7e5fc04c31219ab25a27ae00b50f6fd66622f6e9c913253d6511d1e662",
                "008abae2d66361c879b900d204ad2cc4984fa2aa344dd7ddc46007329ac76c429c",
            ),
            (
                "m/0'/1'/2'/2'/1000000000'",
                "68789923a0cac2cd5a29172a475fe9e0fb14cd6adb5ad98a3fa70333e7afa230",
                "8f94d394a8e8fd6b1bc2f3f49f5c47e385281d5c17e65324b0f62483e37e8793",
                "003c24da049451555d51a7014a37337aa4e12d41e485abccfa46b47dfb2af54b7a",
            ),
        ];
        for (path, chain, private, public) in cases {
            check(&derive(SEED1, Curve::Ed25519, path), chain, private, public);
        }
    }

    #[test]
    fn secp256k1_vector_1() {
        let cases = [
            (
                "m",
                "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508",
                "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35",
                "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2",
            ),
            (
                "m/0'",
                "47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141",
                "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea",
                "035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56",
            ),
            (
                "m/0'/1",
                "2a7857631386ba23dacac34180dd1983734e444fdbf774041578e9b6adb37c19",
                "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368",
                "03501e454bf00751f24b1b489aa925215d66af2234e3891c3b21a52bedb3cd711c",
            ),
            (
                "m/0'/1/2'",
                "04466b9cc8e161e966409ca52986c584f07e9dc81f735db683c3ff6ec7b1503f",
                "cbce0d719ecf7431d88e6a89fa1483e02e35092af60c042b1df2ff59fa424dca",
                "0357bfe1e341d01c69fe5654309956cbea516822fba8a601743a012a7896ee8dc2",
            ),
            (
                "m/0'/1/2'/2",
                "cfb71883f01676f587d023cc53a35bc7f88f724b1f8c2892ac1275ac822a3edd",
                "0f479245fb19a38a1954c5c7c0ebab2f9bdfd96a17563ef28a6a4b1a2a764ef4",
                "02e8445082a72f29b75ca48748a914df60622a609cacfce8ed0e35804560741d29",
            ),
            (
                "m/0'/1/2'/2/1000000000",
                "c783e67b921d2beb8f6b389cc646d7263b4145701dadd2161548a8b078e65e9e",
                "471b76e389e528d6de6d816857e012c5455051cad6660850e58372a6c3e6e7c8",
                "022a471424da5e657499d1ff51cb43c47481a03b1e77f951fe64cec9f5a48f7011",
            ),
        ];
        for (path, chain, private, public) in cases {
            check(&derive(SEED1, Curve::Secp256k1, path), chain, private, public);
        }
    }

    const SEED2: &str = "fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a2\
                         9f9c999693908d8a8784817e7b7875726f6c696663605d5a5754514e4b484542";

    #[test]
    fn ed25519_vector_2() {
        let cases = [
            (
                "m",
                "ef70a74db9c3a5af931b5fe73ed8e1a53464133654fd55e7a66f8570b8e33c3b",
                "171cb88b1b3c1db25add599712e36245d75bc65a1a5c9e18d76f9f2b1eab4012",
                "008fe9693f8fa62a4305a140b9764c5ee01e455963744fe18204b4fb948249308a",
            ),
            (
                "m/0'",
                "0b78a3226f915c082bf118f83618a618ab6dec793752ecd7c91c44bcaa027d4c",
                "1559eb2bbec5790b0c65d8693e4d0875b1747f4970ae8b650486ed7470845635",
                "0086fab68dcb57aa196c77c5f264f215a112c22a912c10d123b0d03c3c28ef1037",
            ),
        ];
        for (path, chain, private, public) in cases {
            check(&derive(SEED2, Curve::Ed25519, path), chain, private, public);
        }
    }

    #[test]
    fn secp256k1_vector_2() {
        let cases = [
            (
                "m",
                "60499f801b896d83179a4374aeb7822aaeaceaa0db1f85ee3e904c4defbd9689",
                "4b03d6fc340455b363f51020ad3ecca4f0850280cf436c70c727923f6db46c3e",
                "03cbcaa9c98c877a26977d00825c956a238e8dddfbd322cce4f74b0b5bd6ace4a7",
            ),
            (
                "m/0",
                "f0909affaa7ee7abe5dd4e100598d4dc53cd709d5a5c2cac40e7412f232f7c9c",
                "abe74a98f6c7eabee0428f53798f0ab8aa1bd37873999041703c742f15ac7e1e",
                "02fc9e5af0ac8d9b3cecfe2a888e2117ba3d089d8585886c9c826b6b22a98d12ea",
            ),
        ];
        for (path, chain, private, public) in cases {
            check(&derive(SEED2, Curve::Secp256k1, path), chain, private, public);
        }
    }

    #[test]
    fn public_path_matches_private_then_public() {
        // spec: watch-only derivation of a non-hardened subtree must match deriving privately
        // and projecting
        for curve in [Curve::Secp256k1, Curve::Nist256p1] {
            let account = derive(SEED1, curve, "m/44'/4218'/0'");
            let watch_only = account.public_key();
            for index in [0u32, 1, 2, 1000] {
                let private = account.derive_child(index).unwrap();
                let public = watch_only.derive_child(index).unwrap();
                assert!(!public.is_private());
                assert_eq!(private.public_key_bytes(), public.public_key_bytes());
                assert_eq!(private.chain_code(), public.chain_code());
                assert_eq!(private.fingerprint(), public.fingerprint());
            }
        }
    }

    #[test]
    fn hardened_from_public_fails() {
        for curve in [Curve::Secp256k1, Curve::Nist256p1, Curve::Ed25519] {
            let master = master_key(&hex::decode(SEED1).unwrap(), curve).unwrap();
            let public = master.public_key();
            assert_eq!(
                public.derive_child(HARDENED).unwrap_err(),
                Error::HardenedFromPublic,
                "{}",
                curve.name()
            );
        }
    }

    #[test]
    fn ed25519_rejects_non_hardened() {
        let master = master_key(&hex::decode(SEED1).unwrap(), Curve::Ed25519).unwrap();
        assert_eq!(master.derive_child(0).unwrap_err(), Error::NotHardened);
        assert_eq!(master.derive_child(HARDENED - 1).unwrap_err(), Error::NotHardened);
        assert_eq!(
            master.public_key().derive_child(0).unwrap_err(),
            Error::NotHardened
        );
        assert!(master.derive_child(HARDENED).is_ok());
    }

    #[test]
    fn fingerprints() {
        let master = master_key(&hex::decode(SEED1).unwrap(), Curve::Secp256k1).unwrap();
        assert_eq!(master.fingerprint(), [0; FINGERPRINT_SIZE]);
        // BIP-32 vector 1: the fingerprint of m/0' is derived from the master public key
        let child = master.derive_child(HARDENED).unwrap();
        assert_eq!(hex::encode(child.fingerprint()), "3442193e");
        assert_ne!(child.fingerprint(), [0; FINGERPRINT_SIZE]);
    }

    #[test]
    fn ed25519_keypair_is_consistent() {
        let key = derive(SEED1, Curve::Ed25519, "m/0'");
        let (public, private) = key.ed25519_keypair().unwrap();
        assert_eq!(private.public_key(), public);
        assert_eq!(&key.public_key_bytes()[1..], public.as_bytes());
        assert!(derive(SEED1, Curve::Secp256k1, "m/0'").ed25519_keypair().is_none());

        let message = b"tanglekit";
        let signature = private.sign(message);
        assert!(crate::ed25519::verify(&public, message, &signature));
    }
}
