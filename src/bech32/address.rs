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

//! The typed address layer on top of Bech32.
//!
//! An address is a hash with a one-byte version tag in front: `0x00` for an Ed25519 address
//! (the BLAKE2b-256 hash of the public key), `0x08` for an alias address and `0x10` for an NFT
//! address (both the BLAKE2b-160 hash of the 34-byte output identifier that created them). The
//! tagged bytes are what travels inside the Bech32 data part; the human-readable prefix picks
//! the network.

use blake2_rfc::blake2b::blake2b;

use crate::bech32::{self, SyntaxError};
use crate::ed25519;

/// Size, in bytes, of an output identifier.
pub const OUTPUT_ID_SIZE: usize = 34;

/// Size, in bytes, of a BLAKE2b-160 hash.
const BLAKE2B_160_SIZE: usize = 20;
/// Size, in bytes, of a BLAKE2b-256 hash.
const BLAKE2B_256_SIZE: usize = 32;

/// The network prefixes with a defined human-readable part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    IotaMainnet,
    IotaDevnet,
    ShimmerMainnet,
    ShimmerDevnet,
}

impl Prefix {
    /// All defined prefixes.
    pub fn all() -> impl ExactSizeIterator<Item = Prefix> {
        [
            Prefix::IotaMainnet,
            Prefix::IotaDevnet,
            Prefix::ShimmerMainnet,
            Prefix::ShimmerDevnet,
        ]
        .into_iter()
    }

    /// The human-readable part of the prefix.
    pub fn hrp(self) -> &'static str {
        match self {
            Prefix::IotaMainnet => "iota",
            Prefix::IotaDevnet => "atoi",
            Prefix::ShimmerMainnet => "smr",
            Prefix::ShimmerDevnet => "rms",
        }
    }
}

impl core::str::FromStr for Prefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::all().find(|p| p.hrp() == s).ok_or(ParseError::InvalidPrefix)
    }
}

impl core::fmt::Display for Prefix {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.hrp())
    }
}

/// Error while parsing a Bech32 address string.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ParseError {
    /// The Bech32 layer itself rejected the string.
    #[display(fmt = "invalid bech32 encoding: {}", _0)]
    Bech32(SyntaxError),
    /// The human-readable part is not a known network prefix.
    #[display(fmt = "invalid prefix")]
    InvalidPrefix,
    /// The version byte is missing or unknown.
    #[display(fmt = "invalid version")]
    InvalidVersion,
    /// The hash length does not match the version.
    #[display(fmt = "invalid length")]
    InvalidLength,
}

impl From<SyntaxError> for ParseError {
    fn from(err: SyntaxError) -> ParseError {
        ParseError::Bech32(err)
    }
}

/// An address of one of the defined kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// BLAKE2b-256 hash of an Ed25519 public key.
    Ed25519([u8; BLAKE2B_256_SIZE]),
    /// BLAKE2b-160 hash of the output that created the alias.
    Alias([u8; BLAKE2B_160_SIZE]),
    /// BLAKE2b-160 hash of the output that created the NFT.
    Nft([u8; BLAKE2B_160_SIZE]),
}

impl Address {
    /// The one-byte version tag of the address kind.
    pub fn version(&self) -> u8 {
        match self {
            Address::Ed25519(_) => 0x00,
            Address::Alias(_) => 0x08,
            Address::Nft(_) => 0x10,
        }
    }

    /// The name of the address kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Address::Ed25519(_) => "Ed25519",
            Address::Alias(_) => "Alias",
            Address::Nft(_) => "NFT",
        }
    }

    /// The hash carried by the address.
    pub fn hash(&self) -> &[u8] {
        match self {
            Address::Ed25519(hash) => hash,
            Address::Alias(hash) => hash,
            Address::Nft(hash) => hash,
        }
    }

    /// The serialization `version || hash`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.hash().len());
        bytes.push(self.version());
        bytes.extend_from_slice(self.hash());
        bytes
    }

    /// Encodes the address as a Bech32 string under the given network prefix.
    pub fn to_bech32(&self, prefix: Prefix) -> String {
        // the payload is far below every length limit, encoding cannot fail
        bech32::encode(prefix.hrp(), &self.to_bytes()).unwrap()
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&hex::encode(self.hash()))
    }
}

/// The Ed25519 address of a public key.
pub fn from_public_key(public_key: &ed25519::PublicKey) -> Address {
    let hash = blake2b(BLAKE2B_256_SIZE, &[], public_key.as_ref());
    Address::Ed25519(hash.as_bytes().try_into().unwrap())
}

/// The alias address created by the given output.
pub fn alias_from_output_id(output_id: &[u8; OUTPUT_ID_SIZE]) -> Address {
    Address::Alias(blake2b_160(output_id))
}

/// The NFT address created by the given output.
pub fn nft_from_output_id(output_id: &[u8; OUTPUT_ID_SIZE]) -> Address {
    Address::Nft(blake2b_160(output_id))
}

fn blake2b_160(data: &[u8]) -> [u8; BLAKE2B_160_SIZE] {
    blake2b(BLAKE2B_160_SIZE, &[], data).as_bytes().try_into().unwrap()
}

/// Decodes a Bech32 address string into its network prefix and address.
pub fn parse_bech32(s: &str) -> Result<(Prefix, Address), ParseError> {
    let (hrp, bytes) = bech32::decode(s)?;
    let prefix: Prefix = hrp.parse()?;
    let (version, hash) = bytes.split_first().ok_or(ParseError::InvalidVersion)?;
    let address = match version {
        0x00 => Address::Ed25519(hash.try_into().map_err(|_| ParseError::InvalidLength)?),
        0x08 => Address::Alias(hash.try_into().map_err(|_| ParseError::InvalidLength)?),
        0x10 => Address::Nft(hash.try_into().map_err(|_| ParseError::InvalidLength)?),
        _ => return Err(ParseError::InvalidVersion),
    };
    Ok((prefix, address))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_key() -> ed25519::PublicKey {
        let bytes =
            hex::decode("52fdfc072182654f163f5f0f9a621d729566c74d10037c4d7bbb0407d1e2c649")
                .unwrap();
        ed25519::PublicKey::from_bytes(bytes.try_into().unwrap())
    }

    #[test]
    fn ed25519_address_round_trip() {
        let address = from_public_key(&public_key());
        assert_eq!(address.version(), 0x00);
        assert_eq!(address.hash().len(), 32);
        assert_eq!(address.to_bytes().len(), 33);

        let encoded = address.to_bech32(Prefix::IotaMainnet);
        assert!(encoded.starts_with("iota1"));
        let (prefix, decoded) = parse_bech32(&encoded).unwrap();
        assert_eq!(prefix, Prefix::IotaMainnet);
        assert_eq!(decoded, address);
    }

    #[test]
    fn every_version_round_trips_under_every_prefix() {
        let output_id = [0xab; OUTPUT_ID_SIZE];
        let addresses =
            [from_public_key(&public_key()), alias_from_output_id(&output_id), nft_from_output_id(&output_id)];
        for prefix in Prefix::all() {
            for address in &addresses {
                let (parsed_prefix, parsed) = parse_bech32(&address.to_bech32(prefix)).unwrap();
                assert_eq!(parsed_prefix, prefix);
                assert_eq!(parsed, *address);
            }
        }
    }

    #[test]
    fn alias_and_nft_differ_only_in_the_version() {
        let output_id = [0x11; OUTPUT_ID_SIZE];
        let alias = alias_from_output_id(&output_id);
        let nft = nft_from_output_id(&output_id);
        assert_eq!(alias.hash(), nft.hash());
        assert_eq!(alias.version(), 0x08);
        assert_eq!(nft.version(), 0x10);
        assert_ne!(alias.to_bech32(Prefix::ShimmerMainnet), nft.to_bech32(Prefix::ShimmerMainnet));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let address = from_public_key(&public_key());
        let encoded = crate::bech32::encode("btc", &address.to_bytes()).unwrap();
        assert_eq!(parse_bech32(&encoded).unwrap_err(), ParseError::InvalidPrefix);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = from_public_key(&public_key()).to_bytes();
        bytes[0] = 0x42;
        let encoded = crate::bech32::encode("iota", &bytes).unwrap();
        assert_eq!(parse_bech32(&encoded).unwrap_err(), ParseError::InvalidVersion);
        let empty = crate::bech32::encode("iota", &[]).unwrap();
        assert_eq!(parse_bech32(&empty).unwrap_err(), ParseError::InvalidVersion);
    }

    #[test]
    fn wrong_hash_length_is_rejected() {
        let encoded = crate::bech32::encode("iota", &[0x00; 21]).unwrap();
        assert_eq!(parse_bech32(&encoded).unwrap_err(), ParseError::InvalidLength);
        let encoded = crate::bech32::encode("iota", &[0x08; 33]).unwrap();
        assert_eq!(parse_bech32(&encoded).unwrap_err(), ParseError::InvalidLength);
    }

    #[test]
    fn syntax_errors_pass_through() {
        assert!(matches!(parse_bech32("iota1qqqqqq").unwrap_err(), ParseError::Bech32(_)));
    }
}
