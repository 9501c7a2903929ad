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

//! Migration addresses: an Ed25519 address rendered on the legacy trit wire.
//!
//! During the transition away from the ternary address format, funds were moved by sending
//! them to a specially marked legacy address that embeds the new-format target. The rendering
//! is 81 trytes: the fixed prefix `MIGRATION`, then the [`b1t6`](crate::encoding::b1t6) trytes
//! of the 32-byte Ed25519 address hash followed by a 4-byte SHA-256 checksum over that hash.

use sha2::{Digest as _, Sha256};

use crate::encoding::b1t6;

/// Size, in bytes, of the embedded Ed25519 address hash.
pub const ADDRESS_SIZE: usize = 32;
/// Size, in bytes, of the appended checksum.
const CHECKSUM_SIZE: usize = 4;
/// The tryte prefix marking a migration address.
const PREFIX: &str = "MIGRATION";
/// Total length of the rendering, in trytes.
const TRYTES_SIZE: usize = 81;

/// Error while decoding a migration address.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Error {
    /// The input is not exactly 81 trytes.
    #[display(fmt = "invalid trytes length")]
    InvalidLength,
    /// The input does not start with the `MIGRATION` prefix.
    #[display(fmt = "invalid prefix")]
    InvalidPrefix,
    /// The payload is not a valid b1t6 encoding.
    #[display(fmt = "invalid address encoding")]
    InvalidEncoding,
    /// The embedded checksum does not match the address hash.
    #[display(fmt = "invalid checksum")]
    InvalidChecksum,
}

/// Renders an Ed25519 address hash as an 81-tryte migration address.
pub fn encode(address: &[u8; ADDRESS_SIZE]) -> String {
    let checksum = Sha256::digest(address);
    let mut payload = [0u8; ADDRESS_SIZE + CHECKSUM_SIZE];
    payload[..ADDRESS_SIZE].copy_from_slice(address);
    payload[ADDRESS_SIZE..].copy_from_slice(&checksum[..CHECKSUM_SIZE]);

    let mut trytes = String::with_capacity(TRYTES_SIZE);
    trytes.push_str(PREFIX);
    trytes.push_str(&b1t6::encode_to_trytes(&payload));
    trytes
}

/// Decodes an 81-tryte migration address back into the Ed25519 address hash, verifying the
/// checksum.
pub fn decode(trytes: &str) -> Result<[u8; ADDRESS_SIZE], Error> {
    if trytes.len() != TRYTES_SIZE {
        return Err(Error::InvalidLength);
    }
    if !trytes.is_ascii() {
        return Err(Error::InvalidEncoding);
    }
    let payload = trytes.strip_prefix(PREFIX).ok_or(Error::InvalidPrefix)?;

    let address_trytes_len = 2 * ADDRESS_SIZE;
    let address =
        b1t6::decode_trytes(&payload[..address_trytes_len]).map_err(|_| Error::InvalidEncoding)?;
    let checksum =
        b1t6::decode_trytes(&payload[address_trytes_len..]).map_err(|_| Error::InvalidEncoding)?;

    let expected = Sha256::digest(&address);
    if checksum != expected[..CHECKSUM_SIZE] {
        return Err(Error::InvalidChecksum);
    }
    Ok(address.try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> [u8; ADDRESS_SIZE] {
        let mut address = [0u8; ADDRESS_SIZE];
        for (i, b) in address.iter_mut().enumerate() {
            *b = i as u8;
        }
        address
    }

    #[test]
    fn round_trip() {
        let trytes = encode(&address());
        assert_eq!(trytes.len(), TRYTES_SIZE);
        assert!(trytes.starts_with("MIGRATION"));
        assert_eq!(decode(&trytes).unwrap(), address());
    }

    #[test]
    fn length_is_checked_first() {
        assert_eq!(decode("MIGRATION"), Err(Error::InvalidLength));
        let trytes = encode(&address());
        assert_eq!(decode(&trytes[..80]), Err(Error::InvalidLength));
    }

    #[test]
    fn prefix_is_required() {
        let mut trytes = encode(&address());
        trytes.replace_range(0..9, "TRANSFERX");
        assert_eq!(decode(&trytes), Err(Error::InvalidPrefix));
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let mut modified = address();
        modified[0] ^= 0x01;
        let mut trytes = encode(&address());
        // splice the payload of a different address behind the genuine checksum
        trytes.replace_range(9..11, &b1t6::encode_to_trytes(&modified[..1]));
        assert_eq!(decode(&trytes), Err(Error::InvalidChecksum));
    }
}
