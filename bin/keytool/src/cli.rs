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

//! Provides the [`CliOptions`] struct that contains all the CLI options that can be passed to
//! the binary.

// Note: the doc-comments applied to the structs and fields below are visible when the binary
// is started with `--help`.

/// Demo tool around the tanglekit key-management and signing primitives.
#[derive(Debug, clap::Parser)]
#[command(about, version)]
pub enum CliOptions {
    /// Encodes a public key or output identifier as a Bech32 address.
    Encode(CliOptionsEncode),
    /// Decodes a Bech32 address.
    Decode(CliOptionsDecode),
    /// Performs the Curl proof of work for a message.
    Mine(CliOptionsMine),
    /// Derives a SLIP-10 key from a mnemonic or a seed.
    Derive(CliOptionsDerive),
    /// Converts entropy to a mnemonic sentence and its master seed.
    Mnemonic(CliOptionsMnemonic),
}

#[derive(Debug, clap::Args)]
pub struct CliOptionsEncode {
    /// Network prefix: iota, atoi, smr or rms.
    #[arg(long, default_value = "iota")]
    pub prefix: String,
    /// Address version: Ed25519, Alias or NFT.
    #[arg(long, default_value = "Ed25519")]
    pub version: String,
    /// Hex-encoded public key (Ed25519) or 34-byte output identifier (Alias, NFT).
    #[arg(long)]
    pub key: String,
}

#[derive(Debug, clap::Args)]
pub struct CliOptionsDecode {
    /// Bech32-encoded address.
    #[arg(long)]
    pub address: String,
}

#[derive(Debug, clap::Args)]
pub struct CliOptionsMine {
    /// Hex-encoded message to prove work for, without the nonce.
    #[arg(long, default_value = "")]
    pub data: String,
    /// Number of trailing zero trits to search for.
    #[arg(long, default_value_t = 9)]
    pub target: usize,
    /// Number of worker threads; defaults to the available parallelism.
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
}

#[derive(Debug, clap::Args)]
pub struct CliOptionsDerive {
    /// Mnemonic sentence to start from; mutually exclusive with --seed.
    #[arg(long, conflicts_with = "seed")]
    pub mnemonic: Option<String>,
    /// Passphrase protecting the mnemonic.
    #[arg(long, default_value = "")]
    pub passphrase: String,
    /// Hex-encoded master seed to start from.
    #[arg(long)]
    pub seed: Option<String>,
    /// Derivation path, e.g. m/44'/4218'/0'/0'.
    #[arg(long, default_value = "m")]
    pub path: String,
    /// Curve to derive for: ed25519, secp256k1 or nist256p1.
    #[arg(long, default_value = "ed25519")]
    pub curve: String,
}

#[derive(Debug, clap::Args)]
pub struct CliOptionsMnemonic {
    /// Hex-encoded entropy; random 256-bit entropy is drawn when omitted.
    #[arg(long)]
    pub entropy: Option<String>,
    /// Wordlist language.
    #[arg(long, default_value = "english")]
    pub language: String,
    /// Passphrase protecting the seed.
    #[arg(long, default_value = "")]
    pub passphrase: String,
}
