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

//! Key-management and signing primitives for Tangle-style distributed ledgers.
//!
//! This library covers the cryptographic path from a human-memorable recovery phrase all the way
//! to usable signing keys and on-the-wire addresses, plus the hashing and encoding primitives
//! that the surrounding protocol uses. It is a library of mechanisms, not policies: nothing in
//! here performs any I/O, holds global mutable state, or talks to a network. Each module is a
//! self-contained building block, and the modules compose in two directions:
//!
//! - The *key-material path*: a [`bip39`] mnemonic is decoded into entropy and stretched into a
//!   64-byte master seed; [`slip10`] derives a tree of extended keys from that seed, following a
//!   [`bip32path`]; the leaf key signs through [`ed25519`] or proves through [`vrf`], or feeds
//!   the legacy [`wots`] one-time-signature scheme.
//!
//! - The *address path*: a public key is hashed and wrapped into a versioned address which is
//!   rendered through [`bech32`]; the legacy trinary rendering lives in [`migration`].
//!
//! The ternary layer ([`trinary`], [`encoding`], [`curl`]) exists because the surrounding
//! protocol historically transported data as balanced-ternary *trits*. The [`pow`] module runs
//! the Curl-P-81 proof-of-work that gates message submission, and is the only multi-threaded
//! component of the library.
//!
//! All operations are deterministic functions of their inputs, except for key generation, which
//! takes the random-number generator as an explicit parameter. Secret material (seeds, private
//! scalars, chain states) is wiped from memory on drop.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod bech32;
pub mod bip32path;
pub mod bip39;
pub mod curl;
pub mod ed25519;
pub mod encoding;
pub mod migration;
pub mod pow;
pub mod slip10;
pub mod trinary;
pub mod vrf;
pub mod wots;
