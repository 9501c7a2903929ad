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

//! The binary-to-ternary codec family.
//!
//! Three distinct codecs coexist on the wire, differing in density and in which side of the
//! conversion is authoritative:
//!
//! - [`b1t6`] maps one byte to six trits (two trytes) by interpreting the byte as a signed
//!   base-27 number. This is the densest byte-to-trit encoding and is used wherever binary data
//!   (hashes, nonces, signatures) must travel over the trit wire.
//! - [`b1t8`] maps one byte to eight trits restricted to `{0, 1}`, one bit per trit,
//!   least-significant bit first. Only an earlier protocol generation uses it.
//! - [`t5b1`] goes the other way and packs five trits into one signed byte, zero-padding the
//!   final group. It is used to persist trit streams in byte-addressed storage.
//!
//! All three codecs are exact: decoding an encoding returns the original input.

pub mod b1t6;
pub mod b1t8;
pub mod t5b1;
