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

//! secp256k1 scalar and point operations for the key derivation.

use k256::elliptic_curve::group::Group as _;
use k256::elliptic_curve::sec1::ToEncodedPoint as _;
use k256::elliptic_curve::{Field as _, PrimeField as _};
use k256::{ProjectivePoint, PublicKey, Scalar};

use super::Error;
use crate::slip10::PUBLIC_KEY_SIZE;

fn scalar(buf: &[u8; 32]) -> Result<Scalar, Error> {
    // rejects values at or above the group order
    Option::<Scalar>::from(Scalar::from_repr((*buf).into())).ok_or(Error::InvalidKey)
}

/// Checks that `buf` is a valid private scalar, in `[1, n)`.
pub(super) fn validate_private_key(buf: &[u8; 32]) -> Result<(), Error> {
    let s = scalar(buf)?;
    if bool::from(s.is_zero()) {
        return Err(Error::InvalidKey);
    }
    Ok(())
}

/// Returns the SEC1 compressed encoding of the public key of the given private scalar.
pub(super) fn public_from_private(key: &[u8; 32]) -> [u8; PUBLIC_KEY_SIZE] {
    let s = scalar(key).expect("extended keys always hold valid scalars");
    let point = ProjectivePoint::GENERATOR * s;
    let mut out = [0; PUBLIC_KEY_SIZE];
    out.copy_from_slice(point.to_affine().to_encoded_point(true).as_bytes());
    out
}

/// Computes `(shift + key) mod n`, rejecting out-of-range shifts and a zero result.
pub(super) fn shift_private(key: &[u8; 32], shift: &[u8; 32]) -> Result<[u8; 32], Error> {
    let sum = scalar(shift)? + scalar(key).expect("extended keys always hold valid scalars");
    if bool::from(sum.is_zero()) {
        return Err(Error::InvalidKey);
    }
    Ok(sum.to_repr().into())
}

/// Computes `shift·G + P`, rejecting out-of-range shifts and the identity result.
pub(super) fn shift_public(
    key: &[u8; PUBLIC_KEY_SIZE],
    shift: &[u8; 32],
) -> Result<[u8; PUBLIC_KEY_SIZE], Error> {
    let s = scalar(shift)?;
    let parent = PublicKey::from_sec1_bytes(key)
        .expect("extended keys always hold valid points")
        .to_projective();
    let child = ProjectivePoint::GENERATOR * s + parent;
    if bool::from(child.is_identity()) {
        return Err(Error::InvalidKey);
    }
    let mut out = [0; PUBLIC_KEY_SIZE];
    out.copy_from_slice(child.to_affine().to_encoded_point(true).as_bytes());
    Ok(out)
}
