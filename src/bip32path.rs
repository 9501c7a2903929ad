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

//! BIP-32 derivation paths.
//!
//! A derivation path is an ordered list of 32-bit child indexes. Indexes at or above `2³¹` are
//! *hardened*: deriving them requires the parent private key. The textual form separates the
//! indexes with `/` and marks hardened ones with a trailing apostrophe or `H`
//! (`m/44'/4218'/0'/0'` and `m/44H/4218H/0H/0H` are the same path); an optional leading `m` or
//! `m/` denotes the master key, and `m` alone (or the empty string) is the empty path.
//!
//! Numbers must fit into 31 bits *before* the hardened marker is applied; `2147483648` is out
//! of range even though `2147483647'` (which sets the top bit) is fine. Formatting always uses
//! the apostrophe notation.

use core::fmt;
use core::str::FromStr;

use nom::bytes::complete::tag;
use nom::character::complete::{digit1, one_of};
use nom::combinator::{all_consuming, opt};
use nom::multi::separated_list1;
use nom::sequence::pair;

/// The first hardened child index.
pub const HARDENED: u32 = 1 << 31;

/// Error while parsing a derivation path.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ParseError {
    /// The string does not follow the path grammar.
    #[display(fmt = "invalid path format")]
    InvalidFormat,
    /// A segment value does not fit into 31 bits.
    #[display(fmt = "path segment out of range")]
    OutOfRange,
}

/// A parsed BIP-32 derivation path.
///
/// The empty path denotes the master key. Paths are immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<u32>);

impl Path {
    /// The raw child indexes, hardened bit included.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Whether this is the empty (master) path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u32>> for Path {
    fn from(segments: Vec<u32>) -> Path {
        Path(segments)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = u32;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl FromStr for Path {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Path, ParseError> {
        if s.is_empty() || s == "m" {
            return Ok(Path(Vec::new()));
        }
        let s = s.strip_prefix("m/").unwrap_or(s);

        // grammar first: digits with an optional trailing ' or H, separated by /
        let parsed: Result<(_, Vec<(&str, Option<char>)>), nom::Err<nom::error::Error<&str>>> =
            all_consuming(separated_list1(tag("/"), pair(digit1, opt(one_of("'H")))))(s);
        let (_, segments) = parsed.map_err(|_| ParseError::InvalidFormat)?;

        // range second, so that `2147483648'` is an out-of-range error and not a format one
        segments
            .into_iter()
            .map(|(digits, marker)| {
                let value = digits.parse::<u64>().map_err(|_| ParseError::OutOfRange)?;
                if value >= u64::from(HARDENED) {
                    return Err(ParseError::OutOfRange);
                }
                let value = value as u32;
                Ok(if marker.is_some() { value | HARDENED } else { value })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.0 {
            write!(f, "/{}", segment & !HARDENED)?;
            if segment & HARDENED != 0 {
                f.write_str("'")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(segments: &[u32]) -> Path {
        Path::from(segments.to_vec())
    }

    #[test]
    fn parse_accepted_forms() {
        let h = HARDENED;
        let cases: &[(&str, &[u32])] = &[
            ("", &[]),
            ("m", &[]),
            ("m/0H", &[h]),
            ("m/0H/1", &[h, 1]),
            ("m/0H/1/2H", &[h, 1, h + 2]),
            ("m/0H/1/2H/2", &[h, 1, h + 2, 2]),
            ("m/0H/1/2H/2/1000000000", &[h, 1, h + 2, 2, 1000000000]),
            ("0H/1/2H/2/1000000000", &[h, 1, h + 2, 2, 1000000000]),
            ("m/0'", &[h]),
            ("m/0'/1/2'/2", &[h, 1, h + 2, 2]),
            ("0'/1/2'", &[h, 1, h + 2]),
            ("0/2147483647'/1/2147483646'/2", &[0, h + 2147483647, 1, h + 2147483646, 2]),
            ("0/0/0/0/0/0/0/0/0/0/0/0/0/0/0/0", &[0; 16]),
        ];
        for (s, expected) in cases {
            assert_eq!(s.parse::<Path>().as_ref(), Ok(&p(expected)), "{}", s);
        }
    }

    #[test]
    fn parse_out_of_range() {
        for s in ["44'/2147483648", "44'/2147483648'", "44'/9999999999999999999999"] {
            assert_eq!(s.parse::<Path>(), Err(ParseError::OutOfRange), "{}", s);
        }
    }

    #[test]
    fn parse_invalid_format() {
        for s in
            ["44'/-1", "44'//0", "/0'/1/2'", "44'/'", "44'/'0", "44'/0h", "44'/0''", "44'/0H'", "wrong"]
        {
            assert_eq!(s.parse::<Path>(), Err(ParseError::InvalidFormat), "{}", s);
        }
    }

    #[test]
    fn format_uses_apostrophes() {
        for s in ["m", "m/0'", "m/0'/1", "m/0'/1/2'", "m/0'/1/2'/2", "m/0'/1/2'/2/1000000000"] {
            assert_eq!(s.parse::<Path>().unwrap().to_string(), s, "{}", s);
        }
        // the H notation formats back as apostrophes
        assert_eq!("m/44H/0H".parse::<Path>().unwrap().to_string(), "m/44'/0'");
    }
}
