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

//! BIP-39 mnemonic sentences.
//!
//! A mnemonic sentence is the human-memorable form of a high-entropy secret. The entropy is
//! split into 11-bit groups, each group indexing one word of a 2048-word dictionary, with a
//! SHA-256 checksum appended so that copying mistakes are caught. The reverse direction
//! recovers the entropy and verifies the checksum. Finally, the sentence is stretched through
//! 2048 iterations of PBKDF2-HMAC-SHA-512 into the 64-byte master seed that key derivation
//! starts from.
//!
//! Note that the seed is derived from the *sentence*, not from the entropy: two different
//! dictionaries yield different seeds for the same entropy. Which dictionary to use is
//! therefore an input to every operation here; see [`wordlist`].
//!
//! Input sentences are NFKD-normalized and split on Unicode whitespace (including the
//! ideographic space that Japanese sentences are traditionally joined with), per the BIP-39
//! specification.

use sha2::{Digest as _, Sha256};
use unicode_normalization::UnicodeNormalization as _;
use zeroize::{Zeroize as _, Zeroizing};

use crate::bip39::wordlist::{Wordlist, INDEX_BITS, WORD_COUNT};

pub mod wordlist;

/// Number of PBKDF2 iterations used for the seed derivation.
const PBKDF2_ROUNDS: u32 = 2048;

/// Size, in bytes, of the derived master seed.
pub const SEED_SIZE: usize = 64;

const ENTROPY_MULTIPLE_BITS: usize = 32;
const ENTROPY_MIN_BITS: usize = 128;
const ENTROPY_MAX_BITS: usize = 512;

/// Error of the mnemonic conversions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Error {
    /// The entropy bit-count is not a multiple of 32 in `[128, 512]`.
    #[display(fmt = "invalid entropy size: unsupported bit size ({})", _0)]
    InvalidEntropySize(usize),
    /// The sentence has an unsupported word count.
    #[display(fmt = "invalid mnemonic: unsupported word count ({})", _0)]
    InvalidWordCount(usize),
    /// A word of the sentence is not part of the dictionary.
    #[display(fmt = "invalid mnemonic: invalid word ({})", _0)]
    InvalidWord(String),
    /// The checksum bits do not match the entropy.
    #[display(fmt = "invalid checksum")]
    InvalidChecksum,
}

/// An ordered list of mnemonic words.
///
/// No dictionary membership is implied; a `Mnemonic` is only a normalized, whitespace-split
/// sentence. Validation happens in [`mnemonic_to_entropy`] and [`mnemonic_to_seed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mnemonic(Vec<String>);

impl Mnemonic {
    /// Parses `s` as a whitespace-separated list of NFKD-normalized words.
    pub fn parse(s: &str) -> Mnemonic {
        let normalized: String = s.nfkd().collect();
        Mnemonic(normalized.split_whitespace().map(str::to_owned).collect())
    }

    /// Number of words in the sentence.
    pub fn word_count(&self) -> usize {
        self.0.len()
    }

    /// The words of the sentence, in order.
    pub fn words(&self) -> impl ExactSizeIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl core::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl core::str::FromStr for Mnemonic {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Mnemonic::parse(s))
    }
}

impl Drop for Mnemonic {
    fn drop(&mut self) {
        for word in &mut self.0 {
            word.zeroize();
        }
    }
}

/// Encodes `entropy` as a mnemonic sentence over the given dictionary.
///
/// The entropy must be 128 to 512 bits long in multiples of 32 bits; the resulting sentence
/// has `3 * bits / 32` words.
pub fn entropy_to_mnemonic(entropy: &[u8], wordlist: &Wordlist) -> Result<Mnemonic, Error> {
    validate_entropy(entropy)?;

    let checksum = Sha256::digest(entropy);
    let bits = BitReader::new(entropy, &checksum);

    let word_count = entropy.len() * 8 * 3 / ENTROPY_MULTIPLE_BITS;
    let mut words = Vec::with_capacity(word_count);
    for i in 0..word_count {
        let index = bits.read(i * INDEX_BITS);
        words.push(wordlist.word(index).to_owned());
    }
    Ok(Mnemonic(words))
}

/// Decodes a mnemonic sentence back into its entropy, verifying the checksum.
///
/// The word count and dictionary membership are checked before the checksum, so an unknown
/// word is always reported as [`Error::InvalidWord`] rather than as a checksum mismatch.
pub fn mnemonic_to_entropy(
    mnemonic: &Mnemonic,
    wordlist: &Wordlist,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let indexes = validate_mnemonic(mnemonic, wordlist)?;

    // 33 entropy-plus-checksum bits for every 3 words
    let total_bits = indexes.len() * INDEX_BITS;
    let entropy_bits = total_bits * 32 / 33;

    let mut buf = Zeroizing::new(vec![0u8; (total_bits + 7) / 8]);
    for (i, &index) in indexes.iter().enumerate() {
        write_bits(&mut buf, i * INDEX_BITS, index);
    }

    let entropy = Zeroizing::new(buf[..entropy_bits / 8].to_vec());
    let checksum = Sha256::digest(&entropy[..]);

    // compare the leading ENT/32 checksum bits
    let checksum_bits = entropy_bits / 32;
    for i in 0..checksum_bits {
        let expected = checksum[i / 8] >> (7 - i % 8) & 1;
        let stored = buf[entropy_bits / 8 + i / 8] >> (7 - i % 8) & 1;
        if expected != stored {
            return Err(Error::InvalidChecksum);
        }
    }
    Ok(entropy)
}

/// Derives the 64-byte master seed from a mnemonic sentence and a passphrase.
///
/// The sentence is validated (word count, dictionary membership, checksum) before any key
/// stretching happens.
pub fn mnemonic_to_seed(
    mnemonic: &Mnemonic,
    passphrase: &str,
    wordlist: &Wordlist,
) -> Result<Zeroizing<[u8; SEED_SIZE]>, Error> {
    validate_mnemonic(mnemonic, wordlist)?;

    let password = Zeroizing::new(
        mnemonic.to_string().nfkd().collect::<String>(),
    );
    let salt = Zeroizing::new(
        "mnemonic".chars().chain(passphrase.nfkd()).collect::<String>(),
    );

    let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
    pbkdf2::pbkdf2_hmac::<sha2::Sha512>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ROUNDS,
        &mut seed[..],
    );
    Ok(seed)
}

fn validate_entropy(entropy: &[u8]) -> Result<(), Error> {
    let bits = entropy.len() * 8;
    if bits % ENTROPY_MULTIPLE_BITS != 0 || !(ENTROPY_MIN_BITS..=ENTROPY_MAX_BITS).contains(&bits)
    {
        return Err(Error::InvalidEntropySize(bits));
    }
    Ok(())
}

/// Checks word count and dictionary membership, returning the word indexes.
fn validate_mnemonic(mnemonic: &Mnemonic, wordlist: &Wordlist) -> Result<Vec<u16>, Error> {
    let count = mnemonic.word_count();
    let min_words = 3 * ENTROPY_MIN_BITS / ENTROPY_MULTIPLE_BITS;
    let max_words = 3 * ENTROPY_MAX_BITS / ENTROPY_MULTIPLE_BITS;
    if count % 3 != 0 || !(min_words..=max_words).contains(&count) {
        return Err(Error::InvalidWordCount(count));
    }
    mnemonic
        .words()
        .map(|word| {
            wordlist.index_of(word).ok_or_else(|| Error::InvalidWord(word.to_owned()))
        })
        .collect()
}

/// Reads 11-bit groups, MSB-first, out of the concatenation of two byte slices.
struct BitReader<'a> {
    entropy: &'a [u8],
    checksum: &'a [u8],
}

impl<'a> BitReader<'a> {
    fn new(entropy: &'a [u8], checksum: &'a [u8]) -> Self {
        BitReader { entropy, checksum }
    }

    fn bit(&self, pos: usize) -> u16 {
        let byte = if pos / 8 < self.entropy.len() {
            self.entropy[pos / 8]
        } else {
            self.checksum[pos / 8 - self.entropy.len()]
        };
        (byte >> (7 - pos % 8)) as u16 & 1
    }

    fn read(&self, pos: usize) -> u16 {
        (0..INDEX_BITS).fold(0, |acc, i| acc << 1 | self.bit(pos + i))
    }
}

/// Writes an 11-bit group, MSB-first, at bit position `pos` of `buf`.
fn write_bits(buf: &mut [u8], pos: usize, index: u16) {
    debug_assert!(index < WORD_COUNT as u16);
    for i in 0..INDEX_BITS {
        let bit = index >> (INDEX_BITS - 1 - i) & 1;
        buf[(pos + i) / 8] |= (bit as u8) << (7 - (pos + i) % 8);
    }
}
