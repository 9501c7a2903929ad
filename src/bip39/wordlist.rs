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

//! The BIP-39 dictionaries.
//!
//! Every dictionary holds exactly 2048 unique words, addressable both by 11-bit index and by
//! word. The reference word data comes from the `bip39` crate; this module wraps it into an
//! index that supports the reverse lookup that mnemonic decoding needs.
//!
//! There is deliberately no process-wide "current language": a [`Wordlist`] is built once per
//! [`Language`] behind a `OnceLock` and handed out as an immutable reference, and every
//! mnemonic operation takes the wordlist to use as an explicit parameter.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Number of bits used to represent a word index.
pub const INDEX_BITS: usize = 11;

/// Number of words in every dictionary.
pub const WORD_COUNT: usize = 1 << INDEX_BITS;

/// Languages with an available dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Japanese,
}

/// Error returned when a language name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "word list '{}' is unavailable", _0)]
pub struct UnknownLanguageError(pub String);

impl Language {
    /// All available languages.
    pub fn all() -> impl ExactSizeIterator<Item = Language> {
        [Language::English, Language::Japanese].into_iter()
    }

    /// The lowercase name of the language.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Japanese => "japanese",
        }
    }

    /// Returns the dictionary of the language, building it on first use.
    pub fn wordlist(self) -> &'static Wordlist {
        match self {
            Language::English => {
                static ENGLISH: OnceLock<Wordlist> = OnceLock::new();
                ENGLISH.get_or_init(|| Wordlist::from_words(bip39::Language::English))
            }
            Language::Japanese => {
                static JAPANESE: OnceLock<Wordlist> = OnceLock::new();
                JAPANESE.get_or_init(|| Wordlist::from_words(bip39::Language::Japanese))
            }
        }
    }
}

impl core::str::FromStr for Language {
    type Err = UnknownLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .find(|l| l.name() == s)
            .ok_or_else(|| UnknownLanguageError(s.to_owned()))
    }
}

impl core::fmt::Display for Language {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A 2048-word dictionary with index-by-word and word-by-index lookup.
pub struct Wordlist {
    words: &'static [&'static str],
    indexes: HashMap<&'static str, u16>,
}

impl Wordlist {
    fn from_words(language: bip39::Language) -> Wordlist {
        // the empty prefix matches every word, yielding the whole list in index order
        let words: &'static [&'static str] = language.words_by_prefix("");
        assert_eq!(words.len(), WORD_COUNT);
        let indexes =
            words.iter().enumerate().map(|(i, &w)| (w, i as u16)).collect::<HashMap<_, _>>();
        assert_eq!(indexes.len(), WORD_COUNT, "dictionary contains duplicate words");
        Wordlist { words, indexes }
    }

    /// Returns the word at the given index.
    ///
    /// # Panic
    ///
    /// Panics when the index is not below 2048.
    pub fn word(&self, index: u16) -> &'static str {
        self.words[usize::from(index)]
    }

    /// Returns the index of the given word, or `None` if the word is not in the dictionary.
    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.indexes.get(word).copied()
    }

    /// Returns whether the dictionary contains the given word.
    pub fn contains(&self, word: &str) -> bool {
        self.indexes.contains_key(word)
    }
}
