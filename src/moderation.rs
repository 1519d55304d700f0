/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Deciding whether a message is offensive.
//!
//! A message is offensive if any of its words is a curse word. The set of curse words used for a block
//! is the union of:
//! 1. The replica's local curse words, from its [configuration](crate::config::Configuration).
//! 2. The curse words carried by the vote extensions of the previous height, which each replica fills
//!    with its own configured [`vote_extension_words`](crate::config::Configuration::vote_extension_words).
//!
//! # Words
//!
//! Messages are split into words at every character that is not alphanumeric, and words are compared
//! case-insensitively. So with the curse word `idiot`, `"you IDIOT!"` is offensive, but `"idiotic"` is
//! not.
//!
//! # Vote extensions
//!
//! A vote extension is the UTF-8 encoding of a list of words joined by [`VOTE_EXTENSION_DELIMITER`].
//! Aggregating the vote extensions of a height does not deduplicate words. Instead, if the same word
//! appears more than once in the aggregate, the whole aggregate is rejected with
//! [`ModerationError::DuplicateWord`] and no proposal can be built from it.

use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
};

/// Separates the words inside a vote extension, and the vote extensions inside an aggregate.
pub const VOTE_EXTENSION_DELIMITER: char = '|';

/// A set of curse words, normalized to lowercase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurseWords(HashSet<String>);

impl CurseWords {
    pub fn new<I, S>(words: I) -> CurseWords
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CurseWords(
            words
                .into_iter()
                .map(|word| normalize(word.as_ref()))
                .filter(|word| !word.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(&normalize(word))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Create the union of these curse words and `extra_words`.
    pub fn union_with(&self, extra_words: &[String]) -> CurseWords {
        let mut union = self.clone();
        union
            .0
            .extend(extra_words.iter().map(|word| normalize(word)).filter(|word| !word.is_empty()));
        union
    }
}

/// Check whether any word of `body` is one of `curse_words`.
pub fn contains_curse_word(body: &str, curse_words: &CurseWords) -> bool {
    body.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| curse_words.contains(word))
}

/// Concatenate the payloads of `vote_extensions` into a single delimited word string.
///
/// Empty payloads are skipped, and no deduplication is done.
pub fn aggregate_vote_extensions<'a, I>(vote_extensions: I) -> String
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let payloads: Vec<String> = vote_extensions
        .into_iter()
        .filter(|payload| !payload.is_empty())
        .map(|payload| String::from_utf8_lossy(payload).into_owned())
        .collect();
    payloads.join(&VOTE_EXTENSION_DELIMITER.to_string())
}

/// Split a delimited word string (a vote extension, or an aggregate of them) into its words.
///
/// Words are trimmed and normalized to lowercase. Empty words are skipped.
pub fn split_words(delimited: &str) -> Vec<String> {
    delimited
        .split(VOTE_EXTENSION_DELIMITER)
        .map(normalize)
        .filter(|word| !word.is_empty())
        .collect()
}

/// Split an aggregated vote extension word string into its words, failing if any word appears twice.
pub fn vote_extension_words(aggregate: &str) -> Result<Vec<String>, ModerationError> {
    let words = split_words(aggregate);
    match find_duplicate_word(&words) {
        Some(word) => Err(ModerationError::DuplicateWord { word: word.clone() }),
        None => Ok(words),
    }
}

/// Get the first word in `words` that also appears earlier in `words`.
pub fn find_duplicate_word(words: &[String]) -> Option<&String> {
    let mut seen = HashSet::with_capacity(words.len());
    words.iter().find(|word| !seen.insert(word.as_str()))
}

/// Encode `words` as a vote extension payload.
///
/// Words are normalized, and a word that normalizes to the same string as an earlier one is left
/// out, so the payload never repeats a word.
pub fn encode_vote_extension(words: &[String]) -> Vec<u8> {
    let mut seen = HashSet::with_capacity(words.len());
    words
        .iter()
        .map(|word| normalize(word))
        .filter(|word| !word.is_empty() && seen.insert(word.clone()))
        .collect::<Vec<String>>()
        .join(&VOTE_EXTENSION_DELIMITER.to_string())
        .into_bytes()
}

/// Check that a single vote extension payload is well-formed: valid UTF-8, no empty words between
/// delimiters, and no word appearing twice. The empty payload is well-formed.
pub fn is_well_formed_vote_extension(payload: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(payload) else {
        return false;
    };
    if text.is_empty() {
        return true;
    }

    let raw_words: Vec<&str> = text.split(VOTE_EXTENSION_DELIMITER).collect();
    if raw_words.iter().any(|word| normalize(word).is_empty()) {
        return false;
    }

    find_duplicate_word(&split_words(text)).is_none()
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    /// `word` appears more than once across the vote extensions of a height.
    DuplicateWord { word: String },
}

impl Display for ModerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModerationError::DuplicateWord { word } => {
                write!(f, "curse word {:?} appears more than once in the vote extensions", word)
            }
        }
    }
}

impl std::error::Error for ModerationError {}
