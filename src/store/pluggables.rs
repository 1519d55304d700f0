/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Traits for pluggable chat store persistence.
//!
//! Library users provide the storage engine by implementing [`KVStore`] (and its associated
//! [`WriteBatch`]) for it. The typed getters of [`KVGet`] are provided methods: implementors only have
//! to implement [`KVGet::get`].

use std::fmt::{self, Display, Formatter};

use borsh::BorshDeserialize;

use crate::types::{chain_state::ChainState, transactions::ChatMessage, user::User};

use super::variables;

/// A handle to the storage engine.
///
/// Handles are `Sync` because `check_tx`, `query` and `prepare_proposal` read committed state through
/// a shared reference to the chat app, possibly from many threads at once.
pub trait KVStore: KVGet + Clone + Send + Sync + 'static {
    type WriteBatch: WriteBatch;

    /// Atomically apply every write in `wb`. Either all of the writes become durable, or none of them do.
    fn write(&mut self, wb: Self::WriteBatch) -> Result<(), KVWriteError>;
}

pub trait KVGet {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /* ↓↓↓ Users ↓↓↓ */

    /// Get the user called `name`. `Ok(None)` means that the user has never been seen before.
    fn user(&self, name: &str) -> Result<Option<User>, KVGetError> {
        match self.get(&variables::user_key(name)) {
            None => Ok(None),
            Some(bytes) => Ok(Some(User::deserialize(&mut bytes.as_slice()).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::User {
                        name: name.to_string(),
                    },
                    source: err,
                },
            )?)),
        }
    }

    /* ↓↓↓ Per-sender messages ↓↓↓ */

    fn user_message_count(&self, name: &str) -> Result<u64, KVGetError> {
        match self.get(&variables::user_message_count_key(name)) {
            None => Ok(0),
            Some(bytes) => u64::deserialize(&mut bytes.as_slice()).map_err(|err| {
                KVGetError::DeserializeValueError {
                    key: Key::UserMessageCount {
                        name: name.to_string(),
                    },
                    source: err,
                }
            }),
        }
    }

    fn user_message(&self, name: &str, index: u64) -> Result<ChatMessage, KVGetError> {
        let key = Key::UserMessage {
            name: name.to_string(),
            index,
        };
        let bytes = self
            .get(&variables::user_message_key(name, index))
            .ok_or(KVGetError::ValueExpectedButNotFound { key: key.clone() })?;
        ChatMessage::deserialize(&mut bytes.as_slice())
            .map_err(|err| KVGetError::DeserializeValueError { key, source: err })
    }

    /// Get every message `name` has ever posted, oldest first.
    fn user_messages(&self, name: &str) -> Result<Vec<ChatMessage>, KVGetError> {
        (0..self.user_message_count(name)?)
            .map(|index| self.user_message(name, index))
            .collect()
    }

    /* ↓↓↓ Global chat history ↓↓↓ */

    fn chat_history_len(&self) -> Result<u64, KVGetError> {
        match self.get(&variables::CHAT_HISTORY_LEN) {
            None => Ok(0),
            Some(bytes) => u64::deserialize(&mut bytes.as_slice()).map_err(|err| {
                KVGetError::DeserializeValueError {
                    key: Key::ChatHistoryLen,
                    source: err,
                }
            }),
        }
    }

    fn chat_history_entry(&self, index: u64) -> Result<ChatMessage, KVGetError> {
        let bytes = self.get(&variables::chat_history_key(index)).ok_or(
            KVGetError::ValueExpectedButNotFound {
                key: Key::ChatHistoryEntry { index },
            },
        )?;
        ChatMessage::deserialize(&mut bytes.as_slice()).map_err(|err| {
            KVGetError::DeserializeValueError {
                key: Key::ChatHistoryEntry { index },
                source: err,
            }
        })
    }

    /// Get the whole global chat history, in the order the messages were finalized.
    fn chat_history(&self) -> Result<Vec<ChatMessage>, KVGetError> {
        (0..self.chat_history_len()?)
            .map(|index| self.chat_history_entry(index))
            .collect()
    }

    /* ↓↓↓ Chain State ↓↓↓ */

    /// Get the persisted chain state. `Ok(None)` means that no block has ever been committed.
    fn chain_state(&self) -> Result<Option<ChainState>, KVGetError> {
        match self.get(&variables::CHAIN_STATE) {
            None => Ok(None),
            Some(bytes) => Ok(Some(ChainState::deserialize(&mut bytes.as_slice()).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::ChainState,
                    source: err,
                },
            )?)),
        }
    }
}

pub trait WriteBatch {
    fn new() -> Self;
    fn set(&mut self, key: &[u8], value: &[u8]);
}

/// Error when trying to read a value corresponding to a given key from the [key value store][KVStore].
/// The error may arise in the following circumstances:
/// 1. The value corresponding to a given key cannot be deserialized into its expected type,
/// 2. The value corresponding to a given key cannot be found, even though the values stored at other
///    keys imply that it should exist.
///
/// A key that is simply absent (e.g., an unknown user) is not an error.
#[derive(Debug)]
pub enum KVGetError {
    DeserializeValueError { key: Key, source: std::io::Error },
    ValueExpectedButNotFound { key: Key },
}

impl Display for KVGetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            KVGetError::DeserializeValueError { key, source } => {
                write!(f, "could not deserialize {}: {}", key, source)
            }
            KVGetError::ValueExpectedButNotFound { key } => {
                write!(f, "expected {} to exist, but it was not found", key)
            }
        }
    }
}

impl std::error::Error for KVGetError {}

/// Error when trying to serialize a value before setting it into a [`WriteBatch`].
#[derive(Debug)]
pub enum KVSetError {
    SerializeValueError { key: Key, source: std::io::Error },
}

impl Display for KVSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            KVSetError::SerializeValueError { key, source } => {
                write!(f, "could not serialize {}: {}", key, source)
            }
        }
    }
}

impl std::error::Error for KVSetError {}

/// Error returned by a storage engine that failed to apply a [`WriteBatch`].
#[derive(Debug)]
pub struct KVWriteError(pub Box<dyn std::error::Error + Send + Sync>);

impl KVWriteError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> KVWriteError {
        KVWriteError(source.into())
    }
}

impl Display for KVWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "write batch could not be applied: {}", self.0)
    }
}

impl std::error::Error for KVWriteError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    User { name: String },
    UserMessageCount { name: String },
    UserMessage { name: String, index: u64 },
    ChatHistoryLen,
    ChatHistoryEntry { index: u64 },
    ChainState,
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self {
            &Key::User { name } => write!(f, "User {}", name),
            &Key::UserMessageCount { name } => write!(f, "Message count of user {}", name),
            &Key::UserMessage { name, index } => write!(f, "Message {} of user {}", index, name),
            &Key::ChatHistoryLen => write!(f, "Chat History length"),
            &Key::ChatHistoryEntry { index } => write!(f, "Chat History entry {}", index),
            &Key::ChainState => write!(f, "Chain State"),
        }
    }
}
