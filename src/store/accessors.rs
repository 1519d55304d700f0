/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Typed read and write access to the chat store.
//!
//! Reads of committed state go directly through the [`KVGet`] getters implemented on the user's
//! [`KVStore`]. Writes are never made to the `KVStore` directly. Instead, a block's writes are staged
//! in a [`MutationScope`], which:
//! 1. Presents reads that reflect the block's own earlier writes on top of committed state, so that,
//!    e.g., the second message by a sender in a block is appended after the first one.
//! 2. Chains every write into the block's app hash, in the order the writes are made.
//! 3. Is turned into a single [`ChatWriteBatch`] when the block is committed, so that either every
//!    write of the block becomes durable or none of them do.

use std::fmt::{self, Display, Formatter};

use borsh::BorshSerialize;

use crate::types::{
    chain_state::{AppHasher, ChainState},
    data_types::CryptoHash,
    transactions::ChatMessage,
    update_sets::AppStateUpdates,
    user::User,
};

use super::{
    pluggables::{KVGet, KVGetError, KVSetError, KVStore, Key, WriteBatch},
    variables,
};

/// Staged, not-yet-durable writes of a single block, layered over the committed state in a [`KVStore`].
pub struct MutationScope<K: KVStore> {
    kv_store: K,
    updates: AppStateUpdates,
    app_hasher: AppHasher,
}

impl<K: KVStore> MutationScope<K> {
    /// Open an empty scope over `kv_store`, whose app hash chains on from `prev_app_hash`.
    pub fn open(kv_store: K, prev_app_hash: &CryptoHash) -> MutationScope<K> {
        MutationScope {
            kv_store,
            updates: AppStateUpdates::new(),
            app_hasher: AppHasher::new(prev_app_hash),
        }
    }

    /// Make sure that a user called `name` exists, and set it as banned if `banned` is `true`.
    ///
    /// The banned flag is never downgraded: upserting an already banned user with `banned == false`
    /// leaves them banned. Returns the user as it is after the upsert.
    pub fn upsert_user(&mut self, name: &str, banned: bool) -> Result<User, StoreError> {
        let existing = self.user(name)?;
        if let Some(user) = &existing {
            if user.banned || !banned {
                return Ok(user.clone());
            }
        }

        let user = User::new(name, banned);
        self.set(
            variables::user_key(name),
            &user,
            Key::User {
                name: name.to_string(),
            },
        )?;
        Ok(user)
    }

    /// Append `message` to the list of messages posted by its sender. Returns the new length of the
    /// sender's message list.
    pub fn append_message(&mut self, message: &ChatMessage) -> Result<u64, StoreError> {
        let sender = message.sender.as_str();
        let index = self.user_message_count(sender)?;
        self.set(
            variables::user_message_key(sender, index),
            message,
            Key::UserMessage {
                name: sender.to_string(),
                index,
            },
        )?;
        self.set(
            variables::user_message_count_key(sender),
            &(index + 1),
            Key::UserMessageCount {
                name: sender.to_string(),
            },
        )?;
        Ok(index + 1)
    }

    /// Append `message` to the global chat history. Returns the new length of the chat history.
    pub fn append_chat_history(&mut self, message: &ChatMessage) -> Result<u64, StoreError> {
        let index = self.chat_history_len()?;
        self.set(
            variables::chat_history_key(index),
            message,
            Key::ChatHistoryEntry { index },
        )?;
        self.set(
            variables::CHAT_HISTORY_LEN.to_vec(),
            &(index + 1),
            Key::ChatHistoryLen,
        )?;
        Ok(index + 1)
    }

    /// Get the app hash that results from all of the writes made into this scope so far.
    pub fn app_hash(&self) -> CryptoHash {
        self.app_hasher.clone().finalize()
    }

    /// Get the staged updates of this scope.
    pub fn updates(&self) -> &AppStateUpdates {
        &self.updates
    }

    fn set<T: BorshSerialize>(&mut self, key: Vec<u8>, value: &T, name: Key) -> Result<(), KVSetError> {
        let bytes = value
            .try_to_vec()
            .map_err(|err| KVSetError::SerializeValueError { key: name, source: err })?;
        self.app_hasher.update(&key, &bytes);
        self.updates.insert(key, bytes);
        Ok(())
    }
}

impl<K: KVStore> KVGet for MutationScope<K> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.updates.get_insert(&key.to_vec()) {
            Some(value) => Some(value.clone()),
            None => self.kv_store.get(key),
        }
    }
}

/// A [`WriteBatch`] that knows where each chat store variable lives.
pub struct ChatWriteBatch<W: WriteBatch>(pub(crate) W);

impl<W: WriteBatch> ChatWriteBatch<W> {
    pub fn new() -> ChatWriteBatch<W> {
        ChatWriteBatch(W::new())
    }

    /// Set every update staged in `app_state_updates` into this write batch.
    pub fn apply_app_state_updates(&mut self, app_state_updates: &AppStateUpdates) {
        for (key, value) in app_state_updates.inserts() {
            self.0.set(key, value);
        }
    }

    pub fn set_chain_state(&mut self, chain_state: &ChainState) -> Result<(), KVSetError> {
        self.0.set(
            &variables::CHAIN_STATE,
            &chain_state
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::ChainState,
                    source: err,
                })?,
        );
        Ok(())
    }

    /// Get the inner, storage engine specific write batch.
    pub fn into_inner(self) -> W {
        self.0
    }
}

/// Errors that may be encountered when reading or writing to the chat store.
#[derive(Debug)]
pub enum StoreError {
    /// Error when trying to get a value from the underlying [key value store][KVStore].
    KVGetError(KVGetError),

    /// Error when trying to set a value into a [`MutationScope`] or [`ChatWriteBatch`].
    KVSetError(KVSetError),
}

impl From<KVGetError> for StoreError {
    fn from(value: KVGetError) -> Self {
        StoreError::KVGetError(value)
    }
}

impl From<KVSetError> for StoreError {
    fn from(value: KVSetError) -> Self {
        StoreError::KVSetError(value)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::KVGetError(err) => Display::fmt(err, f),
            StoreError::KVSetError(err) => Display::fmt(err, f),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::KVGetError(err) => Some(err),
            StoreError::KVSetError(err) => Some(err),
        }
    }
}
