/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Chain-level state that the application reports to the consensus engine.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};

use super::data_types::{CryptoHash, Height, MessageCount};

/// The application's view of the chain.
///
/// The committed `ChainState` is persisted next to the user and message data in the same atomic write
/// and is loaded back when a [`ChatApp`](crate::chat_app::ChatApp) starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ChainState {
    /// Height of the most recently finalized block.
    pub height: Height,

    /// Number of content messages in the global chat history.
    pub size: MessageCount,

    /// Digest of every write ever applied to the store, chained block by block.
    pub app_hash: CryptoHash,
}

impl ChainState {
    /// The chain state of a replica that has not committed any block yet.
    pub fn genesis() -> ChainState {
        ChainState::default()
    }
}

/// Incrementally computes the app hash of a block from the previous app hash and the writes the block
/// applies, in the order it applies them.
#[derive(Clone)]
pub(crate) struct AppHasher(Sha256);

impl AppHasher {
    pub(crate) fn new(prev_app_hash: &CryptoHash) -> AppHasher {
        let mut hasher = Sha256::new();
        hasher.update(prev_app_hash.bytes());
        AppHasher(hasher)
    }

    /// Feed one key-value write into the hash. Both are length-prefixed so that no two different
    /// sequences of writes hash the same bytes.
    pub(crate) fn update(&mut self, key: &[u8], value: &[u8]) {
        self.0.update((key.len() as u64).to_le_bytes());
        self.0.update(key);
        self.0.update((value.len() as u64).to_le_bytes());
        self.0.update(value);
    }

    pub(crate) fn finalize(self) -> CryptoHash {
        CryptoHash::new(self.0.finalize().into())
    }
}
