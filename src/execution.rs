/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Applying a decided block to the chat store, and making the result durable.
//!
//! Execution is two-phase:
//! 1. [`finalize_block`] applies every transaction of the block to a [`MutationScope`]. The writes are
//!    visible through the scope, but nothing reaches the [`KVStore`] yet.
//! 2. [`commit`] writes the scope's updates together with the new [`ChainState`] into the `KVStore` in
//!    a single atomic [`WriteBatch`](crate::store::pluggables::WriteBatch). Either the whole block and
//!    its chain state become durable, or nothing does.

use crate::{
    error::ChatAppError,
    store::{
        accessors::{ChatWriteBatch, MutationScope},
        pluggables::KVStore,
    },
    types::{
        chain_state::ChainState,
        data_types::Height,
        transactions::{is_ban_tx, parse_ban_tx, parse_message, ChatMessage},
        user::User,
    },
    verifier::TxVerifier,
};

/// The effect that executing one transaction had.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutedTx {
    /// A ban transaction set `user` as banned.
    Ban { user: User },

    /// A content transaction appended `message` to its sender's messages and to the chat history.
    Post {
        message: ChatMessage,
        sender_message_count: u64,
        chat_history_len: u64,
    },
}

/// Apply the block `txs` at `height` to `scope`, and update `chain_state` accordingly.
///
/// `txs` must have been accepted by [`validate_proposal`](crate::validation::validate_proposal). If a
/// transaction does not parse as expected, or a content transaction fails verification, this returns
/// an error without undoing the writes already made to `scope`; the caller must discard the scope.
///
/// Returns one [`ExecutedTx`] per transaction, in block order.
pub fn finalize_block<K: KVStore, V: TxVerifier>(
    scope: &mut MutationScope<K>,
    height: Height,
    txs: &[Vec<u8>],
    verifier: &V,
    chain_state: &mut ChainState,
) -> Result<Vec<ExecutedTx>, ChatAppError> {
    let mut executed = Vec::with_capacity(txs.len());
    let ban_prefix_len = txs.iter().take_while(|tx| is_ban_tx(tx)).count();

    for (index, tx) in txs[..ban_prefix_len].iter().enumerate() {
        let ban_tx =
            parse_ban_tx(tx).map_err(|source| ChatAppError::UnexpectedTx { index, source })?;
        let user = scope.upsert_user(&ban_tx.user_name, true)?;
        executed.push(ExecutedTx::Ban { user });
    }

    for (index, tx) in txs.iter().enumerate().skip(ban_prefix_len) {
        let message =
            parse_message(tx).map_err(|source| ChatAppError::UnexpectedTx { index, source })?;
        if !verifier.verify(tx) {
            return Err(ChatAppError::UnverifiedTx { index });
        }

        scope.upsert_user(&message.sender, false)?;
        let sender_message_count = scope.append_message(&message)?;
        let chat_history_len = scope.append_chat_history(&message)?;
        chain_state.size += 1;

        executed.push(ExecutedTx::Post {
            message,
            sender_message_count,
            chat_history_len,
        });
    }

    chain_state.height = height;
    chain_state.app_hash = scope.app_hash();

    Ok(executed)
}

/// Atomically persist the updates staged in `scope` together with `chain_state` into `kv_store`.
pub fn commit<K: KVStore>(
    kv_store: &mut K,
    scope: MutationScope<K>,
    chain_state: &ChainState,
) -> Result<(), ChatAppError> {
    let mut wb = ChatWriteBatch::<K::WriteBatch>::new();
    wb.apply_app_state_updates(scope.updates());
    wb.set_chain_state(chain_state)?;
    kv_store.write(wb.into_inner())?;
    Ok(())
}
