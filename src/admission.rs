/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The gate that every client transaction passes through before it may enter the mempool.
//!
//! [`check_tx`] runs these checks in order, stopping at the first one that fails:
//! 1. The [`TxVerifier`] must accept the transaction.
//! 2. The transaction must parse as a [`ChatMessage`] with a non-empty sender. Ban transactions are
//!    only ever synthesized by proposers, so a client-submitted ban transaction fails this check too.
//! 3. The sender must not be banned. A sender that the store has never seen is admissible.
//!
//! Admission only reads committed state and never writes, so it is safe to run concurrently for
//! many transactions.

use crate::{
    store::pluggables::{KVGet, KVGetError},
    types::transactions::{parse_message, ChatMessage, TxFormatError},
    verifier::TxVerifier,
};

/// The outcome of [`check_tx`] for a transaction that did not hit a store error.
#[derive(Debug)]
pub enum Admission {
    Admitted(ChatMessage),
    Unauthorized,
    InvalidFormat(TxFormatError),
    Banned { sender: String },
}

/// Decide whether `tx` may enter the mempool, reading `store` for the sender's ban status.
///
/// A store error other than the sender being absent is returned as `Err`, since it says nothing about
/// whether the transaction is valid.
pub fn check_tx<S: KVGet, V: TxVerifier>(
    tx: &[u8],
    store: &S,
    verifier: &V,
) -> Result<Admission, KVGetError> {
    if !verifier.verify(tx) {
        return Ok(Admission::Unauthorized);
    }

    let message = match parse_message(tx) {
        Ok(message) => message,
        Err(err) => return Ok(Admission::InvalidFormat(err)),
    };

    match store.user(&message.sender)? {
        Some(user) if user.banned => Ok(Admission::Banned {
            sender: message.sender,
        }),
        _ => Ok(Admission::Admitted(message)),
    }
}
