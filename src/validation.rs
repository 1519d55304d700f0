/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Checking a proposed block on every replica.
//!
//! The proposer may be Byzantine, so every replica re-checks the invariants that
//! [`build_proposal`](crate::proposal::build_proposal) establishes. [`validate_proposal`] is a pure
//! function of the proposed transactions (and the deterministic [`TxVerifier`]): it reads no store,
//! so every honest replica reaches the same verdict on the same block.
//!
//! The block is scanned once:
//! 1. While transactions are formatted as ban transactions, each must parse as a [`BanTx`], and its
//!    target is recorded as banned.
//! 2. Every remaining transaction must parse as a content transaction, pass the verifier, and not be
//!    from a sender recorded as banned in step 1.
//!
//! A ban transaction after the first content transaction fails to parse as a content transaction in
//! step 2, so the ban-first layout is enforced structurally.
//!
//! [`BanTx`]: crate::types::transactions::BanTx

use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
};

use crate::{
    types::transactions::{is_ban_tx, parse_ban_tx, parse_message, TxFormatError},
    verifier::TxVerifier,
};

/// Why a proposal was rejected. `index` is the position of the offending transaction in the block.
#[derive(Debug)]
pub enum RejectReason {
    MalformedBanTx { index: usize, source: TxFormatError },
    MalformedMessage { index: usize, source: TxFormatError },
    Unverified { index: usize },
    BannedSender { index: usize, sender: String },
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MalformedBanTx { index, source } => {
                write!(f, "malformed ban transaction at index {}: {}", index, source)
            }
            RejectReason::MalformedMessage { index, source } => {
                write!(f, "malformed message at index {}: {}", index, source)
            }
            RejectReason::Unverified { index } => {
                write!(f, "message at index {} failed verification", index)
            }
            RejectReason::BannedSender { index, sender } => write!(
                f,
                "message at index {} is from {}, who is banned in the same block",
                index, sender
            ),
        }
    }
}

/// Check that `txs` is a well-formed, ban-first block without messages from senders it bans.
pub fn validate_proposal<V: TxVerifier>(txs: &[Vec<u8>], verifier: &V) -> Result<(), RejectReason> {
    let ban_prefix_len = txs.iter().take_while(|tx| is_ban_tx(tx)).count();

    let mut banned = HashSet::new();
    for (index, tx) in txs[..ban_prefix_len].iter().enumerate() {
        let ban_tx =
            parse_ban_tx(tx).map_err(|source| RejectReason::MalformedBanTx { index, source })?;
        banned.insert(ban_tx.user_name);
    }

    for (index, tx) in txs.iter().enumerate().skip(ban_prefix_len) {
        let message =
            parse_message(tx).map_err(|source| RejectReason::MalformedMessage { index, source })?;
        if !verifier.verify(tx) {
            return Err(RejectReason::Unverified { index });
        }
        if banned.contains(&message.sender) {
            return Err(RejectReason::BannedSender {
                index,
                sender: message.sender,
            });
        }
    }

    Ok(())
}
