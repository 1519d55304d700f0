/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Errors that abort an entry point call.
//!
//! Rejecting a transaction or a proposal is not an error: it is reported through a
//! [`ResultCode`](crate::app::ResultCode) or a [`ProposalStatus`](crate::app::ProposalStatus). A
//! [`ChatAppError`] means that something that should be impossible on an honest, healthy replica has
//! happened, and that the consensus engine must not treat the call as having succeeded.

use std::fmt::{self, Display, Formatter};

use crate::{
    moderation::ModerationError,
    store::{
        accessors::StoreError,
        pluggables::{KVGetError, KVSetError, KVWriteError},
    },
    types::{data_types::Height, transactions::TxFormatError},
};

#[derive(Debug)]
pub enum ChatAppError {
    /// Reading or staging a value in the chat store failed for a reason other than the value being
    /// absent.
    Store(StoreError),

    /// The storage engine failed to apply the write batch of a commit.
    Write(KVWriteError),

    /// A word appears more than once in the aggregated vote extensions, so no proposal can be built.
    DuplicateVoteExtensionWord(ModerationError),

    /// A transaction at `index` could not be parsed even though it must have already been admitted by
    /// `check_tx` (in `prepare_proposal`) or accepted by `process_proposal` (in `finalize_block`).
    UnexpectedTx { index: usize, source: TxFormatError },

    /// A content transaction at `index` of a block being finalized was rejected by the
    /// [`TxVerifier`](crate::verifier::TxVerifier).
    UnverifiedTx { index: usize },

    /// A synthesized ban transaction could not be serialized.
    Encode(std::io::Error),

    /// `finalize_block` was called for a height other than the one after the committed height.
    HeightMismatch { expected: Height, got: Height },

    /// `commit` was called without a preceding `finalize_block`.
    NoOpenScope,

    /// A previous commit failed. The replica's state can no longer be trusted, so it refuses to
    /// finalize or commit any more blocks.
    Halted,
}

impl From<StoreError> for ChatAppError {
    fn from(value: StoreError) -> Self {
        ChatAppError::Store(value)
    }
}

impl From<KVGetError> for ChatAppError {
    fn from(value: KVGetError) -> Self {
        ChatAppError::Store(StoreError::KVGetError(value))
    }
}

impl From<KVSetError> for ChatAppError {
    fn from(value: KVSetError) -> Self {
        ChatAppError::Store(StoreError::KVSetError(value))
    }
}

impl From<KVWriteError> for ChatAppError {
    fn from(value: KVWriteError) -> Self {
        ChatAppError::Write(value)
    }
}

impl From<ModerationError> for ChatAppError {
    fn from(value: ModerationError) -> Self {
        ChatAppError::DuplicateVoteExtensionWord(value)
    }
}

impl Display for ChatAppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChatAppError::Store(err) => write!(f, "store error: {}", err),
            ChatAppError::Write(err) => write!(f, "{}", err),
            ChatAppError::DuplicateVoteExtensionWord(err) => write!(f, "{}", err),
            ChatAppError::UnexpectedTx { index, source } => {
                write!(f, "unexpected malformed transaction at index {}: {}", index, source)
            }
            ChatAppError::UnverifiedTx { index } => {
                write!(f, "transaction at index {} failed verification", index)
            }
            ChatAppError::Encode(err) => write!(f, "could not encode transaction: {}", err),
            ChatAppError::HeightMismatch { expected, got } => write!(
                f,
                "expected to finalize height {}, but was asked to finalize height {}",
                expected, got
            ),
            ChatAppError::NoOpenScope => write!(f, "commit called without a finalized block"),
            ChatAppError::Halted => write!(f, "replica halted after a failed commit"),
        }
    }
}

impl std::error::Error for ChatAppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatAppError::Store(err) => Some(err),
            ChatAppError::Write(err) => Some(err),
            ChatAppError::DuplicateVoteExtensionWord(err) => Some(err),
            ChatAppError::UnexpectedTx { source, .. } => Some(source),
            ChatAppError::Encode(err) => Some(err),
            _ => None,
        }
    }
}
