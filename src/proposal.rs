/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Building the block to propose out of the mempool's candidate transactions.
//!
//! Only the proposer of a height runs this. The block it builds satisfies two invariants that
//! [`validate_proposal`](crate::validation::validate_proposal) checks on every replica:
//! 1. **Ban-first**: every ban transaction comes before every content transaction.
//! 2. **No banned senders**: no content transaction is from a sender banned by a ban transaction of
//!    the same block.
//!
//! Construction happens in two separate passes, each a pure function:
//! 1. [`classify_and_synthesize`]: keep clean messages as pending, and replace every offensive message
//!    by a ban of its sender.
//! 2. [`filter_survivors`]: drop every pending message whose sender is banned, either by the first pass
//!    or already in committed state.
//!
//! [`build_proposal`] runs both passes and lays out the resulting block.

use std::collections::HashSet;

use crate::{
    error::ChatAppError,
    moderation::{aggregate_vote_extensions, contains_curse_word, vote_extension_words, CurseWords},
    store::pluggables::KVGet,
    types::transactions::{parse_message, BanTx, ChatMessage},
};

/// A clean content transaction that will be included in the block unless its sender gets banned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTx {
    /// The transaction exactly as it was submitted.
    pub tx: Vec<u8>,
    pub message: ChatMessage,
}

/// The output of [`classify_and_synthesize`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// One ban per offending sender, in the order their first offensive message appeared.
    pub ban_txs: Vec<BanTx>,

    /// Clean messages, in candidate order.
    pub pending: Vec<PendingTx>,

    /// Senders of `ban_txs`.
    pub newly_banned: HashSet<String>,
}

/// The block built by [`build_proposal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltProposal {
    /// Ban transactions followed by the surviving content transactions.
    pub txs: Vec<Vec<u8>>,
    pub ban_count: usize,
    pub content_count: usize,
    /// Number of candidate transactions that made it into the block neither as themselves nor as a ban.
    pub dropped_count: usize,
}

/// First pass: split `candidates` into clean pending messages and bans of offending senders.
///
/// Every candidate must parse as a content transaction, since it has already been admitted by
/// `check_tx`. A candidate that does not is reported as [`ChatAppError::UnexpectedTx`].
pub fn classify_and_synthesize(
    candidates: &[Vec<u8>],
    curse_words: &CurseWords,
) -> Result<Classification, ChatAppError> {
    let mut classification = Classification::default();

    for (index, tx) in candidates.iter().enumerate() {
        let message =
            parse_message(tx).map_err(|source| ChatAppError::UnexpectedTx { index, source })?;

        if !contains_curse_word(&message.message, curse_words) {
            classification.pending.push(PendingTx {
                tx: tx.clone(),
                message,
            });
        } else if classification.newly_banned.insert(message.sender.clone()) {
            classification.ban_txs.push(BanTx::new(message.sender));
        }
    }

    Ok(classification)
}

/// Second pass: keep only the pending messages whose sender is not in `banned`, preserving order.
pub fn filter_survivors(pending: Vec<PendingTx>, banned: &HashSet<String>) -> Vec<PendingTx> {
    pending
        .into_iter()
        .filter(|pending_tx| !banned.contains(&pending_tx.message.sender))
        .collect()
}

/// Build the block to propose from `candidates`.
///
/// Messages are moderated with the union of `local_curse_words` and the words carried in
/// `vote_extensions`. If any word appears more than once across `vote_extensions`, no block is built
/// and [`ChatAppError::DuplicateVoteExtensionWord`] is returned.
///
/// `store` is read to also drop messages from senders who were banned in an earlier block but whose
/// messages were admitted to the mempool before the ban was committed.
pub fn build_proposal<'a, S, I>(
    candidates: &[Vec<u8>],
    vote_extensions: I,
    local_curse_words: &CurseWords,
    store: &S,
) -> Result<BuiltProposal, ChatAppError>
where
    S: KVGet,
    I: IntoIterator<Item = &'a [u8]>,
{
    let aggregate = aggregate_vote_extensions(vote_extensions);
    let extra_words = vote_extension_words(&aggregate)?;
    let curse_words = local_curse_words.union_with(&extra_words);

    let Classification {
        ban_txs,
        pending,
        mut newly_banned,
    } = classify_and_synthesize(candidates, &curse_words)?;

    let mut excluded = HashSet::new();
    for pending_tx in &pending {
        let sender = &pending_tx.message.sender;
        if newly_banned.contains(sender) || excluded.contains(sender) {
            continue;
        }
        if store.user(sender)?.is_some_and(|user| user.banned) {
            excluded.insert(sender.clone());
        }
    }
    newly_banned.extend(excluded);

    let survivors = filter_survivors(pending, &newly_banned);

    let ban_count = ban_txs.len();
    let content_count = survivors.len();
    let mut txs = Vec::with_capacity(ban_count + content_count);
    for ban_tx in &ban_txs {
        txs.push(ban_tx.to_tx_bytes().map_err(ChatAppError::Encode)?);
    }
    txs.extend(survivors.into_iter().map(|survivor| survivor.tx));

    Ok(BuiltProposal {
        txs,
        ban_count,
        content_count,
        dropped_count: candidates.len() - content_count - ban_count,
    })
}
