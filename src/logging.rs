/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the chat app's
//! [config](crate::config::Configuration).
//!
//! The chat app logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how a [Commit](crate::events::CommitEvent) is printed:
//!
//! ```text
//! Commit, 1701329264, 12, 57, fNGCJyk
//! ```
//!
//! In the snippet:
//! - The third value is the height of the committed block.
//! - The fourth value is the number of messages in the chat history after the commit.
//! - The fifth value is the first seven characters of the Base64 encoding of the app hash.

use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

use crate::{app::ProposalStatus, events::*};

// Names of each event in PascalCase for printing:
pub const CHECK_TX: &str = "CheckTx";
pub const PREPARE_PROPOSAL: &str = "PrepareProposal";
pub const PROCESS_PROPOSAL: &str = "ProcessProposal";
pub const BAN_USER: &str = "BanUser";
pub const APPEND_MESSAGE: &str = "AppendMessage";
pub const FINALIZE_BLOCK: &str = "FinalizeBlock";
pub const COMMIT: &str = "Commit";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync>;
}

impl Logger for CheckTxEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |check_tx_event: &CheckTxEvent| {
            log::info!(
                "{}, {}, {}, {}",
                CHECK_TX,
                secs_since_unix_epoch(check_tx_event.timestamp),
                check_tx_event.sender.as_deref().unwrap_or("-"),
                check_tx_event.code
            )
        };
        Box::new(logger)
    }
}

impl Logger for PrepareProposalEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |prepare_proposal_event: &PrepareProposalEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}",
                PREPARE_PROPOSAL,
                secs_since_unix_epoch(prepare_proposal_event.timestamp),
                prepare_proposal_event.height,
                prepare_proposal_event.candidates,
                prepare_proposal_event.ban_txs,
                prepare_proposal_event.content_txs
            )
        };
        Box::new(logger)
    }
}

impl Logger for ProcessProposalEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |process_proposal_event: &ProcessProposalEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                PROCESS_PROPOSAL,
                secs_since_unix_epoch(process_proposal_event.timestamp),
                process_proposal_event.height,
                process_proposal_event.txs,
                match process_proposal_event.status {
                    ProposalStatus::Accept => "Accept",
                    ProposalStatus::Reject => "Reject",
                }
            )
        };
        Box::new(logger)
    }
}

impl Logger for BanUserEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |ban_user_event: &BanUserEvent| {
            log::info!(
                "{}, {}, {}, {}",
                BAN_USER,
                secs_since_unix_epoch(ban_user_event.timestamp),
                ban_user_event.height,
                ban_user_event.user
            )
        };
        Box::new(logger)
    }
}

impl Logger for AppendMessageEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |append_message_event: &AppendMessageEvent| {
            log::debug!(
                "{}, {}, {}, {}, {}",
                APPEND_MESSAGE,
                secs_since_unix_epoch(append_message_event.timestamp),
                append_message_event.height,
                append_message_event.message.sender,
                append_message_event.message.message.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for FinalizeBlockEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |finalize_block_event: &FinalizeBlockEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                FINALIZE_BLOCK,
                secs_since_unix_epoch(finalize_block_event.timestamp),
                finalize_block_event.height,
                finalize_block_event.txs,
                first_seven_base64_chars(&finalize_block_event.app_hash.bytes())
            )
        };
        Box::new(logger)
    }
}

impl Logger for CommitEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send + Sync> {
        let logger = |commit_event: &CommitEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                COMMIT,
                secs_since_unix_epoch(commit_event.timestamp),
                commit_event.height,
                commit_event.size,
                first_seven_base64_chars(&commit_event.app_hash.bytes())
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
pub(crate) fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
