/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of chat app events for event handling and logging.
//!
//! An event for a given action indicates that the action has been completed. Handlers registered
//! on a [`ChatApp`](crate::chat_app::ChatApp) (e.g., through
//! [`on_ban_user`](crate::chat_app::ChatApp::on_ban_user)) are fired synchronously, in the thread that
//! made the entry point call, in the order they were registered. When
//! [`log_events`](crate::config::Configuration::log_events) is set, the default
//! [loggers](crate::logging) are registered before any user-defined handler.

use std::time::SystemTime;

use crate::{
    app::{ProposalStatus, ResultCode},
    logging::Logger,
    types::{
        data_types::{CryptoHash, Height, MessageCount},
        transactions::ChatMessage,
    },
};

pub enum Event {
    CheckTx(CheckTxEvent),
    PrepareProposal(PrepareProposalEvent),
    ProcessProposal(ProcessProposalEvent),
    BanUser(BanUserEvent),
    AppendMessage(AppendMessageEvent),
    FinalizeBlock(FinalizeBlockEvent),
    Commit(CommitEvent),
}

/// A transaction was checked for admission into the mempool.
pub struct CheckTxEvent {
    pub timestamp: SystemTime,
    pub sender: Option<String>,
    pub code: ResultCode,
}

/// A block was built for proposal.
pub struct PrepareProposalEvent {
    pub timestamp: SystemTime,
    pub height: Height,
    pub candidates: usize,
    pub ban_txs: usize,
    pub content_txs: usize,
}

/// A proposed block was accepted or rejected.
pub struct ProcessProposalEvent {
    pub timestamp: SystemTime,
    pub height: Height,
    pub txs: usize,
    pub status: ProposalStatus,
}

/// A ban transaction was applied while finalizing a block at `height`.
pub struct BanUserEvent {
    pub timestamp: SystemTime,
    pub height: Height,
    pub user: String,
}

/// A message was appended to the chat history while finalizing a block at `height`.
pub struct AppendMessageEvent {
    pub timestamp: SystemTime,
    pub height: Height,
    pub message: ChatMessage,
}

/// A block was finalized. Its effects are not durable yet.
pub struct FinalizeBlockEvent {
    pub timestamp: SystemTime,
    pub height: Height,
    pub txs: usize,
    pub app_hash: CryptoHash,
}

/// A finalized block was committed.
pub struct CommitEvent {
    pub timestamp: SystemTime,
    pub height: Height,
    pub size: MessageCount,
    pub app_hash: CryptoHash,
}

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send + Sync>;

#[derive(Default)]
pub(crate) struct EventHandlers {
    pub(crate) check_tx_handlers: Vec<HandlerPtr<CheckTxEvent>>,
    pub(crate) prepare_proposal_handlers: Vec<HandlerPtr<PrepareProposalEvent>>,
    pub(crate) process_proposal_handlers: Vec<HandlerPtr<ProcessProposalEvent>>,
    pub(crate) ban_user_handlers: Vec<HandlerPtr<BanUserEvent>>,
    pub(crate) append_message_handlers: Vec<HandlerPtr<AppendMessageEvent>>,
    pub(crate) finalize_block_handlers: Vec<HandlerPtr<FinalizeBlockEvent>>,
    pub(crate) commit_handlers: Vec<HandlerPtr<CommitEvent>>,
}

impl EventHandlers {
    /// Create an `EventHandlers` that contains only the default loggers if `log_events` is `true`, and
    /// nothing otherwise.
    pub(crate) fn new(log_events: bool) -> EventHandlers {
        let mut handlers = EventHandlers::default();
        if log_events {
            handlers.check_tx_handlers.push(CheckTxEvent::get_logger());
            handlers
                .prepare_proposal_handlers
                .push(PrepareProposalEvent::get_logger());
            handlers
                .process_proposal_handlers
                .push(ProcessProposalEvent::get_logger());
            handlers.ban_user_handlers.push(BanUserEvent::get_logger());
            handlers
                .append_message_handlers
                .push(AppendMessageEvent::get_logger());
            handlers
                .finalize_block_handlers
                .push(FinalizeBlockEvent::get_logger());
            handlers.commit_handlers.push(CommitEvent::get_logger());
        }
        handlers
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::CheckTx(check_tx_event) => self
                .check_tx_handlers
                .iter()
                .for_each(|handler| handler(&check_tx_event)),

            Event::PrepareProposal(prepare_proposal_event) => self
                .prepare_proposal_handlers
                .iter()
                .for_each(|handler| handler(&prepare_proposal_event)),

            Event::ProcessProposal(process_proposal_event) => self
                .process_proposal_handlers
                .iter()
                .for_each(|handler| handler(&process_proposal_event)),

            Event::BanUser(ban_user_event) => self
                .ban_user_handlers
                .iter()
                .for_each(|handler| handler(&ban_user_event)),

            Event::AppendMessage(append_message_event) => self
                .append_message_handlers
                .iter()
                .for_each(|handler| handler(&append_message_event)),

            Event::FinalizeBlock(finalize_block_event) => self
                .finalize_block_handlers
                .iter()
                .for_each(|handler| handler(&finalize_block_event)),

            Event::Commit(commit_event) => self
                .commit_handlers
                .iter()
                .for_each(|handler| handler(&commit_event)),
        }
    }
}
