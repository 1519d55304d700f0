/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The interface through which a consensus engine drives the chat app.
//!
//! # Call sequence
//!
//! For every height, the consensus engine calls the methods of [`Application`] in a fixed order:
//! 1. [`check_tx`](Application::check_tx), any number of times and possibly concurrently, to admit
//!    client transactions into its mempool.
//! 2. [`prepare_proposal`](Application::prepare_proposal), only on the replica that proposes the block.
//! 3. [`process_proposal`](Application::process_proposal), on every replica, including the proposer.
//! 4. [`extend_vote`](Application::extend_vote) and
//!    [`verify_vote_extension`](Application::verify_vote_extension), while voting.
//! 5. [`finalize_block`](Application::finalize_block), once the block is decided.
//! 6. [`commit`](Application::commit), to make the effects of `finalize_block` durable.
//!
//! [`info`](Application::info) and [`query`](Application::query) may be called at any time and only
//! ever see committed state.
//!
//! # Determinism requirements
//!
//! `prepare_proposal` aside, every method that takes part in deciding or executing a block must
//! evaluate to the same value on every honest replica given the same arguments and the same committed
//! state. `process_proposal` in particular is a pure function of the proposed transactions.
//!
//! # Errors
//!
//! Methods that return `Err` have hit a condition that should never happen on an honest, healthy
//! replica: a corrupted store, a proposal that bypassed validation, or a failed commit. The consensus
//! engine must not carry on with the height as if the call had succeeded.

use std::fmt::{self, Display, Formatter};

use crate::{
    error::ChatAppError,
    types::data_types::{CryptoHash, Height, MessageCount},
};

/// Methods that the chat app exposes to the consensus engine.
pub trait Application {
    /// Get the committed chain state, so that the consensus engine can resume after a restart.
    fn info(&self) -> InfoResponse;

    /// Query committed state. See [`QueryRequest`] for the supported paths.
    fn query(&self, request: QueryRequest) -> Result<QueryResponse, ChatAppError>;

    /// Decide whether a client transaction may enter the mempool. Never writes to the store.
    fn check_tx(&self, request: CheckTxRequest) -> Result<CheckTxResponse, ChatAppError>;

    /// Turn the mempool's candidate transactions into the block to propose, with every ban
    /// transaction first.
    fn prepare_proposal(
        &self,
        request: PrepareProposalRequest,
    ) -> Result<PrepareProposalResponse, ChatAppError>;

    /// Decide whether to accept a block proposed by any replica.
    fn process_proposal(&self, request: ProcessProposalRequest) -> ProcessProposalResponse;

    /// Get the vote extension to attach to this replica's vote.
    fn extend_vote(&self, request: ExtendVoteRequest) -> ExtendVoteResponse;

    /// Decide whether a vote extension produced by another replica is well-formed.
    fn verify_vote_extension(
        &self,
        request: VerifyVoteExtensionRequest,
    ) -> VerifyVoteExtensionResponse;

    /// Execute a decided block. The effects are visible to later calls in the same height but are
    /// not durable until [`commit`](Application::commit) succeeds.
    fn finalize_block(
        &mut self,
        request: FinalizeBlockRequest,
    ) -> Result<FinalizeBlockResponse, ChatAppError>;

    /// Atomically persist the effects of the last `finalize_block` together with the chain state.
    fn commit(&mut self) -> Result<CommitResponse, ChatAppError>;
}

/// Result codes returned to the consensus engine. `Ok` is the only code that means success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    EncodingError,
    InvalidTxFormat,
    Banned,
    Unauthorized,
    UnknownPath,
    UnknownUser,
}

impl ResultCode {
    /// Get the integer that represents this code on the wire.
    pub const fn int(&self) -> u32 {
        match self {
            ResultCode::Ok => 0,
            ResultCode::EncodingError => 1,
            ResultCode::InvalidTxFormat => 2,
            ResultCode::Banned => 3,
            ResultCode::Unauthorized => 4,
            ResultCode::UnknownPath => 5,
            ResultCode::UnknownUser => 6,
        }
    }

    pub const fn is_ok(&self) -> bool {
        matches!(self, ResultCode::Ok)
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Ok => "Ok",
            ResultCode::EncodingError => "EncodingError",
            ResultCode::InvalidTxFormat => "InvalidTxFormat",
            ResultCode::Banned => "Banned",
            ResultCode::Unauthorized => "Unauthorized",
            ResultCode::UnknownPath => "UnknownPath",
            ResultCode::UnknownUser => "UnknownUser",
        };
        write!(f, "{}", name)
    }
}

/* ↓↓↓ Info ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoResponse {
    pub last_block_height: Height,
    pub last_block_app_hash: CryptoHash,
    pub size: MessageCount,
}

/* ↓↓↓ Query ↓↓↓ */

/// A query against committed state. Supported `path`s:
/// - [`QUERY_USER`]: `data` is a user name. Responds with the Borsh-encoded [`User`](crate::types::user::User).
/// - [`QUERY_MESSAGES`]: `data` is a user name. Responds with the Borsh-encoded `Vec<ChatMessage>` of
///   every message that user posted.
/// - [`QUERY_HISTORY`]: `data` is ignored. Responds with the Borsh-encoded `Vec<ChatMessage>` global
///   chat history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub path: String,
    pub data: Vec<u8>,
}

pub const QUERY_USER: &str = "/user";
pub const QUERY_MESSAGES: &str = "/messages";
pub const QUERY_HISTORY: &str = "/history";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResponse {
    pub code: ResultCode,
    pub log: String,
    pub value: Vec<u8>,
    pub height: Height,
}

/* ↓↓↓ CheckTx ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckTxRequest {
    pub tx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckTxResponse {
    pub code: ResultCode,
    pub log: String,
    pub info: String,
}

/* ↓↓↓ PrepareProposal ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrepareProposalRequest {
    /// Height of the block to propose.
    pub height: Height,

    /// Candidate transactions from the mempool, in mempool order.
    pub txs: Vec<Vec<u8>>,

    /// The votes (with their extensions) that committed the previous height.
    pub local_last_commit: ExtendedCommitInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedCommitInfo {
    pub votes: Vec<ExtendedVoteInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedVoteInfo {
    pub vote_extension: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrepareProposalResponse {
    pub txs: Vec<Vec<u8>>,
}

/* ↓↓↓ ProcessProposal ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessProposalRequest {
    pub height: Height,
    pub txs: Vec<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStatus {
    Accept,
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessProposalResponse {
    pub status: ProposalStatus,
}

/* ↓↓↓ Vote extensions ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendVoteRequest {
    pub height: Height,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendVoteResponse {
    pub vote_extension: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyVoteExtensionRequest {
    pub height: Height,
    pub vote_extension: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyStatus {
    Accept,
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyVoteExtensionResponse {
    pub status: VerifyStatus,
}

/* ↓↓↓ FinalizeBlock ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeBlockRequest {
    pub height: Height,
    pub txs: Vec<Vec<u8>>,
}

/// The result of executing one transaction of a finalized block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecTxResult {
    pub code: ResultCode,
    pub log: String,
    pub info: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeBlockResponse {
    /// One result per transaction of the block, in block order.
    pub tx_results: Vec<ExecTxResult>,
    pub app_hash: CryptoHash,
}

/* ↓↓↓ Commit ↓↓↓ */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitResponse {
    /// Height of the block that was just committed.
    pub height: Height,
}
