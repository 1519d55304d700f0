/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The chat app: the [`Application`] that a consensus engine drives.
//!
//! A [`ChatApp`] owns everything that the entry points share across calls:
//! - A handle to the user's [`KVStore`], through which committed state is read and written.
//! - The committed [`ChainState`], loaded from the store when the app starts.
//! - The block being executed, i.e., the [`MutationScope`] opened by `finalize_block` and the chain
//!   state it produced, until `commit` makes both durable. Nothing else reads or writes this.
//! - The moderation configuration, the [`TxVerifier`], and the registered event handlers.
//!
//! ## Starting a chat app
//!
//! ```ignore
//! let mut app = ChatApp::new(kv_store, AcceptAll, Configuration::default())?;
//! app.on_ban_user(|event| println!("{} was banned", event.user));
//! ```
//!
//! ## Concurrency
//!
//! The methods that take `&self` only read committed state, so a `ChatApp` can be shared between
//! threads (it is `Sync`, since [`KVStore`] and [`TxVerifier`] implementations must be). Many
//! `check_tx` calls may then run at once. The methods that take `&mut self` run one at a time.
//!
//! ## Halting
//!
//! If `commit` fails, the store may or may not contain the block, and the replica cannot tell which.
//! The chat app then halts: every later `finalize_block` and `commit` returns
//! [`ChatAppError::Halted`]. Restarting the process reloads the chain state from the store, after which
//! the consensus engine can replay the block if it was not persisted.

use std::time::SystemTime;

use borsh::BorshSerialize;

use crate::{
    admission::{self, Admission},
    app::*,
    config::Configuration,
    error::ChatAppError,
    events::*,
    execution::{self, ExecutedTx},
    moderation::{encode_vote_extension, is_well_formed_vote_extension, CurseWords},
    proposal::build_proposal,
    store::{accessors::MutationScope, pluggables::KVStore},
    types::chain_state::ChainState,
    validation::validate_proposal,
    verifier::{AcceptAll, TxVerifier},
};

/// A block that has been finalized but not yet committed.
struct PendingBlock<K: KVStore> {
    scope: MutationScope<K>,
    chain_state: ChainState,
}

pub struct ChatApp<K: KVStore, V: TxVerifier = AcceptAll> {
    kv_store: K,
    verifier: V,
    curse_words: CurseWords,
    vote_extension_words: Vec<String>,
    committed_chain_state: ChainState,
    pending_block: Option<PendingBlock<K>>,
    halted: bool,
    event_handlers: EventHandlers,
}

impl<K: KVStore, V: TxVerifier> ChatApp<K, V> {
    /// Create a chat app over `kv_store`, resuming from the chain state persisted in it, if any.
    pub fn new(kv_store: K, verifier: V, config: Configuration) -> Result<Self, ChatAppError> {
        let committed_chain_state = kv_store.chain_state()?.unwrap_or_else(ChainState::genesis);
        log::debug!(
            "Starting chat app at height {} with {} messages",
            committed_chain_state.height,
            committed_chain_state.size
        );

        Ok(ChatApp {
            kv_store,
            verifier,
            curse_words: CurseWords::new(&config.curse_words),
            vote_extension_words: config.vote_extension_words,
            committed_chain_state,
            pending_block: None,
            halted: false,
            event_handlers: EventHandlers::new(config.log_events),
        })
    }

    /// Get the chain state as of the last successful commit.
    pub fn chain_state(&self) -> ChainState {
        self.committed_chain_state
    }

    /// Get the underlying key-value store.
    pub fn kv_store(&self) -> &K {
        &self.kv_store
    }

    /// Check whether a failed commit has halted this app.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /* ↓↓↓ Event handler registration ↓↓↓ */

    pub fn on_check_tx(&mut self, handler: impl Fn(&CheckTxEvent) + Send + Sync + 'static) {
        self.event_handlers.check_tx_handlers.push(Box::new(handler));
    }

    pub fn on_prepare_proposal(
        &mut self,
        handler: impl Fn(&PrepareProposalEvent) + Send + Sync + 'static,
    ) {
        self.event_handlers
            .prepare_proposal_handlers
            .push(Box::new(handler));
    }

    pub fn on_process_proposal(
        &mut self,
        handler: impl Fn(&ProcessProposalEvent) + Send + Sync + 'static,
    ) {
        self.event_handlers
            .process_proposal_handlers
            .push(Box::new(handler));
    }

    pub fn on_ban_user(&mut self, handler: impl Fn(&BanUserEvent) + Send + Sync + 'static) {
        self.event_handlers.ban_user_handlers.push(Box::new(handler));
    }

    pub fn on_append_message(
        &mut self,
        handler: impl Fn(&AppendMessageEvent) + Send + Sync + 'static,
    ) {
        self.event_handlers
            .append_message_handlers
            .push(Box::new(handler));
    }

    pub fn on_finalize_block(
        &mut self,
        handler: impl Fn(&FinalizeBlockEvent) + Send + Sync + 'static,
    ) {
        self.event_handlers
            .finalize_block_handlers
            .push(Box::new(handler));
    }

    pub fn on_commit(&mut self, handler: impl Fn(&CommitEvent) + Send + Sync + 'static) {
        self.event_handlers.commit_handlers.push(Box::new(handler));
    }

    fn query_response(&self, code: ResultCode, log: impl Into<String>, value: Vec<u8>) -> QueryResponse {
        QueryResponse {
            code,
            log: log.into(),
            value,
            height: self.committed_chain_state.height,
        }
    }
}

impl<K: KVStore, V: TxVerifier> Application for ChatApp<K, V> {
    fn info(&self) -> InfoResponse {
        InfoResponse {
            last_block_height: self.committed_chain_state.height,
            last_block_app_hash: self.committed_chain_state.app_hash,
            size: self.committed_chain_state.size,
        }
    }

    fn query(&self, request: QueryRequest) -> Result<QueryResponse, ChatAppError> {
        let encoded = match request.path.as_str() {
            QUERY_HISTORY => self.kv_store.chat_history()?.try_to_vec(),
            QUERY_USER | QUERY_MESSAGES => {
                let Ok(name) = std::str::from_utf8(&request.data) else {
                    return Ok(self.query_response(
                        ResultCode::EncodingError,
                        "user name is not valid UTF-8",
                        Vec::new(),
                    ));
                };
                let Some(user) = self.kv_store.user(name)? else {
                    return Ok(self.query_response(
                        ResultCode::UnknownUser,
                        format!("user {} does not exist", name),
                        Vec::new(),
                    ));
                };
                if request.path == QUERY_USER {
                    user.try_to_vec()
                } else {
                    self.kv_store.user_messages(name)?.try_to_vec()
                }
            }
            unknown => {
                return Ok(self.query_response(
                    ResultCode::UnknownPath,
                    format!("unknown query path {}", unknown),
                    Vec::new(),
                ))
            }
        };

        match encoded {
            Ok(value) => Ok(self.query_response(ResultCode::Ok, "", value)),
            Err(err) => Ok(self.query_response(
                ResultCode::EncodingError,
                format!("could not encode query result: {}", err),
                Vec::new(),
            )),
        }
    }

    fn check_tx(&self, request: CheckTxRequest) -> Result<CheckTxResponse, ChatAppError> {
        let admission = admission::check_tx(&request.tx, &self.kv_store, &self.verifier)
            .map_err(|err| {
                log::error!("CheckTx could not read the store: {}", err);
                err
            })?;

        let (sender, response) = match admission {
            Admission::Admitted(message) => (
                Some(message.sender),
                CheckTxResponse {
                    code: ResultCode::Ok,
                    log: String::new(),
                    info: String::new(),
                },
            ),
            Admission::Unauthorized => (
                None,
                CheckTxResponse {
                    code: ResultCode::Unauthorized,
                    log: "transaction failed verification".to_string(),
                    info: String::new(),
                },
            ),
            Admission::InvalidFormat(err) => (
                None,
                CheckTxResponse {
                    code: ResultCode::InvalidTxFormat,
                    log: "invalid transaction format".to_string(),
                    info: err.to_string(),
                },
            ),
            Admission::Banned { sender } => {
                let info = format!("user {} is banned", sender);
                (
                    Some(sender),
                    CheckTxResponse {
                        code: ResultCode::Banned,
                        log: "sender is banned".to_string(),
                        info,
                    },
                )
            }
        };

        if !response.code.is_ok() {
            log::debug!("CheckTx rejected a transaction: {}, {}", response.code, response.log);
        }

        self.event_handlers.fire_handlers(Event::CheckTx(CheckTxEvent {
            timestamp: SystemTime::now(),
            sender,
            code: response.code,
        }));

        Ok(response)
    }

    fn prepare_proposal(
        &self,
        request: PrepareProposalRequest,
    ) -> Result<PrepareProposalResponse, ChatAppError> {
        let vote_extensions = request
            .local_last_commit
            .votes
            .iter()
            .map(|vote| vote.vote_extension.as_slice());

        let proposal = build_proposal(
            &request.txs,
            vote_extensions,
            &self.curse_words,
            &self.kv_store,
        )
        .map_err(|err| {
            log::error!(
                "Could not prepare a proposal for height {}: {}",
                request.height,
                err
            );
            err
        })?;

        if proposal.dropped_count > 0 {
            log::debug!(
                "Dropped {} candidate transactions from the proposal for height {}",
                proposal.dropped_count,
                request.height
            );
        }

        self.event_handlers
            .fire_handlers(Event::PrepareProposal(PrepareProposalEvent {
                timestamp: SystemTime::now(),
                height: request.height,
                candidates: request.txs.len(),
                ban_txs: proposal.ban_count,
                content_txs: proposal.content_count,
            }));

        Ok(PrepareProposalResponse { txs: proposal.txs })
    }

    fn process_proposal(&self, request: ProcessProposalRequest) -> ProcessProposalResponse {
        let status = match validate_proposal(&request.txs, &self.verifier) {
            Ok(()) => ProposalStatus::Accept,
            Err(reason) => {
                log::warn!(
                    "Rejecting proposal for height {}: {}",
                    request.height,
                    reason
                );
                ProposalStatus::Reject
            }
        };

        self.event_handlers
            .fire_handlers(Event::ProcessProposal(ProcessProposalEvent {
                timestamp: SystemTime::now(),
                height: request.height,
                txs: request.txs.len(),
                status,
            }));

        ProcessProposalResponse { status }
    }

    fn extend_vote(&self, _request: ExtendVoteRequest) -> ExtendVoteResponse {
        ExtendVoteResponse {
            vote_extension: encode_vote_extension(&self.vote_extension_words),
        }
    }

    fn verify_vote_extension(
        &self,
        request: VerifyVoteExtensionRequest,
    ) -> VerifyVoteExtensionResponse {
        let status = if is_well_formed_vote_extension(&request.vote_extension) {
            VerifyStatus::Accept
        } else {
            log::warn!(
                "Rejecting malformed vote extension for height {}",
                request.height
            );
            VerifyStatus::Reject
        };
        VerifyVoteExtensionResponse { status }
    }

    fn finalize_block(
        &mut self,
        request: FinalizeBlockRequest,
    ) -> Result<FinalizeBlockResponse, ChatAppError> {
        if self.halted {
            return Err(ChatAppError::Halted);
        }

        let expected = self.committed_chain_state.height + 1;
        if request.height != expected {
            return Err(ChatAppError::HeightMismatch {
                expected,
                got: request.height,
            });
        }

        if self.pending_block.take().is_some() {
            log::warn!(
                "Discarding an uncommitted block to finalize height {} again",
                request.height
            );
        }

        let mut scope = MutationScope::open(
            self.kv_store.clone(),
            &self.committed_chain_state.app_hash,
        );
        let mut chain_state = self.committed_chain_state;
        let executed = execution::finalize_block(
            &mut scope,
            request.height,
            &request.txs,
            &self.verifier,
            &mut chain_state,
        )
        .map_err(|err| {
            log::error!("Could not finalize height {}: {}", request.height, err);
            err
        })?;

        let mut tx_results = Vec::with_capacity(executed.len());
        for executed_tx in executed {
            match executed_tx {
                ExecutedTx::Ban { user } => {
                    tx_results.push(ExecTxResult {
                        code: ResultCode::Ok,
                        log: format!("banned {}", user.name),
                        info: String::new(),
                    });
                    self.event_handlers.fire_handlers(Event::BanUser(BanUserEvent {
                        timestamp: SystemTime::now(),
                        height: request.height,
                        user: user.name,
                    }));
                }
                ExecutedTx::Post {
                    message,
                    sender_message_count,
                    chat_history_len,
                } => {
                    tx_results.push(ExecTxResult {
                        code: ResultCode::Ok,
                        log: format!("posted message {} of {}", sender_message_count, message.sender),
                        info: format!("chat history length {}", chat_history_len),
                    });
                    self.event_handlers
                        .fire_handlers(Event::AppendMessage(AppendMessageEvent {
                            timestamp: SystemTime::now(),
                            height: request.height,
                            message,
                        }));
                }
            }
        }

        self.event_handlers
            .fire_handlers(Event::FinalizeBlock(FinalizeBlockEvent {
                timestamp: SystemTime::now(),
                height: request.height,
                txs: request.txs.len(),
                app_hash: chain_state.app_hash,
            }));

        let app_hash = chain_state.app_hash;
        self.pending_block = Some(PendingBlock { scope, chain_state });

        Ok(FinalizeBlockResponse {
            tx_results,
            app_hash,
        })
    }

    fn commit(&mut self) -> Result<CommitResponse, ChatAppError> {
        if self.halted {
            return Err(ChatAppError::Halted);
        }

        let PendingBlock { scope, chain_state } =
            self.pending_block.take().ok_or(ChatAppError::NoOpenScope)?;

        if let Err(err) = execution::commit(&mut self.kv_store, scope, &chain_state) {
            log::error!(
                "Could not commit height {}, halting: {}",
                chain_state.height,
                err
            );
            self.halted = true;
            return Err(err);
        }

        self.committed_chain_state = chain_state;
        self.event_handlers.fire_handlers(Event::Commit(CommitEvent {
            timestamp: SystemTime::now(),
            height: chain_state.height,
            size: chain_state.size,
            app_hash: chain_state.app_hash,
        }));

        Ok(CommitResponse {
            height: chain_state.height,
        })
    }
}
