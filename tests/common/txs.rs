//! Helpers for building transactions and driving a [`ChatApp`] through whole heights.

use chat_moderation::{
    app::{
        Application, ExtendedCommitInfo, ExtendedVoteInfo, FinalizeBlockRequest,
        FinalizeBlockResponse, PrepareProposalRequest, ProcessProposalRequest, ProposalStatus,
    },
    chat_app::ChatApp,
    config::Configuration,
    store::pluggables::KVStore,
    types::{
        data_types::Height,
        transactions::{BanTx, ChatMessage},
    },
    verifier::AcceptAll,
};
use log::LevelFilter;

use super::{logging::setup_logger, mem_db::MemDB};

pub(crate) fn message_tx(sender: &str, message: &str) -> Vec<u8> {
    ChatMessage::new(sender, message).to_tx_bytes().unwrap()
}

pub(crate) fn ban_tx(user_name: &str) -> Vec<u8> {
    BanTx::new(user_name).to_tx_bytes().unwrap()
}

/// Configuration whose only local curse word is "idiot".
pub(crate) fn test_config() -> Configuration {
    Configuration::builder()
        .curse_words(vec!["idiot".to_string()])
        .build()
}

/// Create a chat app over a fresh `MemDB` that uses [`test_config`].
pub(crate) fn new_app() -> (ChatApp<MemDB>, MemDB) {
    setup_logger(LevelFilter::Debug);
    let db = MemDB::new();
    let app = ChatApp::new(db.clone(), AcceptAll, test_config()).unwrap();
    (app, db)
}

pub(crate) fn commit_info(vote_extensions: &[&str]) -> ExtendedCommitInfo {
    ExtendedCommitInfo {
        votes: vote_extensions
            .iter()
            .map(|extension| ExtendedVoteInfo {
                vote_extension: extension.as_bytes().to_vec(),
            })
            .collect(),
    }
}

/// Drive `app` through a whole height: prepare a proposal out of `candidates`, check that it is
/// accepted, finalize it, and commit it. Returns the proposal and the finalize response.
pub(crate) fn run_height<K: KVStore>(
    app: &mut ChatApp<K>,
    candidates: Vec<Vec<u8>>,
    vote_extensions: &[&str],
) -> (Vec<Vec<u8>>, FinalizeBlockResponse) {
    let height = Height::new(app.chain_state().height.int() + 1);

    let proposal = app
        .prepare_proposal(PrepareProposalRequest {
            height,
            txs: candidates,
            local_last_commit: commit_info(vote_extensions),
        })
        .unwrap()
        .txs;

    let processed = app.process_proposal(ProcessProposalRequest {
        height,
        txs: proposal.clone(),
    });
    assert_eq!(processed.status, ProposalStatus::Accept);

    let finalized = app
        .finalize_block(FinalizeBlockRequest {
            height,
            txs: proposal.clone(),
        })
        .unwrap();
    app.commit().unwrap();

    (proposal, finalized)
}
