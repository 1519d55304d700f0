//! Tests for `finalize_block` and `commit`: executing decided blocks and making them durable.

mod common;

use std::sync::{Arc, Mutex};

use chat_moderation::{
    app::{Application, FinalizeBlockRequest, FinalizeBlockResponse},
    chat_app::ChatApp,
    error::ChatAppError,
    store::pluggables::{KVGet, KVStore},
    types::{
        data_types::{CryptoHash, Height, MessageCount},
        transactions::ChatMessage,
        user::User,
    },
    verifier::{AcceptAll, TxVerifier},
};

use common::{
    mem_db::{FailingDB, MemDB},
    txs::{ban_tx, message_tx, new_app, run_height, test_config},
};

fn finalize<K: KVStore>(
    app: &mut ChatApp<K>,
    txs: Vec<Vec<u8>>,
) -> Result<FinalizeBlockResponse, ChatAppError> {
    let height = Height::new(app.chain_state().height.int() + 1);
    app.finalize_block(FinalizeBlockRequest { height, txs })
}

#[test]
fn offender_is_banned_and_only_clean_messages_are_stored() {
    let (mut app, db) = new_app();
    let (proposal, finalized) = run_height(
        &mut app,
        vec![
            message_tx("bob", "you idiot"),
            message_tx("bob", "hello"),
            message_tx("carol", "hi"),
        ],
        &[],
    );

    assert_eq!(proposal.len(), 2);
    assert_eq!(finalized.tx_results.len(), 2);
    assert!(finalized
        .tx_results
        .iter()
        .all(|result| result.code.is_ok()));

    assert_eq!(db.user("bob").unwrap(), Some(User::new("bob", true)));
    assert_eq!(db.user("carol").unwrap(), Some(User::new("carol", false)));
    assert!(db.user_messages("bob").unwrap().is_empty());
    assert_eq!(
        db.user_messages("carol").unwrap(),
        vec![ChatMessage::new("carol", "hi")]
    );
    assert_eq!(
        db.chat_history().unwrap(),
        vec![ChatMessage::new("carol", "hi")]
    );

    let chain_state = app.chain_state();
    assert_eq!(chain_state.height, Height::new(1));
    assert_eq!(chain_state.size, MessageCount::new(1));
    assert_eq!(chain_state.app_hash, finalized.app_hash);
    assert_eq!(db.chain_state().unwrap(), Some(chain_state));
}

#[test]
fn chat_history_keeps_block_order_across_heights() {
    let (mut app, db) = new_app();
    run_height(
        &mut app,
        vec![message_tx("carol", "one"), message_tx("dave", "two")],
        &[],
    );
    run_height(
        &mut app,
        vec![message_tx("carol", "three")],
        &[],
    );

    assert_eq!(
        db.chat_history().unwrap(),
        vec![
            ChatMessage::new("carol", "one"),
            ChatMessage::new("dave", "two"),
            ChatMessage::new("carol", "three"),
        ]
    );
    assert_eq!(db.user_message_count("carol").unwrap(), 2);
    assert_eq!(db.chat_history_len().unwrap(), 3);
    assert_eq!(app.chain_state().size, MessageCount::new(3));
}

#[test]
fn finalized_block_is_not_durable_before_commit() {
    let (mut app, db) = new_app();
    assert_eq!(db.len(), 0);

    finalize(&mut app, vec![ban_tx("bob"), message_tx("carol", "hi")]).unwrap();
    assert_eq!(db.len(), 0);
    assert_eq!(db.user("carol").unwrap(), None);
    assert_eq!(app.chain_state().height, Height::new(0));

    app.commit().unwrap();
    assert!(db.len() > 0);
    assert_eq!(db.user("carol").unwrap(), Some(User::new("carol", false)));
    assert_eq!(app.chain_state().height, Height::new(1));
}

#[test]
fn bans_are_never_lifted() {
    let (mut app, db) = new_app();
    run_height(&mut app, vec![message_tx("bob", "idiot")], &[]);
    assert_eq!(db.user("bob").unwrap(), Some(User::new("bob", true)));

    // A block proposed without looking at committed state can still carry bob's message.
    finalize(&mut app, vec![message_tx("bob", "hello")]).unwrap();
    app.commit().unwrap();

    assert_eq!(db.user("bob").unwrap(), Some(User::new("bob", true)));

    run_height(&mut app, vec![], &[]);
    assert_eq!(db.user("bob").unwrap(), Some(User::new("bob", true)));
}

#[test]
fn wrong_height_is_rejected() {
    let (mut app, _) = new_app();
    let result = app.finalize_block(FinalizeBlockRequest {
        height: Height::new(2),
        txs: vec![message_tx("carol", "hi")],
    });

    match result {
        Err(ChatAppError::HeightMismatch { expected, got }) => {
            assert_eq!(expected, Height::new(1));
            assert_eq!(got, Height::new(2));
        }
        other => panic!("expected HeightMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn commit_without_finalize_is_an_error() {
    let (mut app, _) = new_app();
    assert!(matches!(app.commit(), Err(ChatAppError::NoOpenScope)));

    run_height(&mut app, vec![message_tx("carol", "hi")], &[]);
    assert!(matches!(app.commit(), Err(ChatAppError::NoOpenScope)));
}

#[test]
fn finalizing_again_discards_the_uncommitted_block() {
    let (mut app, db) = new_app();
    finalize(&mut app, vec![message_tx("carol", "first")]).unwrap();
    finalize(&mut app, vec![message_tx("dave", "second")]).unwrap();
    app.commit().unwrap();

    assert_eq!(
        db.chat_history().unwrap(),
        vec![ChatMessage::new("dave", "second")]
    );
    assert_eq!(db.user("carol").unwrap(), None);
}

#[test]
fn ban_after_content_fails_finalize() {
    let (mut app, db) = new_app();
    let result = finalize(&mut app, vec![message_tx("carol", "hi"), ban_tx("bob")]);

    assert!(matches!(
        result,
        Err(ChatAppError::UnexpectedTx { index: 1, .. })
    ));
    assert!(matches!(app.commit(), Err(ChatAppError::NoOpenScope)));
    assert_eq!(db.len(), 0);
}

struct RejectSender(&'static str);

impl TxVerifier for RejectSender {
    fn verify(&self, tx: &[u8]) -> bool {
        chat_moderation::types::transactions::parse_message(tx)
            .map(|message| message.sender != self.0)
            .unwrap_or(false)
    }
}

#[test]
fn unverified_content_fails_finalize() {
    let db = MemDB::new();
    let mut app = ChatApp::new(db.clone(), RejectSender("eve"), test_config()).unwrap();

    let result = app.finalize_block(FinalizeBlockRequest {
        height: Height::new(1),
        txs: vec![message_tx("carol", "hi"), message_tx("eve", "hello")],
    });
    assert!(matches!(result, Err(ChatAppError::UnverifiedTx { index: 1 })));

    assert!(matches!(app.commit(), Err(ChatAppError::NoOpenScope)));
    assert_eq!(db.user("carol").unwrap(), None);
    assert_eq!(db.len(), 0);
    assert_eq!(app.chain_state().height, Height::new(0));
}

#[test]
fn app_hash_is_deterministic() {
    let block = vec![
        message_tx("bob", "idiot"),
        message_tx("carol", "hi"),
        message_tx("dave", "hey"),
    ];

    let (mut first, _) = new_app();
    let (mut second, _) = new_app();
    let (_, first_finalized) = run_height(&mut first, block.clone(), &[]);
    let (_, second_finalized) = run_height(&mut second, block, &[]);
    assert_eq!(first_finalized.app_hash, second_finalized.app_hash);
    assert_ne!(first_finalized.app_hash, CryptoHash::zero());

    let (mut third, _) = new_app();
    let (_, third_finalized) = run_height(&mut third, vec![message_tx("carol", "hi")], &[]);
    assert_ne!(first_finalized.app_hash, third_finalized.app_hash);

    // The app hash chains over previous heights.
    let (_, first_next) = run_height(&mut first, vec![message_tx("erin", "yo")], &[]);
    let (_, third_next) = run_height(&mut third, vec![message_tx("erin", "yo")], &[]);
    assert_ne!(first_next.app_hash, third_next.app_hash);
}

#[test]
fn restart_resumes_from_committed_chain_state() {
    let (mut app, db) = new_app();
    run_height(&mut app, vec![message_tx("bob", "idiot")], &[]);
    run_height(&mut app, vec![message_tx("carol", "hi")], &[]);
    let info = app.info();
    drop(app);

    let mut restarted = ChatApp::new(db.clone(), AcceptAll, test_config()).unwrap();
    assert_eq!(restarted.info(), info);
    assert_eq!(info.last_block_height, Height::new(2));
    assert_eq!(info.size, MessageCount::new(1));

    run_height(&mut restarted, vec![message_tx("dave", "hey")], &[]);
    assert_eq!(restarted.chain_state().height, Height::new(3));
    assert_eq!(db.chat_history_len().unwrap(), 2);
}

#[test]
fn failed_commit_halts_the_app() {
    let db = FailingDB::new();
    let mut app = ChatApp::new(db.clone(), AcceptAll, test_config()).unwrap();
    run_height(&mut app, vec![message_tx("carol", "hi")], &[]);
    let committed = app.chain_state();

    finalize(&mut app, vec![message_tx("dave", "hey")]).unwrap();
    db.fail_writes(true);
    assert!(matches!(app.commit(), Err(ChatAppError::Write(_))));
    assert!(app.is_halted());
    assert_eq!(app.chain_state(), committed);
    assert_eq!(db.chain_state().unwrap(), Some(committed));
    assert_eq!(db.user("dave").unwrap(), None);

    db.fail_writes(false);
    assert!(matches!(
        finalize(&mut app, vec![message_tx("dave", "hey")]),
        Err(ChatAppError::Halted)
    ));
    assert!(matches!(app.commit(), Err(ChatAppError::Halted)));

    let mut restarted = ChatApp::new(db.clone(), AcceptAll, test_config()).unwrap();
    assert!(!restarted.is_halted());
    assert_eq!(restarted.chain_state(), committed);
    run_height(&mut restarted, vec![message_tx("dave", "hey")], &[]);
    assert_eq!(db.user("dave").unwrap(), Some(User::new("dave", false)));
}

#[test]
fn execution_handlers_fire_in_block_order() {
    let (mut app, _) = new_app();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let ban_seen = seen.clone();
    app.on_ban_user(move |event| {
        ban_seen
            .lock()
            .unwrap()
            .push(format!("ban {} at {}", event.user, event.height))
    });
    let append_seen = seen.clone();
    app.on_append_message(move |event| {
        append_seen
            .lock()
            .unwrap()
            .push(format!("append {}", event.message.sender))
    });
    let commit_seen = seen.clone();
    app.on_commit(move |event| {
        commit_seen
            .lock()
            .unwrap()
            .push(format!("commit {} {}", event.height, event.size))
    });

    run_height(
        &mut app,
        vec![
            message_tx("carol", "hi"),
            message_tx("bob", "idiot"),
            message_tx("dave", "hey"),
        ],
        &[],
    );

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "ban bob at 1".to_string(),
            "append carol".to_string(),
            "append dave".to_string(),
            "commit 1 2".to_string(),
        ]
    );
}

#[test]
fn empty_block_advances_height_only() {
    let (mut app, db) = new_app();
    run_height(&mut app, vec![], &[]);

    assert_eq!(app.chain_state().height, Height::new(1));
    assert_eq!(app.chain_state().size, MessageCount::new(0));
    assert_eq!(db.chat_history_len().unwrap(), 0);
}
