//! Tests for `process_proposal`: the validation of proposed blocks on every replica.

mod common;

use chat_moderation::{
    app::{Application, ProcessProposalRequest, ProposalStatus},
    chat_app::ChatApp,
    types::{data_types::Height, transactions::BAN_TX_TAG},
    validation::{validate_proposal, RejectReason},
    verifier::{AcceptAll, TxVerifier},
};

use common::{
    mem_db::MemDB,
    txs::{ban_tx, message_tx, new_app, test_config},
};

fn process(app: &ChatApp<MemDB>, txs: Vec<Vec<u8>>) -> ProposalStatus {
    app.process_proposal(ProcessProposalRequest {
        height: Height::new(1),
        txs,
    })
    .status
}

#[test]
fn banned_sender_after_ban_prefix_is_rejected() {
    let (app, _) = new_app();
    assert_eq!(
        process(&app, vec![ban_tx("bob"), message_tx("bob", "hello")]),
        ProposalStatus::Reject
    );
}

#[test]
fn well_formed_proposal_is_accepted() {
    let (app, _) = new_app();
    assert_eq!(
        process(
            &app,
            vec![ban_tx("bob"), ban_tx("dave"), message_tx("carol", "hi")]
        ),
        ProposalStatus::Accept
    );
    assert_eq!(
        process(&app, vec![message_tx("carol", "hi")]),
        ProposalStatus::Accept
    );
    assert_eq!(process(&app, vec![ban_tx("bob")]), ProposalStatus::Accept);
}

#[test]
fn empty_proposal_is_accepted() {
    let (app, _) = new_app();
    assert_eq!(process(&app, vec![]), ProposalStatus::Accept);
}

#[test]
fn ban_after_content_is_rejected() {
    let (app, _) = new_app();
    assert_eq!(
        process(&app, vec![message_tx("carol", "hi"), ban_tx("bob")]),
        ProposalStatus::Reject
    );
    assert_eq!(
        process(
            &app,
            vec![ban_tx("dave"), message_tx("carol", "hi"), ban_tx("bob")]
        ),
        ProposalStatus::Reject
    );
}

#[test]
fn malformed_transaction_in_ban_prefix_is_rejected() {
    let (app, _) = new_app();
    let txs = vec![vec![BAN_TX_TAG, 0xff], message_tx("carol", "hi")];
    assert_eq!(process(&app, txs.clone()), ProposalStatus::Reject);
    assert!(matches!(
        validate_proposal(&txs, &AcceptAll),
        Err(RejectReason::MalformedBanTx { index: 0, .. })
    ));
}

#[test]
fn ban_with_empty_user_name_is_rejected() {
    let (app, _) = new_app();
    assert_eq!(process(&app, vec![ban_tx("")]), ProposalStatus::Reject);
}

#[test]
fn malformed_content_is_rejected() {
    let (app, _) = new_app();
    assert_eq!(
        process(&app, vec![ban_tx("bob"), message_tx("", "hi")]),
        ProposalStatus::Reject
    );
    assert_eq!(
        process(&app, vec![message_tx("carol", "hi"), vec![0, 0]]),
        ProposalStatus::Reject
    );
}

#[test]
fn rejects_banned_sender_regardless_of_position() {
    let txs = vec![
        ban_tx("bob"),
        message_tx("carol", "hi"),
        message_tx("dave", "yo"),
        message_tx("bob", "sneaky"),
    ];
    match validate_proposal(&txs, &AcceptAll) {
        Err(RejectReason::BannedSender { index, sender }) => {
            assert_eq!(index, 3);
            assert_eq!(sender, "bob");
        }
        other => panic!("expected BannedSender, got {:?}", other),
    }
}

#[test]
fn validation_is_idempotent() {
    let (app, _) = new_app();
    let good = vec![ban_tx("bob"), message_tx("carol", "hi")];
    let bad = vec![ban_tx("bob"), message_tx("bob", "hi")];

    assert_eq!(process(&app, good.clone()), process(&app, good));
    assert_eq!(process(&app, bad.clone()), process(&app, bad));
}

struct RejectEverything;

impl TxVerifier for RejectEverything {
    fn verify(&self, _tx: &[u8]) -> bool {
        false
    }
}

#[test]
fn unverified_content_is_rejected_but_bans_are_not_verified() {
    let app = ChatApp::new(MemDB::new(), RejectEverything, test_config()).unwrap();

    let ban_only = app.process_proposal(ProcessProposalRequest {
        height: Height::new(1),
        txs: vec![ban_tx("bob")],
    });
    assert_eq!(ban_only.status, ProposalStatus::Accept);

    let with_content = app.process_proposal(ProcessProposalRequest {
        height: Height::new(1),
        txs: vec![ban_tx("bob"), message_tx("carol", "hi")],
    });
    assert_eq!(with_content.status, ProposalStatus::Reject);
}
