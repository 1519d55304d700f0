/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Pluggable authentication of content transactions.
//!
//! The chat app does not authenticate senders by itself. Library users that want to, e.g., require
//! messages to be signed by their sender implement [`TxVerifier`] and pass it to
//! [`ChatApp::new`](crate::chat_app::ChatApp::new). The verifier is consulted on every content
//! transaction in `check_tx`, `process_proposal` and `finalize_block`. Ban transactions are synthesized
//! by the proposer and are never passed to the verifier.
//!
//! Implementations must be deterministic: every replica must reach the same verdict on the same bytes.

pub trait TxVerifier: Send + Sync + 'static {
    /// Decide whether the raw content transaction `tx` is authentic.
    fn verify(&self, tx: &[u8]) -> bool;
}

/// A [`TxVerifier`] that considers every transaction authentic.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl TxVerifier for AcceptAll {
    fn verify(&self, _tx: &[u8]) -> bool {
        true
    }
}
