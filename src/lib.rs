/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A moderated, append-only chat log with user banning, implemented as the deterministic application
//! state machine of a BFT consensus engine.
//!
//! Clients submit [chat messages](types::transactions::ChatMessage). The consensus engine drives a
//! [`ChatApp`](chat_app::ChatApp) through the [`Application`](app::Application) entry points, which:
//! 1. [Admit](admission) messages from senders that are not banned into the mempool.
//! 2. On the proposer, [build](proposal) a block in which every offensive message has been replaced by
//!    a [ban](types::transactions::BanTx) of its sender, and every ban comes before every message.
//! 3. On every replica, [validate](validation) that a proposed block has that shape.
//! 4. [Execute](execution) the decided block into a staged scope, and commit it atomically.
//!
//! Whether a message is offensive is decided by the [moderation] policy, using locally configured
//! curse words and curse words that replicas contribute through vote extensions.
//!
//! Persistence is pluggable: library users provide a key-value store by implementing the traits in
//! [`store::pluggables`].

pub mod admission;

pub mod app;

pub mod chat_app;

pub mod config;

pub mod error;

pub mod events;

pub mod execution;

pub mod logging;

pub mod moderation;

pub mod proposal;

pub mod store;

pub mod types;

pub mod validation;

pub mod verifier;
