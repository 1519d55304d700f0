//! The persistent state of the chat app.
//!
//! # Pluggable persistence
//!
//! - The chat store is kept in persistent storage, most probably in the host's filesystem.
//! - Library users get to choose how exactly this is done.
//! - The chat app merely requires that whatever the user provides as a persistence mechanism implements
//!   the abstract functionality of a key-value store with atomic, batched writes.
//! - This abstract functionality is made concrete by the traits defined in the [`pluggables`] module.
//!
//! # Accessing the chat store
//!
//! - Committed state is read through the typed getters of [`KVGet`](pluggables::KVGet).
//! - A block's writes are staged in a [`MutationScope`](accessors::MutationScope) and made durable all
//!   at once through a [`ChatWriteBatch`](accessors::ChatWriteBatch).
//! - The documentation for the [`variables`] submodule lists everything stored in the chat store.

pub mod accessors;

pub mod pluggables;

pub mod variables;
