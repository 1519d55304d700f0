/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byte-prefixes that specify where each chat store variable is stored in the user-provided key-value
//! store.
//!
//! # List of State Variables
//!
//! |Variable|Type|Description|
//! |---|---|---|
//! |Users|`String` -> [`User`](crate::types::user::User)|Every user that has ever posted or been banned.|
//! |User Message Count|`String` -> `u64`|Number of messages each user has posted. Absent means 0.|
//! |User Messages|(`String`, `u64`) -> [`ChatMessage`](crate::types::transactions::ChatMessage)|Each user's messages, indexed from 0 in posting order.|
//! |Chat History Length|`u64`|Number of messages in the global chat history. Absent means 0.|
//! |Chat History|`u64` -> [`ChatMessage`](crate::types::transactions::ChatMessage)|The global chat history, indexed from 0 in finalization order.|
//! |Chain State|[`ChainState`](crate::types::chain_state::ChainState)|The committed chain state.|
//!
//! # Persistence of state variables
//!
//! Every value is stored Borsh-serialized. Single values are stored at one-byte constant keys.
//! Mappings are stored at keys formed by concatenating the variable's one-byte prefix with the
//! mapping's key: a user name is appended in its Borsh encoding (a little-endian `u32` length followed
//! by its UTF-8 bytes), and an index as a little-endian `u64`. Because names are length-prefixed, no
//! two different (name, index) pairs map to the same key.
//!
//! Messages are stored one per key instead of as one growing list, so appending a message writes
//! a constant number of keys no matter how long the history already is.

pub const USERS: [u8; 1] = [0];
pub const USER_MESSAGE_COUNT: [u8; 1] = [1];
pub const USER_MESSAGES: [u8; 1] = [2];
pub const CHAT_HISTORY_LEN: [u8; 1] = [3];
pub const CHAT_HISTORY: [u8; 1] = [4];
pub const CHAIN_STATE: [u8; 1] = [5];

/// Takes references to two byteslices and returns a vector containing the bytes of the first one, and
/// then the bytes of the second one.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    res.extend_from_slice(a);
    res.extend_from_slice(b);
    res
}

// Same bytes as the Borsh encoding of `name`.
fn name_bytes(name: &str) -> Vec<u8> {
    concat(&(name.len() as u32).to_le_bytes(), name.as_bytes())
}

pub fn user_key(name: &str) -> Vec<u8> {
    concat(&USERS, &name_bytes(name))
}

pub fn user_message_count_key(name: &str) -> Vec<u8> {
    concat(&USER_MESSAGE_COUNT, &name_bytes(name))
}

pub fn user_message_key(name: &str, index: u64) -> Vec<u8> {
    concat(
        &concat(&USER_MESSAGES, &name_bytes(name)),
        &index.to_le_bytes(),
    )
}

pub fn chat_history_key(index: u64) -> Vec<u8> {
    concat(&CHAT_HISTORY, &index.to_le_bytes())
}
