/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Chat participants.

use borsh::{BorshDeserialize, BorshSerialize};

/// A participant of the chat, identified by `name`.
///
/// A `User` is created the first time either a message from them is finalized (with `banned` set to
/// `false`), or a ban targeting them is finalized (with `banned` set to `true`). Users are never
/// deleted, and once `banned` becomes `true` it never becomes `false` again.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct User {
    pub name: String,
    pub banned: bool,
}

impl User {
    pub fn new(name: impl Into<String>, banned: bool) -> User {
        User {
            name: name.into(),
            banned,
        }
    }
}
