/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that exist only to store bytes, and do not have any major "active" behavior.

use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, AddAssign},
};

use borsh::{BorshDeserialize, BorshSerialize};

/// Height of a block, as decided by the consensus engine.
///
/// Starts at 0 before any block has been committed, and increases by 1 for every block that the
/// application finalizes and commits.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize,
)]
pub struct Height(u64);

impl Height {
    /// Create a new `Height` with an `int` inner value.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the inner `u64` value of this `Height`.
    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for Height {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Add<u64> for Height {
    type Output = Height;
    fn add(self, rhs: u64) -> Self::Output {
        Height::new(self.0.add(rhs))
    }
}

/// Number of content messages that have ever been appended to the global chat history.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize,
)]
pub struct MessageCount(u64);

impl MessageCount {
    /// Create a new `MessageCount` with an `int` inner value.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the inner `u64` value of this `MessageCount`.
    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for MessageCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl AddAssign<u64> for MessageCount {
    fn add_assign(&mut self, rhs: u64) {
        self.0.add_assign(rhs)
    }
}

/// 32-byte cryptographic hash.
///
/// Within this crate, `CryptoHash`-es are only ever produced by SHA256, and only ever encountered as
/// the [app hash](super::chain_state::ChainState::app_hash) that the application reports back to the
/// consensus engine after finalizing a block.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    /// Create a new `CryptoHash` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The all-zeroes hash that the app hash chain starts from.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the inner `[u8; 32]` value of this `CryptoHash`.
    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl Display for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}
