/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Transactions that clients submit and that proposers synthesize.
//!
//! # Wire format
//!
//! Every transaction is the Borsh serialization of a [`Transaction`]. Because Borsh encodes an enum
//! as a one-byte variant index followed by the variant's fields, the first byte of a transaction
//! tells apart the two kinds of transactions without decoding the rest:
//!
//! |First byte|Kind|Who creates it|
//! |---|---|---|
//! |[`MESSAGE_TX_TAG`]|[`ChatMessage`]|Clients, through the mempool.|
//! |[`BAN_TX_TAG`]|[`BanTx`]|The block proposer, in [`build_proposal`](crate::proposal::build_proposal).|
//!
//! [`is_ban_tx`] checks only this first byte. [`parse_message`] and [`parse_ban_tx`] decode the full
//! transaction and additionally check that the identifier it carries is non-empty.

use std::fmt::{self, Display, Formatter};

use borsh::{BorshDeserialize, BorshSerialize};

/// Variant index of [`Transaction::Message`] in the Borsh encoding.
pub const MESSAGE_TX_TAG: u8 = 0;

/// Variant index of [`Transaction::Ban`] in the Borsh encoding.
pub const BAN_TX_TAG: u8 = 1;

/// A transaction, as it appears inside a block.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Transaction {
    Message(ChatMessage),
    Ban(BanTx),
}

/// A content transaction: `sender` posts `message` to the chat.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> ChatMessage {
        ChatMessage {
            sender: sender.into(),
            message: message.into(),
        }
    }

    /// Serialize this message into the transaction wire format.
    pub fn to_tx_bytes(&self) -> std::io::Result<Vec<u8>> {
        Transaction::Message(self.clone()).try_to_vec()
    }
}

/// A control transaction that bans `user_name` from posting. Never subject to moderation itself.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BanTx {
    pub user_name: String,
}

impl BanTx {
    pub fn new(user_name: impl Into<String>) -> BanTx {
        BanTx {
            user_name: user_name.into(),
        }
    }

    /// Serialize this ban into the transaction wire format.
    pub fn to_tx_bytes(&self) -> std::io::Result<Vec<u8>> {
        Transaction::Ban(self.clone()).try_to_vec()
    }
}

/// Which of the two transaction shapes a parser expected to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    Message,
    Ban,
}

impl Display for TxKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Message => write!(f, "message transaction"),
            TxKind::Ban => write!(f, "ban transaction"),
        }
    }
}

/// Reasons why some bytes are not a well-formed transaction of the expected kind.
#[derive(Debug)]
pub enum TxFormatError {
    /// The bytes are not the Borsh encoding of a [`Transaction`].
    Undecodable { source: std::io::Error },

    /// The bytes decode into a transaction, but not of the expected kind.
    UnexpectedKind { expected: TxKind },

    /// A [`ChatMessage`] with an empty `sender`.
    EmptySender,

    /// A [`BanTx`] with an empty `user_name`.
    EmptyBanTarget,
}

impl Display for TxFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TxFormatError::Undecodable { source } => {
                write!(f, "transaction could not be decoded: {}", source)
            }
            TxFormatError::UnexpectedKind { expected } => write!(f, "expected a {}", expected),
            TxFormatError::EmptySender => write!(f, "sender must not be empty"),
            TxFormatError::EmptyBanTarget => write!(f, "banned user name must not be empty"),
        }
    }
}

impl std::error::Error for TxFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TxFormatError::Undecodable { source } => Some(source),
            _ => None,
        }
    }
}

/// Cheaply check whether `tx` is formatted as a [`BanTx`], by looking only at its first byte.
///
/// A `true` result does not guarantee that [`parse_ban_tx`] will succeed.
pub fn is_ban_tx(tx: &[u8]) -> bool {
    tx.first() == Some(&BAN_TX_TAG)
}

/// Parse `tx` as a content transaction.
pub fn parse_message(tx: &[u8]) -> Result<ChatMessage, TxFormatError> {
    match decode(tx)? {
        Transaction::Message(msg) if msg.sender.is_empty() => Err(TxFormatError::EmptySender),
        Transaction::Message(msg) => Ok(msg),
        Transaction::Ban(_) => Err(TxFormatError::UnexpectedKind {
            expected: TxKind::Message,
        }),
    }
}

/// Parse `tx` as a ban transaction.
pub fn parse_ban_tx(tx: &[u8]) -> Result<BanTx, TxFormatError> {
    match decode(tx)? {
        Transaction::Ban(ban) if ban.user_name.is_empty() => Err(TxFormatError::EmptyBanTarget),
        Transaction::Ban(ban) => Ok(ban),
        Transaction::Message(_) => Err(TxFormatError::UnexpectedKind {
            expected: TxKind::Ban,
        }),
    }
}

// `try_from_slice` rejects trailing bytes, so every transaction has exactly one valid encoding.
fn decode(tx: &[u8]) -> Result<Transaction, TxFormatError> {
    Transaction::try_from_slice(tx).map_err(|source| TxFormatError::Undecodable { source })
}
