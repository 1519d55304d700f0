/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Operator-specified configuration of a chat app replica.
//!
//! The configuration is defined using the builder pattern, for example:
//!
//! ```
//! # use chat_moderation::config::Configuration;
//! let configuration = Configuration::builder()
//!     .curse_words(vec!["idiot".to_string(), "moron".to_string()])
//!     .vote_extension_words(vec!["doofus".to_string()])
//!     .log_events(false)
//!     .build();
//! ```
//!
//! Every setter is optional. Unset fields take the values documented on [`Configuration`].

use typed_builder::TypedBuilder;

/// Curse words that a replica uses when none are configured.
pub const DEFAULT_CURSE_WORDS: [&str; 4] = ["idiot", "moron", "stupid", "dumb"];

/// Stores the user-defined parameters of a chat app replica, that is:
/// 1. The local curse words, used to moderate messages in `prepare_proposal`. Defaults to
///    [`DEFAULT_CURSE_WORDS`].
/// 2. The vote extension words, which this replica proposes as additional curse words for the next
///    height by attaching them to its votes. Defaults to none.
/// 3. The "Log Events" flag, if set to "true" then logs should be printed. Defaults to `true`.
///
/// ## Vote extension words
///
/// The words of all replicas' vote extensions are aggregated by the next proposer, and the proposer
/// refuses to build a proposal if any word appears twice in the aggregate. Operators must therefore
/// make sure that no two replicas are configured with a common vote extension word.
///
/// ## Log Events
///
/// The chat app logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
/// printed onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [Configuration]. On the builder call the following methods to construct a valid [Configuration].

    Optional:
    - `.curse_words(...)`
    - `.vote_extension_words(...)`
    - `.log_events(...)`
"))]
pub struct Configuration {
    #[builder(
        default = DEFAULT_CURSE_WORDS.iter().map(|word| word.to_string()).collect(),
        setter(doc = "Set the local curse words. Optional.")
    )]
    pub curse_words: Vec<String>,
    #[builder(
        default,
        setter(doc = "Set the words this replica attaches to its votes as vote extensions. Optional.")
    )]
    pub vote_extension_words: Vec<String>,
    #[builder(default = true, setter(doc = "Enable logging? Optional."))]
    pub log_events: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::builder().build()
    }
}
