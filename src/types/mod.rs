//! Types that are used across multiple components of the chat app.
//!
//! Types specific to a single component, e.g., the request and response types of the
//! [`Application`](crate::app::Application) entry points, are defined in that component's module.

pub mod chain_state;

pub mod data_types;

pub mod transactions;

pub mod update_sets;

pub mod user;
