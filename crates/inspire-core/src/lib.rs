//! Core of the inspire chat bot: command schema, dispatch and the quote and
//! moderator handlers.
//!
//! Framework-agnostic. The chat platform sits behind `messaging::port` and
//! persistence behind `store::DocumentStore`.

pub mod alias;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod help;
pub mod logging;
pub mod messaging;
pub mod moderators;
pub mod permissions;
pub mod quotes;
pub mod registry;
pub mod schema;
pub mod store;
pub mod tokenize;
pub mod users;

pub use errors::{Error, Result};
