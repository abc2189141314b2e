//! Incident dashboard core.
//!
//! An [`IncidentStore`](store::IncidentStore) keeps a local cache of incidents
//! in step with a remote incident service, and a
//! [`StackLayoutEngine`](layout::StackLayoutEngine) turns the tag-filtered
//! collection into a collapsible stack of cards. [`dispatch`] ties the two
//! together behind explicit user intents.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod layout;
pub mod models;
pub mod notifications;
pub mod store;

pub use error::{AppError, Operation, Result};
