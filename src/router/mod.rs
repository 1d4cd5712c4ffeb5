//! Webhook routing core
//!
//! A webhook source is first matched against the source providers
//! ([`match_source`]), then the [`Dispatcher`] sends it down one of three
//! paths depending on the outcome and the provider's listen type.

mod dispatch;
mod matcher;

pub use dispatch::{DispatchError, DispatchPath, DispatchResult, Dispatcher, DownloadRequest};
pub use matcher::{MatchOutcome, match_source};
