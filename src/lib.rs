//! Interview Notify - push notifications for IRC interview queues.
//!
//! Tails IRC client logs, recognises interview announcements, mentions,
//! disconnects, netsplits and kicks, and publishes them to an ntfy topic.

pub mod analytics;
pub mod config;
pub mod display;
pub mod notify;
pub mod pipeline;
pub mod trigger;
pub mod watcher;
