//! Push notifications for detected events.
//!
//! Events pass a per (channel, kind) rate limiter, are delivered through a
//! [`Transport`] (ntfy over HTTP in production) and optionally recorded to a
//! history file.

mod dispatcher;
mod error;
mod history;
mod limiter;
mod message;
mod transport;

pub use dispatcher::Dispatcher;
pub use error::NotifyError;
pub use history::{DeliveryStatus, HistoryLog};
pub use limiter::RateLimiter;
pub use message::{priority_for, Notification, PRIORITY_DEFAULT, PRIORITY_HIGH, PRIORITY_URGENT};
pub use transport::{topic_url, NtfyTransport, Transport};
