//! Notification delivery tests.

mod ntfy_test;
