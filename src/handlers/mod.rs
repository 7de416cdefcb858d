//! HTTP request handlers for the relay.
//!
//! Two endpoints only:
//! - `webhook` - signed order webhook intake and alert fan-out
//! - `health` - readiness probe for the external cron collaborator
//!
//! Handlers follow a consistent pattern: validate before any work,
//! trace with structured fields, and never surface post-verification
//! failures to the webhook sender.

pub mod health;
pub mod webhook;

pub use health::readiness_check;
pub use webhook::handle_order_webhook;
