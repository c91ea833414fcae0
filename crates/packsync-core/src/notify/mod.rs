//! Operator announcements.

mod webhook;

pub use webhook::WebhookNotifier;

use crate::error::ToolError;

/// Posts a short status message somewhere operators will see it.
pub trait Notifier {
    fn post(&self, message: &str) -> Result<(), ToolError>;
}
