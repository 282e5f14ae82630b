//! Payment gateway integration: notification payloads and the webhook processor

pub mod notification;
pub mod webhook;

pub use notification::*;
pub use webhook::*;
