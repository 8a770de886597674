//! Built-in [`Notifier`] implementations.

use minireq_types::Notifier;

/// Surfaces user-facing messages as `warn` events under the `minireq::notify` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "minireq::notify", "{message}");
    }
}

/// Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _message: &str) {}
}
