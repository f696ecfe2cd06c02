//! Ordered candidates for decorators declared without an explicit receiver.

use std::fmt;

use tracing::debug;

use crate::decorators::Decorators;
use crate::receiver::ReceiverRef;

/// Most recently registered receiver first; the shared built-in
/// [`Decorators`] are always last.
pub struct ReceiverRegistry {
    receivers: Vec<ReceiverRef>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self {
            receivers: vec![Decorators::shared()],
        }
    }

    /// Later registrations win when several receivers share a decorator name.
    pub fn register(&mut self, receiver: ReceiverRef) {
        debug!(receiver = %receiver.describe(), "registered decorator receiver");
        self.receivers.insert(0, receiver);
    }

    pub fn find_for(&self, decorator: &str) -> Option<ReceiverRef> {
        self.receivers
            .iter()
            .find(|receiver| receiver.responds_to(decorator))
            .cloned()
    }

    pub fn receivers(&self) -> &[ReceiverRef] {
        &self.receivers
    }
}

impl Default for ReceiverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReceiverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.receivers.iter().map(|receiver| receiver.describe()))
            .finish()
    }
}
