//! Declarations waiting for the next method definition.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Options;
use crate::receiver::ReceiverRef;

/// One `decorate` request, before it is resolved.
#[derive(Clone)]
pub struct Declaration {
    pub(crate) name: String,
    pub(crate) from: Option<ReceiverRef>,
    pub(crate) defer_validation: bool,
    pub(crate) options: Options,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: None,
            defer_validation: false,
            options: Options::new(),
        }
    }

    /// Use `receiver` instead of searching the target's registry.
    pub fn from(mut self, receiver: ReceiverRef) -> Self {
        self.from = Some(receiver);
        self
    }

    /// Postpone validation until the decorated method is first called.
    pub fn defer_validation(self) -> Self {
        self.deferred(true)
    }

    pub fn deferred(mut self, defer: bool) -> Self {
        self.defer_validation = defer;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options.extend(options);
        self
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("name", &self.name)
            .field("from", &self.from.as_ref().map(|receiver| receiver.describe()))
            .field("defer_validation", &self.defer_validation)
            .field("options", &self.options)
            .finish()
    }
}

/// A resolved decorator: name, the receiver that implements it, and options.
#[derive(Clone)]
pub struct Descriptor {
    name: Arc<str>,
    receiver: Option<ReceiverRef>,
    options: Arc<Options>,
    validated: bool,
}

impl Descriptor {
    pub(crate) fn new(name: Arc<str>, receiver: Option<ReceiverRef>, options: Options, validated: bool) -> Self {
        Self {
            name,
            receiver,
            options: Arc::new(options),
            validated,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// `None` only for deferred declarations nothing could resolve yet.
    pub fn receiver(&self) -> Option<&ReceiverRef> {
        self.receiver.as_ref()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn shared_options(&self) -> Arc<Options> {
        self.options.clone()
    }

    /// Whether the receiver was checked when the declaration was made.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub(crate) fn with_receiver(mut self, receiver: ReceiverRef) -> Self {
        self.receiver = Some(receiver);
        self
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("receiver", &self.receiver.as_ref().map(|receiver| receiver.describe()))
            .field("options", &self.options)
            .field("validated", &self.validated)
            .finish()
    }
}

/// Descriptors declared since the last method was finalized.
#[derive(Debug, Default)]
pub struct Accumulator {
    pending: Vec<Descriptor>,
}

impl Accumulator {
    pub fn push(&mut self, descriptor: Descriptor) {
        self.pending.push(descriptor);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hands over everything queued and leaves the accumulator empty.
    pub fn drain(&mut self) -> Vec<Descriptor> {
        std::mem::take(&mut self.pending)
    }
}
