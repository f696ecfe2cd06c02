//! The decorator contract and the objects that implement decorators.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::context::{Context, Options};
use crate::error::{Error, Result};

/// Runs the remainder of a chain: the next decorator, or the original method
/// when this is the last link.
///
/// A decorator may call [`proceed`](Continuation::proceed) once, several
/// times, or not at all.
#[derive(Clone, Copy)]
pub struct Continuation<'a> {
    next: &'a dyn Fn() -> Result<Value>,
}

impl<'a> Continuation<'a> {
    pub fn new(next: &'a dyn Fn() -> Result<Value>) -> Self {
        Self { next }
    }

    pub fn proceed(&self) -> Result<Value> {
        (self.next)()
    }
}

impl fmt::Debug for Continuation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Continuation")
    }
}

/// A decorator implementation.
pub type DecoratorFn =
    Arc<dyn Fn(&Context, Continuation<'_>, &Options) -> Result<Value> + Send + Sync>;

/// Whether a receiver stands for a type or for one value of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    Class,
    Instance,
}

/// Anything that can host decorators by name.
pub trait DecoratorReceiver: Send + Sync {
    /// Name of the type this receiver is, or is an instance of.
    fn type_name(&self) -> &str;

    fn kind(&self) -> ReceiverKind;

    /// Whether `invoke` can run a decorator called `decorator`.
    fn responds_to(&self, decorator: &str) -> bool;

    /// Whether `decorator` exists on the other side: as an instance method
    /// when this receiver is a type, or on the type when this is an instance.
    fn counterpart_responds_to(&self, _decorator: &str) -> bool {
        false
    }

    fn invoke(
        &self,
        decorator: &str,
        context: &Context,
        next: Continuation<'_>,
        options: &Options,
    ) -> Result<Value>;

    /// How diagnostics print this receiver.
    fn describe(&self) -> String {
        match self.kind() {
            ReceiverKind::Class => self.type_name().to_string(),
            ReceiverKind::Instance => format!("#<{}>", self.type_name()),
        }
    }
}

pub type ReceiverRef = Arc<dyn DecoratorReceiver>;

/// A named table of decorator functions.
///
/// The table can change after decorators were bound to it; calls through a
/// binding whose decorator was removed fail with
/// [`Error::DecoratorNotFound`].
pub struct DecoratorSet {
    type_name: String,
    kind: ReceiverKind,
    decorators: RwLock<HashMap<String, DecoratorFn>>,
    counterparts: RwLock<HashSet<String>>,
}

impl DecoratorSet {
    /// A receiver standing for the type `type_name` itself.
    pub fn class(type_name: impl Into<String>) -> Self {
        Self::with_kind(type_name, ReceiverKind::Class)
    }

    /// A receiver standing for one value of type `type_name`.
    pub fn instance(type_name: impl Into<String>) -> Self {
        Self::with_kind(type_name, ReceiverKind::Instance)
    }

    fn with_kind(type_name: impl Into<String>, kind: ReceiverKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            decorators: RwLock::new(HashMap::new()),
            counterparts: RwLock::new(HashSet::new()),
        }
    }

    pub fn with<F>(self, name: impl Into<String>, decorator: F) -> Self
    where
        F: Fn(&Context, Continuation<'_>, &Options) -> Result<Value> + Send + Sync + 'static,
    {
        self.define(name, decorator);
        self
    }

    /// Records that `name` exists on the opposite kind of receiver, which
    /// turns a failed lookup into a diagnostic with remediation steps.
    pub fn with_counterpart(self, name: impl Into<String>) -> Self {
        self.counterparts.write().insert(name.into());
        self
    }

    pub fn define<F>(&self, name: impl Into<String>, decorator: F)
    where
        F: Fn(&Context, Continuation<'_>, &Options) -> Result<Value> + Send + Sync + 'static,
    {
        self.decorators.write().insert(name.into(), Arc::new(decorator));
    }

    pub fn remove(&self, name: &str) -> bool {
        self.decorators.write().remove(name).is_some()
    }

    pub fn into_ref(self) -> ReceiverRef {
        Arc::new(self)
    }
}

impl DecoratorReceiver for DecoratorSet {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn kind(&self) -> ReceiverKind {
        self.kind
    }

    fn responds_to(&self, decorator: &str) -> bool {
        self.decorators.read().contains_key(decorator)
    }

    fn counterpart_responds_to(&self, decorator: &str) -> bool {
        self.counterparts.read().contains(decorator)
    }

    fn invoke(
        &self,
        decorator: &str,
        context: &Context,
        next: Continuation<'_>,
        options: &Options,
    ) -> Result<Value> {
        // Clone out so the table is not locked while the chain runs.
        let found = self.decorators.read().get(decorator).cloned();
        match found {
            Some(run) => run(context, next, options),
            None => Err(Error::DecoratorNotFound(format!(
                "Decorator method `{decorator}` cannot be found on `{}`.",
                self.describe()
            ))),
        }
    }
}

impl fmt::Debug for DecoratorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.decorators.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("DecoratorSet")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("decorators", &names)
            .finish()
    }
}
