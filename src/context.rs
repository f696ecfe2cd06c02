//! Call data handed to every decorator in a chain.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Result;

/// Option values supplied when a decorator is declared.
pub type Options = Map<String, Value>;

/// Whether a method lives on instances or on the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Instance,
    Static,
}

impl MethodKind {
    /// Separator used in formal method names: `Type#name` or `Type::name`.
    pub fn separator(self) -> &'static str {
        match self {
            MethodKind::Instance => "#",
            MethodKind::Static => "::",
        }
    }
}

/// Identity of one [`Target`](crate::Target). Unique per process, so
/// same-named types never share per-type state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Values that decorated instance methods can be called on.
///
/// `instance_id` must not change while the value lives, and no other value
/// of the same type may report it, before or after. Embed an [`InstanceId`]
/// to get that for free; a unit struct can return a constant.
pub trait Identified {
    fn instance_id(&self) -> u64;
}

/// A process-unique id to embed in values with decorated instance methods.
///
/// Cloning hands out a fresh id: the clone is a different receiver.
#[derive(Debug)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InstanceId {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Identified for InstanceId {
    fn instance_id(&self) -> u64 {
        self.0
    }
}

/// The object (or type) a decorated method was called on.
///
/// `type_name` is for display; identity is the target plus, for instances,
/// the value's [`Identified::instance_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodReceiver {
    Class {
        type_name: Arc<str>,
        target: TargetId,
    },
    Instance {
        type_name: Arc<str>,
        target: TargetId,
        instance: u64,
    },
}

impl MethodReceiver {
    pub fn class(type_name: impl Into<Arc<str>>, target: TargetId) -> Self {
        MethodReceiver::Class {
            type_name: type_name.into(),
            target,
        }
    }

    pub fn instance<T: Identified + ?Sized>(type_name: impl Into<Arc<str>>, target: TargetId, receiver: &T) -> Self {
        MethodReceiver::Instance {
            type_name: type_name.into(),
            target,
            instance: receiver.instance_id(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            MethodReceiver::Class { type_name, .. } | MethodReceiver::Instance { type_name, .. } => {
                type_name
            }
        }
    }

    pub fn target(&self) -> TargetId {
        match self {
            MethodReceiver::Class { target, .. } | MethodReceiver::Instance { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            MethodReceiver::Class { .. } => MethodKind::Static,
            MethodReceiver::Instance { .. } => MethodKind::Instance,
        }
    }

    /// `Type::method` for types, `Type#method` for instances.
    pub fn formal_name(&self, method_name: &str) -> String {
        formal_name(self.type_name(), self.kind(), method_name)
    }
}

pub(crate) fn formal_name(type_name: &str, kind: MethodKind, method_name: &str) -> String {
    format!("{type_name}{}{method_name}", kind.separator())
}

/// Positional and named arguments of one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Arguments {
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positional(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Map::new(),
        }
    }

    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named(&self) -> &Map<String, Value> {
        &self.named
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Deserializes the positional argument at `index`. A missing argument
    /// reads as `null`, so `Option` parameters may be omitted.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.positional.get(index).cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    pub fn get_named<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.named.get(name).cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Flat view used for display: positional values, then the named map if
    /// there is one.
    pub fn to_list(&self) -> Value {
        let mut all = self.positional.clone();
        if !self.named.is_empty() {
            all.push(Value::Object(self.named.clone()));
        }
        Value::Array(all)
    }

    /// Structural encoding that is equal for equal-by-value arguments.
    /// Object keys are sorted at every depth before encoding.
    pub fn canonical_key(&self) -> Result<String> {
        let positional = Value::Array(self.positional.iter().map(sorted).collect());
        let named = sorted_object(&self.named);
        Ok(serde_json::to_string(&Value::Array(vec![positional, named]))?)
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        Value::Object(map) => sorted_object(map),
        other => other.clone(),
    }
}

fn sorted_object(map: &Map<String, Value>) -> Value {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.clone(), sorted(value)))
            .collect(),
    )
}

/// Call data shared by every step of one chain.
#[derive(Debug)]
pub struct Invocation {
    receiver: MethodReceiver,
    method_name: Arc<str>,
    arguments: Arguments,
}

impl Invocation {
    pub fn new(receiver: MethodReceiver, method_name: impl Into<Arc<str>>, arguments: Arguments) -> Self {
        Self {
            receiver,
            method_name: method_name.into(),
            arguments,
        }
    }

    pub fn receiver(&self) -> &MethodReceiver {
        &self.receiver
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

/// What a decorator sees: the call it wraps plus its own name and options.
///
/// Built fresh for each step of a chain; never mutated.
#[derive(Debug, Clone)]
pub struct Context {
    invocation: Arc<Invocation>,
    decorator_name: Arc<str>,
    decorator_options: Arc<Options>,
}

impl Context {
    pub fn new(
        invocation: Arc<Invocation>,
        decorator_name: impl Into<Arc<str>>,
        decorator_options: Arc<Options>,
    ) -> Self {
        Self {
            invocation,
            decorator_name: decorator_name.into(),
            decorator_options,
        }
    }

    pub fn receiver(&self) -> &MethodReceiver {
        self.invocation.receiver()
    }

    pub fn method_name(&self) -> &str {
        self.invocation.method_name()
    }

    pub fn arguments(&self) -> &Arguments {
        self.invocation.arguments()
    }

    pub fn decorator_name(&self) -> &str {
        &self.decorator_name
    }

    pub fn decorator_options(&self) -> &Options {
        &self.decorator_options
    }

    pub fn formal_method_name(&self) -> String {
        self.receiver().formal_name(self.method_name())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via `{}`", self.formal_method_name(), self.decorator_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_key_sorts_keys_at_every_depth() {
        let arguments = Arguments::new()
            .with(json!([{ "z": 1, "a": { "y": true, "b": null } }]))
            .with_named("zeta", 1)
            .with_named("alpha", json!({ "k": [3, 2, 1], "c": "x" }));

        assert_eq!(
            arguments.canonical_key().unwrap(),
            r#"[[[{"a":{"b":null,"y":true},"z":1}]],{"alpha":{"c":"x","k":[3,2,1]},"zeta":1}]"#
        );
    }

    #[test]
    fn canonical_key_keeps_positional_order() {
        let forward = Arguments::new().with(1).with(2);
        let backward = Arguments::new().with(2).with(1);
        assert_ne!(forward.canonical_key().unwrap(), backward.canonical_key().unwrap());
    }

    #[test]
    fn cloned_instance_id_is_a_new_identity() {
        let original = InstanceId::new();
        let copy = original.clone();
        assert_ne!(original.get(), copy.get());
        assert_eq!(original.instance_id(), original.get());
    }

    #[test]
    fn receivers_of_same_named_targets_differ() {
        let first = MethodReceiver::class("Config", TargetId::next());
        let second = MethodReceiver::class("Config", TargetId::next());
        assert_eq!(first.type_name(), second.type_name());
        assert_ne!(first, second);
    }
}
