//! Replacement callables produced when a method is finalized.

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::binding::BindingTable;
use crate::context::{Arguments, Identified, Invocation, MethodKind, MethodReceiver, TargetId, formal_name};
use crate::dispatch;
use crate::error::{Error, Result};

/// Where a decorated method was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    file: &'static str,
    line: u32,
}

impl SourceLocation {
    pub fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Identity of a defined method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    target: TargetId,
    type_name: Arc<str>,
    name: Arc<str>,
    kind: MethodKind,
    location: SourceLocation,
}

impl MethodSignature {
    pub fn new(
        target: TargetId,
        type_name: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        kind: MethodKind,
        location: SourceLocation,
    ) -> Self {
        Self {
            target,
            type_name: type_name.into(),
            name: name.into(),
            kind,
            location,
        }
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn formal_name(&self) -> String {
        formal_name(&self.type_name, self.kind, &self.name)
    }

    pub(crate) fn shared_type_name(&self) -> Arc<str> {
        self.type_name.clone()
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }
}

pub type InstanceBody<T> = Arc<dyn Fn(&T, &Arguments) -> Result<Value> + Send + Sync>;
pub type StaticBody = Arc<dyn Fn(&Arguments) -> Result<Value> + Send + Sync>;

/// Looks the chain up by name on every call, so a later definition of the
/// same name governs all wrappers that share the table.
#[derive(Clone)]
struct Wrapper {
    signature: Arc<MethodSignature>,
    bindings: Arc<RwLock<BindingTable>>,
}

impl Wrapper {
    fn dispatch(
        &self,
        receiver: MethodReceiver,
        arguments: Arguments,
        original: &dyn Fn(&Arguments) -> Result<Value>,
    ) -> Result<Value> {
        let chain = self
            .bindings
            .read()
            .lookup(self.signature.kind(), self.signature.name());
        let invocation = Arc::new(Invocation::new(receiver, self.signature.shared_name(), arguments));
        dispatch::run_chain(&chain, &invocation, &self.signature, original)
    }
}

/// A finalized instance method on values of type `T`.
pub struct InstanceMethod<T> {
    signature: Arc<MethodSignature>,
    body: InstanceBody<T>,
    wrapper: Option<Wrapper>,
}

impl<T> InstanceMethod<T> {
    pub(crate) fn plain(signature: Arc<MethodSignature>, body: InstanceBody<T>) -> Self {
        Self {
            signature,
            body,
            wrapper: None,
        }
    }

    pub(crate) fn decorated(
        signature: Arc<MethodSignature>,
        body: InstanceBody<T>,
        bindings: Arc<RwLock<BindingTable>>,
    ) -> Self {
        let wrapper = Wrapper {
            signature: signature.clone(),
            bindings,
        };
        Self {
            signature,
            body,
            wrapper: Some(wrapper),
        }
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn is_decorated(&self) -> bool {
        self.wrapper.is_some()
    }
}

impl<T: Identified> InstanceMethod<T> {
    pub fn call(&self, receiver: &T, arguments: Arguments) -> Result<Value> {
        match &self.wrapper {
            None => (self.body)(receiver, &arguments),
            Some(wrapper) => {
                let called_on = MethodReceiver::instance(
                    self.signature.shared_type_name(),
                    self.signature.target(),
                    receiver,
                );
                let original = |arguments: &Arguments| (self.body)(receiver, arguments);
                wrapper.dispatch(called_on, arguments, &original)
            }
        }
    }
}

impl<T> Clone for InstanceMethod<T> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            body: self.body.clone(),
            wrapper: self.wrapper.clone(),
        }
    }
}

impl<T> fmt::Debug for InstanceMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceMethod")
            .field("signature", &self.signature)
            .field("decorated", &self.is_decorated())
            .finish()
    }
}

/// A finalized type-level method.
#[derive(Clone)]
pub struct StaticMethod {
    signature: Arc<MethodSignature>,
    body: StaticBody,
    wrapper: Option<Wrapper>,
}

impl StaticMethod {
    pub(crate) fn plain(signature: Arc<MethodSignature>, body: StaticBody) -> Self {
        Self {
            signature,
            body,
            wrapper: None,
        }
    }

    pub(crate) fn decorated(
        signature: Arc<MethodSignature>,
        body: StaticBody,
        bindings: Arc<RwLock<BindingTable>>,
    ) -> Self {
        let wrapper = Wrapper {
            signature: signature.clone(),
            bindings,
        };
        Self {
            signature,
            body,
            wrapper: Some(wrapper),
        }
    }

    pub fn call(&self, arguments: Arguments) -> Result<Value> {
        match &self.wrapper {
            None => (self.body)(&arguments),
            Some(wrapper) => {
                let called_on = MethodReceiver::class(self.signature.shared_type_name(), self.signature.target());
                wrapper.dispatch(called_on, arguments, &*self.body)
            }
        }
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn is_decorated(&self) -> bool {
        self.wrapper.is_some()
    }
}

impl fmt::Debug for StaticMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMethod")
            .field("signature", &self.signature)
            .field("decorated", &self.is_decorated())
            .finish()
    }
}

/// Installed methods of one type, by name. Defining a name again replaces
/// the earlier method.
pub struct MethodTable<T> {
    instance: HashMap<Arc<str>, InstanceMethod<T>>,
    statics: HashMap<Arc<str>, StaticMethod>,
}

impl<T> MethodTable<T> {
    pub fn new() -> Self {
        Self {
            instance: HashMap::new(),
            statics: HashMap::new(),
        }
    }

    pub fn install_instance(&mut self, method: InstanceMethod<T>) {
        self.instance.insert(method.signature.shared_name(), method);
    }

    pub fn install_static(&mut self, method: StaticMethod) {
        self.statics.insert(method.signature.shared_name(), method);
    }

    pub fn instance(&self, name: &str) -> Result<&InstanceMethod<T>> {
        self.instance
            .get(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))
    }

    pub fn static_method(&self, name: &str) -> Result<&StaticMethod> {
        self.statics
            .get(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))
    }
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MethodTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("instance", &self.instance.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}
