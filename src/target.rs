//! The per-type definition session.
//!
//! A [`Target`] is threaded through the definition of one type's methods:
//! declarations queue up, and the next defined method takes all of them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::accumulator::{Accumulator, Declaration, Descriptor};
use crate::binding::BindingTable;
use crate::context::{Arguments, Identified, MethodKind, TargetId};
use crate::error::{Error, Result};
use crate::method::{InstanceMethod, MethodSignature, SourceLocation, StaticMethod};
use crate::receiver::ReceiverRef;
use crate::registry::ReceiverRegistry;
use crate::validate;

/// Declaration and finalization state for one decorated type.
pub struct Target {
    id: TargetId,
    type_name: Arc<str>,
    registry: ReceiverRegistry,
    accumulator: Accumulator,
    bindings: Arc<RwLock<BindingTable>>,
}

impl Target {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            id: TargetId::next(),
            type_name: type_name.into(),
            registry: ReceiverRegistry::new(),
            accumulator: Accumulator::default(),
            bindings: Arc::new(RwLock::new(BindingTable::new())),
        }
    }

    /// Identity of this target; distinct from every other target, whatever
    /// its type name.
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Makes `receiver` the first place undirected declarations look.
    pub fn register_receiver(&mut self, receiver: ReceiverRef) -> &mut Self {
        self.registry.register(receiver);
        self
    }

    pub fn registry(&self) -> &ReceiverRegistry {
        &self.registry
    }

    /// Queues a decorator for the next defined method.
    ///
    /// Resolves the receiver through the registry unless one was given, and
    /// validates it unless validation is deferred. On failure nothing is
    /// queued.
    pub fn declare(&mut self, declaration: Declaration) -> Result<&mut Self> {
        let Declaration {
            name,
            from,
            defer_validation,
            options,
        } = declaration;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidDeclaration(
                "Decorator name must be provided.".to_string(),
            ));
        }

        let receiver = from.or_else(|| self.registry.find_for(name));
        if !defer_validation {
            validate::validate(name, receiver.as_ref(), None).map_err(Error::InvalidDeclaration)?;
        }

        debug!(
            target_type = %self.type_name,
            decorator = name,
            receiver = ?receiver.as_ref().map(|receiver| receiver.describe()),
            deferred = defer_validation,
            "declared decorator"
        );

        self.accumulator
            .push(Descriptor::new(Arc::from(name), receiver, options, !defer_validation));
        Ok(self)
    }

    pub fn has_pending(&self) -> bool {
        self.accumulator.has_pending()
    }

    /// Finalizes an instance method, binding every pending declaration to it.
    ///
    /// Without pending declarations the method's binding is cleared and the
    /// returned method calls `body` directly.
    #[track_caller]
    pub fn define_instance_method<T, F>(&mut self, name: impl Into<Arc<str>>, body: F) -> InstanceMethod<T>
    where
        T: Identified,
        F: Fn(&T, &Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        let signature = self.signature(name.into(), MethodKind::Instance, SourceLocation::caller());
        if self.finalize(&signature) {
            InstanceMethod::decorated(signature, Arc::new(body), self.bindings.clone())
        } else {
            InstanceMethod::plain(signature, Arc::new(body))
        }
    }

    /// Finalizes a type-level method. See [`Target::define_instance_method`].
    #[track_caller]
    pub fn define_static_method<F>(&mut self, name: impl Into<Arc<str>>, body: F) -> StaticMethod
    where
        F: Fn(&Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        let signature = self.signature(name.into(), MethodKind::Static, SourceLocation::caller());
        if self.finalize(&signature) {
            StaticMethod::decorated(signature, Arc::new(body), self.bindings.clone())
        } else {
            StaticMethod::plain(signature, Arc::new(body))
        }
    }

    pub fn instance_decorators(&self, name: &str) -> Arc<[Descriptor]> {
        self.bindings.read().lookup_instance_method(name)
    }

    pub fn static_decorators(&self, name: &str) -> Arc<[Descriptor]> {
        self.bindings.read().lookup_static_method(name)
    }

    fn signature(&self, name: Arc<str>, kind: MethodKind, location: SourceLocation) -> Arc<MethodSignature> {
        Arc::new(MethodSignature::new(self.id, self.type_name.clone(), name, kind, location))
    }

    /// Moves pending descriptors into the binding table. Returns whether the
    /// method ended up decorated.
    fn finalize(&mut self, signature: &MethodSignature) -> bool {
        let registry = &self.registry;
        let chain: Vec<Descriptor> = self
            .accumulator
            .drain()
            .into_iter()
            .map(|descriptor| {
                if descriptor.receiver().is_some() {
                    return descriptor;
                }
                match registry.find_for(descriptor.name()) {
                    Some(receiver) => descriptor.with_receiver(receiver),
                    None => descriptor,
                }
            })
            .collect();

        let decorated = !chain.is_empty();
        debug!(
            method = %signature.formal_name(),
            decorators = chain.len(),
            location = %signature.location(),
            "finalized method"
        );
        let mut bindings = self.bindings.write();
        match signature.kind() {
            MethodKind::Instance => bindings.bind_instance_method(signature.shared_name(), chain),
            MethodKind::Static => bindings.bind_static_method(signature.shared_name(), chain),
        }
        decorated
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("registry", &self.registry)
            .field("accumulator", &self.accumulator)
            .field("bindings", &*self.bindings.read())
            .finish()
    }
}
