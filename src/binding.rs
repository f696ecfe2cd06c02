use std::collections::HashMap;
use std::sync::Arc;

use crate::accumulator::Descriptor;
use crate::context::MethodKind;

/// Decorator chains per method name, kept apart for instance and static
/// methods. Order is declaration order, outermost first.
#[derive(Debug, Default)]
pub struct BindingTable {
    instance: HashMap<Arc<str>, Arc<[Descriptor]>>,
    statics: HashMap<Arc<str>, Arc<[Descriptor]>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole chain; an empty chain clears the binding.
    fn bind(&mut self, kind: MethodKind, name: Arc<str>, descriptors: Vec<Descriptor>) {
        let table = self.table_mut(kind);
        if descriptors.is_empty() {
            table.remove(&name);
        } else {
            table.insert(name, descriptors.into());
        }
    }

    pub fn bind_instance_method(&mut self, name: Arc<str>, descriptors: Vec<Descriptor>) {
        self.bind(MethodKind::Instance, name, descriptors);
    }

    pub fn bind_static_method(&mut self, name: Arc<str>, descriptors: Vec<Descriptor>) {
        self.bind(MethodKind::Static, name, descriptors);
    }

    /// Never fails: an unbound method has an empty chain.
    pub fn lookup(&self, kind: MethodKind, name: &str) -> Arc<[Descriptor]> {
        let table = match kind {
            MethodKind::Instance => &self.instance,
            MethodKind::Static => &self.statics,
        };
        table.get(name).cloned().unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn lookup_instance_method(&self, name: &str) -> Arc<[Descriptor]> {
        self.lookup(MethodKind::Instance, name)
    }

    pub fn lookup_static_method(&self, name: &str) -> Arc<[Descriptor]> {
        self.lookup(MethodKind::Static, name)
    }

    fn table_mut(&mut self, kind: MethodKind) -> &mut HashMap<Arc<str>, Arc<[Descriptor]>> {
        match kind {
            MethodKind::Instance => &mut self.instance,
            MethodKind::Static => &mut self.statics,
        }
    }
}
