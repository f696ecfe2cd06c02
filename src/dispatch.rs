//! Runs a bound chain around the original method.

use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::accumulator::Descriptor;
use crate::context::{Arguments, Context, Invocation};
use crate::error::{Error, Result};
use crate::method::MethodSignature;
use crate::receiver::Continuation;
use crate::validate;

/// Calls the head decorator with a continuation over the rest of the chain.
/// An empty chain calls `original` directly.
///
/// Errors from decorators or from `original` come back unchanged.
pub(crate) fn run_chain(
    chain: &[Descriptor],
    invocation: &Arc<Invocation>,
    method: &MethodSignature,
    original: &dyn Fn(&Arguments) -> Result<Value>,
) -> Result<Value> {
    let Some((head, rest)) = chain.split_first() else {
        return original(invocation.arguments());
    };

    let receiver = match validate::validate(head.name(), head.receiver(), Some(method)) {
        Ok(receiver) => receiver,
        Err(message) => {
            warn!(method = %method.formal_name(), decorator = head.name(), "decorator cannot be dispatched");
            return Err(if head.is_validated() {
                Error::DecoratorNotFound(message)
            } else {
                Error::InvalidDeclaration(message)
            });
        }
    };

    trace!(
        method = %method.formal_name(),
        decorator = head.name(),
        remaining = rest.len(),
        "entering decorator"
    );

    let context = Context::new(invocation.clone(), head.shared_name(), head.shared_options());
    let next = || run_chain(rest, invocation, method, original);
    receiver.invoke(head.name(), &context, Continuation::new(&next), head.options())
}
