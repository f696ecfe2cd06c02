//! Named, reusable method decorators.
//!
//! Declare one or more decorators, then define a method: the method is
//! finalized with every pending declaration bound to it, and each call runs
//! through those decorators in declaration order before reaching the
//! original body.
//!
//! Decorator names are resolved on *receivers*. A declaration either names
//! its receiver explicitly or searches the type's registry, newest
//! registration first, ending with the built-in [`Decorators`] (`log`,
//! `memoize`, `memoize_for_arguments`).
//!
//! # Example
//!
//! ```rust
//! use adornable::{Arguments, Declaration, DecoratorSet, Target};
//! use serde_json::json;
//!
//! let exclaim = DecoratorSet::class("Exclaim")
//!     .with("exclaim", |_, next, _| {
//!         let value = next.proceed()?;
//!         Ok(json!(format!("{}!", value.as_str().unwrap_or_default())))
//!     })
//!     .into_ref();
//!
//! let mut target = Target::new("Greeter");
//! target.register_receiver(exclaim);
//! target.declare(Declaration::new("exclaim")).unwrap();
//! let greet = target.define_static_method("greet", |arguments| {
//!     let name: String = arguments.get(0)?;
//!     Ok(json!(format!("hello {name}")))
//! });
//!
//! let value = greet.call(Arguments::new().with("Al")).unwrap();
//! assert_eq!(value, json!("hello Al!"));
//! ```
//!
//! The [`adornable`] attribute offers the same machinery declaratively on an
//! `impl` block; see its documentation.

mod accumulator;
mod binding;
mod context;
mod decorators;
mod dispatch;
mod error;
mod method;
mod receiver;
mod registry;
mod target;
mod validate;

pub use accumulator::{Accumulator, Declaration, Descriptor};
pub use adornable_macros::{adornable, decorate};
pub use binding::BindingTable;
pub use context::{
    Arguments, Context, Identified, InstanceId, Invocation, MethodKind, MethodReceiver, Options, TargetId,
};
pub use decorators::{Decorators, FOR_ARGUMENTS, LOG, MEMOIZE, MEMOIZE_FOR_ARGUMENTS};
pub use error::{Error, Result};
pub use method::{InstanceMethod, MethodSignature, MethodTable, SourceLocation, StaticMethod};
pub use receiver::{Continuation, DecoratorFn, DecoratorReceiver, DecoratorSet, ReceiverKind, ReceiverRef};
pub use registry::ReceiverRegistry;
pub use target::Target;

#[doc(hidden)]
pub use serde_json;

/// Converts a value for use as a call argument or result.
pub fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// Converts a call result back to its declared type.
pub fn from_value<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}
