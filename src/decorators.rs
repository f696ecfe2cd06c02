//! Built-in decorators: `log`, `memoize`, and `memoize_for_arguments`.
//!
//! These are the fallback receiver of every registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use crate::context::{Context, MethodReceiver, Options};
use crate::error::{Error, Result};
use crate::receiver::{Continuation, DecoratorReceiver, ReceiverKind, ReceiverRef};

pub const LOG: &str = "log";
pub const MEMOIZE: &str = "memoize";
pub const MEMOIZE_FOR_ARGUMENTS: &str = "memoize_for_arguments";

/// Option that makes `memoize` key its cache on the call's arguments.
pub const FOR_ARGUMENTS: &str = "for_arguments";

const TYPE_NAME: &str = "adornable::Decorators";

type Output = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    receiver: MethodReceiver,
    method: String,
    arguments: Option<String>,
}

static SHARED: LazyLock<Arc<Decorators>> = LazyLock::new(|| Arc::new(Decorators::new()));

/// Receiver for the built-in decorators.
///
/// Each instance has its own memoization cache. `log` lines go to stdout
/// unless an output was supplied.
pub struct Decorators {
    output: Option<Output>,
    memo: Mutex<HashMap<MemoKey, Value>>,
}

impl Decorators {
    pub fn new() -> Self {
        Self {
            output: None,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Sends each `log` line to `output` instead of stdout.
    pub fn with_output<F>(output: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            output: Some(Box::new(output)),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide instance every registry falls back to.
    pub fn shared() -> ReceiverRef {
        SHARED.clone()
    }

    /// Emits ``Calling method `Type#name` with arguments `[..]` `` and runs
    /// the rest of the chain once.
    pub fn log(&self, context: &Context, next: Continuation<'_>) -> Result<Value> {
        let arguments = context.arguments();
        let description = if arguments.is_empty() {
            "no arguments".to_string()
        } else {
            format!("arguments `{}`", arguments.to_list())
        };
        let line = format!(
            "Calling method `{}` with {description}",
            context.formal_method_name()
        );
        match &self.output {
            Some(output) => output(&line),
            None => println!("{line}"),
        }
        next.proceed()
    }

    /// Caches the first result per receiver and method, or per receiver,
    /// method, and arguments when `for_arguments` is true.
    pub fn memoize(&self, context: &Context, next: Continuation<'_>, options: &Options) -> Result<Value> {
        let for_arguments = options
            .get(FOR_ARGUMENTS)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.memoized(context, next, for_arguments)
    }

    pub fn memoize_for_arguments(&self, context: &Context, next: Continuation<'_>) -> Result<Value> {
        self.memoized(context, next, true)
    }

    fn memoized(&self, context: &Context, next: Continuation<'_>, for_arguments: bool) -> Result<Value> {
        let key = MemoKey {
            receiver: context.receiver().clone(),
            method: context.method_name().to_string(),
            arguments: if for_arguments {
                Some(context.arguments().canonical_key()?)
            } else {
                None
            },
        };

        if let Some(cached) = self.memo.lock().get(&key) {
            trace!(method = %context.formal_method_name(), "memoized value reused");
            return Ok(cached.clone());
        }

        // Not locked while computing: the chain may call back into memoized
        // methods.
        let value = next.proceed()?;
        Ok(self.memo.lock().entry(key).or_insert(value).clone())
    }
}

impl Default for Decorators {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Decorators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorators")
            .field("cached", &self.memo.lock().len())
            .finish()
    }
}

impl DecoratorReceiver for Decorators {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Class
    }

    fn responds_to(&self, decorator: &str) -> bool {
        matches!(decorator, LOG | MEMOIZE | MEMOIZE_FOR_ARGUMENTS)
    }

    fn invoke(
        &self,
        decorator: &str,
        context: &Context,
        next: Continuation<'_>,
        options: &Options,
    ) -> Result<Value> {
        match decorator {
            LOG => self.log(context, next),
            MEMOIZE => self.memoize(context, next, options),
            MEMOIZE_FOR_ARGUMENTS => self.memoize_for_arguments(context, next),
            other => Err(Error::DecoratorNotFound(format!(
                "Decorator method `{other}` cannot be found on `{TYPE_NAME}`."
            ))),
        }
    }
}
