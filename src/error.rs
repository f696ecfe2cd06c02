//! Error taxonomy for declaration, dispatch, and pass-through failures.

use std::sync::Arc;

use thiserror::Error;

/// Errors produced while declaring decorators or calling decorated methods.
///
/// Payloads live behind `Arc` so a failed definition can be reported from
/// every later call without losing the original value.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Missing decorator name, or a receiver that cannot handle the decorator
    /// when the declaration is validated (immediately, or on first call when
    /// validation was deferred).
    #[error("{0}")]
    InvalidDeclaration(String),

    /// A bound receiver stopped exposing its decorator after binding.
    #[error("{0}")]
    DecoratorNotFound(String),

    /// A method table was asked for a method that was never defined on it.
    #[error("no adorned method named `{0}`")]
    UnknownMethod(String),

    /// Call data could not be converted to or from a dynamic value.
    #[error("value conversion failed: {0}")]
    Conversion(Arc<serde_json::Error>),

    /// Raised by a decorator body or an original method. Passed through the
    /// chain untouched.
    #[error("{0}")]
    Raised(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an application error so it can travel through a decorator chain.
    pub fn raise<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Raised(Arc::new(error))
    }

    /// Returns the raised application error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Error::Raised(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_invalid_declaration(&self) -> bool {
        matches!(self, Error::InvalidDeclaration(_))
    }

    pub fn is_decorator_not_found(&self) -> bool {
        matches!(self, Error::DecoratorNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Conversion(Arc::new(error))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
