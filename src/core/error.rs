//! Error handling for undercomplicate
//!
//! Every fallible operation in the crate returns [`PipelineError`]. The variants are
//! grouped by the kind of failure rather than by the module that raised them:
//!
//! - **Configuration**: [`PipelineError::Config`]
//! - **Cache contract**: [`PipelineError::NotImplemented`]
//! - **Grouping / shape**: [`PipelineError::MissingGroupField`],
//!   [`PipelineError::NonPrimitiveGroupKey`], [`PipelineError::MissingField`]
//! - **Dependency graph**: [`PipelineError::InvalidDeclaration`],
//!   [`PipelineError::CircularDependency`], [`PipelineError::UnknownSource`]
//! - **Request / transport**: [`PipelineError::Http`], [`PipelineError::Transport`],
//!   [`PipelineError::Json`], [`PipelineError::Other`]
//!
//! # Cloning
//!
//! Adapters share one in-flight request between every caller asking for the same cache
//! key, so the error produced by that request is handed to each waiter. That requires
//! `PipelineError: Clone`; foreign errors that are not `Clone` are either flattened to
//! their message ([`reqwest::Error`], [`serde_json::Error`]) or kept behind an [`Arc`]
//! ([`anyhow::Error`]).
//!
//! # Examples
//!
//! ```rust
//! use undercomplicate::core::PipelineError;
//!
//! fn lookup(name: &str) -> Result<(), PipelineError> {
//!     Err(PipelineError::UnknownSource {
//!         name: name.to_string(),
//!     })
//! }
//!
//! let err = lookup("assoc").unwrap_err();
//! assert!(err.to_string().contains("no matching source was provided"));
//! ```

use std::sync::Arc;
use thiserror::Error;

/// The error type for every adapter, cache, join, and orchestration operation.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Required setup is missing or inconsistent
    ///
    /// Raised for a URL adapter with no URL, or a connector-style source that expects
    /// a dependency the linked request never declared.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// A hook required by the current configuration was not provided
    ///
    /// `cache_key` must be implemented whenever caching is enabled, and every adapter
    /// that can miss the cache must implement `perform_request`.
    #[error("Method not implemented: {hook}")]
    NotImplemented {
        /// Name of the hook that has no implementation
        hook: &'static str,
    },

    /// A record lacks the field used to group it
    #[error("All records must specify a value for the field \"{field}\"")]
    MissingGroupField {
        /// The grouping field
        field: String,
    },

    /// A grouping field resolved to an object, array or null
    #[error("Attempted to group on a field \"{field}\" with a non-primitive value")]
    NonPrimitiveGroupKey {
        /// The grouping field
        field: String,
    },

    /// A field requested by a record transform does not exist
    #[error("Field \"{field}\" not found in record")]
    MissingField {
        /// The requested field
        field: String,
    },

    /// A dependency declaration does not match `name` or `name(dep1, dep2)`
    #[error("Unable to parse dependency specification: {declaration}")]
    InvalidDeclaration {
        /// The raw declaration text
        declaration: String,
    },

    /// The declared dependencies contain a cycle
    #[error("Invalid or possible circular dependency specification: {chain}")]
    CircularDependency {
        /// The cycle, rendered as `a → b → a`
        chain: String,
    },

    /// A declared name has no matching entry in the provider registry
    #[error("Data has been requested from source '{name}', but no matching source was provided")]
    UnknownSource {
        /// The name that was looked up
        name: String,
    },

    /// The server answered with a non-success status
    #[error("{reason}")]
    Http {
        /// Numeric HTTP status code
        status: u16,
        /// Status text, e.g. `Not Found`
        reason: String,
    },

    /// The HTTP client failed before a status was received
    #[error("Request failed: {message}")]
    Transport {
        /// Message from the underlying client
        message: String,
    },

    /// A response body could not be parsed as JSON
    #[error("Invalid JSON response: {message}")]
    Json {
        /// Message from the JSON parser
        message: String,
    },

    /// Any other failure raised by a user-supplied hook
    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl PipelineError {
    /// Shorthand for [`PipelineError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns the wrapped [`anyhow::Error`] for errors raised by custom hooks.
    ///
    /// Callers use this to inspect the value a hook failed with, unchanged.
    pub fn as_other(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Other(err) => Some(err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        // Pipeline errors routed through anyhow come back out as themselves
        match err.downcast::<PipelineError>() {
            Ok(inner) => inner,
            Err(err) => Self::Other(Arc::new(err)),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
