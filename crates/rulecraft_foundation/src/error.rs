//! Error types for the Rulecraft system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::types::Type;

/// The main error type for Rulecraft operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Pushes an expression frame onto the error's context stack.
    ///
    /// Frames are pushed innermost first while the error unwinds.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Sets the source label (component or rule name) of the error context.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_source(source));
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a data selector resolution error.
    #[must_use]
    pub fn resolution(err: ResolutionError) -> Self {
        Self::new(ErrorKind::Resolution(err))
    }

    /// Creates a context binding error.
    #[must_use]
    pub fn bind(err: BindError) -> Self {
        Self::new(ErrorKind::Bind(err))
    }

    /// Creates an unknown plugin error.
    #[must_use]
    pub fn plugin_not_found(id: impl Into<String>) -> Self {
        Self::new(ErrorKind::PluginNotFound(id.into()))
    }

    /// Creates a plugin execution error.
    #[must_use]
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PluginExecution {
            plugin: plugin.into(),
            message: message.into(),
        })
    }

    /// Creates a persistence error reported by the host storage.
    #[must_use]
    pub fn persistence(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence {
            entity_type: entity_type.into(),
            message: message.into(),
        })
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(entity_type: impl Into<String>, id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound {
            entity_type: entity_type.into(),
            id,
        })
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration(message.into()))
    }

    /// Returns the resolution error, if this is one.
    #[must_use]
    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match &self.kind {
            ErrorKind::Resolution(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the binding error, if this is one.
    #[must_use]
    pub fn as_bind(&self) -> Option<&BindError> {
        match &self.kind {
            ErrorKind::Bind(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResolutionError> for Error {
    fn from(err: ResolutionError) -> Self {
        Self::resolution(err)
    }
}

impl From<BindError> for Error {
    fn from(err: BindError) -> Self {
        Self::bind(err)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Type mismatch during runtime type checking.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// A data selector could not be resolved or written.
    #[error("data selector error: {0}")]
    Resolution(ResolutionError),

    /// Context values could not be bound to their definitions.
    #[error("context binding error: {0}")]
    Bind(BindError),

    /// No plugin is registered under the requested id.
    #[error("unknown plugin: {0}")]
    PluginNotFound(String),

    /// A condition or action body reported a failure.
    #[error("plugin {plugin} failed: {message}")]
    PluginExecution {
        /// The plugin id.
        plugin: String,
        /// Description of the failure.
        message: String,
    },

    /// The host storage failed to persist an entity.
    #[error("failed to save {entity_type}: {message}")]
    Persistence {
        /// The entity type being saved.
        entity_type: String,
        /// Description of the failure.
        message: String,
    },

    /// Entity was not found in storage.
    #[error("entity not found: {entity_type} {id}")]
    EntityNotFound {
        /// The entity type that was queried.
        entity_type: String,
        /// The identifier that was queried.
        id: EntityId,
    },

    /// Configuration refers to something that does not exist or is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures while resolving or writing a data selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The selector string contained no segments.
    #[error("empty data selector")]
    EmptyPath,

    /// The root variable of the selector is not available.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// A segment names a property the current value does not have.
    #[error("unknown property {property} in {path}")]
    UnknownProperty {
        /// The offending segment.
        property: String,
        /// The full selector.
        path: String,
    },

    /// A segment expects a different shape of value.
    #[error("cannot apply {segment} in {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The offending segment.
        segment: String,
        /// The full selector.
        path: String,
        /// What the segment needs.
        expected: String,
        /// The type actually found.
        actual: Type,
    },

    /// A list index is past the end of the list.
    #[error("index {index} out of bounds (length {length}) in {path}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The list length.
        length: usize,
        /// The full selector.
        path: String,
    },

    /// The selector crosses a boundary that cannot be written through.
    #[error("{path} is not writable")]
    NotWritable {
        /// The full selector.
        path: String,
    },
}

/// Failures while binding context values to context definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A required context has no value.
    #[error("missing value for required context {name}")]
    MissingContextValue {
        /// Context name.
        name: String,
    },

    /// The value does not satisfy the declared type.
    #[error("context {name} expects {expected}, got {actual}")]
    ContextTypeMismatch {
        /// Context name.
        name: String,
        /// The declared type.
        expected: Type,
        /// The type of the provided value.
        actual: Type,
    },

    /// A value was provided for a context that is not declared.
    #[error("no context named {name} is defined")]
    UndefinedContext {
        /// Context name.
        name: String,
    },

    /// The value is not among the context's allowed values.
    #[error("value {value} is not allowed for context {name}")]
    DisallowedValue {
        /// Context name.
        name: String,
        /// Rendered value.
        value: String,
    },
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Component or rule label.
    pub source: Option<String>,
    /// Stack of expressions being evaluated, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
