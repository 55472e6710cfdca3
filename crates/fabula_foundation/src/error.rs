//! Error types for the Fabula system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! These are authoring and runtime faults; expected control flow (abort,
//! substitution, short-circuit) never travels through [`Error`].

use std::fmt;

use thiserror::Error;

/// The main error type for Fabula operations.
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

    /// Pushes a frame onto this error's context, creating one if needed.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates an undefined property kind error.
    #[must_use]
    pub fn undefined_property(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedProperty(name.into()))
    }

    /// Creates an undefined relation kind error.
    #[must_use]
    pub fn undefined_relation(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedRelation(name.into()))
    }

    /// Creates an undefined action kind error.
    #[must_use]
    pub fn undefined_action(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedAction(name.into()))
    }

    /// Creates an undefined activity or rule table error.
    #[must_use]
    pub fn undefined_activity(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedActivity(name.into()))
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            name: name.into(),
            expected,
            actual,
        })
    }

    /// Creates a sealed schema error.
    #[must_use]
    pub fn sealed(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::SealedSchema(what.into()))
    }

    /// Creates a duplicate definition error.
    #[must_use]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateDefinition(name.into()))
    }

    /// Creates an unknown insertion anchor error.
    #[must_use]
    pub fn unknown_anchor(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownAnchor(name.into()))
    }

    /// Creates an unbound variable error.
    #[must_use]
    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnboundVariable(name.into()))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error is an authoring mistake rather than a runtime fault.
    #[must_use]
    pub fn is_authoring(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UndefinedProperty(_)
                | ErrorKind::UndefinedRelation(_)
                | ErrorKind::UndefinedAction(_)
                | ErrorKind::UndefinedActivity(_)
                | ErrorKind::ArityMismatch { .. }
                | ErrorKind::SealedSchema(_)
                | ErrorKind::DuplicateDefinition(_)
                | ErrorKind::UnknownAnchor(_)
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A property kind was read or written without being defined.
    #[error("undefined property: {0}")]
    UndefinedProperty(String),

    /// A relation kind was used without being defined.
    #[error("undefined relation: {0}")]
    UndefinedRelation(String),

    /// An action kind was used without being defined.
    #[error("undefined action: {0}")]
    UndefinedAction(String),

    /// An activity or rule table was called without being defined.
    #[error("undefined activity: {0}")]
    UndefinedActivity(String),

    /// Wrong number of arguments for a property, relation, or action.
    #[error("arity mismatch for {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// The kind name that was used.
        name: String,
        /// The declared arity.
        expected: usize,
        /// Actual number of arguments.
        actual: usize,
    },

    /// The schema was sealed and can no longer gain new kinds.
    #[error("world is sealed: cannot define {0}")]
    SealedSchema(String),

    /// A kind or named handler was defined twice.
    #[error("duplicate definition: {0}")]
    DuplicateDefinition(String),

    /// An insertion directive named a handler that does not exist.
    #[error("unknown insertion anchor: {0}")]
    UnknownAnchor(String),

    /// A relation cardinality constraint was violated.
    #[error("cardinality violation in {relation}: {message}")]
    CardinalityViolation {
        /// The relation kind.
        relation: String,
        /// What was violated.
        message: String,
    },

    /// A pattern needed to be ground but still had a variable.
    #[error("unbound variable: ?{0}")]
    UnboundVariable(String),

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// Snapshot encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem or terminal failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// Nested do-first actions went deeper than allowed.
    MaxActionDepth {
        /// The configured limit.
        limit: u32,
        /// The action that would have exceeded the limit.
        action: Option<String>,
    },
    /// A chain of do-instead substitutions ran too long.
    MaxRedirects {
        /// The configured limit.
        limit: u32,
        /// The last substituted action.
        action: Option<String>,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxActionDepth { limit, action } => {
                write!(f, "max action depth ({limit}) exceeded")?;
                if let Some(action) = action {
                    write!(f, " while running {action}")?;
                }
                Ok(())
            }
            Self::MaxRedirects { limit, action } => {
                write!(f, "max redirects ({limit}) exceeded")?;
                if let Some(action) = action {
                    write!(f, " at {action}")?;
                }
                Ok(())
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Handler or table name.
    pub source: Option<String>,
    /// Stack of actions and activities being run.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
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
