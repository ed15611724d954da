//! Error taxonomy for the pipeline.
//!
//! Three severities, matching the distinction the pipeline's invariants
//! draw: a `Warning` is recoverable and collected by [`crate::diagnostic`]
//! rather than raised here; a `Fatal` translation error means the input
//! cannot be translated and aborts the current function/class; a
//! `Structural` error means the translator itself produced an inconsistent
//! state (a node visited out of the order its own passes guarantee) and is
//! always a bug in this crate, not in the input.

use std::fmt;
use thiserror::Error;

/// Where in the Source file an error originated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The kind of a fatal or structural error.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("parse error")]
    ParseError,

    #[error("unsupported construct")]
    UnsupportedConstruct(String),

    #[error("type could not be resolved")]
    UnresolvedType(String),

    #[error("code generation error")]
    CodeGenerationError(String),

    /// A translator-internal invariant was violated: the node shape a later
    /// pass assumed does not match what an earlier pass actually produced.
    /// Always a bug in this crate.
    #[error("structural assertion failed")]
    StructuralAssertion(String),

    #[error("internal error")]
    InternalError(String),
}

/// A fatal or structural error with its location and any context frames
/// accumulated while propagating up through the pipeline.
#[derive(Debug, Error)]
pub struct TranspileError {
    pub kind: ErrorKind,
    pub location: Option<SourceLocation>,
    pub context: Vec<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TranspileError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: None,
            context: Vec::new(),
            source: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// `true` for [`ErrorKind::StructuralAssertion`] — a bug in the
    /// translator rather than an unsupported input. Callers that surface
    /// errors to a user (the CLI) use this to word the message differently.
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, ErrorKind::StructuralAssertion(_))
    }
}

impl fmt::Display for TranspileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(loc) = &self.location {
            write!(f, " at {loc}")?;
        }
        if !self.context.is_empty() {
            write!(f, "\n\nContext:")?;
            for (i, ctx) in self.context.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, ctx)?;
            }
        }
        Ok(())
    }
}

pub type TranspileResult<T> = Result<T, TranspileError>;

pub trait ResultExt<T> {
    fn with_context(self, ctx: impl Into<String>) -> TranspileResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<TranspileError>,
{
    fn with_context(self, ctx: impl Into<String>) -> TranspileResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }
}

impl From<anyhow::Error> for TranspileError {
    fn from(err: anyhow::Error) -> Self {
        TranspileError::new(ErrorKind::InternalError(err.to_string()))
    }
}

#[macro_export]
macro_rules! transpile_error {
    ($kind:expr) => {
        $crate::error::TranspileError::new($kind)
    };

    ($kind:expr, $($ctx:expr),+) => {{
        let mut err = $crate::error::TranspileError::new($kind);
        $(
            err = err.with_context($ctx);
        )+
        err
    }};
}

#[macro_export]
macro_rules! transpile_bail {
    ($kind:expr) => {
        return Err($crate::transpile_error!($kind))
    };

    ($kind:expr, $($ctx:expr),+) => {
        return Err($crate::transpile_error!($kind, $($ctx),+))
    };
}

/// Raises a [`ErrorKind::StructuralAssertion`] if `cond` is false. Used at
/// pass boundaries where a later pass relies on an earlier pass's output
/// shape (e.g. the generator assuming the analyzer has annotated every
/// `Expr::Name`).
#[macro_export]
macro_rules! structural_assert {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::error::TranspileError::new(
                $crate::error::ErrorKind::StructuralAssertion($msg.to_string()),
            ));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation() {
        let err = TranspileError::new(ErrorKind::UnsupportedConstruct("async def".to_string()));
        assert!(matches!(err.kind, ErrorKind::UnsupportedConstruct(_)));
        assert!(err.location.is_none());
        assert!(err.context.is_empty());
    }

    #[test]
    fn error_with_location() {
        let loc = SourceLocation {
            file: "test.py".to_string(),
            line: 10,
            column: 5,
        };
        let err = TranspileError::new(ErrorKind::ParseError).with_location(loc.clone());
        assert_eq!(err.location.unwrap(), loc);
    }

    #[test]
    fn error_with_context_accumulates() {
        let err = TranspileError::new(ErrorKind::UnresolvedType("x".to_string()))
            .with_context("in function 'add'")
            .with_context("while processing parameter 'x'");
        assert_eq!(err.context.len(), 2);
    }

    #[test]
    fn error_display_includes_location_and_context() {
        let loc = SourceLocation {
            file: "example.py".to_string(),
            line: 25,
            column: 10,
        };
        let err = TranspileError::new(ErrorKind::UnsupportedConstruct("decorators".to_string()))
            .with_location(loc)
            .with_context("in function 'my_func'");
        let display = format!("{err}");
        assert!(display.contains("example.py:25:10"));
        assert!(display.contains("in function 'my_func'"));
    }

    #[test]
    fn structural_errors_are_flagged() {
        let err = TranspileError::new(ErrorKind::StructuralAssertion("unreachable".to_string()));
        assert!(err.is_structural());
        let not_structural = TranspileError::new(ErrorKind::ParseError);
        assert!(!not_structural.is_structural());
    }
}
