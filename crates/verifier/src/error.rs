//! Error types for function body verification

use std::fmt;

use thiserror::Error;

/// A verification failure, located at the offending function index and
/// instruction offset. The first violation found aborts verification of
/// the module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("function {func}, instruction {pc}: {violation}")]
pub struct VerificationError {
    /// Index of the offending function in the module's function space.
    pub func: u32,
    /// Instruction offset within the body; `body.len()` for violations
    /// detected at the end-of-body result check.
    pub pc: usize,
    pub violation: Violation,
}

/// The kind of discipline a function body violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// An operand or index had the wrong numeric kind or referent.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A secret value would reach a public-typed sink.
    #[error("secret value would flow into public {sink}")]
    SecrecyLeak { sink: String },

    /// A trust-restricted operation in an untrusted context.
    #[error("trust violation: {reason}")]
    TrustViolation { reason: String },

    /// Operand stack underflow or wrong arity at end of body.
    #[error("stack shape: {reason}")]
    StackShape { reason: String },
}

impl Violation {
    pub(crate) fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Violation::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn leak(sink: impl Into<String>) -> Self {
        Violation::SecrecyLeak { sink: sink.into() }
    }

    pub(crate) fn trust(reason: impl Into<String>) -> Self {
        Violation::TrustViolation {
            reason: reason.into(),
        }
    }

    pub(crate) fn stack(reason: impl Into<String>) -> Self {
        Violation::StackShape {
            reason: reason.into(),
        }
    }
}
