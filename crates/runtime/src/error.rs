//! Error types for the runtime crate

use module::{ContractError, NumKind};
use thiserror::Error;
use verifier::VerificationError;

/// Link-time failures. Each carries the offending import's two-level
/// name; the first failure aborts the whole instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("unknown import `{module}`.`{name}`: no provider supplied")]
    UnknownImport { module: String, name: String },

    #[error("incompatible import `{module}`.`{name}`: {reason}")]
    Incompatible {
        module: String,
        name: String,
        reason: String,
    },

    /// Host callbacks bypass verification, so trust cannot be claimed
    /// for them. Rejected when the callback is defined, before any
    /// link is attempted.
    #[error("host functions cannot claim trusted status")]
    HostTrust,
}

/// Any way instantiation can fail. All variants are fatal to the one
/// instantiation and recoverable at the host level; no partial
/// instance is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiateError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Execution-time faults. Verified code can still trap on dynamic
/// conditions (out-of-bounds addresses, call depth); hosts calling in
/// through the public surface can also present bad arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Trap {
    #[error("out-of-bounds memory access at address {addr} ({len} bytes)")]
    MemoryOutOfBounds { addr: u32, len: u32 },

    #[error("memory instruction executed with no memory bound")]
    NoMemory,

    #[error("call depth exceeded budget of {budget}")]
    CallStackExhausted { budget: usize },

    #[error("no export named `{name}`")]
    UnknownExport { name: String },

    #[error("no function at index {index}")]
    UnknownFunction { index: u32 },

    #[error("no local at index {index}")]
    UnknownLocal { index: u32 },

    #[error("expected {expected} arguments, found {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument {index}: expected {expected}, found {found}")]
    ArgumentKind {
        index: usize,
        expected: NumKind,
        found: NumKind,
    },

    #[error("host function returned {found} results, declared {expected}")]
    HostResultCount { expected: usize, found: usize },

    #[error("host function result {index}: expected {expected}, found {found}")]
    HostResultKind {
        index: usize,
        expected: NumKind,
        found: NumKind,
    },

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("operand kind confusion: expected {expected}")]
    KindMismatch { expected: NumKind },

    #[error("host function failed: {message}")]
    Host { message: String },
}

impl Trap {
    /// Convenience constructor for host closures reporting their own
    /// failures.
    pub fn host(message: impl Into<String>) -> Self {
        Trap::Host {
            message: message.into(),
        }
    }
}
