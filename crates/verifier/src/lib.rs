// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Static verifier for the security-typed module format
//!
//! Checks every function body of a parsed module against the security
//! type model before any code can run:
//!
//! | Check | Description |
//! |-------|-------------|
//! | **Kind discipline** | Operands match each operation's numeric kind |
//! | **Infectious secrecy** | Tag-polymorphic ops join operand tags; secrets never silently drop to public |
//! | **Sink protection** | Stores, locals, call arguments, results and select arms reject secret-to-public flows |
//! | **Secret selects** | A secret condition forces a secret-declared result |
//! | **Declassification** | `declassify` only inside trusted functions |
//! | **Call trust** | Untrusted functions never call trusted ones, local or imported |
//! | **Stack shape** | No underflow; exact result arity at end of body |
//!
//! Verification is a deterministic linear pass over each body with no
//! execution, no I/O and no shared mutable state; the first violation
//! aborts with the offending function index and instruction offset.

mod error;
mod stack;
pub mod trust;
mod verify;

pub use error::{VerificationError, Violation};
pub use verify::{Verifier, verify_module};
