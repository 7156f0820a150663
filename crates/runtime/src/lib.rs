// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Linking and execution runtime for the security-typed module format
//!
//! This crate takes verified modules the last mile: it checks every
//! import binding against the provider actually supplied, constructs
//! atomic instances, and executes exported functions.
//!
//! # Architecture
//!
//! ```text
//! Module (parsed, read-only)
//!      ↓ extract_contract     (module crate)
//!      ↓ verify_module        (verifier crate)
//!      ↓ link                 (per-import exact compatibility check)
//! Instance ──exports──→ providers for further links
//!      ↓
//! Func::call → interpreter
//! ```
//!
//! # Linking Discipline
//!
//! Import contracts match exactly: numeric kind, secrecy tag, trust
//! tag and memory bounds. A secret-memory import never binds a public
//! provider or vice versa; a trusted function import never binds a
//! host callback. Instantiation is all-or-nothing: if any import is
//! rejected, no instance exists and no binding is observable.
//!
//! # Thread Safety
//!
//! Modules and contracts are immutable once built and safe to share
//! across concurrent instantiations. Instances share memories via
//! `Arc` with the data behind an `RwLock`; bindings reference their
//! providers, which therefore outlive them.

mod error;
mod execute;
mod func;
mod instance;
mod link;
mod memory;
mod value;

pub use error::{InstantiateError, LinkError, Trap};
pub use execute::DEFAULT_CALL_DEPTH_BUDGET;
pub use func::Func;
pub use instance::{Extern, Instance, instantiate};
pub use link::Imports;
pub use memory::{Memory, PAGE_SIZE};
pub use value::Value;
