// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Security-typed module format: type model and module structure
//!
//! This crate is the shared leaf of the verification stack. It defines:
//!
//! - the security type model: `{public, secret}` value/memory tags and
//!   `{trusted, untrusted}` function tags composed with numeric kinds
//!   ([`types`]);
//! - the instruction set of the format's linear body language
//!   ([`instr`]);
//! - the parsed-module structure and its builder ([`ModuleBuilder`]);
//! - contract extraction: the pure derivation of a module's externally
//!   visible import/export contract ([`extract_contract`]).
//!
//! Verification of function bodies lives in the `verifier` crate;
//! link-time compatibility checking and execution live in `runtime`.

mod contract;
mod error;
pub mod instr;
mod module;
pub mod types;

pub use contract::{ImportSpec, ModuleContract, extract_contract};
pub use error::ContractError;
pub use instr::{BinOp, CmpOp, Instr};
pub use module::{Export, ExportKind, Function, Import, Module, ModuleBuilder};
pub use types::{
    ExternType, FuncType, Limits, MemoryType, NumKind, SecurityTag, TrustTag, ValueType,
};
