// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Security type model
//!
//! Two independent tag axes compose into the types the verifier and
//! linker reason about:
//!
//! - [`SecurityTag`]: whether a value or memory region is observable
//!   (`Public`) or classified (`Secret`). Secrecy propagates upward via
//!   [`SecurityTag::join`] and is only removed by an explicit
//!   declassification in a trusted context.
//! - [`TrustTag`]: whether a function may perform trust-restricted
//!   operations (`Trusted`) or not (`Untrusted`).
//!
//! Two distinct compatibility relations exist on purpose:
//!
//! - `flows_to` is the subsumption used *inside* function bodies: a
//!   public value may stand in where a secret is expected, never the
//!   reverse.
//! - `matches` / the `compatible` predicates are the exact-match rules
//!   used at link time, where no covariance is allowed in either
//!   direction.

use std::fmt;

/// Secrecy classification of a value or memory region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SecurityTag {
    /// Observable by any party, including the host.
    Public,
    /// Classified; must never reach a public sink without declassification.
    Secret,
}

impl SecurityTag {
    /// Least upper bound: secrecy is infectious.
    pub fn join(self, other: SecurityTag) -> SecurityTag {
        match (self, other) {
            (SecurityTag::Public, SecurityTag::Public) => SecurityTag::Public,
            _ => SecurityTag::Secret,
        }
    }

    /// Whether a value with this tag may occupy a slot expecting `sink`.
    ///
    /// Public flows anywhere; Secret only flows into Secret.
    pub fn flows_to(self, sink: SecurityTag) -> bool {
        !(self == SecurityTag::Secret && sink == SecurityTag::Public)
    }

    pub fn is_secret(self) -> bool {
        self == SecurityTag::Secret
    }
}

impl fmt::Display for SecurityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityTag::Public => write!(f, "public"),
            SecurityTag::Secret => write!(f, "secret"),
        }
    }
}

/// Trust classification of a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrustTag {
    /// May declassify secrets and call other trusted functions.
    Trusted,
    /// May do neither. The default for all functions and the ceiling
    /// for host-supplied callbacks, which bypass verification.
    Untrusted,
}

impl fmt::Display for TrustTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustTag::Trusted => write!(f, "trusted"),
            TrustTag::Untrusted => write!(f, "untrusted"),
        }
    }
}

/// Numeric representation kind, independent of secrecy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumKind {
    I32,
    I64,
}

impl NumKind {
    /// Width of a value of this kind in linear memory, in bytes.
    pub fn byte_width(self) -> u32 {
        match self {
            NumKind::I32 => 4,
            NumKind::I64 => 8,
        }
    }
}

impl fmt::Display for NumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumKind::I32 => write!(f, "i32"),
            NumKind::I64 => write!(f, "i64"),
        }
    }
}

/// The type of a single operand-stack slot, local, parameter or result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub kind: NumKind,
    pub sec: SecurityTag,
}

impl ValueType {
    /// Public 32-bit integer.
    pub const I32: ValueType = ValueType::new(NumKind::I32, SecurityTag::Public);
    /// Public 64-bit integer.
    pub const I64: ValueType = ValueType::new(NumKind::I64, SecurityTag::Public);
    /// Secret 32-bit integer.
    pub const S32: ValueType = ValueType::new(NumKind::I32, SecurityTag::Secret);
    /// Secret 64-bit integer.
    pub const S64: ValueType = ValueType::new(NumKind::I64, SecurityTag::Secret);

    pub const fn new(kind: NumKind, sec: SecurityTag) -> Self {
        Self { kind, sec }
    }

    /// Body-level subsumption: same kind, and the tag may flow.
    pub fn flows_to(self, expected: ValueType) -> bool {
        self.kind == expected.kind && self.sec.flows_to(expected.sec)
    }

    /// Link-level compatibility: exact equality on both components.
    pub fn matches(self, other: ValueType) -> bool {
        self == other
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.sec, self.kind) {
            (SecurityTag::Public, NumKind::I32) => write!(f, "i32"),
            (SecurityTag::Public, NumKind::I64) => write!(f, "i64"),
            (SecurityTag::Secret, NumKind::I32) => write!(f, "s32"),
            (SecurityTag::Secret, NumKind::I64) => write!(f, "s64"),
        }
    }
}

/// Size bounds of a linear memory, in 64 KiB pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Initial size in pages.
    pub initial: u32,
    /// Optional upper bound in pages.
    pub max: Option<u32>,
}

impl Limits {
    pub const fn new(initial: u32, max: Option<u32>) -> Self {
        Self { initial, max }
    }

    /// Whether the declared bounds are internally consistent.
    pub fn is_valid(&self) -> bool {
        self.max.is_none_or(|max| self.initial <= max)
    }

    /// Whether an actual memory with `actual` bounds satisfies an import
    /// declared with `self`: at least as large initially, and no less
    /// constrained than the importer demands.
    pub fn admits(&self, actual: &Limits) -> bool {
        if actual.initial < self.initial {
            return false;
        }
        match self.max {
            None => true,
            Some(expected_max) => actual.max.is_some_and(|m| m <= expected_max),
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{} pages", self.initial, max),
            None => write!(f, "{}.. pages", self.initial),
        }
    }
}

/// Declared type of a linear memory: size bounds plus a secrecy tag
/// fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryType {
    pub limits: Limits,
    pub sec: SecurityTag,
}

impl MemoryType {
    /// A public memory with the given bounds. Absent an explicit tag,
    /// memories are public.
    pub const fn new(initial: u32, max: Option<u32>) -> Self {
        Self {
            limits: Limits::new(initial, max),
            sec: SecurityTag::Public,
        }
    }

    /// Mark this memory secret. Loads from it produce secret values and
    /// only secret-compatible stores are accepted.
    pub const fn secret(mut self) -> Self {
        self.sec = SecurityTag::Secret;
        self
    }

    /// Link-level compatibility: exact secrecy equality plus bound
    /// admission. Secrecy mismatches fail in both directions.
    pub fn compatible(expected: &MemoryType, actual: &MemoryType) -> bool {
        expected.sec == actual.sec && expected.limits.admits(&actual.limits)
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} memory ({})", self.sec, self.limits)
    }
}

/// Declared signature of a function: parameter and result value types
/// plus the trust tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
    pub trust: TrustTag,
}

impl FuncType {
    /// An untrusted function signature. Untrusted is the default; trust
    /// must be claimed explicitly via [`FuncType::trusted`].
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        Self {
            params,
            results,
            trust: TrustTag::Untrusted,
        }
    }

    /// Mark this signature trusted.
    pub fn trusted(mut self) -> Self {
        self.trust = TrustTag::Trusted;
        self
    }

    /// Link-level compatibility: params, results and trust all exactly
    /// equal. No widening, no trust covariance.
    pub fn compatible(expected: &FuncType, actual: &FuncType) -> bool {
        expected.trust == actual.trust
            && expected.params.len() == actual.params.len()
            && expected.results.len() == actual.results.len()
            && expected
                .params
                .iter()
                .zip(&actual.params)
                .chain(expected.results.iter().zip(&actual.results))
                .all(|(e, a)| e.matches(*a))
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fn(", self.trust)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> (")?;
        for (i, r) in self.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{r}")?;
        }
        write!(f, ")")
    }
}

/// The externally visible contract of an import or export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternType {
    Func(FuncType),
    Memory(MemoryType),
}

impl ExternType {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExternType::Func(_) => "function",
            ExternType::Memory(_) => "memory",
        }
    }

    /// Link-level compatibility across kinds: kinds must agree and the
    /// kind-specific exact predicate must hold.
    pub fn compatible(expected: &ExternType, actual: &ExternType) -> bool {
        match (expected, actual) {
            (ExternType::Func(e), ExternType::Func(a)) => FuncType::compatible(e, a),
            (ExternType::Memory(e), ExternType::Memory(a)) => MemoryType::compatible(e, a),
            _ => false,
        }
    }
}

impl fmt::Display for ExternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternType::Func(ty) => write!(f, "{ty}"),
            ExternType::Memory(ty) => write!(f, "{ty}"),
        }
    }
}
