// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Instruction set of the security-typed numeric format
//!
//! The format's body language is a linear sequence of stack
//! instructions with no intra-function control flow, so both
//! verification and execution are single forward passes.

use crate::types::{NumKind, ValueType};

/// Tag-polymorphic binary arithmetic. Operands must share the numeric
/// kind; the result carries the join of the operand secrecy tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

/// Tag-polymorphic comparison. Produces an `i32`-kind value carrying
/// the join of the operand tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    /// Signed less-than.
    LtS,
    /// Signed greater-than.
    GtS,
}

/// A single body instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instr {
    /// Push a public `i32` constant.
    I32Const(i32),
    /// Push a public `i64` constant.
    I64Const(i64),
    /// Push a secret `i32` constant.
    S32Const(i32),
    /// Push a secret `i64` constant.
    S64Const(i64),
    /// Pop two operands of `kind`, push the result.
    Binary { op: BinOp, kind: NumKind },
    /// Pop two operands of `kind`, push an `i32`-kind flag.
    Compare { op: CmpOp, kind: NumKind },
    /// Pop a condition, then two arms; push one arm. `ty` is the
    /// declared result type and must absorb the condition's secrecy.
    Select { ty: ValueType },
    /// Raise a public operand of `kind` to secret.
    Classify { kind: NumKind },
    /// Lower a secret operand of `kind` to public. Trusted context only.
    Declassify { kind: NumKind },
    /// Load a value of `kind` from memory 0 at a public `i32` address.
    /// The loaded value carries the memory's declared secrecy.
    Load { kind: NumKind },
    /// Store a value of `kind` to memory 0 at a public `i32` address.
    Store { kind: NumKind },
    /// Push the value of a local.
    LocalGet(u32),
    /// Pop a value into a local.
    LocalSet(u32),
    /// Pop and discard a value.
    Drop,
    /// Call the function at `index` in the imports-then-locals space.
    Call(u32),
}

impl Instr {
    /// Short mnemonic for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Instr::I32Const(_) => "i32.const",
            Instr::I64Const(_) => "i64.const",
            Instr::S32Const(_) => "s32.const",
            Instr::S64Const(_) => "s64.const",
            Instr::Binary { op: BinOp::Add, .. } => "add",
            Instr::Binary { op: BinOp::Sub, .. } => "sub",
            Instr::Binary { op: BinOp::Mul, .. } => "mul",
            Instr::Binary { op: BinOp::And, .. } => "and",
            Instr::Binary { op: BinOp::Or, .. } => "or",
            Instr::Binary { op: BinOp::Xor, .. } => "xor",
            Instr::Compare { op: CmpOp::Eq, .. } => "eq",
            Instr::Compare { op: CmpOp::Ne, .. } => "ne",
            Instr::Compare { op: CmpOp::LtS, .. } => "lt_s",
            Instr::Compare { op: CmpOp::GtS, .. } => "gt_s",
            Instr::Select { .. } => "select",
            Instr::Classify { .. } => "classify",
            Instr::Declassify { .. } => "declassify",
            Instr::Load { .. } => "load",
            Instr::Store { .. } => "store",
            Instr::LocalGet(_) => "local.get",
            Instr::LocalSet(_) => "local.set",
            Instr::Drop => "drop",
            Instr::Call(_) => "call",
        }
    }
}
