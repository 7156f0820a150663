// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Static verification of function bodies
//!
//! A single forward pass per function over an abstract operand stack of
//! [`ValueType`]s. Secrecy propagates through tag-polymorphic
//! operations via the join; any flow of a secret into a public sink,
//! any trust-restricted operation in an untrusted context, and any
//! stack shape inconsistency is rejected before the module can link.
//! The first violation aborts verification.

use module::{FuncType, Function, Instr, MemoryType, Module, NumKind, ValueType};
use tracing::{debug, trace};

use crate::error::{VerificationError, Violation};
use crate::stack::OperandStack;
use crate::trust;

/// Verifier for the function bodies of one module.
///
/// Borrows the module read-only; the same module may be verified from
/// several threads concurrently.
pub struct Verifier<'a> {
    module: &'a Module,
    /// Full function index space, imports first.
    func_types: Vec<&'a FuncType>,
    /// Declared type of memory 0, if any (imported or local).
    memory: Option<&'a MemoryType>,
}

impl<'a> Verifier<'a> {
    pub fn new(module: &'a Module) -> Self {
        let func_types = module
            .imported_funcs()
            .chain(module.functions.iter().map(|f| &f.ty))
            .collect();
        Self {
            module,
            func_types,
            memory: module.memory_type(),
        }
    }

    /// Verify every local function body. Fails on the first violation,
    /// reporting the offending function index and instruction offset.
    pub fn verify(&self) -> Result<(), VerificationError> {
        let offset = self.module.num_imported_funcs();
        for (i, func) in self.module.functions.iter().enumerate() {
            let index = offset + i as u32;
            trace!(function = index, "verifying function body");
            self.verify_function(index, func)?;
        }
        debug!(
            functions = self.module.functions.len(),
            "module verification passed"
        );
        Ok(())
    }

    fn verify_function(&self, index: u32, func: &Function) -> Result<(), VerificationError> {
        let mut locals: Vec<ValueType> = func.ty.params.clone();
        locals.extend_from_slice(&func.locals);

        let mut stack = OperandStack::new();
        for (pc, instr) in func.body.iter().enumerate() {
            self.step(&func.ty, &locals, &mut stack, instr)
                .map_err(|violation| VerificationError {
                    func: index,
                    pc,
                    violation,
                })?;
        }

        self.finish(&func.ty, &mut stack)
            .map_err(|violation| VerificationError {
                func: index,
                pc: func.body.len(),
                violation,
            })
    }

    /// Abstractly execute one instruction.
    fn step(
        &self,
        func: &FuncType,
        locals: &[ValueType],
        stack: &mut OperandStack,
        instr: &Instr,
    ) -> Result<(), Violation> {
        match *instr {
            Instr::I32Const(_) => stack.push(ValueType::I32),
            Instr::I64Const(_) => stack.push(ValueType::I64),
            Instr::S32Const(_) => stack.push(ValueType::S32),
            Instr::S64Const(_) => stack.push(ValueType::S64),

            Instr::Binary { kind, .. } => {
                let rhs = stack.pop_kind(kind, instr.name())?;
                let lhs = stack.pop_kind(kind, instr.name())?;
                stack.push(ValueType::new(kind, lhs.sec.join(rhs.sec)));
            }

            Instr::Compare { kind, .. } => {
                let rhs = stack.pop_kind(kind, instr.name())?;
                let lhs = stack.pop_kind(kind, instr.name())?;
                stack.push(ValueType::new(NumKind::I32, lhs.sec.join(rhs.sec)));
            }

            Instr::Select { ty } => {
                let cond = stack.pop_kind(NumKind::I32, "select condition")?;
                // Observing which arm was chosen reveals the condition,
                // so the declared result must absorb its secrecy.
                if cond.sec.is_secret() && !ty.sec.is_secret() {
                    return Err(Violation::leak("select result"));
                }
                stack.pop_into(ty, "select arm")?;
                stack.pop_into(ty, "select arm")?;
                stack.push(ty);
            }

            Instr::Classify { kind } => {
                stack.pop_kind(kind, "classify operand")?;
                stack.push(ValueType::new(kind, module::SecurityTag::Secret));
            }

            Instr::Declassify { kind } => {
                if !trust::declassify_allowed(func.trust) {
                    return Err(Violation::trust(
                        "declassify is only permitted in trusted functions",
                    ));
                }
                stack.pop_kind(kind, "declassify operand")?;
                stack.push(ValueType::new(kind, module::SecurityTag::Public));
            }

            Instr::Load { kind } => {
                let mem = self.memory_or_mismatch()?;
                stack.pop_into(ValueType::I32, "memory address")?;
                stack.push(ValueType::new(kind, mem.sec));
            }

            Instr::Store { kind } => {
                let mem = self.memory_or_mismatch()?;
                stack.pop_into(ValueType::new(kind, mem.sec), "memory store")?;
                stack.pop_into(ValueType::I32, "memory address")?;
            }

            Instr::LocalGet(i) => {
                let ty = locals
                    .get(i as usize)
                    .ok_or_else(|| Violation::type_mismatch("known local index", i))?;
                stack.push(*ty);
            }

            Instr::LocalSet(i) => {
                let ty = *locals
                    .get(i as usize)
                    .ok_or_else(|| Violation::type_mismatch("known local index", i))?;
                stack.pop_into(ty, &format!("local {i}"))?;
            }

            Instr::Drop => {
                stack.pop("drop")?;
            }

            Instr::Call(index) => {
                let callee = *self
                    .func_types
                    .get(index as usize)
                    .ok_or_else(|| Violation::type_mismatch("known function index", index))?;
                if !trust::call_allowed(func.trust, callee.trust) {
                    return Err(Violation::trust(format!(
                        "untrusted function calls trusted function {index}"
                    )));
                }
                for (i, param) in callee.params.iter().enumerate().rev() {
                    stack.pop_into(*param, &format!("argument {i} of call {index}"))?;
                }
                for result in &callee.results {
                    stack.push(*result);
                }
            }
        }
        Ok(())
    }

    /// Check the end-of-body stack against the declared results: exact
    /// arity, subsumption per value.
    fn finish(&self, func: &FuncType, stack: &mut OperandStack) -> Result<(), Violation> {
        for (i, result) in func.results.iter().enumerate().rev() {
            stack.pop_into(*result, &format!("function result {i}"))?;
        }
        if !stack.is_empty() {
            return Err(Violation::stack(format!(
                "{} extra values remain on the stack at end of body",
                stack.len()
            )));
        }
        Ok(())
    }

    fn memory_or_mismatch(&self) -> Result<&MemoryType, Violation> {
        self.memory
            .ok_or_else(|| Violation::type_mismatch("a declared memory", "module with no memory"))
    }
}

/// Verify every function of `module` against the security type model.
pub fn verify_module(module: &Module) -> Result<(), VerificationError> {
    Verifier::new(module).verify()
}
