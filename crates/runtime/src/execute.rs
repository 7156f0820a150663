//! Interpreter for verified function bodies
//!
//! Executes the linear body language over a value stack. Secrecy and
//! trust are static properties already enforced by the verifier and
//! linker; execution treats secret and public values uniformly, so the
//! kind checks here only guard against dynamic faults (bad addresses,
//! call depth) and internal invariant breakage.

use std::sync::Arc;

use module::{BinOp, CmpOp, Instr, NumKind};

use crate::error::Trap;
use crate::instance::InstanceInner;
use crate::value::Value;

/// Maximum interpreter call depth. Bodies have no loops, but cyclic
/// call graphs can still recurse.
pub const DEFAULT_CALL_DEPTH_BUDGET: usize = 128;

/// Execute the function at `index` of the instance's function space.
pub(crate) fn invoke(
    inner: &Arc<InstanceInner>,
    index: u32,
    args: Vec<Value>,
    depth: usize,
) -> Result<Vec<Value>, Trap> {
    if depth >= DEFAULT_CALL_DEPTH_BUDGET {
        return Err(Trap::CallStackExhausted {
            budget: DEFAULT_CALL_DEPTH_BUDGET,
        });
    }

    let num_imports = inner.func_imports.len() as u32;
    if index < num_imports {
        return inner.func_imports[index as usize].call_unchecked(args, depth + 1);
    }

    let func = inner
        .module
        .functions
        .get((index - num_imports) as usize)
        .ok_or(Trap::UnknownFunction { index })?;

    let mut locals = args;
    locals.extend(func.locals.iter().map(|ty| Value::zero(ty.kind)));

    let mut stack: Vec<Value> = Vec::new();
    for instr in &func.body {
        match *instr {
            Instr::I32Const(v) => stack.push(Value::I32(v)),
            Instr::S32Const(v) => stack.push(Value::I32(v)),
            Instr::I64Const(v) => stack.push(Value::I64(v)),
            Instr::S64Const(v) => stack.push(Value::I64(v)),

            Instr::Binary { op, kind } => {
                let rhs = pop(&mut stack)?;
                let lhs = pop(&mut stack)?;
                stack.push(binary(op, kind, lhs, rhs)?);
            }

            Instr::Compare { op, kind } => {
                let rhs = pop(&mut stack)?;
                let lhs = pop(&mut stack)?;
                stack.push(Value::I32(compare(op, kind, lhs, rhs)? as i32));
            }

            Instr::Select { .. } => {
                let cond = pop_i32(&mut stack)?;
                let on_zero = pop(&mut stack)?;
                let on_nonzero = pop(&mut stack)?;
                stack.push(if cond != 0 { on_nonzero } else { on_zero });
            }

            // Tags are static; classification does not change bits.
            Instr::Classify { .. } | Instr::Declassify { .. } => {}

            Instr::Load { kind } => {
                let addr = pop_i32(&mut stack)? as u32;
                let memory = inner.memory.as_ref().ok_or(Trap::NoMemory)?;
                stack.push(memory.load(addr, kind)?);
            }

            Instr::Store { .. } => {
                let value = pop(&mut stack)?;
                let addr = pop_i32(&mut stack)? as u32;
                let memory = inner.memory.as_ref().ok_or(Trap::NoMemory)?;
                memory.store(addr, value)?;
            }

            Instr::LocalGet(i) => {
                let value = *locals.get(i as usize).ok_or(Trap::UnknownLocal { index: i })?;
                stack.push(value);
            }

            Instr::LocalSet(i) => {
                let value = pop(&mut stack)?;
                let slot = locals
                    .get_mut(i as usize)
                    .ok_or(Trap::UnknownLocal { index: i })?;
                *slot = value;
            }

            Instr::Drop => {
                pop(&mut stack)?;
            }

            Instr::Call(callee) => {
                let ty = inner
                    .module
                    .func_type(callee)
                    .ok_or(Trap::UnknownFunction { index: callee })?;
                let arity = ty.params.len();
                if stack.len() < arity {
                    return Err(Trap::StackUnderflow);
                }
                let call_args = stack.split_off(stack.len() - arity);
                let results = invoke(inner, callee, call_args, depth + 1)?;
                stack.extend(results);
            }
        }
    }

    Ok(stack)
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, Trap> {
    stack.pop().ok_or(Trap::StackUnderflow)
}

fn pop_i32(stack: &mut Vec<Value>) -> Result<i32, Trap> {
    pop(stack)?.as_i32().ok_or(Trap::KindMismatch {
        expected: NumKind::I32,
    })
}

fn binary(op: BinOp, kind: NumKind, lhs: Value, rhs: Value) -> Result<Value, Trap> {
    match kind {
        NumKind::I32 => {
            let (a, b) = both_i32(lhs, rhs)?;
            Ok(Value::I32(match op {
                BinOp::Add => a.wrapping_add(b),
                BinOp::Sub => a.wrapping_sub(b),
                BinOp::Mul => a.wrapping_mul(b),
                BinOp::And => a & b,
                BinOp::Or => a | b,
                BinOp::Xor => a ^ b,
            }))
        }
        NumKind::I64 => {
            let (a, b) = both_i64(lhs, rhs)?;
            Ok(Value::I64(match op {
                BinOp::Add => a.wrapping_add(b),
                BinOp::Sub => a.wrapping_sub(b),
                BinOp::Mul => a.wrapping_mul(b),
                BinOp::And => a & b,
                BinOp::Or => a | b,
                BinOp::Xor => a ^ b,
            }))
        }
    }
}

fn compare(op: CmpOp, kind: NumKind, lhs: Value, rhs: Value) -> Result<bool, Trap> {
    match kind {
        NumKind::I32 => {
            let (a, b) = both_i32(lhs, rhs)?;
            Ok(apply_cmp(op, a, b))
        }
        NumKind::I64 => {
            let (a, b) = both_i64(lhs, rhs)?;
            Ok(apply_cmp(op, a, b))
        }
    }
}

fn apply_cmp<T: Ord>(op: CmpOp, a: T, b: T) -> bool {
    match op {
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        CmpOp::LtS => a < b,
        CmpOp::GtS => a > b,
    }
}

fn both_i32(lhs: Value, rhs: Value) -> Result<(i32, i32), Trap> {
    match (lhs.as_i32(), rhs.as_i32()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Trap::KindMismatch {
            expected: NumKind::I32,
        }),
    }
}

fn both_i64(lhs: Value, rhs: Value) -> Result<(i64, i64), Trap> {
    match (lhs.as_i64(), rhs.as_i64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Trap::KindMismatch {
            expected: NumKind::I64,
        }),
    }
}
