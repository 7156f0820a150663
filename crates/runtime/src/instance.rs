// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module instances
//!
//! [`instantiate`] is the single entry point of the pipeline: contract
//! extraction, body verification, link compatibility checking, then
//! instance construction, in that order, atomically. No instance (and
//! no binding of any already-checked import) becomes observable unless
//! every step succeeds.

use std::sync::Arc;

use module::{ExportKind, ExternType, Module, ModuleContract, extract_contract};
use tracing::debug;
use verifier::verify_module;

use crate::error::{InstantiateError, Trap};
use crate::func::Func;
use crate::link::{Imports, link};
use crate::memory::Memory;
use crate::value::Value;

/// A provider value: what an instance exports and what hosts supply
/// for imports.
#[derive(Clone, Debug)]
pub enum Extern {
    Func(Func),
    Memory(Arc<Memory>),
}

impl Extern {
    /// The full security/trust contract of this value.
    pub fn ty(&self) -> ExternType {
        match self {
            Extern::Func(func) => ExternType::Func(func.ty().clone()),
            Extern::Memory(memory) => ExternType::Memory(memory.ty()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Extern::Func(_) => "function",
            Extern::Memory(_) => "memory",
        }
    }
}

/// Shared state of a live instance. Bindings reference their providers
/// through `Arc`s, so a provider instance outlives every importer bound
/// to it.
#[derive(Debug)]
pub(crate) struct InstanceInner {
    pub(crate) module: Module,
    pub(crate) contract: ModuleContract,
    /// Bound function providers, indexed as the import half of the
    /// function index space.
    pub(crate) func_imports: Vec<Func>,
    /// Memory 0: the bound import, or the locally defined memory.
    pub(crate) memory: Option<Arc<Memory>>,
}

/// A verified, fully linked module instance.
///
/// Exposes only its declared exports, each carrying its complete
/// contract, so an instance can itself serve as a provider for further
/// links. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    /// Look up an export by name.
    pub fn get_export(&self, name: &str) -> Option<Extern> {
        let export = self.inner.module.exports.iter().find(|e| e.name == name)?;
        match export.kind {
            ExportKind::Func(index) => self.func_by_index(index).map(Extern::Func),
            ExportKind::Memory(_) => self.inner.memory.clone().map(Extern::Memory),
        }
    }

    /// Look up an exported function by name.
    pub fn get_func(&self, name: &str) -> Option<Func> {
        match self.get_export(name)? {
            Extern::Func(func) => Some(func),
            Extern::Memory(_) => None,
        }
    }

    /// Look up the exported memory by name.
    pub fn get_memory(&self, name: &str) -> Option<Arc<Memory>> {
        match self.get_export(name)? {
            Extern::Memory(memory) => Some(memory),
            Extern::Func(_) => None,
        }
    }

    /// All exports with their resolved provider values, in contract
    /// order.
    pub fn exports(&self) -> Vec<(String, Extern)> {
        self.inner
            .module
            .exports
            .iter()
            .filter_map(|e| self.get_export(&e.name).map(|ext| (e.name.clone(), ext)))
            .collect()
    }

    /// The export half of this instance's contract.
    pub fn export_types(&self) -> impl Iterator<Item = (&str, &ExternType)> {
        self.inner
            .contract
            .exports
            .iter()
            .map(|(name, ty)| (name.as_str(), ty))
    }

    /// Call an exported function by name.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, Trap> {
        let func = self.get_func(name).ok_or_else(|| Trap::UnknownExport {
            name: name.to_string(),
        })?;
        func.call(args)
    }

    fn func_by_index(&self, index: u32) -> Option<Func> {
        let num_imports = self.inner.func_imports.len() as u32;
        if index < num_imports {
            // Re-exported import: hand out the bound provider directly.
            return Some(self.inner.func_imports[index as usize].clone());
        }
        let ty = self.inner.module.func_type(index)?.clone();
        Some(Func::from_instance(Arc::clone(&self.inner), index, ty))
    }
}

/// Verify and link `module` against the supplied providers.
///
/// The synchronous core of instantiation: derive the contract, verify
/// every function body, check every import binding, then construct the
/// instance. Fails closed at the first problem with no partial
/// instance and no observable effect on any provider.
pub fn instantiate(module: &Module, imports: &Imports) -> Result<Instance, InstantiateError> {
    let contract = extract_contract(module)?;
    verify_module(module)?;
    let bindings = link(&contract, imports)?;

    let memory = match bindings.memory {
        Some(bound) => Some(bound),
        None => module.memory.map(|ty| Arc::new(Memory::new(ty))),
    };

    debug!(
        imports = contract.imports.len(),
        exports = contract.exports.len(),
        "module instantiated"
    );

    Ok(Instance {
        inner: Arc::new(InstanceInner {
            module: module.clone(),
            contract,
            func_imports: bindings.funcs,
            memory,
        }),
    })
}
