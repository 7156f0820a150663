// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module contract extraction
//!
//! Derives the externally visible contract of a parsed module: the
//! ordered import expectations and the name-keyed export offerings,
//! each carrying its full security/trust type. Extraction reads
//! declarations only, never function bodies, and is the one place
//! structural consistency of the import/export tables is checked.

use std::collections::BTreeMap;

use crate::error::ContractError;
use crate::module::{ExportKind, Module};
use crate::types::ExternType;

/// One declared import expectation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    pub module: String,
    pub name: String,
    pub ty: ExternType,
}

/// The fixed, externally visible contract of a module: what it demands
/// from providers and what it offers by name. Read-only once derived.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleContract {
    /// Import expectations in declaration order.
    pub imports: Vec<ImportSpec>,
    /// Export offerings, keyed by unique name.
    pub exports: BTreeMap<String, ExternType>,
}

/// Derive the [`ModuleContract`] of a parsed module.
///
/// Fails with [`ContractError`] on structural inconsistencies:
/// duplicate export names, exports referencing out-of-range indices,
/// more than one memory, or inverted size bounds.
pub fn extract_contract(module: &Module) -> Result<ModuleContract, ContractError> {
    let memory_count = module.imported_memories().count() + usize::from(module.memory.is_some());
    if memory_count > 1 {
        return Err(ContractError::MultipleMemories {
            count: memory_count,
        });
    }

    for mem in module.imported_memories().chain(module.memory.as_ref()) {
        if !mem.limits.is_valid() {
            return Err(ContractError::InvalidLimits {
                initial: mem.limits.initial,
                // is_valid only fails when a maximum is declared
                max: mem.limits.max.unwrap_or(mem.limits.initial),
            });
        }
    }

    let imports = module
        .imports
        .iter()
        .map(|import| ImportSpec {
            module: import.module.clone(),
            name: import.name.clone(),
            ty: import.ty.clone(),
        })
        .collect();

    let mut exports = BTreeMap::new();
    for export in &module.exports {
        let ty = match export.kind {
            ExportKind::Func(index) => {
                let ty = module
                    .func_type(index)
                    .ok_or(ContractError::UnknownFunction {
                        name: export.name.clone(),
                        index,
                    })?;
                ExternType::Func(ty.clone())
            }
            ExportKind::Memory(index) => {
                let ty = (index == 0)
                    .then(|| module.memory_type())
                    .flatten()
                    .ok_or(ContractError::UnknownMemory {
                        name: export.name.clone(),
                        index,
                    })?;
                ExternType::Memory(*ty)
            }
        };

        if exports.insert(export.name.clone(), ty).is_some() {
            return Err(ContractError::DuplicateExport {
                name: export.name.clone(),
            });
        }
    }

    Ok(ModuleContract { imports, exports })
}
