// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Link compatibility checking
//!
//! Matches each declared import of a module against the provider the
//! host supplied, using the exact-match predicates of the type model:
//! no secrecy covariance, no trust covariance, no signature widening.
//! Each import advances `Unresolved → Checking → Bound`; the first
//! rejection aborts the whole link, and no binding from a partially
//! checked link is ever observable (instantiation is all-or-nothing).

use std::collections::HashMap;
use std::sync::Arc;

use module::{ExternType, FuncType, ImportSpec, ModuleContract, TrustTag};
use tracing::{debug, trace};

use crate::error::LinkError;
use crate::func::Func;
use crate::instance::{Extern, Instance};
use crate::memory::Memory;

/// Provider registry: two-level import name → supplied value.
#[derive(Default)]
pub struct Imports {
    map: HashMap<(String, String), Extern>,
}

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply a provider for `module`.`name`. Later definitions under
    /// the same name replace earlier ones.
    pub fn define(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        provider: Extern,
    ) -> &mut Self {
        self.map.insert((module.into(), name.into()), provider);
        self
    }

    /// Register every export of an instance under `namespace`, letting
    /// the instance serve as a provider for further links.
    pub fn define_instance(&mut self, namespace: &str, instance: &Instance) -> &mut Self {
        for (name, provider) in instance.exports() {
            self.define(namespace, name, provider);
        }
        self
    }

    fn resolve(&self, module: &str, name: &str) -> Option<&Extern> {
        self.map.get(&(module.to_string(), name.to_string()))
    }
}

/// The bound providers of a successful link, in import-space order.
pub(crate) struct Bindings {
    pub(crate) funcs: Vec<Func>,
    pub(crate) memory: Option<Arc<Memory>>,
}

/// Check every import of `contract` against `imports`.
///
/// Returns the bindings only if every import is compatible; otherwise
/// the error names the first offending import and nothing is bound.
pub(crate) fn link(contract: &ModuleContract, imports: &Imports) -> Result<Bindings, LinkError> {
    let mut bindings = Bindings {
        funcs: Vec::new(),
        memory: None,
    };

    for spec in &contract.imports {
        trace!(module = %spec.module, name = %spec.name, "checking import");
        let provider = imports
            .resolve(&spec.module, &spec.name)
            .ok_or_else(|| LinkError::UnknownImport {
                module: spec.module.clone(),
                name: spec.name.clone(),
            })?;

        match (&spec.ty, provider) {
            (ExternType::Func(expected), Extern::Func(func)) => {
                // Trust can only be established by verified code; an
                // opaque host callback never satisfies a trusted
                // import, whatever its signature claims.
                if expected.trust == TrustTag::Trusted && func.is_host() {
                    return Err(incompatible(
                        spec,
                        "a host function cannot satisfy a trusted import".to_string(),
                    ));
                }
                if !FuncType::compatible(expected, func.ty()) {
                    return Err(incompatible(
                        spec,
                        format!("expected {expected}, provider offers {}", func.ty()),
                    ));
                }
                bindings.funcs.push(func.clone());
            }

            (ExternType::Memory(expected), Extern::Memory(memory)) => {
                let actual = memory.ty();
                if expected.sec != actual.sec {
                    return Err(incompatible(
                        spec,
                        format!("expected {expected}, provider offers {actual}"),
                    ));
                }
                if !expected.limits.admits(&actual.limits) {
                    return Err(incompatible(
                        spec,
                        format!(
                            "provider bounds {} do not satisfy {}",
                            actual.limits, expected.limits
                        ),
                    ));
                }
                bindings.memory = Some(Arc::clone(memory));
            }

            (expected, provided) => {
                return Err(incompatible(
                    spec,
                    format!(
                        "expected a {}, provider offers a {}",
                        expected.kind_name(),
                        provided.kind_name()
                    ),
                ));
            }
        }
        trace!(module = %spec.module, name = %spec.name, "bound");
    }

    debug!(imports = contract.imports.len(), "all imports bound");
    Ok(bindings)
}

fn incompatible(spec: &ImportSpec, reason: String) -> LinkError {
    LinkError::Incompatible {
        module: spec.module.clone(),
        name: spec.name.clone(),
        reason,
    }
}
