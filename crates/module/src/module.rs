//! Parsed-module structure
//!
//! [`Module`] is the in-memory form a host's byte-format parser hands
//! to this subsystem; [`ModuleBuilder`] is the construction surface.
//! Function and memory index spaces put imports before local
//! definitions, matching the base format.

use crate::instr::Instr;
use crate::types::{ExternType, FuncType, MemoryType, ValueType};

/// A locally defined function: declared signature, extra locals, body.
#[derive(Clone, Debug)]
pub struct Function {
    pub ty: FuncType,
    /// Declared locals, appended after the parameters in the local
    /// index space. Zero-initialized at call entry.
    pub locals: Vec<ValueType>,
    pub body: Vec<Instr>,
}

/// A declared import: two-level name plus the expected contract.
#[derive(Clone, Debug)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub ty: ExternType,
}

/// What an export refers to, by index into the respective space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// Index into the imports-then-locals function space.
    Func(u32),
    /// Index into the memory space (at most one memory exists).
    Memory(u32),
}

/// A named export.
#[derive(Clone, Debug)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
}

/// A parsed module, fixed once built. Read-only afterwards; safe to
/// share across concurrent verifications.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub imports: Vec<Import>,
    pub functions: Vec<Function>,
    /// Locally defined memory, if any. Combined with an imported
    /// memory the format allows at most one in total.
    pub memory: Option<MemoryType>,
    pub exports: Vec<Export>,
}

impl Module {
    /// Declared types of imported functions, in import order.
    pub fn imported_funcs(&self) -> impl Iterator<Item = &FuncType> {
        self.imports.iter().filter_map(|import| match &import.ty {
            ExternType::Func(ty) => Some(ty),
            ExternType::Memory(_) => None,
        })
    }

    /// Declared types of imported memories, in import order.
    pub fn imported_memories(&self) -> impl Iterator<Item = &MemoryType> {
        self.imports.iter().filter_map(|import| match &import.ty {
            ExternType::Memory(ty) => Some(ty),
            ExternType::Func(_) => None,
        })
    }

    /// Number of imported functions (the offset of the first local
    /// function in the function index space).
    pub fn num_imported_funcs(&self) -> u32 {
        self.imported_funcs().count() as u32
    }

    /// Total size of the function index space.
    pub fn num_funcs(&self) -> u32 {
        self.num_imported_funcs() + self.functions.len() as u32
    }

    /// Resolve a function index across the imports-then-locals space.
    pub fn func_type(&self, index: u32) -> Option<&FuncType> {
        let num_imported = self.num_imported_funcs();
        if index < num_imported {
            self.imported_funcs().nth(index as usize)
        } else {
            self.functions
                .get((index - num_imported) as usize)
                .map(|f| &f.ty)
        }
    }

    /// The declared type of memory 0: the imported declaration if one
    /// exists, otherwise the local definition.
    pub fn memory_type(&self) -> Option<&MemoryType> {
        self.imported_memories().next().or(self.memory.as_ref())
    }
}

/// Fluent builder for [`Module`].
///
/// Index spaces follow declaration order, imports first: the first
/// `func` added after two function imports has index 2.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function import with the expected signature.
    pub fn import_func(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        ty: FuncType,
    ) -> Self {
        self.module.imports.push(Import {
            module: module.into(),
            name: name.into(),
            ty: ExternType::Func(ty),
        });
        self
    }

    /// Declare a memory import with the expected descriptor.
    pub fn import_memory(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        ty: MemoryType,
    ) -> Self {
        self.module.imports.push(Import {
            module: module.into(),
            name: name.into(),
            ty: ExternType::Memory(ty),
        });
        self
    }

    /// Define the local memory.
    pub fn memory(mut self, ty: MemoryType) -> Self {
        self.module.memory = Some(ty);
        self
    }

    /// Define a local function.
    pub fn func(mut self, ty: FuncType, locals: Vec<ValueType>, body: Vec<Instr>) -> Self {
        self.module.functions.push(Function { ty, locals, body });
        self
    }

    /// Export the function at `index` under `name`.
    pub fn export_func(mut self, name: impl Into<String>, index: u32) -> Self {
        self.module.exports.push(Export {
            name: name.into(),
            kind: ExportKind::Func(index),
        });
        self
    }

    /// Export memory 0 under `name`.
    pub fn export_memory(mut self, name: impl Into<String>) -> Self {
        self.module.exports.push(Export {
            name: name.into(),
            kind: ExportKind::Memory(0),
        });
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}
