//! Error types for the module crate

use thiserror::Error;

/// Structural inconsistencies in a module's declared import/export
/// tables. Reported before verification begins; a module with a
/// malformed contract is never verified or linked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("duplicate export name `{name}`")]
    DuplicateExport { name: String },

    #[error("export `{name}` references unknown function index {index}")]
    UnknownFunction { name: String, index: u32 },

    #[error("export `{name}` references unknown memory index {index}")]
    UnknownMemory { name: String, index: u32 },

    #[error("module declares {count} memories, the format allows at most one")]
    MultipleMemories { count: usize },

    #[error("memory initial size {initial} pages exceeds declared maximum {max}")]
    InvalidLimits { initial: u32, max: u32 },
}
