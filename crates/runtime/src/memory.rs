//! Linear memory instances
//!
//! A [`Memory`] pairs its declared [`MemoryType`] (size bounds plus
//! the secrecy tag fixed at creation) with the backing bytes. Shared
//! via `Arc` between the owning instance, importers bound to it, and
//! the host; the data sits behind an `RwLock` so host inspection and
//! executing code never race.

use std::sync::{PoisonError, RwLock};

use module::{MemoryType, NumKind, SecurityTag};

use crate::error::Trap;
use crate::value::Value;

/// Size of one memory page in bytes.
pub const PAGE_SIZE: u32 = 65536;

/// A linear memory with a fixed security tag.
#[derive(Debug)]
pub struct Memory {
    ty: MemoryType,
    data: RwLock<Vec<u8>>,
}

impl Memory {
    /// Allocate a memory of the declared type, zero-filled to its
    /// initial size. Host descriptors built with [`MemoryType::new`]
    /// are public unless [`MemoryType::secret`] was applied.
    pub fn new(ty: MemoryType) -> Self {
        let bytes = ty.limits.initial as usize * PAGE_SIZE as usize;
        Self {
            ty,
            data: RwLock::new(vec![0; bytes]),
        }
    }

    pub fn ty(&self) -> MemoryType {
        self.ty
    }

    pub fn security(&self) -> SecurityTag {
        self.ty.sec
    }

    /// Current size in bytes.
    pub fn size(&self) -> usize {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Host accessor: read a little-endian `u32` at `addr`.
    pub fn read_u32(&self, addr: u32) -> Result<u32, Trap> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let bytes = Self::slice(&data, addr, 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    /// Host accessor: write a little-endian `u32` at `addr`.
    pub fn write_u32(&self, addr: u32, value: u32) -> Result<(), Trap> {
        self.store(addr, Value::I32(value as i32))
    }

    pub(crate) fn load(&self, addr: u32, kind: NumKind) -> Result<Value, Trap> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let bytes = Self::slice(&data, addr, kind.byte_width())?;
        Ok(match kind {
            NumKind::I32 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Value::I32(i32::from_le_bytes(buf))
            }
            NumKind::I64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Value::I64(i64::from_le_bytes(buf))
            }
        })
    }

    pub(crate) fn store(&self, addr: u32, value: Value) -> Result<(), Trap> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let len = value.kind().byte_width();
        let offset = Self::checked_range(data.len(), addr, len)?;
        match value {
            Value::I32(v) => data[offset..offset + 4].copy_from_slice(&v.to_le_bytes()),
            Value::I64(v) => data[offset..offset + 8].copy_from_slice(&v.to_le_bytes()),
        }
        Ok(())
    }

    fn slice(data: &[u8], addr: u32, len: u32) -> Result<&[u8], Trap> {
        let offset = Self::checked_range(data.len(), addr, len)?;
        Ok(&data[offset..offset + len as usize])
    }

    fn checked_range(size: usize, addr: u32, len: u32) -> Result<usize, Trap> {
        let end = addr as u64 + len as u64;
        if end > size as u64 {
            return Err(Trap::MemoryOutOfBounds { addr, len });
        }
        Ok(addr as usize)
    }
}
