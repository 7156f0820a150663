//! Runtime values
//!
//! Values carry their numeric kind only. Secrecy is a static property
//! enforced by the verifier and linker; at the host boundary tags are
//! erased, exactly as the base embedding passes plain numbers in and
//! out.

use std::fmt;

use module::NumKind;

/// A runtime value of the format's numeric kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    I32(i32),
    I64(i64),
}

impl Value {
    pub fn kind(&self) -> NumKind {
        match self {
            Value::I32(_) => NumKind::I32,
            Value::I64(_) => NumKind::I64,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            Value::I64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::I32(_) => None,
        }
    }

    /// The zero value of a kind, used to initialize declared locals.
    pub(crate) fn zero(kind: NumKind) -> Value {
        match kind {
            NumKind::I32 => Value::I32(0),
            NumKind::I64 => Value::I64(0),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{v}: i32"),
            Value::I64(v) => write!(f, "{v}: i64"),
        }
    }
}
