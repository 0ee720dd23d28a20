//! Element types and shapes
//!
//! The container stores the type tag and extents of every record so that
//! readers can validate a record before touching its payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Element type tag of a record or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// IEEE-754 binary64, little-endian
    F64Le,
    /// IEEE-754 binary64, big-endian
    F64Be,
    /// IEEE-754 binary32, little-endian
    F32Le,
    /// Two's-complement 32-bit integer, little-endian
    I32Le,
    /// Two's-complement 64-bit integer, little-endian
    I64Le,
    /// Unsigned byte
    U8,
    /// Fixed-length byte string (UTF-8), no terminator stored
    FixedString { len: u32 },
}

impl DataType {
    /// Size in bytes of a single element
    pub fn element_size(&self) -> usize {
        match self {
            DataType::F64Le | DataType::F64Be | DataType::I64Le => 8,
            DataType::F32Le | DataType::I32Le => 4,
            DataType::U8 => 1,
            DataType::FixedString { len } => *len as usize,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::F64Le => f.write_str("f64le"),
            DataType::F64Be => f.write_str("f64be"),
            DataType::F32Le => f.write_str("f32le"),
            DataType::I32Le => f.write_str("i32le"),
            DataType::I64Le => f.write_str("i64le"),
            DataType::U8 => f.write_str("u8"),
            DataType::FixedString { len } => write!(f, "str[{}]", len),
        }
    }
}

/// Extents of a record, one per dimension
///
/// Rank 0 is a scalar holding exactly one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(Vec<u64>);

impl Shape {
    pub fn new(dims: impl Into<Vec<u64>>) -> Self {
        Self(dims.into())
    }

    /// One-dimensional shape with `len` elements
    pub fn linear(len: usize) -> Self {
        Self(vec![len as u64])
    }

    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[u64] {
        &self.0
    }

    /// Total number of elements, failing on overflow
    pub fn element_count(&self) -> Result<usize, BackendError> {
        self.0
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                BackendError::Dataspace(format!("element count of shape {:?} overflows", self.0))
            })
    }

    /// Number of payload bytes for elements of `dtype`
    pub fn byte_len(&self, dtype: DataType) -> Result<usize, BackendError> {
        self.element_count()?
            .checked_mul(dtype.element_size())
            .ok_or_else(|| {
                BackendError::Dataspace(format!(
                    "byte size of shape {:?} with type {} overflows",
                    self.0, dtype
                ))
            })
    }
}
