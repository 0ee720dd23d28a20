//! Records and attributes
//!
//! Writing goes through a [`RecordBuilder`], which stages the payload and
//! attributes in memory and appends one frame on [`RecordBuilder::commit`].
//! Reading returns an owned [`Record`] fetched from disk.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

use super::file::ContainerFile;
use super::frame::{self, RecordDescriptor};
use super::{DataType, Shape};

// =============================================================================
// Attribute
// =============================================================================

/// A small named value attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    dtype: DataType,
    shape: Shape,
    data: Vec<u8>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// String value, if this is a fixed-length string attribute
    pub fn as_str(&self) -> Option<&str> {
        match self.dtype {
            DataType::FixedString { .. } => std::str::from_utf8(&self.data).ok(),
            _ => None,
        }
    }
}

/// Checks that `bytes` exactly fills `shape` elements of `dtype`
fn check_extent(what: &str, dtype: DataType, shape: &Shape, bytes: usize) -> Result<(), BackendError> {
    let expected = shape.byte_len(dtype)?;
    if bytes != expected {
        return Err(BackendError::Dataspace(format!(
            "{} expects {} bytes ({} x {}), got {}",
            what,
            expected,
            shape.element_count()?,
            dtype,
            bytes
        )));
    }
    Ok(())
}

// =============================================================================
// RecordBuilder
// =============================================================================

/// A record being created; nothing reaches the file until `commit`
pub struct RecordBuilder<'a> {
    file: &'a mut ContainerFile,
    descriptor: RecordDescriptor,
    payload: Option<Vec<u8>>,
}

impl<'a> RecordBuilder<'a> {
    pub(super) fn new(file: &'a mut ContainerFile, name: &str, dtype: DataType, shape: Shape) -> Self {
        Self {
            file,
            descriptor: RecordDescriptor {
                name: name.to_string(),
                dtype,
                shape,
                attributes: Vec::new(),
            },
            payload: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Stage raw payload bytes, already in the record's element type
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BackendError> {
        check_extent(
            &format!("record '{}'", self.descriptor.name),
            self.descriptor.dtype,
            &self.descriptor.shape,
            bytes.len(),
        )?;
        self.payload = Some(bytes.to_vec());
        Ok(())
    }

    /// Stage f64 values; the record must be of type `F64Le`
    pub fn write_f64(&mut self, values: &[f64]) -> Result<(), BackendError> {
        if self.descriptor.dtype != DataType::F64Le {
            return Err(BackendError::Datatype(format!(
                "cannot write f64 values into record '{}' of type {}",
                self.descriptor.name, self.descriptor.dtype
            )));
        }

        let mut buf = BytesMut::with_capacity(values.len() * 8);
        for &v in values {
            buf.put_f64_le(v);
        }
        self.write(&buf)
    }

    /// Create an attribute on this record
    pub fn create_attribute(
        &mut self,
        name: &str,
        dtype: DataType,
        shape: Shape,
    ) -> Result<AttributeWriter<'_>, BackendError> {
        if self.descriptor.attributes.iter().any(|a| a.name == name) {
            return Err(BackendError::Dataset(format!(
                "attribute '{}' already exists on record '{}'",
                name, self.descriptor.name
            )));
        }
        shape.byte_len(dtype)?;

        Ok(AttributeWriter {
            attributes: &mut self.descriptor.attributes,
            name: name.to_string(),
            dtype,
            shape,
        })
    }

    /// Append the record to the container
    ///
    /// Returns the file offset of the new frame.
    pub fn commit(self) -> Result<u64, BackendError> {
        let payload = match self.payload {
            Some(p) => p,
            None if self.descriptor.shape.element_count()? == 0 => Vec::new(),
            None => {
                return Err(BackendError::Dataset(format!(
                    "record '{}' committed without data",
                    self.descriptor.name
                )))
            }
        };

        let frame = frame::encode(&self.descriptor, &payload)?;
        self.file.append_frame(&self.descriptor.name, &frame)
    }
}

/// Handle for writing a single attribute value
pub struct AttributeWriter<'b> {
    attributes: &'b mut Vec<Attribute>,
    name: String,
    dtype: DataType,
    shape: Shape,
}

impl AttributeWriter<'_> {
    /// Write the attribute value, attaching it to the record
    pub fn write(self, bytes: &[u8]) -> Result<(), BackendError> {
        check_extent(
            &format!("attribute '{}'", self.name),
            self.dtype,
            &self.shape,
            bytes.len(),
        )?;
        self.attributes.push(Attribute {
            name: self.name,
            dtype: self.dtype,
            shape: self.shape,
            data: bytes.to_vec(),
        });
        Ok(())
    }
}

// =============================================================================
// Record
// =============================================================================

/// A record read back from a container
#[derive(Debug, Clone)]
pub struct Record {
    header: RecordHeader,
    payload: Bytes,
}

impl Record {
    pub(super) fn new(descriptor: RecordDescriptor, payload: Bytes) -> Self {
        Self {
            header: RecordHeader::new(descriptor),
            payload,
        }
    }

    /// Metadata without the payload
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn data_type(&self) -> DataType {
        self.header.data_type()
    }

    pub fn shape(&self) -> &Shape {
        self.header.shape()
    }

    /// Raw payload bytes
    pub fn raw(&self) -> &[u8] {
        &self.payload
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.header.attribute(name)
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.header.attributes()
    }

    /// Decode the payload as f64 values; the record must be of type `F64Le`
    pub fn read_f64(&self) -> Result<Vec<f64>, BackendError> {
        let descriptor = &self.header.descriptor;
        if descriptor.dtype != DataType::F64Le {
            return Err(BackendError::Datatype(format!(
                "cannot read record '{}' of type {} as f64",
                descriptor.name, descriptor.dtype
            )));
        }
        check_extent(
            &format!("record '{}'", descriptor.name),
            descriptor.dtype,
            &descriptor.shape,
            self.payload.len(),
        )?;

        let count = descriptor.shape.element_count()?;
        let mut values = Vec::with_capacity(count);
        let mut buf = self.payload.clone();
        while buf.has_remaining() {
            values.push(buf.get_f64_le());
        }
        Ok(values)
    }
}

/// Name, type, extents and attributes of a stored record
#[derive(Debug, Clone)]
pub struct RecordHeader {
    descriptor: RecordDescriptor,
}

impl RecordHeader {
    pub(super) fn new(descriptor: RecordDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn data_type(&self) -> DataType {
        self.descriptor.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.descriptor.shape
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.descriptor.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.descriptor.attributes
    }
}
