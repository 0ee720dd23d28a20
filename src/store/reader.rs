//! Dataset Reader
//!
//! Locates a record by name and validates it before decoding:
//! 1. the record must exist
//! 2. its element type must be f64 little-endian (no conversion)
//! 3. its rank must be exactly 1 (no reshaping)
//!
//! Only then is an output buffer of the stored extent allocated and filled.
//! Every failure is an `Err`; an `Ok` with no values is an empty dataset.
//!
//! [`Store::describe`] stops after step 1 and never loads the payload.

use crate::container::{Attribute, DataType, Record};
use crate::error::{Result, StoreError};

use super::{report, Dataset, DatasetInfo, Mode, Store, UNITS_ATTR};

impl Store {
    /// Read the values of dataset `name`
    pub fn read(&mut self, name: &str) -> Result<Vec<f64>> {
        let record = self.validated_record(name)?;
        decode_values(&record)
    }

    /// Read dataset `name` together with its unit
    pub fn read_dataset(&mut self, name: &str) -> Result<Dataset> {
        let record = self.validated_record(name)?;
        let values = decode_values(&record)?;

        Ok(Dataset {
            name: name.to_string(),
            unit: unit_of(name, record.attribute(UNITS_ATTR)),
            values,
        })
    }

    /// Metadata of dataset `name` without reading its values
    ///
    /// Applies no type or rank check, so records this crate did not write
    /// can be described too.
    pub fn describe(&mut self, name: &str) -> Result<DatasetInfo> {
        self.require_mode(Mode::Read, "describe")?;

        let header = self
            .container
            .describe_record(name)
            .map_err(|source| {
                report(StoreError::Read {
                    name: name.to_string(),
                    source,
                })
            })?
            .ok_or_else(|| report(StoreError::NotFound(name.to_string())))?;

        Ok(DatasetInfo {
            name: name.to_string(),
            unit: unit_of(name, header.attribute(UNITS_ATTR)),
            data_type: header.data_type(),
            shape: header.shape().clone(),
        })
    }

    /// Steps 1-3: locate, type check, rank check
    fn validated_record(&mut self, name: &str) -> Result<Record> {
        self.require_mode(Mode::Read, "read")?;

        let record = self
            .container
            .open_record(name)
            .map_err(|source| {
                report(StoreError::Read {
                    name: name.to_string(),
                    source,
                })
            })?
            .ok_or_else(|| report(StoreError::NotFound(name.to_string())))?;

        if record.data_type() != DataType::F64Le {
            return Err(report(StoreError::TypeMismatch {
                name: name.to_string(),
                found: record.data_type(),
            }));
        }

        let rank = record.shape().rank();
        if rank != 1 {
            return Err(report(StoreError::ShapeMismatch {
                name: name.to_string(),
                rank,
            }));
        }

        tracing::debug!(
            dataset = name,
            rank,
            extent = record.shape().dims()[0],
            "located f64 dataset"
        );
        Ok(record)
    }
}

/// Steps 4-5: allocate and copy
fn decode_values(record: &Record) -> Result<Vec<f64>> {
    let values = record.read_f64().map_err(|source| {
        report(StoreError::Read {
            name: record.name().to_string(),
            source,
        })
    })?;

    tracing::debug!(dataset = record.name(), len = values.len(), "read dataset");
    Ok(values)
}

fn unit_of(name: &str, attr: Option<&Attribute>) -> String {
    match attr.and_then(|a| a.as_str()) {
        Some(unit) => unit.to_string(),
        None => {
            tracing::warn!(dataset = name, "dataset has no readable units attribute");
            String::new()
        }
    }
}
