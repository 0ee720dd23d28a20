//! Dataset Writer
//!
//! Creates one rank-1 f64 record per dataset and attaches the `Variable`
//! and `units` string attributes. The record is committed as a whole, so a
//! failed write leaves the name absent.

use crate::container::{ContainerFile, DataType, RecordBuilder, Shape};
use crate::error::{BackendError, Result, StoreError};

use super::{report, Mode, Store, UNITS_ATTR, VARIABLE_ATTR};

impl Store {
    /// Write `values` as a new dataset called `name`
    ///
    /// Fails if the store is not in write mode, if `name` is empty or
    /// already used in this file, or if the file rejects the append.
    pub fn write(&mut self, name: &str, unit: &str, values: &[f64]) -> Result<()> {
        self.require_mode(Mode::Write, "write")?;

        write_dataset(&mut self.container, name, unit, values).map_err(|source| {
            report(StoreError::Write {
                name: name.to_string(),
                source,
            })
        })?;

        tracing::debug!(dataset = name, unit, len = values.len(), "wrote dataset");
        Ok(())
    }
}

fn write_dataset(
    container: &mut ContainerFile,
    name: &str,
    unit: &str,
    values: &[f64],
) -> std::result::Result<(), BackendError> {
    let mut record = container.create_record(name, DataType::F64Le, Shape::linear(values.len()))?;
    record.write_f64(values)?;

    write_string_attribute(&mut record, VARIABLE_ATTR, name)?;
    write_string_attribute(&mut record, UNITS_ATTR, unit)?;

    record.commit()?;
    Ok(())
}

/// Attach `value` as a one-element string sized exactly to its byte length
fn write_string_attribute(
    record: &mut RecordBuilder<'_>,
    attr: &str,
    value: &str,
) -> std::result::Result<(), BackendError> {
    let len = u32::try_from(value.len()).map_err(|_| {
        BackendError::Datatype(format!(
            "attribute '{}' value of {} bytes is too long",
            attr,
            value.len()
        ))
    })?;

    record
        .create_attribute(attr, DataType::FixedString { len }, Shape::linear(1))?
        .write(value.as_bytes())
}
