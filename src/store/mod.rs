//! Store Module
//!
//! Session façade over one container file.
//!
//! ## Responsibilities
//! - Open a file in exactly one mode for the whole session
//! - Write named f64 arrays with `Variable` / `units` metadata
//! - Read arrays back, rejecting anything that is not rank-1 f64
//! - Turn every container failure into a logged, typed [`StoreError`]
//!
//! ## Session States
//! ```text
//!   Closed ──open(Write)──▶ Open(Write) ──close/drop──▶ Closed
//!   Closed ──open(Read)───▶ Open(Read)  ──close/drop──▶ Closed
//! ```
//! There is no transition between the two open states.

mod reader;
mod writer;

use std::fmt;
use std::path::Path;

use crate::config::StoreConfig;
use crate::container::{ContainerFile, DataType, Shape};
use crate::error::{Result, StoreError};

/// Attribute holding the dataset's display name
pub const VARIABLE_ATTR: &str = "Variable";

/// Attribute holding the dataset's physical unit
pub const UNITS_ATTR: &str = "units";

/// Access mode of a Store session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create or truncate the file and write datasets
    Write,
    /// Open an existing file and read datasets
    Read,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Write => f.write_str("write"),
            Mode::Read => f.write_str("read"),
        }
    }
}

/// A dataset read back together with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub unit: String,
    pub values: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Metadata of a stored dataset, read without its values
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub name: String,
    pub unit: String,
    pub data_type: DataType,
    pub shape: Shape,
}

/// One open session against one container file
///
/// Dropping the Store closes the file. Use [`Store::close`] to observe
/// errors from the final sync of a write session.
pub struct Store {
    mode: Mode,
    container: ContainerFile,
    /// Set once the write session has been synced by `close`
    synced: bool,
}

impl Store {
    /// Open `path` in `mode` with the default configuration
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        Self::open_with_config(path, mode, StoreConfig::default())
    }

    /// Open `path` in `mode`
    ///
    /// `Write` truncates or creates the file; `Read` requires an existing
    /// container.
    pub fn open_with_config(path: impl AsRef<Path>, mode: Mode, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();

        let opened = match mode {
            Mode::Write => ContainerFile::create(path, config),
            Mode::Read => ContainerFile::open_read_only(path, config),
        };
        let container = opened.map_err(|source| {
            report(StoreError::Open {
                path: path.to_path_buf(),
                source,
            })
        })?;

        tracing::debug!(path = %path.display(), %mode, "store opened");

        Ok(Self {
            mode,
            container,
            synced: false,
        })
    }

    /// Close the session, syncing a write session to disk
    pub fn close(mut self) -> Result<()> {
        self.synced = true;
        self.container.sync().map_err(|source| {
            report(StoreError::Close {
                path: self.container.path().to_path_buf(),
                source,
            })
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        self.container.path()
    }

    /// Whether a dataset called `name` exists in the file
    pub fn contains(&self, name: &str) -> bool {
        self.container.contains(name)
    }

    /// Dataset names in the order they were written
    pub fn dataset_names(&self) -> &[String] {
        self.container.record_names()
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// Fail with `WrongMode` unless the session is in `required` mode
    fn require_mode(&self, required: Mode, operation: &'static str) -> Result<()> {
        if self.mode != required {
            return Err(report(StoreError::WrongMode {
                operation,
                mode: self.mode,
            }));
        }
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.mode != Mode::Write || self.synced {
            return;
        }
        // `Flush` sessions defer the fsync to here
        if let Err(e) = self.container.sync() {
            tracing::warn!(
                path = %self.container.path().display(),
                error = %e,
                "sync on drop failed"
            );
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.container.path())
            .field("mode", &self.mode)
            .field("datasets", &self.container.len())
            .finish()
    }
}

/// Log an error with its cause before handing it to the caller
fn report(err: StoreError) -> StoreError {
    match err.cause() {
        Some(cause) => tracing::error!(%cause, error = %err, "store operation failed"),
        None => tracing::error!(error = %err, "store operation failed"),
    }
    err
}
