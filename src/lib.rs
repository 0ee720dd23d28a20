//! # arraystore
//!
//! A small persistence layer for named one-dimensional f64 arrays:
//! - One structured file per session, opened for write (truncate) or read
//! - Each dataset carries `Variable` and `units` string metadata
//! - Write-once names; a failed write leaves nothing behind
//! - Reads validate element type and rank before copying values out
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Numeric / physics pipeline                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ write(name, unit, values) / read(name)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Store (façade)                          │
//! │               (Write mode  XOR  Read mode)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Dataset   │          │   Dataset   │
//!   │   Writer    │          │   Reader    │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │ ContainerFile │──── process-wide registry
//!               │ (frames+CRC)  │
//!               └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use arraystore::{Mode, Store};
//!
//! # fn main() -> arraystore::Result<()> {
//! let mut store = Store::open("results.astr", Mode::Write)?;
//! store.write("pressure", "Pa", &[1.0, 2.5, 3.75])?;
//! store.close()?;
//!
//! let mut store = Store::open("results.astr", Mode::Read)?;
//! assert_eq!(store.read("pressure")?, vec![1.0, 2.5, 3.75]);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod container;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BackendError, ErrorCause, Result, StoreError};
pub use config::{StoreConfig, SyncStrategy};
pub use store::{Dataset, DatasetInfo, Mode, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of arraystore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
