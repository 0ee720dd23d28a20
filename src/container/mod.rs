//! Container Module
//!
//! Append-only structured file holding named, typed, shaped records with
//! string attributes. This is the backing store the [`Store`](crate::Store)
//! façade is built on.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (8 bytes)                                        │
//! │   Magic: "ASTR" (4) | Version: u16 (2) | Reserved (2)   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Frame (repeated, one per record)                        │
//! │   Prefix (20 bytes):                                    │
//! │     BodyLen: u64 (8) | BodyCRC: u32 (4)                 │
//! │     DescCRC: u32 (4) | PrefixCRC: u32 (4)               │
//! │   Body:                                                 │
//! │     [DescLen: u32][Descriptor (bincode)][Payload]       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The descriptor carries the record name, element type, extents and
//! attributes. The payload is the raw element bytes, `element_count *
//! element_size` long. All integers are little-endian.
//!
//! `PrefixCRC` covers the first 16 prefix bytes, `DescCRC` covers
//! `DescLen` plus the descriptor, and `BodyCRC` covers the whole body.
//! Opening a container checks the first two for every frame; the body
//! checksum is checked when a record is read.
//!
//! A frame is appended with a single write once the record is complete;
//! a failed append is truncated away, so readers only ever see whole
//! records. A trailing frame that is cut short by the end of the file but
//! has an intact prefix was torn by a crash and is skipped on open. Any
//! other checksum failure makes the open fail.

mod file;
mod frame;
mod record;
mod types;

pub mod registry;

pub use file::ContainerFile;
pub use record::{Attribute, AttributeWriter, Record, RecordBuilder, RecordHeader};
pub use types::{DataType, Shape};

// =============================================================================
// Shared Constants (used by file, frame, record)
// =============================================================================

/// Magic bytes identifying an arraystore container
pub(crate) const MAGIC: &[u8; 4] = b"ASTR";

/// Current container format version
pub(crate) const VERSION: u16 = 2;

/// Header size: Magic (4) + Version (2) + Reserved (2) = 8 bytes
pub(crate) const HEADER_SIZE: u64 = 8;

/// Frame prefix size: BodyLen (8) + BodyCRC (4) + DescCRC (4) + PrefixCRC (4) = 20 bytes
pub(crate) const FRAME_PREFIX_SIZE: u64 = 20;
