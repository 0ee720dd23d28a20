//! Container File
//!
//! Owns the file handle of one container session, in one of two modes:
//! truncate-for-write or read-only. Keeps an in-memory name → offset index;
//! record contents are always fetched from disk.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::config::{StoreConfig, SyncStrategy};
use crate::error::BackendError;

use super::frame::{self, FramePrefix, RecordDescriptor};
use super::record::{Record, RecordBuilder, RecordHeader};
use super::registry::{self, Access, Lease};
use super::{DataType, Shape, FRAME_PREFIX_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// An open container file
pub struct ContainerFile {
    /// Path the container was opened with
    path: PathBuf,
    /// Exclusively owned file handle
    file: File,
    /// Whether this session may append records
    writable: bool,
    config: StoreConfig,
    /// Record name → frame offset
    index: HashMap<String, u64>,
    /// Record names in file order
    order: Vec<String>,
    /// Offset where the next frame is appended
    end: u64,
    /// Process-wide registration, released on drop
    _lease: Lease,
    #[cfg(test)]
    fail_append_after: Option<usize>,
}

impl ContainerFile {
    /// Create a container, truncating any existing file at `path`
    pub fn create(path: &Path, config: StoreConfig) -> Result<Self, BackendError> {
        let lease = registry::acquire(path, Access::Write)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| BackendError::io(format!("cannot create {}", path.display()), e))?;

        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..4].copy_from_slice(MAGIC);
        header[4..6].copy_from_slice(&VERSION.to_le_bytes());
        file.write_all(&header)
            .and_then(|_| file.flush())
            .map_err(|e| BackendError::io("cannot write container header", e))?;

        tracing::debug!(path = %path.display(), "created container");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            writable: true,
            config,
            index: HashMap::new(),
            order: Vec::new(),
            end: HEADER_SIZE,
            _lease: lease,
            #[cfg(test)]
            fail_append_after: None,
        })
    }

    /// Open an existing container read-only
    ///
    /// Validates the header and scans every frame to build the index.
    pub fn open_read_only(path: &Path, config: StoreConfig) -> Result<Self, BackendError> {
        let lease = registry::acquire(path, Access::Read)?;

        let mut file = File::open(path)
            .map_err(|e| BackendError::io(format!("cannot open {}", path.display()), e))?;
        let file_len = file
            .metadata()
            .map_err(|e| BackendError::io("cannot stat container", e))?
            .len();

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                BackendError::file(format!("{} is too short to be a container", path.display()))
            } else {
                BackendError::io("cannot read container header", e)
            }
        })?;

        if &header[0..4] != MAGIC {
            return Err(BackendError::file(format!(
                "invalid container magic: expected ASTR, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(BackendError::file(format!(
                "unsupported container version: {}",
                version
            )));
        }

        let mut container = Self {
            path: path.to_path_buf(),
            file,
            writable: false,
            config,
            index: HashMap::new(),
            order: Vec::new(),
            end: HEADER_SIZE,
            _lease: lease,
            #[cfg(test)]
            fail_append_after: None,
        };
        container.scan(file_len)?;

        tracing::debug!(
            path = %path.display(),
            records = container.order.len(),
            "opened container"
        );

        Ok(container)
    }

    /// Build the index by walking frame headers from the start of the file
    fn scan(&mut self, file_len: u64) -> Result<(), BackendError> {
        let mut pos = HEADER_SIZE;

        while pos < file_len {
            if file_len - pos < FRAME_PREFIX_SIZE {
                tracing::warn!(offset = pos, "ignoring torn frame at end of container");
                break;
            }

            let prefix = self.read_prefix(pos)?;
            let frame_end = pos
                .checked_add(FRAME_PREFIX_SIZE)
                .and_then(|p| p.checked_add(prefix.body_len))
                .ok_or_else(|| {
                    BackendError::file(format!(
                        "corrupt frame at offset {}: body length {} overflows",
                        pos, prefix.body_len
                    ))
                })?;
            if frame_end > file_len {
                // Intact prefix, missing body: the last append never finished
                tracing::warn!(
                    offset = pos,
                    missing = frame_end - file_len,
                    "ignoring torn frame at end of container"
                );
                break;
            }

            let descriptor = self.read_descriptor(pos, &prefix)?;
            if self.index.contains_key(&descriptor.name) {
                return Err(BackendError::file(format!(
                    "corrupt container: record '{}' appears twice",
                    descriptor.name
                )));
            }
            self.index.insert(descriptor.name.clone(), pos);
            self.order.push(descriptor.name);

            pos = frame_end;
        }

        self.end = pos;
        Ok(())
    }

    /// Read and verify the prefix of the frame at `offset`
    fn read_prefix(&mut self, offset: u64) -> Result<FramePrefix, BackendError> {
        let mut bytes = [0u8; FRAME_PREFIX_SIZE as usize];
        self.read_at(offset, &mut bytes)?;
        FramePrefix::parse(&bytes).ok_or_else(|| {
            BackendError::file(format!("corrupt frame prefix at offset {}", offset))
        })
    }

    /// Read and verify the descriptor of the frame at `offset`, skipping its payload
    fn read_descriptor(
        &mut self,
        offset: u64,
        prefix: &FramePrefix,
    ) -> Result<RecordDescriptor, BackendError> {
        if prefix.body_len < 4 {
            return Err(BackendError::file(format!(
                "corrupt frame at offset {}: body shorter than its length field",
                offset
            )));
        }

        let body_start = offset + FRAME_PREFIX_SIZE;
        let mut desc_len = [0u8; 4];
        self.read_at(body_start, &mut desc_len)?;
        let len = u32::from_le_bytes(desc_len) as u64;
        if len > prefix.body_len - 4 {
            return Err(BackendError::file(format!(
                "corrupt frame at offset {}: descriptor overruns frame",
                offset
            )));
        }

        let mut checked = vec![0u8; 4 + len as usize];
        checked[..4].copy_from_slice(&desc_len);
        self.read_at(body_start + 4, &mut checked[4..])?;
        if crc32fast::hash(&checked) != prefix.desc_crc {
            return Err(BackendError::file(format!(
                "corrupt frame at offset {}: descriptor checksum mismatch",
                offset
            )));
        }

        frame::decode_descriptor(&checked[4..])
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), BackendError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(buf))
            .map_err(|e| BackendError::io(format!("cannot read container at offset {}", offset), e))
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Start a new record; nothing is written until the builder commits
    pub fn create_record(
        &mut self,
        name: &str,
        dtype: DataType,
        shape: Shape,
    ) -> Result<RecordBuilder<'_>, BackendError> {
        if !self.writable {
            return Err(BackendError::file(format!(
                "{} is open read-only",
                self.path.display()
            )));
        }
        if name.is_empty() {
            return Err(BackendError::Dataset("record name must not be empty".to_string()));
        }
        if self.index.contains_key(name) {
            return Err(BackendError::Dataset(format!(
                "record '{}' already exists",
                name
            )));
        }
        shape.byte_len(dtype)?;

        Ok(RecordBuilder::new(self, name, dtype, shape))
    }

    /// Append an encoded frame, rolling the file back on failure
    pub(super) fn append_frame(&mut self, name: &str, frame: &[u8]) -> Result<u64, BackendError> {
        if !self.writable {
            return Err(BackendError::file(format!(
                "{} is open read-only",
                self.path.display()
            )));
        }

        let offset = self.end;
        let sync = self.config.sync_strategy == SyncStrategy::EveryWrite;
        let result = self
            .file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.write_frame(frame))
            .and_then(|_| self.file.flush())
            .and_then(|_| if sync { self.file.sync_data() } else { Ok(()) });

        if let Err(e) = result {
            if let Err(rollback) = self.file.set_len(offset) {
                tracing::error!(
                    offset,
                    error = %rollback,
                    "failed to truncate partial frame"
                );
            }
            return Err(BackendError::io(
                format!("cannot append record '{}'", name),
                e,
            ));
        }

        self.end = offset + frame.len() as u64;
        self.index.insert(name.to_string(), offset);
        self.order.push(name.to_string());

        Ok(offset)
    }

    #[cfg(not(test))]
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.write_all(frame)
    }

    #[cfg(test)]
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        if let Some(limit) = self.fail_append_after.take() {
            self.file.write_all(&frame[..limit.min(frame.len())])?;
            return Err(io::Error::new(io::ErrorKind::Other, "device full"));
        }
        self.file.write_all(frame)
    }

    /// Make the next append fail after writing `bytes` bytes of its frame
    #[cfg(test)]
    pub(crate) fn fail_next_append_after(&mut self, bytes: usize) {
        self.fail_append_after = Some(bytes);
    }

    /// Force all written records to stable storage
    pub fn sync(&mut self) -> Result<(), BackendError> {
        if !self.writable {
            return Ok(());
        }
        self.file
            .sync_all()
            .map_err(|e| BackendError::io("cannot sync container", e))
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Fetch a record by name, or `None` if it does not exist
    pub fn open_record(&mut self, name: &str) -> Result<Option<Record>, BackendError> {
        let offset = match self.index.get(name) {
            Some(&off) => off,
            None => return Ok(None),
        };

        let prefix = self.read_prefix(offset)?;

        let body_len = usize::try_from(prefix.body_len).map_err(|_| {
            BackendError::file(format!("frame of '{}' is too large to read", name))
        })?;
        let mut body = vec![0u8; body_len];
        self.read_at(offset + FRAME_PREFIX_SIZE, &mut body)?;

        if self.config.verify_checksums {
            let actual = crc32fast::hash(&body);
            if actual != prefix.body_crc {
                return Err(BackendError::file(format!(
                    "checksum mismatch in record '{}': stored {:08x}, computed {:08x}",
                    name, prefix.body_crc, actual
                )));
            }
        }

        let (descriptor, payload) = frame::decode_body(Bytes::from(body))?;
        if descriptor.name != name {
            return Err(BackendError::file(format!(
                "index points '{}' at record '{}'",
                name, descriptor.name
            )));
        }

        Ok(Some(Record::new(descriptor, payload)))
    }

    /// Fetch only the metadata of a record, leaving its payload on disk
    pub fn describe_record(&mut self, name: &str) -> Result<Option<RecordHeader>, BackendError> {
        let offset = match self.index.get(name) {
            Some(&off) => off,
            None => return Ok(None),
        };

        let prefix = self.read_prefix(offset)?;
        let descriptor = self.read_descriptor(offset, &prefix)?;
        if descriptor.name != name {
            return Err(BackendError::file(format!(
                "index points '{}' at record '{}'",
                name, descriptor.name
            )));
        }

        Ok(Some(RecordHeader::new(descriptor)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Record names in the order they were written
    pub fn record_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
