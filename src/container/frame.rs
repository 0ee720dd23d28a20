//! Frame encoding
//!
//! Builds and parses the frames that make up a container:
//! `[BodyLen][BodyCRC][DescCRC][PrefixCRC]` followed by the body
//! `[DescLen][Descriptor][Payload]`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

use super::record::Attribute;
use super::{DataType, Shape, FRAME_PREFIX_SIZE};

/// Bytes of the prefix covered by the prefix checksum
const PREFIX_CHECKED_LEN: usize = FRAME_PREFIX_SIZE as usize - 4;

/// Everything about a record except its payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RecordDescriptor {
    pub name: String,
    pub dtype: DataType,
    pub shape: Shape,
    pub attributes: Vec<Attribute>,
}

/// Parsed frame prefix whose own checksum has been verified
#[derive(Debug, Clone, Copy)]
pub(crate) struct FramePrefix {
    /// Length of the body following the prefix
    pub body_len: u64,
    /// CRC32 of the whole body
    pub body_crc: u32,
    /// CRC32 of the `DescLen` field and descriptor bytes
    pub desc_crc: u32,
}

impl FramePrefix {
    /// Parse a prefix, or `None` if its checksum does not match
    pub fn parse(bytes: &[u8; FRAME_PREFIX_SIZE as usize]) -> Option<Self> {
        let mut buf = &bytes[..];
        let body_len = buf.get_u64_le();
        let body_crc = buf.get_u32_le();
        let desc_crc = buf.get_u32_le();
        let stored = buf.get_u32_le();

        if crc32fast::hash(&bytes[..PREFIX_CHECKED_LEN]) != stored {
            return None;
        }
        Some(Self {
            body_len,
            body_crc,
            desc_crc,
        })
    }
}

/// Encode a complete frame, prefix included
pub(crate) fn encode(descriptor: &RecordDescriptor, payload: &[u8]) -> Result<Bytes, BackendError> {
    let desc = bincode::serialize(descriptor).map_err(|e| {
        BackendError::Dataset(format!(
            "cannot encode descriptor of '{}': {}",
            descriptor.name, e
        ))
    })?;
    let desc_len = u32::try_from(desc.len()).map_err(|_| {
        BackendError::Dataset(format!("descriptor of '{}' is too large", descriptor.name))
    })?;

    let prefix_len = FRAME_PREFIX_SIZE as usize;
    let body_len = 4 + desc.len() + payload.len();
    let mut frame = BytesMut::with_capacity(prefix_len + body_len);
    frame.put_u64_le(body_len as u64);
    frame.put_bytes(0, prefix_len - 8); // checksums, filled in below
    frame.put_u32_le(desc_len);
    frame.put_slice(&desc);
    frame.put_slice(payload);

    let body_crc = crc32fast::hash(&frame[prefix_len..]);
    let desc_crc = crc32fast::hash(&frame[prefix_len..prefix_len + 4 + desc.len()]);
    frame[8..12].copy_from_slice(&body_crc.to_le_bytes());
    frame[12..16].copy_from_slice(&desc_crc.to_le_bytes());

    let prefix_crc = crc32fast::hash(&frame[..PREFIX_CHECKED_LEN]);
    frame[PREFIX_CHECKED_LEN..prefix_len].copy_from_slice(&prefix_crc.to_le_bytes());

    Ok(frame.freeze())
}

/// Decode a descriptor from its bincode bytes
pub(crate) fn decode_descriptor(bytes: &[u8]) -> Result<RecordDescriptor, BackendError> {
    bincode::deserialize(bytes)
        .map_err(|e| BackendError::file(format!("corrupt record descriptor: {}", e)))
}

/// Split a frame body into descriptor and payload
pub(crate) fn decode_body(mut body: Bytes) -> Result<(RecordDescriptor, Bytes), BackendError> {
    if body.remaining() < 4 {
        return Err(BackendError::file("frame body shorter than its length field"));
    }
    let desc_len = body.get_u32_le() as usize;
    if desc_len > body.remaining() {
        return Err(BackendError::file(format!(
            "descriptor length {} exceeds frame body of {} bytes",
            desc_len,
            body.remaining()
        )));
    }

    let descriptor = decode_descriptor(&body[..desc_len])?;
    body.advance(desc_len);

    Ok((descriptor, body))
}
