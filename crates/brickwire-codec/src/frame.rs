use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Every frame on the wire starts with its body length as a u16 LE.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest body a 16-bit length prefix can describe.
pub const MAX_FRAME_BODY: usize = u16::MAX as usize;

/// Prefix `body` with its length.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────────┐
/// │ Length (2B)  │ Body (Length bytes)          │
/// │ LE           │ sequence, type, payload...   │
/// └──────────────┴──────────────────────────────┘
/// ```
pub fn encode_frame(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > MAX_FRAME_BODY {
        return Err(CodecError::FrameTooLarge {
            size: body.len(),
            max: MAX_FRAME_BODY,
        });
    }
    dst.reserve(LENGTH_PREFIX_SIZE + body.len());
    dst.put_u16_le(body.len() as u16);
    dst.put_slice(body);
    Ok(())
}

/// Split one frame body off the front of `src`.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success the prefix and body are consumed from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_body: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let body_len = usize::from(u16::from_le_bytes([src[0], src[1]]));
    if body_len > max_body {
        return Err(CodecError::FrameTooLarge {
            size: body_len,
            max: max_body,
        });
    }

    if src.len() < LENGTH_PREFIX_SIZE + body_len {
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(body_len).freeze()))
}

/// Space-separated hex rendering for trace logs and dry runs.
pub struct Hex<'a>(pub &'a [u8]);

pub fn hex(bytes: &[u8]) -> Hex<'_> {
    Hex(bytes)
}

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
