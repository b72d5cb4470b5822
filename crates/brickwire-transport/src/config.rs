use brickwire_codec::MAX_FRAME_BODY;

/// Default number of bytes requested from the stream per read call.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Configuration for a [`StreamConnection`](crate::StreamConnection).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Largest reply body accepted. Default: the full 16-bit length range.
    pub max_reply_size: usize,
    /// Bytes requested per `read` call. Default: 1 KiB.
    pub read_chunk_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_reply_size: MAX_FRAME_BODY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
