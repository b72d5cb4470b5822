use brickwire_codec::CodecError;

/// Errors that can occur while exchanging frames with the brick.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream, possibly in the middle of a frame.
    #[error("connection closed")]
    ConnectionClosed,

    /// A write or read was attempted before `connect`.
    #[error("not connected")]
    NotConnected,

    /// The reply announced a body longer than the configured limit.
    #[error("reply frame too large ({size} bytes, max {max})")]
    ReplyTooLarge { size: usize, max: usize },

    /// The command could not be encoded or its reply could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, TransportError>;
