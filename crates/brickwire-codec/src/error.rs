use crate::validate::ValidationError;
use crate::wire::WireType;

/// Errors that can occur while building, encoding or decoding commands.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A value failed a precondition check before encoding.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The reply is missing header fields or carries an unknown reply type.
    #[error("malformed reply frame: {0}")]
    MalformedFrame(String),

    /// The reply belongs to a different request.
    #[error("sequence number mismatch (expected {expected}, got {actual})")]
    SequenceMismatch { expected: u16, actual: u16 },

    /// The reply payload length disagrees with what was declared at encode time.
    #[error("reply size mismatch (expected {expected} bytes, got {actual})")]
    SizeMismatch { expected: usize, actual: usize },

    /// The brick answered with its error reply type.
    #[error("{}", execution_message(.status))]
    Execution { status: Option<u8> },

    /// A system reply echoed a different opcode than the one sent.
    #[error("reply opcode 0x{actual:02X} does not match request opcode 0x{expected:02X}")]
    OpcodeMismatch { expected: u8, actual: u8 },

    /// A value cannot be represented in the declared wire type.
    #[error("value {value} does not fit wire type {wire_type}")]
    ValueOutOfRange { wire_type: WireType, value: String },

    /// A value of the wrong kind was supplied for the declared wire type.
    #[error("cannot encode {kind} as wire type {wire_type}")]
    TypeMismatch {
        wire_type: WireType,
        kind: &'static str,
    },

    /// Too few bytes to decode a value of the declared wire type.
    #[error("cannot decode {wire_type}: need {needed} bytes, got {actual}")]
    Decode {
        wire_type: WireType,
        needed: usize,
        actual: usize,
    },

    /// A reply descriptor has no byte footprint (string without repeat count).
    #[error("reply of wire type {0} needs a repeat count")]
    UnsizedReply(WireType),

    /// The command has no components.
    #[error("command has no components")]
    EmptyCommand,

    /// System commands carry exactly one component.
    #[error("system command must have exactly one component (has {0})")]
    SystemComponentCount(usize),

    /// The combined reply buffer exceeds the 10-bit global variable count.
    #[error("reply buffer too large ({size} bytes, max {max})")]
    ReplyBufferTooLarge { size: usize, max: usize },

    /// The encoded frame does not fit the 16-bit length prefix.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The owning context was dropped before it could be read or updated.
    #[error("owning context is no longer available")]
    OwnerUnavailable,

    /// No reply has been decoded for this command.
    #[error("command has no decoded reply")]
    NoReply,

    /// The requested reply index does not exist.
    #[error("reply index {index} out of range ({len} replies)")]
    ReplyIndex { index: usize, len: usize },
}

fn execution_message(status: &Option<u8>) -> String {
    match status {
        Some(status) => format!("command returned error (status 0x{status:02X})"),
        None => "command returned an error".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
