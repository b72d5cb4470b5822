//! Command framing and reply decoding for the EV3 brick byte-code protocol.
//!
//! A [`Command`] is one wire frame. It carries one or more
//! [`CommandComponent`]s, each an opcode with typed parameters and declared
//! replies:
//! - Direct commands tag every parameter and reserve reply space in the
//!   brick's global variable buffer
//! - System commands carry a single untagged operation and reply with an
//!   opcode echo and a status byte
//!
//! Encoding and decoding never touch I/O; see `brickwire-transport` for that.

pub mod command;
pub mod component;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod validate;
pub mod value;
pub mod wire;

pub use command::{Command, CommandKind, CommandState};
pub use component::{Accessor, CommandComponent, Operation, Ramp, ReplyDescriptor, Setter};
pub use error::{CodecError, Result};
pub use frame::{decode_frame, encode_frame, hex, LENGTH_PREFIX_SIZE, MAX_FRAME_BODY};
pub use validate::{validate_exclusive, validate_member, validate_range, ValidationError};
pub use value::Value;
pub use wire::WireType;
