//! Request/response plumbing for brick commands.
//!
//! [`Connection`] is the contract every transport implements: one command in
//! flight, sequence numbers assigned on write, one reply frame read back when
//! the command expects one. [`StreamConnection`] implements it over any
//! `Read + Write` byte stream the caller knows how to open (an RFCOMM device
//! node, a serial port, a TCP socket).

pub mod config;
pub mod error;
pub mod stream;
pub mod traits;

pub use config::{ConnectionConfig, DEFAULT_READ_CHUNK_SIZE};
pub use error::{Result, TransportError};
pub use stream::{Opener, StreamConnection};
pub use traits::{Connection, SequenceCounter};
