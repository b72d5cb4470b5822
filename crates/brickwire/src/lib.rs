//! Drive LEGO Mindstorms EV3 bricks over their direct and system command
//! protocol.
//!
//! # Crate Structure
//!
//! - [`codec`]: Wire types, command components and command framing
//! - [`transport`]: Blocking connections that exchange frames with a brick
//! - [`device`]: Opcode builders and handles for motors, buttons, ports and files
//!
//! ```no_run
//! use std::fs::OpenOptions;
//!
//! use brickwire::device::{Brick, MotorSet};
//! use brickwire::transport::StreamConnection;
//!
//! # fn main() -> brickwire::device::Result<()> {
//! let connection = StreamConnection::new(|| {
//!     OpenOptions::new().read(true).write(true).open("/dev/rfcomm0")
//! });
//! let brick = Brick::new(connection);
//! brick.connect()?;
//! brick.beep()?;
//! println!("motor A at {} degrees", brick.motor(MotorSet::A).count()?);
//! # Ok(())
//! # }
//! ```

/// Re-export codec types.
pub mod codec {
    pub use brickwire_codec::*;
}

/// Re-export transport types.
pub mod transport {
    pub use brickwire_transport::*;
}

/// Re-export device types.
pub mod device {
    pub use brickwire_device::*;
}
