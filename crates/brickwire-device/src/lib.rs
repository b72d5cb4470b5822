//! Device layer for EV3 bricks.
//!
//! [`actions`] turns validated arguments into command components without
//! touching a connection. The handles ([`Brick`], [`Motor`], [`Button`],
//! [`Port`]) send those components over a shared [`Connection`] and keep the
//! decoded replies. [`poller`] repeats a command on a background thread.
//!
//! [`Connection`]: brickwire_transport::Connection

pub mod actions;
pub mod brick;
pub mod button;
pub mod bytecodes;
pub mod capability;
pub mod error;
pub mod ids;
pub mod motor;
pub mod poller;
pub mod port;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::draw::{Color, Font};
pub use actions::file::FileEntry;
pub use actions::motor::MoveRequest;
pub use brick::{Brick, DeviceList};
pub use button::{Button, ChangeCallback};
pub use bytecodes::DeviceType;
pub use capability::{HasLayer, HasLayerAndAddress, Layer};
pub use error::{DeviceError, Result};
pub use ids::{ButtonId, MotorSet, PortId};
pub use motor::{Motor, MotorReading};
pub use poller::{PollHandle, PollerConfig};
pub use port::{Port, PortState};
