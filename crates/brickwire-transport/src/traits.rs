use bytes::Bytes;
use tracing::debug;

use brickwire_codec::Command;

use crate::error::{Result, TransportError};

/// A synchronous, one-request-at-a-time link to a brick.
///
/// Implementors provide raw frame I/O; [`Connection::write`] drives a
/// [`Command`] through sequence assignment, encoding and reply decoding.
pub trait Connection: Send {
    /// Open the underlying link. Connecting twice is a no-op.
    fn connect(&mut self) -> Result<()>;

    /// Close the underlying link. Disconnecting twice is a no-op.
    fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Sequence number for the next outgoing command.
    fn next_sequence_number(&mut self) -> u16;

    /// Write one complete frame, length prefix included.
    fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Read one complete frame and return its body without the length prefix.
    fn read_frame(&mut self) -> Result<Bytes>;

    /// Send `command` and, if it expects one, decode the reply into it.
    fn write(&mut self, mut command: Command) -> Result<Command> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        command.set_sequence_number(self.next_sequence_number());
        let frame = command.serialize()?;
        self.write_frame(&frame)?;

        if command.expects_reply() {
            let reply = self.read_frame()?;
            command.deserialize(&reply)?;
        } else {
            debug!(
                sequence = command.sequence_number(),
                "command sent without reply"
            );
        }

        Ok(command)
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn next_sequence_number(&mut self) -> u16 {
        (**self).next_sequence_number()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn read_frame(&mut self) -> Result<Bytes> {
        (**self).read_frame()
    }

    fn write(&mut self, command: Command) -> Result<Command> {
        (**self).write(command)
    }
}

/// Hands out sequence numbers starting at 1, wrapping at `u16::MAX`.
#[derive(Debug, Clone)]
pub struct SequenceCounter {
    next: u16,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u16) -> Self {
        Self { next: first }
    }

    pub fn next_value(&mut self) -> u16 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_increases() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.next_value(), 1);
        assert_eq!(counter.next_value(), 2);
        assert_eq!(counter.next_value(), 3);
    }

    #[test]
    fn sequence_wraps() {
        let mut counter = SequenceCounter::starting_at(u16::MAX);
        assert_eq!(counter.next_value(), u16::MAX);
        assert_eq!(counter.next_value(), 0);
        assert_eq!(counter.next_value(), 1);
    }
}
