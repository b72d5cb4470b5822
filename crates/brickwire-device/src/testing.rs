//! Recording connection double for façade tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use brickwire_codec::protocol::{
    DIRECT_REPLY, DIRECT_REPLY_WITH_ERROR, SYSTEM_COMMAND, SYSTEM_REPLY, SYSTEM_REPLY_WITH_ERROR,
    WITHOUT_REPLY,
};
use brickwire_transport::{Connection, Result, SequenceCounter, TransportError};

/// What the fake brick answers to the next request.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Success reply with this payload. System replies get the opcode echo
    /// inserted automatically.
    Ok(Vec<u8>),
    /// Error reply with this payload.
    Error(Vec<u8>),
    /// Fail the read outright.
    Closed,
}

#[derive(Debug, Default)]
struct ScriptState {
    written: Vec<Vec<u8>>,
    replies: VecDeque<FakeReply>,
}

/// Handle kept by the test after the connection moves into a `Brick`.
#[derive(Debug, Clone, Default)]
pub struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub fn reply(&self, reply: FakeReply) -> &Self {
        self.state.lock().expect("script lock").replies.push_back(reply);
        self
    }

    /// Every frame written so far, length prefix included.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("script lock").written.clone()
    }

    pub fn last_written(&self) -> Vec<u8> {
        self.written().pop().expect("at least one frame should have been written")
    }

    pub fn pending_replies(&self) -> usize {
        self.state.lock().expect("script lock").replies.len()
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    script: Script,
    connected: bool,
    sequence: SequenceCounter,
    last_frame: Vec<u8>,
}

impl FakeConnection {
    /// A connected fake and the script that drives it.
    pub fn new() -> (Self, Script) {
        let script = Script::default();
        let connection = Self {
            script: script.clone(),
            connected: true,
            sequence: SequenceCounter::new(),
            last_frame: Vec::new(),
        };
        (connection, script)
    }
}

impl Connection for FakeConnection {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn next_sequence_number(&mut self) -> u16 {
        self.sequence.next_value()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.last_frame = frame.to_vec();
        self.script
            .state
            .lock()
            .expect("script lock")
            .written
            .push(frame.to_vec());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Bytes> {
        let reply = self
            .script
            .state
            .lock()
            .expect("script lock")
            .replies
            .pop_front()
            .ok_or(TransportError::ConnectionClosed)?;

        let frame = &self.last_frame;
        let system = frame[4] & !WITHOUT_REPLY == SYSTEM_COMMAND;
        let (ok_tag, error_tag) = if system {
            (SYSTEM_REPLY, SYSTEM_REPLY_WITH_ERROR)
        } else {
            (DIRECT_REPLY, DIRECT_REPLY_WITH_ERROR)
        };

        let (tag, payload) = match reply {
            FakeReply::Ok(payload) => (ok_tag, payload),
            FakeReply::Error(payload) => (error_tag, payload),
            FakeReply::Closed => return Err(TransportError::ConnectionClosed),
        };

        let mut body = frame[2..4].to_vec();
        body.push(tag);
        if system {
            body.push(frame[5]);
        }
        body.extend_from_slice(&payload);
        Ok(Bytes::from(body))
    }
}
