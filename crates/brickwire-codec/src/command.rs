//! One wire frame carrying one or more operations.
//!
//! Request layout:
//! ```text
//! ┌────────────┬────────────┬──────┬─────────────────────┬──────────────────┐
//! │ Length     │ Sequence   │ Type │ Globals/locals      │ Component bytes  │
//! │ (2B LE)    │ (2B LE)    │ (1B) │ (2B, direct only)   │                  │
//! └────────────┴────────────┴──────┴─────────────────────┴──────────────────┘
//! ```
//!
//! The packed variable counts are `llllllgg gggggggg` (byte 6, byte 5): ten
//! bits of global buffer size and six bits of local variables.
//!
//! Reply layout (length prefix already stripped by the transport):
//! ```text
//! ┌────────────┬────────────┬────────────────────────┬──────────────────┐
//! │ Sequence   │ Reply type │ Opcode (system only)   │ Reply buffer     │
//! └────────────┴────────────┴────────────────────────┴──────────────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::component::Operation;
use crate::error::{CodecError, Result};
use crate::frame::{encode_frame, hex, LENGTH_PREFIX_SIZE};
use crate::protocol::{
    DIRECT_COMMAND, DIRECT_REPLY, DIRECT_REPLY_WITH_ERROR, MAX_GLOBAL_VARIABLES,
    MAX_LOCAL_VARIABLES, SYSTEM_COMMAND, SYSTEM_REPLY, SYSTEM_REPLY_WITH_ERROR, WITHOUT_REPLY,
};
use crate::validate::validate_range;
use crate::value::Value;

/// Whether a command is executed by the byte-code VM or the system layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Byte codes whose replies land in the global variable buffer.
    Direct,
    /// File and firmware operations; the reply echoes the opcode and a status.
    System,
}

impl CommandKind {
    pub const fn command_type(self) -> u8 {
        match self {
            CommandKind::Direct => DIRECT_COMMAND,
            CommandKind::System => SYSTEM_COMMAND,
        }
    }

    pub const fn reply_tag(self) -> u8 {
        match self {
            CommandKind::Direct => DIRECT_REPLY,
            CommandKind::System => SYSTEM_REPLY,
        }
    }

    pub const fn error_tag(self) -> u8 {
        match self {
            CommandKind::Direct => DIRECT_REPLY_WITH_ERROR,
            CommandKind::System => SYSTEM_REPLY_WITH_ERROR,
        }
    }
}

/// Lifecycle of a single-use command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Built,
    Sent,
    Replied,
    Errored,
}

/// A request frame made of one or more operations.
#[derive(Debug)]
pub struct Command {
    kind: CommandKind,
    sequence_number: u16,
    local_variables: u8,
    components: Vec<Box<dyn Operation>>,
    command_type: u8,
    reply_size: usize,
    has_reply: bool,
    reply_tag: u8,
    error_tag: u8,
    replies: Option<Vec<Value>>,
    state: CommandState,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            sequence_number: 0,
            local_variables: 0,
            components: Vec::new(),
            command_type: kind.command_type(),
            reply_size: 0,
            has_reply: false,
            reply_tag: 0,
            error_tag: 0,
            replies: None,
            state: CommandState::Built,
        }
    }

    pub fn direct() -> Self {
        Self::new(CommandKind::Direct)
    }

    pub fn system() -> Self {
        Self::new(CommandKind::System)
    }

    /// Append one component.
    pub fn add_component(mut self, component: impl Operation + 'static) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// Append several components, keeping their order.
    pub fn add_components<I, O>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Operation + 'static,
    {
        self.components.extend(
            components
                .into_iter()
                .map(|component| Box::new(component) as Box<dyn Operation>),
        );
        self
    }

    /// Append an already boxed component.
    pub fn add_boxed(mut self, component: Box<dyn Operation>) -> Self {
        self.components.push(component);
        self
    }

    /// Reserve local variables on the brick (six bits, rarely needed).
    pub fn with_local_variables(mut self, count: u8) -> Self {
        self.local_variables = count;
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    /// Assigned by the connection right before the command is written.
    pub fn set_sequence_number(&mut self, sequence_number: u16) {
        self.sequence_number = sequence_number;
    }

    pub fn components(&self) -> &[Box<dyn Operation>] {
        &self.components
    }

    /// Command type byte from the last `serialize`, including the no-reply bit.
    pub fn command_type(&self) -> u8 {
        self.command_type
    }

    /// Global buffer size computed by the last `serialize`.
    pub fn reply_size(&self) -> usize {
        self.reply_size
    }

    /// Whether the brick will answer this frame. Valid after `serialize`.
    pub fn expects_reply(&self) -> bool {
        self.has_reply
    }

    /// Encode the full frame, length prefix included.
    pub fn serialize(&mut self) -> Result<Bytes> {
        if self.components.is_empty() {
            return Err(CodecError::EmptyCommand);
        }
        if self.kind == CommandKind::System && self.components.len() != 1 {
            return Err(CodecError::SystemComponentCount(self.components.len()));
        }
        validate_range(self.local_variables, "local variables", 0..=MAX_LOCAL_VARIABLES)?;

        let mut payload = BytesMut::new();
        let mut reply_size = 0usize;
        let mut has_reply = false;
        for component in &self.components {
            component.serialize_into(reply_size, self.kind, &mut payload)?;
            if component.has_reply() {
                reply_size += component.reply_size();
                has_reply = true;
            }
        }

        let direct = self.kind == CommandKind::Direct;
        if direct && reply_size > MAX_GLOBAL_VARIABLES {
            return Err(CodecError::ReplyBufferTooLarge {
                size: reply_size,
                max: MAX_GLOBAL_VARIABLES,
            });
        }

        let mut command_type = self.kind.command_type();
        if has_reply {
            self.reply_tag = self.kind.reply_tag();
            self.error_tag = self.kind.error_tag();
        } else {
            command_type |= WITHOUT_REPLY;
        }

        let mut body = BytesMut::with_capacity(2 + 1 + 2 + payload.len());
        body.put_u16_le(self.sequence_number);
        body.put_u8(command_type);
        if direct {
            body.put_u8((reply_size & 0xFF) as u8);
            body.put_u8(((self.local_variables << 2) & 0xFC) | ((reply_size >> 8) & 0x03) as u8);
        }
        body.put_slice(&payload);

        let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
        encode_frame(&body, &mut frame)?;

        self.command_type = command_type;
        self.reply_size = reply_size;
        self.has_reply = has_reply;
        self.replies = None;
        self.state = CommandState::Sent;

        debug!(
            sequence = self.sequence_number,
            kind = ?self.kind,
            components = self.components.len(),
            reply_size,
            has_reply,
            len = frame.len(),
            "serialized command"
        );
        trace!(frame = %hex(&frame), "request bytes");

        Ok(frame.freeze())
    }

    /// Decode a reply frame (without its length prefix) and distribute the
    /// reply buffer to the components in declaration order.
    ///
    /// Only a command that has been sent and not yet answered accepts a reply;
    /// anything else fails without touching the command or its owners.
    pub fn deserialize(&mut self, src: &[u8]) -> Result<()> {
        trace!(frame = %hex(src), "reply bytes");
        match self.state {
            CommandState::Sent => {}
            CommandState::Built => {
                return Err(CodecError::MalformedFrame(
                    "command has not been serialized".to_string(),
                ))
            }
            CommandState::Replied | CommandState::Errored => {
                return Err(CodecError::MalformedFrame(
                    "command has already been answered".to_string(),
                ))
            }
        }
        match self.decode(src) {
            Ok(replies) => {
                debug!(
                    sequence = self.sequence_number,
                    replies = replies.len(),
                    "decoded reply"
                );
                self.replies = Some(replies);
                self.state = CommandState::Replied;
                Ok(())
            }
            Err(err) => {
                self.state = CommandState::Errored;
                Err(err)
            }
        }
    }

    fn decode(&self, src: &[u8]) -> Result<Vec<Value>> {
        if !self.has_reply {
            return Err(CodecError::MalformedFrame(
                "command does not expect a reply".to_string(),
            ));
        }

        let mut buf = src;
        if buf.remaining() < 2 {
            return Err(CodecError::MalformedFrame("no sequence number".to_string()));
        }
        let sequence_number = buf.get_u16_le();
        if sequence_number != self.sequence_number {
            return Err(CodecError::SequenceMismatch {
                expected: self.sequence_number,
                actual: sequence_number,
            });
        }

        if !buf.has_remaining() {
            return Err(CodecError::MalformedFrame("no reply type".to_string()));
        }
        let reply_type = buf.get_u8();
        if reply_type == self.error_tag {
            let status = match self.kind {
                CommandKind::System => buf.get(1).copied(),
                CommandKind::Direct => None,
            };
            return Err(CodecError::Execution { status });
        }
        if reply_type != self.reply_tag {
            return Err(CodecError::MalformedFrame(format!(
                "incorrect reply type 0x{reply_type:02X}"
            )));
        }

        match self.kind {
            CommandKind::Direct => self.decode_direct(buf),
            CommandKind::System => self.decode_system(buf),
        }
    }

    fn decode_direct(&self, buf: &[u8]) -> Result<Vec<Value>> {
        if buf.len() != self.reply_size {
            return Err(CodecError::SizeMismatch {
                expected: self.reply_size,
                actual: buf.len(),
            });
        }

        let mut decoded = Vec::with_capacity(self.components.len());
        let mut cursor = 0usize;
        for component in &self.components {
            let end = cursor + component.reply_size();
            decoded.push(component.decode_reply(&buf[cursor..end])?);
            cursor = end;
        }

        self.notify_all(&decoded)?;
        Ok(decoded.into_iter().flatten().collect())
    }

    fn decode_system(&self, mut buf: &[u8]) -> Result<Vec<Value>> {
        if !buf.has_remaining() {
            return Err(CodecError::MalformedFrame("no opcode echo".to_string()));
        }
        let component = &self.components[0];
        let opcode = buf.get_u8();
        if opcode != component.opcode() {
            return Err(CodecError::OpcodeMismatch {
                expected: component.opcode(),
                actual: opcode,
            });
        }

        let values = component.decode_reply(buf)?;
        self.notify_all(std::slice::from_ref(&values))?;
        Ok(values)
    }

    // Every component decoded cleanly; only now do owners see any value.
    fn notify_all(&self, decoded: &[Vec<Value>]) -> Result<()> {
        for component in &self.components {
            component.check_owner()?;
        }
        for (component, values) in self.components.iter().zip(decoded) {
            component.notify(values)?;
        }
        Ok(())
    }

    /// The `n`th decoded value across all components.
    pub fn reply(&self, n: usize) -> Result<&Value> {
        let replies = self.replies.as_deref().ok_or(CodecError::NoReply)?;
        replies.get(n).ok_or(CodecError::ReplyIndex {
            index: n,
            len: replies.len(),
        })
    }

    /// All decoded values, or `None` before a reply was decoded.
    pub fn replies(&self) -> Option<&[Value]> {
        self.replies.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::component::CommandComponent;
    use crate::protocol::{ARG_CONST_1, GLOBAL_INDEX};
    use crate::validate::ValidationError;
    use crate::wire::WireType;

    fn reply_frame(sequence: u16, tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = sequence.to_le_bytes().to_vec();
        bytes.push(tag);
        bytes.extend_from_slice(payload);
        bytes
    }

    fn short_reader(opcode: u8) -> CommandComponent {
        CommandComponent::detached(opcode, None).add_reply(WireType::Short, None, 0)
    }

    #[test]
    fn single_byte_parameter_and_ubyte_reply() {
        let mut command = Command::direct().add_component(
            CommandComponent::detached(0x99, None)
                .add_parameter(WireType::Byte, 50i8)
                .add_reply(WireType::UByte, None, 0),
        );
        command.set_sequence_number(0x0102);

        let frame = command.serialize().unwrap();
        assert_eq!(
            frame.as_ref(),
            &[
                0x0A, 0x00, // length
                0x02, 0x01, // sequence
                DIRECT_COMMAND,
                0x01, 0x00, // one global byte, no locals
                0x99, ARG_CONST_1, 50, GLOBAL_INDEX, 0x00
            ]
        );
        assert!(command.expects_reply());

        command
            .deserialize(&reply_frame(0x0102, DIRECT_REPLY, &[0x07]))
            .unwrap();
        assert_eq!(command.replies().unwrap(), &[Value::UByte(7)]);
        assert_eq!(command.reply(0).unwrap(), &Value::UByte(7));
        assert_eq!(command.state(), CommandState::Replied);
    }

    #[test]
    fn reply_offsets_accumulate_in_declaration_order() {
        let mut command = Command::direct().add_components([
            CommandComponent::detached(0xB3, None).add_reply(WireType::Int, None, 0),
            CommandComponent::detached(0xA6, None),
            CommandComponent::detached(0x99, None)
                .add_reply(WireType::UByte, None, 0)
                .add_reply(WireType::Short, None, 0),
        ]);

        let frame = command.serialize().unwrap();
        assert_eq!(command.reply_size(), 7);
        assert_eq!(frame[5], 7);

        let markers: Vec<u8> = frame
            .windows(2)
            .filter(|pair| pair[0] == GLOBAL_INDEX)
            .map(|pair| pair[1])
            .collect();
        assert_eq!(markers, vec![0, 4, 5]);
    }

    #[test]
    fn no_reply_sets_without_reply_bit() {
        let mut command = Command::direct()
            .add_component(CommandComponent::detached(0xA6, None).add_parameter(WireType::Byte, 0i8));
        let frame = command.serialize().unwrap();

        assert!(!command.expects_reply());
        assert_eq!(frame[4], DIRECT_COMMAND | WITHOUT_REPLY);
        assert_eq!(&frame[5..7], &[0, 0]);

        let err = command.deserialize(&reply_frame(0, DIRECT_REPLY, &[])).unwrap_err();
        assert!(matches!(err, CodecError::MalformedFrame(_)));
    }

    #[test]
    fn swapping_components_changes_decoded_values() {
        let reply = reply_frame(1, DIRECT_REPLY, &[0x01, 0x00, 0x02, 0x00]);

        let mut ordered = Command::direct()
            .add_component(short_reader(0xA0))
            .add_component(short_reader(0xA1));
        ordered.set_sequence_number(1);
        let frame = ordered.serialize().unwrap();
        // Second component's reply lands at offset 2.
        assert_eq!(&frame[frame.len() - 2..], &[GLOBAL_INDEX, 2]);
        ordered.deserialize(&reply).unwrap();
        assert_eq!(
            ordered.replies().unwrap(),
            &[Value::Short(1), Value::Short(2)]
        );

        let mut swapped = Command::direct()
            .add_component(short_reader(0xA1))
            .add_component(short_reader(0xA0));
        swapped.set_sequence_number(1);
        swapped.serialize().unwrap();
        swapped.deserialize(&reply).unwrap();
        // The 0xA0 reader now sees the 0xA1 slot and vice versa.
        assert_eq!(
            swapped.replies().unwrap(),
            &[Value::Short(1), Value::Short(2)]
        );
        assert_ne!(swapped.reply(1).unwrap(), ordered.reply(0).unwrap());
    }

    #[test]
    fn sequence_mismatch_rejected_even_with_valid_payload() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        command.set_sequence_number(5);
        command.serialize().unwrap();

        let err = command
            .deserialize(&reply_frame(6, DIRECT_REPLY, &[1, 0]))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::SequenceMismatch {
                expected: 5,
                actual: 6
            }
        ));
        assert_eq!(command.state(), CommandState::Errored);
    }

    #[test]
    fn error_tag_is_execution_error_even_when_size_matches() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        command.serialize().unwrap();

        let err = command
            .deserialize(&reply_frame(0, DIRECT_REPLY_WITH_ERROR, &[1, 0]))
            .unwrap_err();
        assert!(matches!(err, CodecError::Execution { status: None }));
        assert!(matches!(command.reply(0), Err(CodecError::NoReply)));
    }

    #[test]
    fn system_opcode_echo_must_match() {
        let mut command = Command::system().add_component(
            CommandComponent::detached(0x42, None).add_reply(WireType::UByte, None, 0),
        );
        command.set_sequence_number(9);
        command.serialize().unwrap();

        let err = command
            .deserialize(&reply_frame(9, SYSTEM_REPLY, &[0x43, 0x00]))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::OpcodeMismatch {
                expected: 0x42,
                actual: 0x43
            }
        ));
    }

    #[test]
    fn system_layout_and_reply() {
        let mut command = Command::system().add_component(
            CommandComponent::detached(0x9B, None)
                .add_parameter(WireType::String, "../x")
                .add_reply(WireType::UByte, None, 0),
        );
        command.set_sequence_number(3);

        let frame = command.serialize().unwrap();
        assert_eq!(
            frame.as_ref(),
            &[0x09, 0x00, 0x03, 0x00, SYSTEM_COMMAND, 0x9B, b'.', b'.', b'/', b'x', 0]
        );

        command
            .deserialize(&reply_frame(3, SYSTEM_REPLY, &[0x9B, 0x00]))
            .unwrap();
        assert_eq!(command.reply(0).unwrap(), &Value::UByte(0));
    }

    #[test]
    fn system_error_reports_status() {
        let mut command = Command::system().add_component(
            CommandComponent::detached(0x9C, None)
                .add_parameter(WireType::String, "/missing")
                .add_reply(WireType::UByte, None, 0),
        );
        command.serialize().unwrap();

        let err = command
            .deserialize(&reply_frame(0, SYSTEM_REPLY_WITH_ERROR, &[0x9C, 0x06]))
            .unwrap_err();
        assert!(matches!(err, CodecError::Execution { status: Some(0x06) }));
        assert_eq!(err.to_string(), "command returned error (status 0x06)");
    }

    #[test]
    fn malformed_frames() {
        for reply in [vec![0x00], vec![0x00, 0x00], reply_frame(0, 0x7E, &[1, 0])] {
            let mut command = Command::direct().add_component(short_reader(0xA0));
            command.serialize().unwrap();
            assert!(
                matches!(command.deserialize(&reply), Err(CodecError::MalformedFrame(_))),
                "reply {reply:?} should be malformed"
            );
        }
    }

    #[test]
    fn direct_payload_size_must_match() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        command.serialize().unwrap();

        let err = command
            .deserialize(&reply_frame(0, DIRECT_REPLY, &[1, 0, 0]))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::SizeMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn global_count_packs_into_ten_bits() {
        let mut command = Command::direct()
            .with_local_variables(3)
            .add_component(CommandComponent::detached(0x99, None).add_reply(WireType::String, None, 200))
            .add_component(CommandComponent::detached(0x99, None).add_reply(WireType::String, None, 100));

        let frame = command.serialize().unwrap();
        assert_eq!(command.reply_size(), 300);
        assert_eq!(frame[5], (300 & 0xFF) as u8);
        assert_eq!(frame[6], (3 << 2) | 0x01);
    }

    #[test]
    fn rejects_oversized_buffers_and_locals() {
        let mut too_many_globals = Command::direct()
            .add_component(CommandComponent::detached(0x99, None).add_reply(WireType::Byte, None, 255))
            .add_component(
                CommandComponent::detached(0x99, None).add_reply(WireType::Int, None, 200),
            );
        assert!(matches!(
            too_many_globals.serialize(),
            Err(CodecError::ReplyBufferTooLarge { size: 1055, .. })
        ));

        let mut too_many_locals = Command::direct()
            .with_local_variables(64)
            .add_component(short_reader(0xA0));
        assert!(matches!(
            too_many_locals.serialize(),
            Err(CodecError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn rejects_empty_and_multi_component_system_commands() {
        assert!(matches!(
            Command::direct().serialize(),
            Err(CodecError::EmptyCommand)
        ));

        let mut command = Command::system()
            .add_component(CommandComponent::detached(0x9B, None))
            .add_component(CommandComponent::detached(0x9C, None));
        assert!(matches!(
            command.serialize(),
            Err(CodecError::SystemComponentCount(2))
        ));
    }

    #[test]
    fn reply_before_decode_fails() {
        let command = Command::direct().add_component(short_reader(0xA0));
        assert!(matches!(command.reply(0), Err(CodecError::NoReply)));
    }

    #[test]
    fn reply_index_out_of_range() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        command.serialize().unwrap();
        command
            .deserialize(&reply_frame(0, DIRECT_REPLY, &[1, 0]))
            .unwrap();
        assert!(matches!(
            command.reply(1),
            Err(CodecError::ReplyIndex { index: 1, len: 1 })
        ));
    }

    #[test]
    fn no_setter_runs_when_any_owner_is_gone() {
        let alive = Arc::new(Mutex::new(None::<i16>));
        let gone = Arc::new(Mutex::new(None::<i16>));

        let mut command = Command::direct()
            .add_component(
                CommandComponent::new(Some(&alive), 0xA0, None).add_reply_with(
                    WireType::Short,
                    0,
                    |slot: &Mutex<Option<i16>>, v| {
                        *slot.lock().unwrap() = v.as_i64().map(|v| v as i16);
                    },
                ),
            )
            .add_component(
                CommandComponent::new(Some(&gone), 0xA1, None).add_reply_with(
                    WireType::Short,
                    0,
                    |slot: &Mutex<Option<i16>>, v| {
                        *slot.lock().unwrap() = v.as_i64().map(|v| v as i16);
                    },
                ),
            );
        command.serialize().unwrap();
        drop(gone);

        let err = command
            .deserialize(&reply_frame(0, DIRECT_REPLY, &[1, 0, 2, 0]))
            .unwrap_err();
        assert!(matches!(err, CodecError::OwnerUnavailable));
        assert_eq!(*alive.lock().unwrap(), None);
    }

    #[test]
    fn answered_command_rejects_a_second_reply() {
        let seen = Arc::new(Mutex::new(Vec::<i16>::new()));
        let mut command = Command::direct().add_component(
            CommandComponent::new(Some(&seen), 0xA0, None).add_reply_with(
                WireType::Short,
                0,
                |log: &Mutex<Vec<i16>>, v| {
                    log.lock().unwrap().extend(v.as_i64().map(|v| v as i16));
                },
            ),
        );
        command.serialize().unwrap();
        command
            .deserialize(&reply_frame(0, DIRECT_REPLY, &[5, 0]))
            .unwrap();

        let err = command
            .deserialize(&reply_frame(0, DIRECT_REPLY, &[6, 0]))
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedFrame(_)));
        assert_eq!(*seen.lock().unwrap(), vec![5]);
        assert_eq!(command.state(), CommandState::Replied);
        assert_eq!(command.reply(0).unwrap(), &Value::Short(5));
    }

    #[test]
    fn errored_command_rejects_a_later_reply() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        command.serialize().unwrap();
        command
            .deserialize(&reply_frame(0, DIRECT_REPLY_WITH_ERROR, &[0, 0]))
            .unwrap_err();

        assert!(matches!(
            command.deserialize(&reply_frame(0, DIRECT_REPLY, &[1, 0])),
            Err(CodecError::MalformedFrame(_))
        ));
        assert!(matches!(command.reply(0), Err(CodecError::NoReply)));
    }

    #[test]
    fn oversized_frame_is_rejected_by_the_length_prefix() {
        let mut command = Command::system().add_component(
            CommandComponent::detached(0x92, None).add_parameter(WireType::String, "x".repeat(70_000)),
        );
        assert!(matches!(
            command.serialize(),
            Err(CodecError::FrameTooLarge { max: 65_535, .. })
        ));
    }

    #[test]
    fn serialized_frame_splits_back_into_its_body() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        command.set_sequence_number(4);
        let frame = command.serialize().unwrap();

        let mut buf = BytesMut::from(frame.as_ref());
        let body = crate::frame::decode_frame(&mut buf, crate::frame::MAX_FRAME_BODY)
            .unwrap()
            .expect("one complete frame");
        assert_eq!(body.len(), frame.len() - LENGTH_PREFIX_SIZE);
        assert_eq!(&body[..3], &[0x04, 0x00, DIRECT_COMMAND]);
        assert!(buf.is_empty());
    }

    #[test]
    fn deserialize_before_serialize_is_malformed() {
        let mut command = Command::direct().add_component(short_reader(0xA0));
        assert!(matches!(
            command.deserialize(&reply_frame(0, DIRECT_REPLY, &[1, 0])),
            Err(CodecError::MalformedFrame(_))
        ));
    }
}
