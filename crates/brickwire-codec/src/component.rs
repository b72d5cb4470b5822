//! A single opcode operation: parameters out, typed replies back.
//!
//! Direct commands reserve room for every reply in the brick's global
//! variable buffer. The component writes a global-index marker and the offset
//! for each reply it declares, so encoding must walk replies in exactly the
//! order decoding will later slice them.

use std::fmt;
use std::sync::{Arc, Weak};

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::CommandKind;
use crate::error::{CodecError, Result};
use crate::protocol::{GLOBAL_INDEX, MAX_GLOBAL_OFFSET};
use crate::validate::ValidationError;
use crate::value::Value;
use crate::wire::WireType;

/// Reads a parameter value off the owning context at serialize time.
pub type Accessor<C> = Box<dyn Fn(&C) -> Value + Send + Sync>;

/// Pushes a decoded reply value back into the owning context.
pub type Setter<C> = Box<dyn Fn(&C, &Value) + Send + Sync>;

/// Three-phase motor profile: ramp up, constant, ramp down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ramp {
    pub up: u32,
    pub constant: u32,
    pub down: u32,
}

impl Ramp {
    pub fn new(up: u32, constant: u32, down: u32) -> Self {
        Self { up, constant, down }
    }

    /// A profile with no ramp phases.
    pub fn constant(value: u32) -> Self {
        Self::new(0, value, 0)
    }

    fn values(self) -> [Value; 3] {
        [
            Value::UInt(self.up),
            Value::UInt(self.constant),
            Value::UInt(self.down),
        ]
    }
}

impl From<u32> for Ramp {
    fn from(value: u32) -> Self {
        Self::constant(value)
    }
}

enum Source<C> {
    Literal(Value),
    Ramp([Value; 3]),
    Accessor(Accessor<C>),
}

struct Parameter<C> {
    wire_type: WireType,
    source: Source<C>,
}

/// Declared shape of one reply value.
pub struct ReplyDescriptor<C> {
    wire_type: WireType,
    setter: Option<Setter<C>>,
    repeat: usize,
    trailing: bool,
}

impl<C> ReplyDescriptor<C> {
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    pub fn repeat(&self) -> usize {
        self.repeat
    }

    /// Bytes this reply occupies in the reply buffer.
    pub fn footprint(&self) -> usize {
        if self.repeat == 0 {
            self.wire_type.width().unwrap_or(0)
        } else {
            self.repeat * self.wire_type.element_width()
        }
    }

    fn decode(&self, src: &[u8]) -> Result<Value> {
        match (self.repeat, self.wire_type) {
            (0, wire_type) | (_, wire_type @ WireType::String) => wire_type.decode(src),
            _ => Ok(Value::Bytes(src.to_vec())),
        }
    }
}

/// Object-safe view of a component, so one [`Command`](crate::Command) can
/// carry components bound to different owner types.
pub trait Operation: Send + fmt::Debug {
    fn opcode(&self) -> u8;

    fn subcode(&self) -> Option<u8>;

    /// Total bytes of all declared replies.
    fn reply_size(&self) -> usize;

    fn has_reply(&self) -> bool {
        self.reply_size() > 0
    }

    /// Append this operation's bytes to `dst`, placing replies from `start_offset`.
    fn serialize_into(&self, start_offset: usize, kind: CommandKind, dst: &mut BytesMut)
        -> Result<()>;

    fn serialize(&self, start_offset: usize, kind: CommandKind) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.serialize_into(start_offset, kind, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Slice `src` into one value per reply descriptor without side effects.
    fn decode_reply(&self, src: &[u8]) -> Result<Vec<Value>>;

    /// Fails if a reply setter is declared but the owner is gone.
    fn check_owner(&self) -> Result<()>;

    /// Hand decoded values to the registered setters.
    fn notify(&self, values: &[Value]) -> Result<()>;

    /// Decode and notify in one step.
    fn deserialize(&self, src: &[u8]) -> Result<Vec<Value>> {
        let values = self.decode_reply(src)?;
        self.notify(&values)?;
        Ok(values)
    }
}

/// One opcode (and optional subcode) with its parameters and reply shape.
///
/// `C` is the owning context the component reads accessor parameters from and
/// pushes replies into. The component only holds a [`Weak`] reference to it.
pub struct CommandComponent<C = ()> {
    owner: Option<Weak<C>>,
    opcode: u8,
    subcode: Option<u8>,
    parameters: Vec<Parameter<C>>,
    replies: Vec<ReplyDescriptor<C>>,
    reply_size: usize,
}

impl CommandComponent {
    /// A component with no owning context.
    pub fn detached(opcode: u8, subcode: Option<u8>) -> Self {
        Self::new(None, opcode, subcode)
    }
}

impl<C> CommandComponent<C> {
    pub fn new(owner: Option<&Arc<C>>, opcode: u8, subcode: Option<u8>) -> Self {
        Self {
            owner: owner.map(Arc::downgrade),
            opcode,
            subcode,
            parameters: Vec::new(),
            replies: Vec::new(),
            reply_size: 0,
        }
    }

    /// Append a literal parameter. Range checks are the caller's job.
    pub fn add_parameter(mut self, wire_type: WireType, value: impl Into<Value>) -> Self {
        self.parameters.push(Parameter {
            wire_type,
            source: Source::Literal(value.into()),
        });
        self
    }

    /// Append a ramp profile; each phase is encoded as its own value.
    pub fn add_ramp_parameter(mut self, wire_type: WireType, ramp: impl Into<Ramp>) -> Self {
        self.parameters.push(Parameter {
            wire_type,
            source: Source::Ramp(ramp.into().values()),
        });
        self
    }

    /// Append a parameter read from the owner when the component is serialized.
    pub fn add_accessor_parameter<F>(mut self, wire_type: WireType, accessor: F) -> Self
    where
        F: Fn(&C) -> Value + Send + Sync + 'static,
    {
        self.parameters.push(Parameter {
            wire_type,
            source: Source::Accessor(Box::new(accessor)),
        });
        self
    }

    /// Declare a reply. `repeat == 0` is a scalar, otherwise a buffer of
    /// `repeat` elements (strings and raw byte arrays).
    pub fn add_reply(
        self,
        wire_type: WireType,
        setter: Option<Setter<C>>,
        repeat: usize,
    ) -> Self {
        self.push_reply(wire_type, setter, repeat, false)
    }

    /// Declare a reply whose setter receives the decoded value.
    pub fn add_reply_with<F>(self, wire_type: WireType, repeat: usize, setter: F) -> Self
    where
        F: Fn(&C, &Value) + Send + Sync + 'static,
    {
        self.push_reply(wire_type, Some(Box::new(setter)), repeat, false)
    }

    /// Declare a final reply that reserves `max` elements but may come back
    /// shorter. Used for variable-length system listings.
    pub fn add_trailing_reply(
        self,
        wire_type: WireType,
        setter: Option<Setter<C>>,
        max: usize,
    ) -> Self {
        self.push_reply(wire_type, setter, max, true)
    }

    fn push_reply(
        mut self,
        wire_type: WireType,
        setter: Option<Setter<C>>,
        repeat: usize,
        trailing: bool,
    ) -> Self {
        let reply = ReplyDescriptor {
            wire_type,
            setter,
            repeat,
            trailing,
        };
        self.reply_size += reply.footprint();
        self.replies.push(reply);
        self
    }

    pub fn replies(&self) -> &[ReplyDescriptor<C>] {
        &self.replies
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    fn has_setters(&self) -> bool {
        self.replies.iter().any(|reply| reply.setter.is_some())
    }

    fn upgrade_owner(&self) -> Result<Arc<C>> {
        self.owner
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(CodecError::OwnerUnavailable)
    }
}

impl<C: Send + Sync + 'static> Operation for CommandComponent<C> {
    fn opcode(&self) -> u8 {
        self.opcode
    }

    fn subcode(&self) -> Option<u8> {
        self.subcode
    }

    fn reply_size(&self) -> usize {
        self.reply_size
    }

    fn serialize_into(
        &self,
        start_offset: usize,
        kind: CommandKind,
        dst: &mut BytesMut,
    ) -> Result<()> {
        let tagged = kind == CommandKind::Direct;

        dst.put_u8(self.opcode);
        if let Some(subcode) = self.subcode {
            dst.put_u8(subcode);
        }

        let needs_owner = self
            .parameters
            .iter()
            .any(|parameter| matches!(parameter.source, Source::Accessor(_)));
        let owner = if needs_owner {
            Some(self.upgrade_owner()?)
        } else {
            None
        };

        for parameter in &self.parameters {
            let resolved;
            let values = match &parameter.source {
                Source::Literal(value) => std::slice::from_ref(value),
                Source::Ramp(values) => values.as_slice(),
                Source::Accessor(accessor) => {
                    let owner = owner.as_deref().ok_or(CodecError::OwnerUnavailable)?;
                    resolved = accessor(owner);
                    std::slice::from_ref(&resolved)
                }
            };
            for value in values {
                if tagged {
                    dst.put_u8(parameter.wire_type.argument_tag());
                }
                parameter.wire_type.encode(value, dst)?;
            }
        }

        let mut offset = start_offset;
        for reply in &self.replies {
            let footprint = reply.footprint();
            if footprint == 0 {
                return Err(CodecError::UnsizedReply(reply.wire_type));
            }
            if tagged {
                if offset > MAX_GLOBAL_OFFSET {
                    return Err(ValidationError::OutOfRange {
                        name: "reply offset",
                        value: offset.to_string(),
                        min: "0".to_string(),
                        max: MAX_GLOBAL_OFFSET.to_string(),
                    }
                    .into());
                }
                dst.put_u8(GLOBAL_INDEX);
                dst.put_u8(offset as u8);
            }
            offset += footprint;
        }

        Ok(())
    }

    fn decode_reply(&self, src: &[u8]) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(self.replies.len());
        let mut cursor = 0usize;

        for reply in &self.replies {
            let footprint = reply.footprint();
            let remaining = src.len() - cursor;
            let take = if reply.trailing {
                remaining.min(footprint)
            } else if remaining < footprint {
                return Err(CodecError::SizeMismatch {
                    expected: cursor + footprint,
                    actual: src.len(),
                });
            } else {
                footprint
            };

            values.push(reply.decode(&src[cursor..cursor + take])?);
            cursor += take;
        }

        Ok(values)
    }

    fn check_owner(&self) -> Result<()> {
        if self.has_setters() {
            self.upgrade_owner()?;
        }
        Ok(())
    }

    fn notify(&self, values: &[Value]) -> Result<()> {
        if !self.has_setters() {
            return Ok(());
        }

        let owner = self.upgrade_owner()?;
        for (reply, value) in self.replies.iter().zip(values) {
            if let Some(setter) = &reply.setter {
                setter(&owner, value);
            }
        }
        Ok(())
    }
}

impl<C> fmt::Debug for CommandComponent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let replies: Vec<_> = self
            .replies
            .iter()
            .map(|reply| (reply.wire_type, reply.repeat))
            .collect();
        f.debug_struct("CommandComponent")
            .field("opcode", &format_args!("0x{:02X}", self.opcode))
            .field("subcode", &self.subcode)
            .field("parameters", &self.parameters.len())
            .field("replies", &replies)
            .field("reply_size", &self.reply_size)
            .field("owned", &self.owner.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::protocol::{ARG_CONST_1, ARG_CONST_2, ARG_CONST_4, ARG_STRING};

    #[derive(Default)]
    struct Sensor {
        layer: u8,
        raw: AtomicI32,
        name: Mutex<String>,
    }

    #[test]
    fn direct_layout_tags_parameters_and_marks_replies() {
        let component = CommandComponent::detached(0x94, Some(0x01))
            .add_parameter(WireType::Byte, 2i8)
            .add_parameter(WireType::Short, 1000i16)
            .add_reply(WireType::UByte, None, 0)
            .add_reply(WireType::Int, None, 0);

        let bytes = component.serialize(3, CommandKind::Direct).unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x94, 0x01, ARG_CONST_1, 2, ARG_CONST_2, 0xE8, 0x03, GLOBAL_INDEX, 3,
                GLOBAL_INDEX, 4
            ]
        );
        assert_eq!(component.reply_size(), 5);
        assert!(component.has_reply());
    }

    #[test]
    fn system_layout_omits_tags_and_markers() {
        let component = CommandComponent::detached(0x9B, None)
            .add_parameter(WireType::String, "../prjs/new")
            .add_reply(WireType::UByte, None, 0);

        let bytes = component.serialize(0, CommandKind::System).unwrap();
        let mut expected = vec![0x9B];
        expected.extend_from_slice(b"../prjs/new\0");
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn direct_string_parameter_uses_string_tag() {
        let bytes = CommandComponent::detached(0x94, Some(0x02))
            .add_parameter(WireType::Byte, 100i8)
            .add_parameter(WireType::String, "ui/Startup")
            .serialize(0, CommandKind::Direct)
            .unwrap();
        assert_eq!(bytes[4], ARG_STRING);
        assert_eq!(&bytes[5..], b"ui/Startup\0");
    }

    #[test]
    fn ramp_emits_each_phase_as_tagged_value() {
        let bytes = CommandComponent::detached(0xAF, None)
            .add_ramp_parameter(WireType::UInt, Ramp::new(10, 1000, 20))
            .serialize(0, CommandKind::Direct)
            .unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0xAF,
                ARG_CONST_4, 10, 0, 0, 0,
                ARG_CONST_4, 0xE8, 0x03, 0, 0,
                ARG_CONST_4, 20, 0, 0, 0
            ]
        );
    }

    #[test]
    fn constant_ramp_from_scalar() {
        assert_eq!(Ramp::from(500), Ramp::new(0, 500, 0));
    }

    #[test]
    fn accessor_reads_owner_at_serialize_time() {
        let sensor = Arc::new(Sensor {
            layer: 2,
            ..Sensor::default()
        });
        let component = CommandComponent::new(Some(&sensor), 0x99, Some(0x0B))
            .add_accessor_parameter(WireType::Byte, |s: &Sensor| Value::Byte(s.layer as i8));

        let bytes = component.serialize(0, CommandKind::Direct).unwrap();
        assert_eq!(bytes.as_ref(), &[0x99, 0x0B, ARG_CONST_1, 2]);
    }

    #[test]
    fn accessor_without_owner_fails() {
        let sensor = Arc::new(Sensor::default());
        let component = CommandComponent::new(Some(&sensor), 0x99, None)
            .add_accessor_parameter(WireType::Byte, |s: &Sensor| Value::Byte(s.layer as i8));
        drop(sensor);

        let err = component.serialize(0, CommandKind::Direct).unwrap_err();
        assert!(matches!(err, CodecError::OwnerUnavailable));
    }

    #[test]
    fn reply_offset_above_255_fails_validation() {
        let component = CommandComponent::detached(0x99, None).add_reply(WireType::UByte, None, 0);
        assert!(component.serialize(255, CommandKind::Direct).is_ok());

        let err = component.serialize(256, CommandKind::Direct).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Validation(ValidationError::OutOfRange {
                name: "reply offset",
                ..
            })
        ));
        // System commands carry no offsets.
        assert!(component.serialize(256, CommandKind::System).is_ok());
    }

    #[test]
    fn unsized_string_reply_is_rejected() {
        let component = CommandComponent::detached(0x99, None).add_reply(WireType::String, None, 0);
        assert!(!component.has_reply());
        let err = component.serialize(0, CommandKind::Direct).unwrap_err();
        assert!(matches!(err, CodecError::UnsizedReply(WireType::String)));
    }

    #[test]
    fn deserialize_pushes_values_into_owner() {
        let sensor = Arc::new(Sensor::default());
        let component = CommandComponent::new(Some(&sensor), 0x99, Some(0x15))
            .add_reply_with(WireType::String, 8, |s: &Sensor, v| {
                *s.name.lock().unwrap() = v.as_str().unwrap_or_default().to_string();
            })
            .add_reply_with(WireType::Int, 0, |s: &Sensor, v| {
                s.raw.store(v.as_i64().unwrap_or_default() as i32, Ordering::SeqCst);
            });
        assert_eq!(component.reply_size(), 12);

        let mut reply = b"TOUCH\0\0\0".to_vec();
        reply.extend_from_slice(&(-5i32).to_le_bytes());
        let values = component.deserialize(&reply).unwrap();

        assert_eq!(values, vec![Value::from("TOUCH"), Value::Int(-5)]);
        assert_eq!(*sensor.name.lock().unwrap(), "TOUCH");
        assert_eq!(sensor.raw.load(Ordering::SeqCst), -5);
    }

    #[test]
    fn repeated_numeric_reply_yields_raw_bytes() {
        let component = CommandComponent::detached(0x98, None)
            .add_parameter(WireType::Byte, 4i8)
            .add_reply(WireType::Byte, None, 4)
            .add_reply(WireType::Byte, None, 0);

        let values = component.deserialize(&[7, 7, 126, 30, 1]).unwrap();
        assert_eq!(values, vec![Value::Bytes(vec![7, 7, 126, 30]), Value::Byte(1)]);
    }

    #[test]
    fn short_reply_is_a_size_error() {
        let component = CommandComponent::detached(0xB3, None).add_reply(WireType::Int, None, 0);
        let err = component.deserialize(&[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::SizeMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn trailing_reply_accepts_shorter_payload() {
        let component = CommandComponent::detached(0x99, None)
            .add_reply(WireType::UByte, None, 0)
            .add_trailing_reply(WireType::String, None, 64);

        let mut reply = vec![0x00];
        reply.extend_from_slice(b"a.rbf\n");
        let values = component.deserialize(&reply).unwrap();
        assert_eq!(values, vec![Value::UByte(0), Value::from("a.rbf")]);
    }

    #[test]
    fn setter_without_owner_fails() {
        let sensor = Arc::new(Sensor::default());
        let component = CommandComponent::new(Some(&sensor), 0x99, None)
            .add_reply_with(WireType::UByte, 0, |_: &Sensor, _| {});
        drop(sensor);

        let err = component.deserialize(&[1]).unwrap_err();
        assert!(matches!(err, CodecError::OwnerUnavailable));
    }

    #[test]
    fn has_reply_tracks_reply_size() {
        let silent = CommandComponent::detached(0xA6, None).add_parameter(WireType::Byte, 0i8);
        assert!(!silent.has_reply());
        assert_eq!(silent.reply_size(), 0);
        assert!(silent.deserialize(&[]).unwrap().is_empty());
    }

    #[test]
    fn debug_output_hides_closures() {
        let component = CommandComponent::detached(0x83, Some(0x09)).add_reply(WireType::Boolean, None, 0);
        let rendered = format!("{component:?}");
        assert!(rendered.contains("0x83"));
        assert!(rendered.contains("reply_size: 1"));
    }
}
