//! Primitive wire types and their little-endian codecs.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CodecError, Result};
use crate::protocol::{ARG_CONST_1, ARG_CONST_2, ARG_CONST_4, ARG_STRING};
use crate::value::Value;

/// Primitive types understood by the brick's byte-code interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Boolean,
    /// Signed 8-bit.
    Byte,
    /// Unsigned 8-bit.
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    /// NUL-terminated, variable width.
    String,
}

impl WireType {
    /// Fixed byte width, or `None` for strings.
    pub const fn width(self) -> Option<usize> {
        match self {
            WireType::Boolean | WireType::Byte | WireType::UByte => Some(1),
            WireType::Short | WireType::UShort => Some(2),
            WireType::Int | WireType::UInt | WireType::Float => Some(4),
            WireType::String => None,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            WireType::Byte | WireType::Short | WireType::Int | WireType::Float
        )
    }

    /// Tag byte that precedes a parameter of this type in a direct command.
    pub const fn argument_tag(self) -> u8 {
        match self {
            WireType::Boolean | WireType::Byte | WireType::UByte => ARG_CONST_1,
            WireType::Short | WireType::UShort => ARG_CONST_2,
            WireType::Int | WireType::UInt | WireType::Float => ARG_CONST_4,
            WireType::String => ARG_STRING,
        }
    }

    /// Width of one element when the type is used as a repeated buffer.
    pub(crate) const fn element_width(self) -> usize {
        match self.width() {
            Some(width) => width,
            None => 1,
        }
    }

    /// Encode `value` into `dst` using this type's width and byte order.
    pub fn encode(self, value: &Value, dst: &mut BytesMut) -> Result<()> {
        match self {
            WireType::String => {
                let text = match value {
                    Value::String(s) => s.as_bytes(),
                    other => return Err(self.mismatch(other)),
                };
                // The brick ends the string at the first NUL and would run the
                // rest as byte codes.
                if text.contains(&0) {
                    return Err(CodecError::ValueOutOfRange {
                        wire_type: self,
                        value: format!("{:?}", String::from_utf8_lossy(text)),
                    });
                }
                dst.reserve(text.len() + 1);
                dst.put_slice(text);
                dst.put_u8(0);
            }
            WireType::Float => {
                let v = value.as_f32().ok_or_else(|| self.mismatch(value))?;
                dst.put_f32_le(v);
            }
            WireType::Boolean => {
                let v = value.as_bool().ok_or_else(|| self.mismatch(value))?;
                dst.put_u8(u8::from(v));
            }
            _ => {
                let v = value.as_i64().ok_or_else(|| self.mismatch(value))?;
                self.put_integer(v, dst)?;
            }
        }
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn encode_to_vec(self, value: &Value) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.encode(value, &mut buf)?;
        Ok(buf.to_vec())
    }

    /// Decode a value of this type from the front of `src`.
    ///
    /// Strings consume the whole slice, stop at the first NUL and are trimmed.
    pub fn decode(self, src: &[u8]) -> Result<Value> {
        if let Some(needed) = self.width() {
            if src.len() < needed {
                return Err(CodecError::Decode {
                    wire_type: self,
                    needed,
                    actual: src.len(),
                });
            }
        }

        let mut buf = src;
        let value = match self {
            WireType::Boolean => Value::Bool(buf.get_u8() != 0),
            WireType::Byte => Value::Byte(buf.get_i8()),
            WireType::UByte => Value::UByte(buf.get_u8()),
            WireType::Short => Value::Short(buf.get_i16_le()),
            WireType::UShort => Value::UShort(buf.get_u16_le()),
            WireType::Int => Value::Int(buf.get_i32_le()),
            WireType::UInt => Value::UInt(buf.get_u32_le()),
            WireType::Float => Value::Float(buf.get_f32_le()),
            WireType::String => Value::String(decode_string(src)),
        };
        Ok(value)
    }

    fn put_integer(self, v: i64, dst: &mut BytesMut) -> Result<()> {
        let (min, max) = match self {
            WireType::Byte => (i64::from(i8::MIN), i64::from(i8::MAX)),
            WireType::UByte => (0, i64::from(u8::MAX)),
            WireType::Short => (i64::from(i16::MIN), i64::from(i16::MAX)),
            WireType::UShort => (0, i64::from(u16::MAX)),
            WireType::Int => (i64::from(i32::MIN), i64::from(i32::MAX)),
            WireType::UInt => (0, i64::from(u32::MAX)),
            _ => unreachable!("non-integer wire type {self}"),
        };
        if v < min || v > max {
            return Err(CodecError::ValueOutOfRange {
                wire_type: self,
                value: v.to_string(),
            });
        }

        let width = self.element_width();
        dst.put_slice(&v.to_le_bytes()[..width]);
        Ok(())
    }

    fn mismatch(self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            wire_type: self,
            kind: value.kind(),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Boolean => "boolean",
            WireType::Byte => "byte",
            WireType::UByte => "ubyte",
            WireType::Short => "short",
            WireType::UShort => "ushort",
            WireType::Int => "int",
            WireType::UInt => "uint",
            WireType::Float => "float",
            WireType::String => "string",
        };
        f.write_str(name)
    }
}

fn decode_string(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).trim().to_string()
}
