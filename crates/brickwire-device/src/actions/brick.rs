use brickwire_codec::{CommandComponent, WireType};

use crate::bytecodes::opcode;

/// Number of device slots reported by the device list (4 layers x 8 ports).
pub const DEVICE_SLOTS: usize = 0x20;

/// Type codes of every port on every layer, followed by a flag that is set
/// when anything changed since the last query.
pub fn device_list() -> CommandComponent {
    CommandComponent::detached(opcode::INPUT_DEVICE_LIST, None)
        .add_parameter(WireType::Byte, DEVICE_SLOTS as i8)
        .add_reply(WireType::Byte, None, DEVICE_SLOTS)
        .add_reply(WireType::Byte, None, 0)
}
