//! Command-type, reply-type and argument tag bytes.
//!
//! These are the fixed header values the brick firmware understands. Opcode
//! and subcode tables live with the device builders; the codec only needs the
//! framing bytes below.

/// Direct command expecting a reply.
pub const DIRECT_COMMAND: u8 = 0x00;

/// System command expecting a reply.
pub const SYSTEM_COMMAND: u8 = 0x01;

/// Successful reply to a direct command.
pub const DIRECT_REPLY: u8 = 0x02;

/// Successful reply to a system command.
pub const SYSTEM_REPLY: u8 = 0x03;

/// Direct command failed on the brick.
pub const DIRECT_REPLY_WITH_ERROR: u8 = 0x04;

/// System command failed on the brick.
pub const SYSTEM_REPLY_WITH_ERROR: u8 = 0x05;

/// OR-ed into the command type when no reply should be sent back.
pub const WITHOUT_REPLY: u8 = 0x80;

/// Parameter tag: constant followed by one byte.
pub const ARG_CONST_1: u8 = 0x81;

/// Parameter tag: constant followed by two bytes.
pub const ARG_CONST_2: u8 = 0x82;

/// Parameter tag: constant followed by four bytes.
pub const ARG_CONST_4: u8 = 0x83;

/// Parameter tag: NUL-terminated string follows.
pub const ARG_STRING: u8 = 0x84;

/// Reply marker: global variable index, one offset byte follows.
pub const GLOBAL_INDEX: u8 = 0xE1;

/// Largest offset a one-byte global index can address.
pub const MAX_GLOBAL_OFFSET: usize = 0xFF;

/// Global variable count is packed into 10 bits.
pub const MAX_GLOBAL_VARIABLES: usize = 0x3FF;

/// Local variable count is packed into 6 bits.
pub const MAX_LOCAL_VARIABLES: u8 = 0x3F;

/// Returns a human-readable name for a command or reply type byte.
pub fn type_name(tag: u8) -> &'static str {
    match tag & !WITHOUT_REPLY {
        DIRECT_COMMAND => "DIRECT_COMMAND",
        SYSTEM_COMMAND => "SYSTEM_COMMAND",
        DIRECT_REPLY => "DIRECT_REPLY",
        SYSTEM_REPLY => "SYSTEM_REPLY",
        DIRECT_REPLY_WITH_ERROR => "DIRECT_REPLY_WITH_ERROR",
        SYSTEM_REPLY_WITH_ERROR => "SYSTEM_REPLY_WITH_ERROR",
        _ => "UNKNOWN",
    }
}

/// Returns true if the command type byte asks the brick not to reply.
pub fn is_without_reply(command_type: u8) -> bool {
    command_type & WITHOUT_REPLY != 0
}
