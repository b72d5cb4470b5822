use brickwire_codec::{validate_range, CodecError, CommandComponent, Result, WireType};

use crate::bytecodes::{opcode, sound};

pub const MAX_VOLUME: i32 = 100;
pub const MAX_FREQUENCY: i32 = 50_000;
/// The brick reads the two-byte frequency as signed; higher requests play at
/// this pitch.
pub const MAX_ENCODED_FREQUENCY: i32 = i16::MAX as i32;
/// One year in milliseconds.
pub const MAX_DURATION_MS: i64 = 1000 * 60 * 60 * 24 * 365;

/// Play a tone. Frequency in Hz, duration in milliseconds.
///
/// The duration travels as a four-byte constant; anything past `u32::MAX`
/// milliseconds cannot be encoded even though it passes the range check.
pub fn tone(volume: i32, frequency: i32, duration_ms: i64) -> Result<CommandComponent> {
    let volume = validate_range(volume, "volume", 0..=MAX_VOLUME)?;
    let frequency = validate_range(frequency, "frequency", 0..=MAX_FREQUENCY)?;
    let duration_ms = validate_range(duration_ms, "duration", 0..=MAX_DURATION_MS)?;
    let duration = u32::try_from(duration_ms).map_err(|_| CodecError::ValueOutOfRange {
        wire_type: WireType::UInt,
        value: duration_ms.to_string(),
    })?;

    Ok(CommandComponent::detached(opcode::SOUND, Some(sound::TONE))
        .add_parameter(WireType::UByte, volume as u8)
        .add_parameter(WireType::Short, frequency.min(MAX_ENCODED_FREQUENCY) as i16)
        .add_parameter(WireType::UInt, duration))
}

/// Play a sound file once. `path` is relative to the brick's program
/// directory and has no extension.
pub fn play(volume: i32, path: &str) -> Result<CommandComponent> {
    file_playback(sound::PLAY, volume, path)
}

/// Play a sound file in a loop until [`stop`].
pub fn repeat(volume: i32, path: &str) -> Result<CommandComponent> {
    file_playback(sound::REPEAT, volume, path)
}

/// Stop whatever is playing.
pub fn stop() -> CommandComponent {
    CommandComponent::detached(opcode::SOUND, Some(sound::BREAK))
}

/// Reply is non-zero while a sound is playing.
pub fn busy() -> CommandComponent {
    CommandComponent::detached(opcode::SOUND_TEST, None).add_reply(WireType::UByte, None, 0)
}

fn file_playback(subcode: u8, volume: i32, path: &str) -> Result<CommandComponent> {
    let volume = validate_range(volume, "volume", 0..=MAX_VOLUME)?;
    Ok(CommandComponent::detached(opcode::SOUND, Some(subcode))
        .add_parameter(WireType::UByte, volume as u8)
        .add_parameter(WireType::String, path))
}
