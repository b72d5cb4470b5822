use std::sync::Arc;

use brickwire_codec::{CommandComponent, Setter, WireType};

use super::with_layer_and_address;
use crate::bytecodes::{input, opcode};
use crate::capability::HasLayerAndAddress;

/// Reply buffer reserved for device and mode names.
pub const STRING_BUFFER_SIZE: usize = 0x18;

/// Number of modes a sensor can expose.
pub const MODE_COUNT: u8 = 9;

fn input_device<O>(owner: &Arc<O>, subcode: u8) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::INPUT_DEVICE, Some(subcode))
}

pub fn device_name<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_NAME)
        .add_parameter(WireType::UByte, STRING_BUFFER_SIZE as u8)
        .add_reply(WireType::String, on_reply, STRING_BUFFER_SIZE)
}

pub fn mode_name<O>(owner: &Arc<O>, mode: u8, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_MODENAME)
        .add_parameter(WireType::UByte, mode)
        .add_parameter(WireType::UByte, STRING_BUFFER_SIZE as u8)
        .add_reply(WireType::String, on_reply, STRING_BUFFER_SIZE)
}

/// Device type code and current mode.
pub fn type_mode<O>(
    owner: &Arc<O>,
    on_type: Option<Setter<O>>,
    on_mode: Option<Setter<O>>,
) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_TYPEMODE)
        .add_reply(WireType::UByte, on_type, 0)
        .add_reply(WireType::UByte, on_mode, 0)
}

/// Raw sensor value without waiting for the sensor to become ready.
pub fn raw<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_RAW).add_reply(WireType::Int, on_reply, 0)
}

fn ready<O>(owner: &Arc<O>, subcode: u8, device_type: u8, mode: u8) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, subcode)
        .add_parameter(WireType::UByte, device_type)
        .add_parameter(WireType::UByte, mode)
        .add_parameter(WireType::UByte, 1u8)
}

pub fn ready_raw<O>(
    owner: &Arc<O>,
    device_type: u8,
    mode: u8,
    on_reply: Option<Setter<O>>,
) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    ready(owner, input::READY_RAW, device_type, mode).add_reply(WireType::Int, on_reply, 0)
}

/// Reading in SI units.
pub fn ready_si<O>(
    owner: &Arc<O>,
    device_type: u8,
    mode: u8,
    on_reply: Option<Setter<O>>,
) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    ready(owner, input::READY_SI, device_type, mode).add_reply(WireType::Float, on_reply, 0)
}

pub fn ready_percent<O>(
    owner: &Arc<O>,
    device_type: u8,
    mode: u8,
    on_reply: Option<Setter<O>>,
) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    ready(owner, input::READY_PCT, device_type, mode).add_reply(WireType::Byte, on_reply, 0)
}

pub fn min_max<O>(
    owner: &Arc<O>,
    on_min: Option<Setter<O>>,
    on_max: Option<Setter<O>>,
) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_MINMAX)
        .add_reply(WireType::Float, on_min, 0)
        .add_reply(WireType::Float, on_max, 0)
}

/// Positive value changes since the last clear.
pub fn changes<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_CHANGES).add_reply(WireType::Float, on_reply, 0)
}

/// Negative value changes since the last clear.
pub fn bumps<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::GET_BUMPS).add_reply(WireType::Float, on_reply, 0)
}

pub fn clear_changes<O>(owner: &Arc<O>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    input_device(owner, input::CLR_CHANGES)
}

/// One mode-name query per possible mode, for a single multi-component command.
pub fn all_mode_names<O>(owner: &Arc<O>) -> Vec<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    (0..MODE_COUNT).map(|mode| mode_name(owner, mode, None)).collect()
}

#[cfg(test)]
mod tests {
    use brickwire_codec::protocol::{ARG_CONST_1, GLOBAL_INDEX};
    use brickwire_codec::{Command, CommandKind, Operation, Value};

    use super::*;
    use crate::actions::fixture::Target;
    use crate::capability::Layer;

    #[test]
    fn device_name_layout() {
        let target = Target::new(Layer::Master, 0x02);
        let component = device_name(&target, None);
        let bytes = component
            .serialize(0, CommandKind::Direct)
            .expect("device name query should encode");
        assert_eq!(
            bytes.as_ref(),
            &[
                opcode::INPUT_DEVICE,
                input::GET_NAME,
                ARG_CONST_1, 0,
                ARG_CONST_1, 0x02,
                ARG_CONST_1, 0x18,
                GLOBAL_INDEX, 0
            ]
        );
        assert_eq!(component.reply_size(), STRING_BUFFER_SIZE);
    }

    #[test]
    fn ready_queries_pass_type_mode_and_one_value() {
        let target = Target::new(Layer::Master, 0x00);
        let bytes = ready_si(&target, 29, 2, None)
            .serialize(0, CommandKind::Direct)
            .expect("ready query should encode");
        assert_eq!(
            &bytes[..12],
            &[
                opcode::INPUT_DEVICE,
                input::READY_SI,
                ARG_CONST_1, 0,
                ARG_CONST_1, 0,
                ARG_CONST_1, 29,
                ARG_CONST_1, 2,
                ARG_CONST_1, 1
            ]
        );
    }

    #[test]
    fn reply_widths() {
        let target = Target::new(Layer::Master, 0x00);
        assert_eq!(type_mode(&target, None, None).reply_size(), 2);
        assert_eq!(raw(&target, None).reply_size(), 4);
        assert_eq!(ready_percent(&target, 0, 0, None).reply_size(), 1);
        assert_eq!(min_max(&target, None, None).reply_size(), 8);
        assert!(!clear_changes(&target).has_reply());
    }

    #[test]
    fn all_mode_names_fit_one_command() {
        let target = Target::new(Layer::Master, 0x03);
        let mut command = Command::direct().add_components(all_mode_names(&target));
        let frame = command.serialize().expect("nine mode queries fit the buffer");

        assert_eq!(command.components().len(), usize::from(MODE_COUNT));
        assert_eq!(command.reply_size(), 9 * STRING_BUFFER_SIZE);
        assert_eq!(frame[5], (9 * STRING_BUFFER_SIZE) as u8);

        let mut reply = command.sequence_number().to_le_bytes().to_vec();
        reply.push(brickwire_codec::protocol::DIRECT_REPLY);
        for mode in 0..MODE_COUNT {
            let mut name = [0u8; STRING_BUFFER_SIZE];
            if mode < 2 {
                let text = format!("MODE-{mode}");
                name[..text.len()].copy_from_slice(text.as_bytes());
            }
            reply.extend_from_slice(&name);
        }
        command.deserialize(&reply).expect("reply should decode");
        assert_eq!(command.reply(1).expect("second mode"), &Value::from("MODE-1"));
        assert_eq!(command.reply(2).expect("third mode"), &Value::from(""));
    }
}
