//! Builders that turn validated arguments into [`CommandComponent`]s.
//!
//! Builders never touch a connection. Components bound to a device handle
//! read its layer and address through accessor parameters, so the values are
//! taken when the command is serialized, not when it is built.

use std::sync::Arc;

use brickwire_codec::{CommandComponent, Value, WireType};

use crate::capability::{HasLayer, HasLayerAndAddress};

pub mod brick;
pub mod button;
pub mod draw;
pub mod file;
pub mod motor;
pub mod port;
pub mod sound;

/// Component whose first parameter is the owner's daisy-chain layer.
pub(crate) fn with_layer<O>(owner: &Arc<O>, opcode: u8, subcode: Option<u8>) -> CommandComponent<O>
where
    O: HasLayer + Send + Sync + 'static,
{
    CommandComponent::new(Some(owner), opcode, subcode)
        .add_accessor_parameter(WireType::UByte, |o: &O| Value::UByte(o.layer().code()))
}

/// Component whose first parameters are the owner's layer and address.
pub(crate) fn with_layer_and_address<O>(
    owner: &Arc<O>,
    opcode: u8,
    subcode: Option<u8>,
) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer(owner, opcode, subcode)
        .add_accessor_parameter(WireType::UByte, |o: &O| Value::UByte(o.address()))
}
