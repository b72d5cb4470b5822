use serde::Serialize;

use brickwire_codec::{validate_range, ValidationError};

/// Position of a brick in a daisy chain. The brick the host talks to is
/// always [`Layer::Master`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    #[default]
    Master,
    Slave1,
    Slave2,
    Slave3,
}

impl Layer {
    pub const fn code(self) -> u8 {
        match self {
            Layer::Master => 0,
            Layer::Slave1 => 1,
            Layer::Slave2 => 2,
            Layer::Slave3 => 3,
        }
    }
}

impl TryFrom<u8> for Layer {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match validate_range(code, "layer", 0..=3)? {
            0 => Ok(Layer::Master),
            1 => Ok(Layer::Slave1),
            2 => Ok(Layer::Slave2),
            _ => Ok(Layer::Slave3),
        }
    }
}

/// Something addressed through a daisy-chain layer.
pub trait HasLayer {
    fn layer(&self) -> Layer;
}

/// Something addressed through a layer plus a port, motor set or button id.
pub trait HasLayerAndAddress: HasLayer {
    fn address(&self) -> u8;
}
