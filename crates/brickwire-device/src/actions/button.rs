use std::sync::Arc;

use brickwire_codec::{CommandComponent, Setter, Value, WireType};

use crate::bytecodes::{button, opcode};
use crate::capability::HasLayerAndAddress;

/// Query whether the owner's button is held down. The boolean reply goes to
/// `on_reply` when given.
pub fn pressed<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    CommandComponent::new(Some(owner), opcode::UI_BUTTON, Some(button::PRESSED))
        .add_accessor_parameter(WireType::UByte, |o: &O| Value::UByte(o.address()))
        .add_reply(WireType::Boolean, on_reply, 0)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use brickwire_codec::protocol::{ARG_CONST_1, GLOBAL_INDEX};
    use brickwire_codec::{CommandKind, Operation};

    use super::*;
    use crate::actions::fixture::Target;
    use crate::capability::{HasLayer, Layer};

    #[test]
    fn pressed_layout() {
        let target = Target::new(Layer::Master, 2);
        let bytes = pressed(&target, None)
            .serialize(0, CommandKind::Direct)
            .expect("button query should encode");
        assert_eq!(
            bytes.as_ref(),
            &[
                opcode::UI_BUTTON,
                button::PRESSED,
                ARG_CONST_1,
                2,
                GLOBAL_INDEX,
                0
            ]
        );
    }

    struct Held {
        id: u8,
        down: AtomicBool,
    }

    impl HasLayer for Held {
        fn layer(&self) -> Layer {
            Layer::Master
        }
    }

    impl HasLayerAndAddress for Held {
        fn address(&self) -> u8 {
            self.id
        }
    }

    #[test]
    fn reply_reaches_setter() {
        let held = Arc::new(Held {
            id: 6,
            down: AtomicBool::new(false),
        });
        let component = pressed(
            &held,
            Some(Box::new(|h: &Held, v: &Value| {
                h.down.store(v.as_bool().unwrap_or(false), Ordering::SeqCst)
            })),
        );

        component.deserialize(&[1]).expect("one byte is a full reply");
        assert!(held.down.load(Ordering::SeqCst));
    }
}
