use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use brickwire_codec::{CommandComponent, Value};
use brickwire_transport::Connection;

use crate::actions::button as actions;
use crate::brick::{reply_bool, Link};
use crate::capability::{HasLayer, HasLayerAndAddress, Layer};
use crate::error::Result;
use crate::ids::ButtonId;

/// Called with the button and its new state whenever the state changes.
pub type ChangeCallback = Arc<dyn Fn(ButtonId, bool) + Send + Sync>;

/// One hardware button on the brick.
///
/// The last known state is updated by every pressed query, including the
/// ones a poller sends. A change fires the instance callback if one is set,
/// otherwise the default the brick handed out at construction.
pub struct Button<C> {
    link: Link<C>,
    id: ButtonId,
    pressed: AtomicBool,
    on_changed: Mutex<Option<ChangeCallback>>,
    default_callback: Option<ChangeCallback>,
}

impl<C: Connection + 'static> Button<C> {
    pub(crate) fn new(link: Link<C>, id: ButtonId, default_callback: Option<ChangeCallback>) -> Self {
        Self {
            link,
            id,
            pressed: AtomicBool::new(false),
            on_changed: Mutex::new(None),
            default_callback,
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Query the brick.
    pub fn is_pressed(self: &Arc<Self>) -> Result<bool> {
        let command = self.link.execute_component(self.pressed_component())?;
        reply_bool(&command, 0, "button state")
    }

    /// State seen by the most recent query, without talking to the brick.
    pub fn last_pressed(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }

    /// Pressed query whose reply updates this handle. Useful for batching all
    /// buttons into one command.
    pub fn pressed_component(self: &Arc<Self>) -> CommandComponent<Self> {
        actions::pressed(
            self,
            Some(Box::new(|button: &Self, value: &Value| {
                button.record(value.as_bool().unwrap_or(false));
            })),
        )
    }

    /// Replace the instance callback. `None` falls back to the default.
    pub fn set_on_changed(&self, callback: Option<ChangeCallback>) {
        *self.on_changed.lock().unwrap_or_else(PoisonError::into_inner) = callback;
    }

    fn record(&self, pressed: bool) {
        if self.pressed.swap(pressed, Ordering::SeqCst) == pressed {
            return;
        }
        debug!(button = %self.id, pressed, "button changed");

        let callback = self
            .on_changed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .or_else(|| self.default_callback.clone());
        if let Some(callback) = callback {
            callback(self.id, pressed);
        }
    }
}

impl<C> HasLayer for Button<C> {
    fn layer(&self) -> Layer {
        self.link.layer()
    }
}

impl<C> HasLayerAndAddress for Button<C> {
    fn address(&self) -> u8 {
        self.id.code()
    }
}

impl<C> fmt::Debug for Button<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("id", &self.id)
            .field("pressed", &self.pressed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
