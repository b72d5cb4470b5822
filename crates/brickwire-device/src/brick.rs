//! The brick façade: one shared connection, handles for everything on it.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use brickwire_codec::{CodecError, Command, CommandComponent, Operation};
use brickwire_transport::{Connection, TransportError};

use crate::actions::{brick as brick_actions, file, sound};
use crate::bytecodes::{system, DeviceType};
use crate::button::{Button, ChangeCallback};
use crate::capability::Layer;
use crate::error::{DeviceError, Result};
use crate::ids::{ButtonId, MotorSet, PortId};
use crate::motor::Motor;
use crate::poller::{self, PollHandle, PollerConfig};
use crate::port::Port;

/// Shared connection plus the layer handles address.
pub(crate) struct Link<C> {
    connection: Arc<Mutex<C>>,
    layer: Layer,
}

impl<C> Clone for Link<C> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            layer: self.layer,
        }
    }
}

impl<C> Link<C> {
    pub(crate) fn layer(&self) -> Layer {
        self.layer
    }
}

impl<C: Connection> Link<C> {
    // A panic in another thread's callback must not wedge the connection.
    fn lock(&self) -> MutexGuard<'_, C> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn execute(&self, command: Command) -> Result<Command> {
        Ok(self.lock().write(command)?)
    }

    pub(crate) fn execute_component(&self, component: impl Operation + 'static) -> Result<Command> {
        self.execute(Command::direct().add_component(component))
    }
}

/// Types of everything plugged into the brick and its daisy chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceList {
    pub types: Vec<DeviceType>,
    /// Set when the list differs from the previous query.
    pub changed: bool,
}

struct Handles<C> {
    motors: Mutex<HashMap<MotorSet, Arc<Motor<C>>>>,
    buttons: Mutex<HashMap<ButtonId, Arc<Button<C>>>>,
    ports: Mutex<HashMap<PortId, Arc<Port<C>>>>,
}

fn cached<K, V>(map: &Mutex<HashMap<K, Arc<V>>>, key: K, make: impl FnOnce() -> V) -> Arc<V>
where
    K: Eq + Hash,
{
    let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(map.entry(key).or_insert_with(|| Arc::new(make())))
}

/// An EV3 brick reached through one connection.
///
/// Cloning is cheap; clones share the connection and the handle cache, so a
/// poller thread and the caller can use the same brick.
pub struct Brick<C> {
    link: Link<C>,
    handles: Arc<Handles<C>>,
    default_button_callback: Option<ChangeCallback>,
}

impl<C> Clone for Brick<C> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
            handles: Arc::clone(&self.handles),
            default_button_callback: self.default_button_callback.clone(),
        }
    }
}

impl<C> fmt::Debug for Brick<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Brick")
            .field("layer", &self.link.layer)
            .field("default_button_callback", &self.default_button_callback.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Connection + 'static> Brick<C> {
    /// Brick at the head of the daisy chain.
    pub fn new(connection: C) -> Self {
        Self::with_layer(connection, Layer::Master)
    }

    pub fn with_layer(connection: C, layer: Layer) -> Self {
        Self {
            link: Link {
                connection: Arc::new(Mutex::new(connection)),
                layer,
            },
            handles: Arc::new(Handles {
                motors: Mutex::new(HashMap::new()),
                buttons: Mutex::new(HashMap::new()),
                ports: Mutex::new(HashMap::new()),
            }),
            default_button_callback: None,
        }
    }

    /// Callback given to buttons that have none of their own. Only affects
    /// buttons created after this call.
    pub fn with_default_button_callback(mut self, callback: ChangeCallback) -> Self {
        self.default_button_callback = Some(callback);
        self
    }

    pub fn layer(&self) -> Layer {
        self.link.layer
    }

    pub fn connect(&self) -> Result<()> {
        self.link.lock().connect()?;
        debug!(layer = ?self.link.layer, "brick connected");
        Ok(())
    }

    pub fn disconnect(&self) -> Result<()> {
        self.link.lock().disconnect()?;
        debug!(layer = ?self.link.layer, "brick disconnected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.link.lock().is_connected()
    }

    /// Send a fully built command and return it with its decoded replies.
    pub fn execute(&self, command: Command) -> Result<Command> {
        self.link.execute(command)
    }

    /// Send one component as a direct command.
    pub fn execute_component(&self, component: impl Operation + 'static) -> Result<Command> {
        self.link.execute_component(component)
    }

    /// Send several components as one direct command.
    pub fn execute_components<I, O>(&self, components: I) -> Result<Command>
    where
        I: IntoIterator<Item = O>,
        O: Operation + 'static,
    {
        self.execute(Command::direct().add_components(components))
    }

    /// Send one component as a system command and check its status byte.
    ///
    /// `SUCCESS` and `END_OF_FILE` pass; every other status, in a normal or an
    /// error reply, becomes [`DeviceError::SystemStatus`].
    pub fn execute_system(&self, component: CommandComponent) -> Result<Command> {
        let opcode = component.opcode();
        let command = match self.execute(Command::system().add_component(component)) {
            Err(DeviceError::Transport(TransportError::Codec(CodecError::Execution {
                status: Some(status),
            }))) => {
                warn!(opcode, status = system::status_name(status), "system command failed");
                return Err(DeviceError::SystemStatus { opcode, status });
            }
            other => other?,
        };

        let status = reply_u8(&command, 0, "status")?;
        if status != system::SUCCESS && status != system::END_OF_FILE {
            warn!(opcode, status = system::status_name(status), "system command failed");
            return Err(DeviceError::SystemStatus { opcode, status });
        }
        Ok(command)
    }

    /// Short tone: volume 50, 1 kHz, half a second.
    pub fn beep(&self) -> Result<()> {
        self.play_tone(50, 1000, 500)
    }

    pub fn play_tone(&self, volume: i32, frequency: i32, duration_ms: i64) -> Result<()> {
        self.execute_component(sound::tone(volume, frequency, duration_ms)?)?;
        Ok(())
    }

    pub fn play_sound(&self, volume: i32, path: &str) -> Result<()> {
        self.execute_component(sound::play(volume, path)?)?;
        Ok(())
    }

    pub fn repeat_sound(&self, volume: i32, path: &str) -> Result<()> {
        self.execute_component(sound::repeat(volume, path)?)?;
        Ok(())
    }

    pub fn stop_sound(&self) -> Result<()> {
        self.execute_component(sound::stop())?;
        Ok(())
    }

    pub fn is_playing(&self) -> Result<bool> {
        let command = self.execute_component(sound::busy())?;
        reply_bool(&command, 0, "sound busy flag")
    }

    pub fn device_list(&self) -> Result<DeviceList> {
        let command = self.execute_component(brick_actions::device_list())?;
        let types = reply_bytes(&command, 0, "device codes")?
            .iter()
            .map(|&code| DeviceType::from_code(code))
            .collect();
        Ok(DeviceList {
            types,
            changed: reply_bool(&command, 1, "change flag")?,
        })
    }

    /// Send drawing components as one command. Include
    /// [`draw::update`](crate::actions::draw::update) to make them visible.
    pub fn draw<I>(&self, components: I) -> Result<()>
    where
        I: IntoIterator<Item = CommandComponent>,
    {
        self.execute_components(components)?;
        Ok(())
    }

    /// Handle for the motors in `set`. Repeated calls return the same handle.
    pub fn motor(&self, set: MotorSet) -> Arc<Motor<C>> {
        cached(&self.handles.motors, set, || Motor::new(self.link.clone(), set))
    }

    /// Handle for one button. Repeated calls return the same handle.
    pub fn button(&self, id: ButtonId) -> Arc<Button<C>> {
        cached(&self.handles.buttons, id, || {
            Button::new(self.link.clone(), id, self.default_button_callback.clone())
        })
    }

    pub fn buttons(&self) -> Vec<Arc<Button<C>>> {
        ButtonId::ALL.iter().map(|&id| self.button(id)).collect()
    }

    /// Handle for one input port. Repeated calls return the same handle.
    pub fn port(&self, id: PortId) -> Arc<Port<C>> {
        cached(&self.handles.ports, id, || Port::new(self.link.clone(), id))
    }

    pub fn create_dir(&self, path: &str) -> Result<()> {
        self.execute_system(file::create_dir(path))?;
        Ok(())
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        self.execute_system(file::delete_file(path))?;
        Ok(())
    }

    /// Full listing of `path`, fetched chunk by chunk.
    pub fn list_files(&self, path: &str) -> Result<Vec<file::FileEntry>> {
        let command = self.execute_system(file::list_files(path, file::MAX_CHUNK)?)?;
        let mut status = reply_u8(&command, 0, "status")?;
        let total = reply_u32(&command, 1, "listing size")? as usize;
        let handle = reply_u8(&command, 2, "handle")?;
        let mut listing = reply_bytes(&command, 3, "listing")?.to_vec();

        while status != system::END_OF_FILE && listing.len() < total {
            let command = self.execute_system(file::continue_list_files(handle, file::MAX_CHUNK)?)?;
            status = reply_u8(&command, 0, "status")?;
            let chunk = reply_bytes(&command, 2, "listing")?;
            if chunk.is_empty() {
                break;
            }
            listing.extend_from_slice(chunk);
        }

        listing.truncate(total);
        debug!(path, bytes = listing.len(), "listing received");
        file::parse_listing(&listing).map_err(|err| DeviceError::UnexpectedReply(err.to_string()))
    }

    /// Poll every button on a background thread, firing their change
    /// callbacks. Callbacks run while the connection is locked and must not
    /// issue commands of their own.
    pub fn poll_buttons(&self, config: PollerConfig) -> Result<PollHandle> {
        let buttons = self.buttons();
        poller::spawn(self.clone(), config, move || {
            Ok(Command::direct()
                .add_components(buttons.iter().map(|button| button.pressed_component())))
        })
    }
}

pub(crate) fn reply_i64(command: &Command, n: usize, what: &str) -> Result<i64> {
    let value = command.reply(n)?;
    value
        .as_i64()
        .ok_or_else(|| DeviceError::UnexpectedReply(format!("{what}: {value:?}")))
}

pub(crate) fn reply_u8(command: &Command, n: usize, what: &str) -> Result<u8> {
    let value = reply_i64(command, n, what)?;
    u8::try_from(value).map_err(|_| DeviceError::UnexpectedReply(format!("{what}: {value}")))
}

pub(crate) fn reply_u32(command: &Command, n: usize, what: &str) -> Result<u32> {
    let value = reply_i64(command, n, what)?;
    u32::try_from(value).map_err(|_| DeviceError::UnexpectedReply(format!("{what}: {value}")))
}

pub(crate) fn reply_i32(command: &Command, n: usize, what: &str) -> Result<i32> {
    let value = reply_i64(command, n, what)?;
    i32::try_from(value).map_err(|_| DeviceError::UnexpectedReply(format!("{what}: {value}")))
}

pub(crate) fn reply_f32(command: &Command, n: usize, what: &str) -> Result<f32> {
    let value = command.reply(n)?;
    value
        .as_f32()
        .ok_or_else(|| DeviceError::UnexpectedReply(format!("{what}: {value:?}")))
}

pub(crate) fn reply_string(command: &Command, n: usize, what: &str) -> Result<String> {
    let value = command.reply(n)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DeviceError::UnexpectedReply(format!("{what}: {value:?}")))
}

pub(crate) fn reply_bool(command: &Command, n: usize, what: &str) -> Result<bool> {
    let value = command.reply(n)?;
    value
        .as_bool()
        .ok_or_else(|| DeviceError::UnexpectedReply(format!("{what}: {value:?}")))
}

pub(crate) fn reply_bytes<'a>(command: &'a Command, n: usize, what: &str) -> Result<&'a [u8]> {
    let value = command.reply(n)?;
    value
        .as_bytes()
        .ok_or_else(|| DeviceError::UnexpectedReply(format!("{what}: {value:?}")))
}
