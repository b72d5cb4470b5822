use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use brickwire_codec::{Command, Setter, Value};
use brickwire_transport::Connection;

use crate::actions::port as actions;
use crate::brick::{reply_f32, reply_i32, reply_i64, reply_string, reply_u8, Link};
use crate::bytecodes::DeviceType;
use crate::capability::{HasLayer, HasLayerAndAddress, Layer};
use crate::error::{DeviceError, Result};
use crate::ids::PortId;

/// Everything the port handle has learned from the brick so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortState {
    pub device_name: Option<String>,
    pub mode_name: Option<String>,
    /// Raw device type code.
    pub device_type: Option<u8>,
    pub mode: Option<u8>,
    pub raw: Option<i32>,
    pub si: Option<f32>,
    pub percent: Option<i8>,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub changes: Option<f32>,
    pub bumps: Option<f32>,
}

/// A sensor port, or a motor port read as an input.
pub struct Port<C> {
    link: Link<C>,
    id: PortId,
    state: Mutex<PortState>,
}

fn store<C, F>(update: F) -> Option<Setter<Port<C>>>
where
    C: Connection + 'static,
    F: Fn(&mut PortState, &Value) + Send + Sync + 'static,
{
    Some(Box::new(move |port: &Port<C>, value: &Value| {
        update(&mut port.lock_state(), value);
    }))
}

fn int(value: &Value) -> Option<i32> {
    value.as_i64().map(|v| v as i32)
}

impl<C: Connection + 'static> Port<C> {
    pub(crate) fn new(link: Link<C>, id: PortId) -> Self {
        Self {
            link,
            id,
            state: Mutex::new(PortState::default()),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    /// Snapshot of the values decoded so far.
    pub fn state(&self) -> PortState {
        self.lock_state().clone()
    }

    pub fn device_name(self: &Arc<Self>) -> Result<String> {
        let command = self.link.execute_component(actions::device_name(
            self,
            store(|state, value| state.device_name = value.as_str().map(str::to_string)),
        ))?;
        reply_string(&command, 0, "device name")
    }

    pub fn mode_name(self: &Arc<Self>, mode: u8) -> Result<String> {
        let command = self.link.execute_component(actions::mode_name(
            self,
            mode,
            store(|state, value| state.mode_name = value.as_str().map(str::to_string)),
        ))?;
        reply_string(&command, 0, "mode name")
    }

    /// Type code and mode of the attached device.
    pub fn type_mode(self: &Arc<Self>) -> Result<(u8, u8)> {
        let command = self.link.execute_component(actions::type_mode(
            self,
            store(|state, value| state.device_type = value.as_i64().map(|v| v as u8)),
            store(|state, value| state.mode = value.as_i64().map(|v| v as u8)),
        ))?;
        Ok((reply_u8(&command, 0, "device type")?, reply_u8(&command, 1, "mode")?))
    }

    pub fn device_type(self: &Arc<Self>) -> Result<DeviceType> {
        let (code, _) = self.type_mode()?;
        Ok(DeviceType::from_code(code))
    }

    /// Raw value without waiting for the sensor.
    pub fn raw(self: &Arc<Self>) -> Result<i32> {
        let command = self
            .link
            .execute_component(actions::raw(self, store(|state, value| state.raw = int(value))))?;
        reply_i32(&command, 0, "raw value")
    }

    /// Raw value once the sensor reports ready, for the given type and mode.
    pub fn raw_value(self: &Arc<Self>, device_type: u8, mode: u8) -> Result<i32> {
        let command = self.link.execute_component(actions::ready_raw(
            self,
            device_type,
            mode,
            store(|state, value| state.raw = int(value)),
        ))?;
        reply_i32(&command, 0, "raw value")
    }

    /// Value in SI units once the sensor reports ready.
    pub fn si(self: &Arc<Self>, device_type: u8, mode: u8) -> Result<f32> {
        let command = self.link.execute_component(actions::ready_si(
            self,
            device_type,
            mode,
            store(|state, value| state.si = value.as_f32()),
        ))?;
        reply_f32(&command, 0, "SI value")
    }

    /// Value as a percentage of the sensor's range once it reports ready.
    pub fn percent(self: &Arc<Self>, device_type: u8, mode: u8) -> Result<i8> {
        let command = self.link.execute_component(actions::ready_percent(
            self,
            device_type,
            mode,
            store(|state, value| state.percent = value.as_i64().map(|v| v as i8)),
        ))?;
        let percent = reply_i64(&command, 0, "percent")?;
        i8::try_from(percent)
            .map_err(|_| DeviceError::UnexpectedReply(format!("percent: {percent}")))
    }

    pub fn min_max(self: &Arc<Self>) -> Result<(f32, f32)> {
        let command = self.link.execute_component(actions::min_max(
            self,
            store(|state, value| state.min = value.as_f32()),
            store(|state, value| state.max = value.as_f32()),
        ))?;
        Ok((reply_f32(&command, 0, "minimum")?, reply_f32(&command, 1, "maximum")?))
    }

    pub fn changes(self: &Arc<Self>) -> Result<f32> {
        let command = self.link.execute_component(actions::changes(
            self,
            store(|state, value| state.changes = value.as_f32()),
        ))?;
        reply_f32(&command, 0, "changes")
    }

    pub fn bumps(self: &Arc<Self>) -> Result<f32> {
        let command = self.link.execute_component(actions::bumps(
            self,
            store(|state, value| state.bumps = value.as_f32()),
        ))?;
        reply_f32(&command, 0, "bumps")
    }

    pub fn clear_changes(self: &Arc<Self>) -> Result<()> {
        self.link.execute_component(actions::clear_changes(self))?;
        let mut state = self.lock_state();
        state.changes = None;
        state.bumps = None;
        Ok(())
    }

    /// Names of every mode the attached device supports, in one round trip.
    /// Unused mode slots come back empty and are left out.
    pub fn query_modes(self: &Arc<Self>) -> Result<Vec<String>> {
        let command = self
            .link
            .execute(Command::direct().add_components(actions::all_mode_names(self)))?;
        let modes: Vec<String> = command
            .replies()
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        debug!(port = %self.id, modes = modes.len(), "queried mode names");
        Ok(modes)
    }

    fn lock_state(&self) -> MutexGuard<'_, PortState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> HasLayer for Port<C> {
    fn layer(&self) -> Layer {
        self.link.layer()
    }
}

impl<C> HasLayerAndAddress for Port<C> {
    fn address(&self) -> u8 {
        self.id.code()
    }
}

impl<C> fmt::Debug for Port<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port").field("id", &self.id).finish_non_exhaustive()
    }
}
