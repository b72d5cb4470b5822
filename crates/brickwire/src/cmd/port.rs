use serde::Serialize;

use brickwire_codec::Command as Request;
use brickwire_device::actions::port as actions;
use brickwire_device::{DeviceError, DeviceType, PortId};

use crate::cmd::{PortArgs, Session};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

#[derive(Debug, Serialize)]
struct PortReport {
    port: PortId,
    device: String,
    device_type: DeviceType,
    type_code: u8,
    mode: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    modes: Option<Vec<String>>,
}

impl Record for PortReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("port", self.port.to_string()),
            ("device", self.device.clone()),
            ("type", format!("{:?} ({})", self.device_type, self.type_code)),
            ("mode", self.mode.to_string()),
        ];
        if let Some(modes) = &self.modes {
            fields.push(("modes", modes.join(", ")));
        }
        fields
    }
}

pub fn run(args: PortArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let port = session.brick().port(args.port);

    if !session.is_live() {
        let mut request = Request::direct()
            .add_component(actions::device_name(&port, None))
            .add_component(actions::type_mode(&port, None, None));
        if args.modes {
            request = request.add_components(actions::all_mode_names(&port));
        }
        return session.preview(request, format);
    }

    let failed = |err: DeviceError| device_error(&format!("port {} query failed", args.port), err);
    let device = port.device_name().map_err(failed)?;
    let (type_code, mode) = port.type_mode().map_err(failed)?;
    let modes = if args.modes {
        Some(port.query_modes().map_err(failed)?)
    } else {
        None
    };

    print_record(
        &PortReport {
            port: args.port,
            device,
            device_type: DeviceType::from_code(type_code),
            type_code,
            mode,
            modes,
        },
        format,
    );
    Ok(SUCCESS)
}
