use serde::Serialize;

use brickwire_codec::Command as Request;
use brickwire_device::actions::motor as actions;
use brickwire_device::MotorReading;

use crate::cmd::{MotorArgs, Session};
use crate::exit::{codec_error, device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

#[derive(Debug, Serialize)]
struct CountReport {
    motor: String,
    degrees: i32,
}

impl Record for CountReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("motor", self.motor.clone()),
            ("degrees", self.degrees.to_string()),
        ]
    }
}

#[derive(Debug, Serialize)]
struct ReadReport {
    motor: String,
    #[serde(flatten)]
    reading: MotorReading,
}

impl Record for ReadReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("motor", self.motor.clone()),
            ("speed", self.reading.speed.to_string()),
            ("degrees", self.reading.degrees.to_string()),
        ]
    }
}

pub fn run_count(args: MotorArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let motor = session.brick().motor(args.motor);

    if !session.is_live() {
        let component =
            actions::get_count(&motor, None).map_err(|err| codec_error("invalid motor", err))?;
        return session.preview(Request::direct().add_component(component), format);
    }

    let degrees = motor
        .count()
        .map_err(|err| device_error("motor count failed", err))?;
    print_record(
        &CountReport {
            motor: args.motor.to_string(),
            degrees,
        },
        format,
    );
    Ok(SUCCESS)
}

pub fn run_read(args: MotorArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let motor = session.brick().motor(args.motor);

    if !session.is_live() {
        let component =
            actions::read(&motor, None, None).map_err(|err| codec_error("invalid motor", err))?;
        return session.preview(Request::direct().add_component(component), format);
    }

    let reading = motor
        .read()
        .map_err(|err| device_error("motor read failed", err))?;
    print_record(
        &ReadReport {
            motor: args.motor.to_string(),
            reading,
        },
        format,
    );
    Ok(SUCCESS)
}
