use serde::Serialize;
use tracing::info;

use brickwire_codec::Command as Request;
use brickwire_device::actions::sound;

use crate::cmd::{parse_duration, Session, ToneArgs};
use crate::exit::{codec_error, device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

#[derive(Debug, Serialize)]
struct ToneReport {
    volume: i32,
    frequency: i32,
    duration_ms: i64,
}

impl Record for ToneReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("volume", self.volume.to_string()),
            ("frequency", self.frequency.to_string()),
            ("duration_ms", self.duration_ms.to_string()),
        ]
    }
}

pub fn run(args: ToneArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let duration_ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);

    if !session.is_live() {
        let component = sound::tone(args.volume, args.frequency, duration_ms)
            .map_err(|err| codec_error("invalid tone", err))?;
        return session.preview(Request::direct().add_component(component), format);
    }

    session
        .brick()
        .play_tone(args.volume, args.frequency, duration_ms)
        .map_err(|err| device_error("tone failed", err))?;
    info!(frequency = args.frequency, duration_ms, "tone sent");

    print_record(
        &ToneReport {
            volume: args.volume,
            frequency: args.frequency,
            duration_ms,
        },
        format,
    );
    Ok(SUCCESS)
}
