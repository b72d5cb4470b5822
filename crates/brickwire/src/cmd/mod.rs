use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use tracing::debug;

use brickwire_codec::Command as Request;
use brickwire_device::{Brick, MotorSet, PortId};
use brickwire_transport::{Connection, StreamConnection};

use crate::exit::{device_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_preview, FramePreview, OutputFormat};

pub mod buttons;
pub mod files;
pub mod motor;
pub mod port;
pub mod tone;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a tone.
    Tone(ToneArgs),
    /// Print the tacho count of one motor.
    MotorCount(MotorArgs),
    /// Print the speed and tacho degrees of one motor.
    MotorRead(MotorArgs),
    /// Describe the device on a port.
    Port(PortArgs),
    /// Create a directory on the brick.
    Mkdir(PathArgs),
    /// Delete a file or empty directory on the brick.
    Rm(PathArgs),
    /// List a directory on the brick.
    Ls(PathArgs),
    /// Print button changes until interrupted.
    Buttons(ButtonsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, device: Option<&Path>, format: OutputFormat) -> CliResult<i32> {
    if let Command::Version(args) = command {
        return version::run(args);
    }

    let session = Session::open(device)?;
    match command {
        Command::Tone(args) => tone::run(args, &session, format),
        Command::MotorCount(args) => motor::run_count(args, &session, format),
        Command::MotorRead(args) => motor::run_read(args, &session, format),
        Command::Port(args) => port::run(args, &session, format),
        Command::Mkdir(args) => files::run_mkdir(args, &session, format),
        Command::Rm(args) => files::run_rm(args, &session, format),
        Command::Ls(args) => files::run_ls(args, &session, format),
        Command::Buttons(args) => buttons::run(args, &session, format),
        Command::Version(args) => version::run(args),
    }
}

pub type Device = Brick<Box<dyn Connection>>;

/// The brick the command talks to. Without a device path nothing is sent:
/// commands print the frame they would have written.
pub struct Session {
    brick: Device,
    live: bool,
}

impl Session {
    pub fn open(device: Option<&Path>) -> CliResult<Self> {
        let Some(path) = device else {
            let offline: StreamConnection<File> = StreamConnection::new(|| {
                Err(io::Error::new(io::ErrorKind::NotConnected, "no device given"))
            });
            let offline: Box<dyn Connection> = Box::new(offline);
            debug!("no device given, printing frames only");
            return Ok(Self {
                brick: Brick::new(offline),
                live: false,
            });
        };

        let target = path.to_path_buf();
        let connection: Box<dyn Connection> = Box::new(StreamConnection::new(move || {
            OpenOptions::new().read(true).write(true).open(&target)
        }));
        let brick = Brick::new(connection);
        brick
            .connect()
            .map_err(|err| device_error(&format!("failed opening {}", path.display()), err))?;
        debug!(device = %path.display(), "connected");
        Ok(Self { brick, live: true })
    }

    pub fn brick(&self) -> &Device {
        &self.brick
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Print `request` as the dry-run result.
    pub fn preview(&self, request: Request, format: OutputFormat) -> CliResult<i32> {
        print_preview(&FramePreview::of(request)?, format);
        Ok(SUCCESS)
    }
}

#[derive(Args, Debug)]
pub struct ToneArgs {
    /// Volume, 0-100.
    #[arg(long, default_value_t = 50)]
    pub volume: i32,
    /// Frequency in Hz, 0-50000.
    #[arg(long, default_value_t = 1000)]
    pub frequency: i32,
    /// How long to play (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms")]
    pub duration: String,
}

#[derive(Args, Debug)]
pub struct MotorArgs {
    /// Motor port: A, B, C or D.
    pub motor: MotorSet,
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Sensor port 1-4, or motor port A-D.
    pub port: PortId,
    /// Also list the names of every mode the device supports.
    #[arg(long)]
    pub modes: bool,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Path on the brick.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct ButtonsArgs {
    /// Poll interval (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Exit after N button changes.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Path as the brick expects it.
pub fn brick_path(path: &Path) -> CliResult<&str> {
    path.to_str()
        .ok_or_else(|| CliError::new(USAGE, format!("path is not valid UTF-8: {}", path.display())))
}
