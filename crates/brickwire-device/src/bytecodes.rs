//! Opcode, subcode and status tables of the brick firmware.

use serde::Serialize;

/// Direct command opcodes.
pub mod opcode {
    /// Read the state of a hardware button.
    pub const UI_BUTTON: u8 = 0x83;
    /// Draw on the display.
    pub const UI_DRAW: u8 = 0x84;
    /// Sound output.
    pub const SOUND: u8 = 0x94;
    /// Non-zero while a sound is playing.
    pub const SOUND_TEST: u8 = 0x95;
    /// Types of all connected devices.
    pub const INPUT_DEVICE_LIST: u8 = 0x98;
    /// Sensor queries, selected by an input subcode.
    pub const INPUT_DEVICE: u8 = 0x99;
    pub const OUTPUT_RESET: u8 = 0xA2;
    pub const OUTPUT_STOP: u8 = 0xA3;
    pub const OUTPUT_POWER: u8 = 0xA4;
    pub const OUTPUT_SPEED: u8 = 0xA5;
    pub const OUTPUT_START: u8 = 0xA6;
    pub const OUTPUT_POLARITY: u8 = 0xA7;
    pub const OUTPUT_READ: u8 = 0xA8;
    pub const OUTPUT_TEST: u8 = 0xA9;
    pub const OUTPUT_READY: u8 = 0xAA;
    pub const OUTPUT_STEP_POWER: u8 = 0xAC;
    pub const OUTPUT_TIME_POWER: u8 = 0xAD;
    pub const OUTPUT_STEP_SPEED: u8 = 0xAE;
    pub const OUTPUT_TIME_SPEED: u8 = 0xAF;
    pub const OUTPUT_STEP_SYNC: u8 = 0xB0;
    pub const OUTPUT_TIME_SYNC: u8 = 0xB1;
    pub const OUTPUT_CLR_COUNT: u8 = 0xB2;
    pub const OUTPUT_GET_COUNT: u8 = 0xB3;
}

/// Subcodes of [`opcode::SOUND`].
pub mod sound {
    pub const BREAK: u8 = 0x00;
    pub const TONE: u8 = 0x01;
    pub const PLAY: u8 = 0x02;
    pub const REPEAT: u8 = 0x03;
}

/// Subcodes of [`opcode::UI_BUTTON`].
pub mod button {
    pub const PRESSED: u8 = 0x09;
}

/// Subcodes of [`opcode::INPUT_DEVICE`].
pub mod input {
    pub const GET_TYPEMODE: u8 = 0x05;
    pub const GET_RAW: u8 = 0x0B;
    pub const GET_NAME: u8 = 0x15;
    pub const GET_MODENAME: u8 = 0x16;
    pub const GET_CHANGES: u8 = 0x19;
    pub const CLR_CHANGES: u8 = 0x1A;
    pub const READY_PCT: u8 = 0x1B;
    pub const READY_RAW: u8 = 0x1C;
    pub const READY_SI: u8 = 0x1D;
    pub const GET_MINMAX: u8 = 0x1E;
    pub const GET_BUMPS: u8 = 0x1F;
}

/// Subcodes of [`opcode::UI_DRAW`].
pub mod draw {
    pub const UPDATE: u8 = 0x00;
    pub const CLEAN: u8 = 0x01;
    pub const PIXEL: u8 = 0x02;
    pub const LINE: u8 = 0x03;
    pub const CIRCLE: u8 = 0x04;
    pub const TEXT: u8 = 0x05;
    pub const FILLRECT: u8 = 0x09;
    pub const RECT: u8 = 0x0A;
    pub const INVERSERECT: u8 = 0x10;
    pub const SELECT_FONT: u8 = 0x11;
    pub const TOPLINE: u8 = 0x12;
    pub const FILLWINDOW: u8 = 0x13;
    pub const FILLCIRCLE: u8 = 0x18;
}

/// System command opcodes and reply status codes.
pub mod system {
    pub const LIST_FILES: u8 = 0x99;
    pub const CONTINUE_LIST_FILES: u8 = 0x9A;
    pub const CREATE_DIR: u8 = 0x9B;
    pub const DELETE_FILE: u8 = 0x9C;

    pub const SUCCESS: u8 = 0x00;
    pub const UNKNOWN_HANDLE: u8 = 0x01;
    pub const HANDLE_NOT_READY: u8 = 0x02;
    pub const CORRUPT_FILE: u8 = 0x03;
    pub const NO_HANDLES_AVAILABLE: u8 = 0x04;
    pub const NO_PERMISSION: u8 = 0x05;
    pub const ILLEGAL_PATH: u8 = 0x06;
    pub const FILE_EXISTS: u8 = 0x07;
    pub const END_OF_FILE: u8 = 0x08;
    pub const SIZE_ERROR: u8 = 0x09;
    pub const UNKNOWN_ERROR: u8 = 0x0A;
    pub const ILLEGAL_FILENAME: u8 = 0x0B;
    pub const ILLEGAL_CONNECTION: u8 = 0x0C;

    /// Human-readable name for a system reply status.
    pub fn status_name(status: u8) -> &'static str {
        match status {
            SUCCESS => "success",
            UNKNOWN_HANDLE => "unknown handle",
            HANDLE_NOT_READY => "handle not ready",
            CORRUPT_FILE => "corrupt file",
            NO_HANDLES_AVAILABLE => "no handles available",
            NO_PERMISSION => "no permission",
            ILLEGAL_PATH => "illegal path",
            FILE_EXISTS => "file exists",
            END_OF_FILE => "end of file",
            SIZE_ERROR => "size error",
            UNKNOWN_ERROR => "unknown error",
            ILLEGAL_FILENAME => "illegal filename",
            ILLEGAL_CONNECTION => "illegal connection",
            _ => "unrecognized status",
        }
    }
}

/// Device type codes reported by the input subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    NxtTouch,
    NxtLight,
    NxtSound,
    NxtColor,
    NxtUltrasonic,
    NxtTemperature,
    LargeMotor,
    MediumMotor,
    Ev3Touch,
    Ev3Color,
    Ev3Ultrasonic,
    Ev3Gyro,
    Ev3Infrared,
    EnergyMeter,
    I2c,
    Terminal,
    Unknown,
    /// Nothing connected.
    None,
    /// Port error, usually a device that is still initializing.
    Error,
    /// A code outside the known table.
    Other(u8),
}

impl DeviceType {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => DeviceType::NxtTouch,
            2 => DeviceType::NxtLight,
            3 => DeviceType::NxtSound,
            4 => DeviceType::NxtColor,
            5 => DeviceType::NxtUltrasonic,
            6 => DeviceType::NxtTemperature,
            7 => DeviceType::LargeMotor,
            8 => DeviceType::MediumMotor,
            16 => DeviceType::Ev3Touch,
            29 => DeviceType::Ev3Color,
            30 => DeviceType::Ev3Ultrasonic,
            32 => DeviceType::Ev3Gyro,
            33 => DeviceType::Ev3Infrared,
            99 => DeviceType::EnergyMeter,
            100 => DeviceType::I2c,
            124 => DeviceType::Terminal,
            125 => DeviceType::Unknown,
            126 => DeviceType::None,
            127 => DeviceType::Error,
            other => DeviceType::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            DeviceType::NxtTouch => 1,
            DeviceType::NxtLight => 2,
            DeviceType::NxtSound => 3,
            DeviceType::NxtColor => 4,
            DeviceType::NxtUltrasonic => 5,
            DeviceType::NxtTemperature => 6,
            DeviceType::LargeMotor => 7,
            DeviceType::MediumMotor => 8,
            DeviceType::Ev3Touch => 16,
            DeviceType::Ev3Color => 29,
            DeviceType::Ev3Ultrasonic => 30,
            DeviceType::Ev3Gyro => 32,
            DeviceType::Ev3Infrared => 33,
            DeviceType::EnergyMeter => 99,
            DeviceType::I2c => 100,
            DeviceType::Terminal => 124,
            DeviceType::Unknown => 125,
            DeviceType::None => 126,
            DeviceType::Error => 127,
            DeviceType::Other(code) => code,
        }
    }

    pub fn is_connected(self) -> bool {
        !matches!(self, DeviceType::None | DeviceType::Error)
    }
}
