//! Identifiers for motors, buttons and sensor ports.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use brickwire_codec::{validate_range, ValidationError};

/// One or more output ports as a bit field: A=1, B=2, C=4, D=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MotorSet(u8);

impl MotorSet {
    pub const A: MotorSet = MotorSet(0x01);
    pub const B: MotorSet = MotorSet(0x02);
    pub const C: MotorSet = MotorSet(0x04);
    pub const D: MotorSet = MotorSet(0x08);
    pub const AD: MotorSet = MotorSet(0x09);
    pub const BC: MotorSet = MotorSet(0x06);
    pub const ALL: MotorSet = MotorSet(0x0F);

    pub fn new(bits: u8) -> Result<Self, ValidationError> {
        validate_range(bits, "motor", 0x01..=0x0F).map(MotorSet)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when exactly one port is selected.
    pub const fn is_single(self) -> bool {
        self.0.is_power_of_two()
    }

    /// Port index (A=0 .. D=3) of a single-motor set.
    pub fn index(self) -> Option<u8> {
        self.is_single().then(|| self.0.trailing_zeros() as u8)
    }

    pub const fn union(self, other: MotorSet) -> MotorSet {
        MotorSet(self.0 | other.0)
    }
}

impl std::ops::BitOr for MotorSet {
    type Output = MotorSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for MotorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (bit, name) in [(0x01, 'A'), (0x02, 'B'), (0x04, 'C'), (0x08, 'D')] {
            if self.0 & bit != 0 {
                write!(f, "{name}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for MotorSet {
    type Err = ValidationError;

    /// Parses letter sets such as `a`, `BC` or `abcd`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = 0u8;
        for ch in s.chars() {
            bits |= match ch.to_ascii_uppercase() {
                'A' => 0x01,
                'B' => 0x02,
                'C' => 0x04,
                'D' => 0x08,
                _ => {
                    return Err(ValidationError::NotAMember {
                        name: "motor",
                        value: format!("{s:?}"),
                        allowed: "letters A, B, C, D".to_string(),
                    })
                }
            };
        }
        MotorSet::new(bits)
    }
}

/// Hardware buttons on the brick face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    Up,
    Enter,
    Down,
    Right,
    Left,
    Back,
}

impl ButtonId {
    pub const ALL: [ButtonId; 6] = [
        ButtonId::Up,
        ButtonId::Enter,
        ButtonId::Down,
        ButtonId::Right,
        ButtonId::Left,
        ButtonId::Back,
    ];

    pub const fn code(self) -> u8 {
        match self {
            ButtonId::Up => 1,
            ButtonId::Enter => 2,
            ButtonId::Down => 3,
            ButtonId::Right => 4,
            ButtonId::Left => 5,
            ButtonId::Back => 6,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ButtonId::Up => "up",
            ButtonId::Enter => "enter",
            ButtonId::Down => "down",
            ButtonId::Right => "right",
            ButtonId::Left => "left",
            ButtonId::Back => "back",
        }
    }
}

impl TryFrom<u8> for ButtonId {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let index = validate_range(code, "button", 1..=6)?;
        Ok(ButtonId::ALL[usize::from(index - 1)])
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sensor ports 1-4 and the motor ports A-D read as inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortId {
    One,
    Two,
    Three,
    Four,
    A,
    B,
    C,
    D,
}

impl PortId {
    pub const fn code(self) -> u8 {
        match self {
            PortId::One => 0x00,
            PortId::Two => 0x01,
            PortId::Three => 0x02,
            PortId::Four => 0x03,
            PortId::A => 0x10,
            PortId::B => 0x11,
            PortId::C => 0x12,
            PortId::D => 0x13,
        }
    }
}

impl TryFrom<u8> for PortId {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(PortId::One),
            0x01 => Ok(PortId::Two),
            0x02 => Ok(PortId::Three),
            0x03 => Ok(PortId::Four),
            0x10 => Ok(PortId::A),
            0x11 => Ok(PortId::B),
            0x12 => Ok(PortId::C),
            0x13 => Ok(PortId::D),
            other => Err(ValidationError::NotAMember {
                name: "port",
                value: format!("0x{other:02X}"),
                allowed: "0x00..0x03, 0x10..0x13".to_string(),
            }),
        }
    }
}

impl FromStr for PortId {
    type Err = ValidationError;

    /// Accepts `1`-`4` for sensor ports and `a`-`d` for motor ports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" => Ok(PortId::One),
            "2" => Ok(PortId::Two),
            "3" => Ok(PortId::Three),
            "4" => Ok(PortId::Four),
            "a" => Ok(PortId::A),
            "b" => Ok(PortId::B),
            "c" => Ok(PortId::C),
            "d" => Ok(PortId::D),
            _ => Err(ValidationError::NotAMember {
                name: "port",
                value: format!("{s:?}"),
                allowed: "1, 2, 3, 4, a, b, c, d".to_string(),
            }),
        }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortId::One => "1",
            PortId::Two => "2",
            PortId::Three => "3",
            PortId::Four => "4",
            PortId::A => "A",
            PortId::B => "B",
            PortId::C => "C",
            PortId::D => "D",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_set_bits() {
        assert_eq!((MotorSet::A | MotorSet::D), MotorSet::AD);
        assert!(MotorSet::C.is_single());
        assert!(!MotorSet::BC.is_single());
        assert_eq!(MotorSet::D.index(), Some(3));
        assert_eq!(MotorSet::BC.index(), None);
        assert!(MotorSet::new(0).is_err());
        assert!(MotorSet::new(0x10).is_err());
    }

    #[test]
    fn motor_set_parsing_and_display() {
        assert_eq!("bc".parse::<MotorSet>().expect("bc is valid"), MotorSet::BC);
        assert_eq!("DA".parse::<MotorSet>().expect("da is valid").to_string(), "AD");
        assert!("e".parse::<MotorSet>().is_err());
        assert!("".parse::<MotorSet>().is_err());
    }

    #[test]
    fn button_codes() {
        assert_eq!(ButtonId::Up.code(), 1);
        assert_eq!(ButtonId::Back.code(), 6);
        assert_eq!(ButtonId::try_from(4).expect("4 is a button"), ButtonId::Right);
        assert!(ButtonId::try_from(0).is_err());
        assert!(ButtonId::try_from(7).is_err());
    }

    #[test]
    fn port_codes() {
        assert_eq!(PortId::Four.code(), 0x03);
        assert_eq!(PortId::A.code(), 0x10);
        assert_eq!(PortId::try_from(0x12).expect("0x12 is port C"), PortId::C);
        assert!(PortId::try_from(0x04).is_err());
        assert_eq!("b".parse::<PortId>().expect("b is a port"), PortId::B);
        assert_eq!(PortId::Two.to_string(), "2");
    }
}
