//! Display drawing. Nothing appears on screen until [`update`] runs, so
//! callers usually batch several operations and finish with it.

use brickwire_codec::{validate_range, CommandComponent, Result, WireType};

use crate::bytecodes::{draw, opcode};

pub const SCREEN_WIDTH: i32 = 178;
pub const SCREEN_HEIGHT: i32 = 128;

/// Pixel color on the monochrome display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    Background,
    #[default]
    Foreground,
}

impl Color {
    const fn code(self) -> u8 {
        match self {
            Color::Background => 0,
            Color::Foreground => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    #[default]
    Normal,
    Small,
    Large,
}

impl Font {
    const fn code(self) -> u8 {
        match self {
            Font::Normal => 0,
            Font::Small => 1,
            Font::Large => 2,
        }
    }
}

fn base(subcode: u8) -> CommandComponent {
    CommandComponent::detached(opcode::UI_DRAW, Some(subcode))
}

fn x(value: i32, name: &'static str) -> Result<i16> {
    Ok(validate_range(value, name, 0..=SCREEN_WIDTH - 1)? as i16)
}

fn y(value: i32, name: &'static str) -> Result<i16> {
    Ok(validate_range(value, name, 0..=SCREEN_HEIGHT - 1)? as i16)
}

fn extent(value: i32, name: &'static str, max: i32) -> Result<i16> {
    Ok(validate_range(value, name, 0..=max)? as i16)
}

/// Push the drawing buffer to the screen.
pub fn update() -> CommandComponent {
    base(draw::UPDATE)
}

/// Clear the drawing buffer.
pub fn clean() -> CommandComponent {
    base(draw::CLEAN)
}

pub fn pixel(color: Color, px: i32, py: i32) -> Result<CommandComponent> {
    Ok(base(draw::PIXEL)
        .add_parameter(WireType::UByte, color.code())
        .add_parameter(WireType::Short, x(px, "x")?)
        .add_parameter(WireType::Short, y(py, "y")?))
}

pub fn line(color: Color, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<CommandComponent> {
    Ok(base(draw::LINE)
        .add_parameter(WireType::UByte, color.code())
        .add_parameter(WireType::Short, x(x0, "x0")?)
        .add_parameter(WireType::Short, y(y0, "y0")?)
        .add_parameter(WireType::Short, x(x1, "x1")?)
        .add_parameter(WireType::Short, y(y1, "y1")?))
}

pub fn circle(color: Color, cx: i32, cy: i32, radius: i32) -> Result<CommandComponent> {
    round(draw::CIRCLE, color, cx, cy, radius)
}

pub fn fill_circle(color: Color, cx: i32, cy: i32, radius: i32) -> Result<CommandComponent> {
    round(draw::FILLCIRCLE, color, cx, cy, radius)
}

fn round(subcode: u8, color: Color, cx: i32, cy: i32, radius: i32) -> Result<CommandComponent> {
    Ok(base(subcode)
        .add_parameter(WireType::UByte, color.code())
        .add_parameter(WireType::Short, x(cx, "x")?)
        .add_parameter(WireType::Short, y(cy, "y")?)
        .add_parameter(WireType::Short, extent(radius, "radius", SCREEN_WIDTH)?))
}

pub fn rect(color: Color, rx: i32, ry: i32, width: i32, height: i32) -> Result<CommandComponent> {
    boxed(draw::RECT, color, rx, ry, width, height)
}

pub fn fill_rect(color: Color, rx: i32, ry: i32, width: i32, height: i32) -> Result<CommandComponent> {
    boxed(draw::FILLRECT, color, rx, ry, width, height)
}

/// Invert every pixel inside the rectangle.
pub fn inverse_rect(rx: i32, ry: i32, width: i32, height: i32) -> Result<CommandComponent> {
    Ok(base(draw::INVERSERECT)
        .add_parameter(WireType::Short, x(rx, "x")?)
        .add_parameter(WireType::Short, y(ry, "y")?)
        .add_parameter(WireType::Short, extent(width, "width", SCREEN_WIDTH)?)
        .add_parameter(WireType::Short, extent(height, "height", SCREEN_HEIGHT)?))
}

fn boxed(subcode: u8, color: Color, rx: i32, ry: i32, width: i32, height: i32) -> Result<CommandComponent> {
    Ok(base(subcode)
        .add_parameter(WireType::UByte, color.code())
        .add_parameter(WireType::Short, x(rx, "x")?)
        .add_parameter(WireType::Short, y(ry, "y")?)
        .add_parameter(WireType::Short, extent(width, "width", SCREEN_WIDTH)?)
        .add_parameter(WireType::Short, extent(height, "height", SCREEN_HEIGHT)?))
}

pub fn text(color: Color, tx: i32, ty: i32, text: &str) -> Result<CommandComponent> {
    Ok(base(draw::TEXT)
        .add_parameter(WireType::UByte, color.code())
        .add_parameter(WireType::Short, x(tx, "x")?)
        .add_parameter(WireType::Short, y(ty, "y")?)
        .add_parameter(WireType::String, text))
}

pub fn select_font(font: Font) -> CommandComponent {
    base(draw::SELECT_FONT).add_parameter(WireType::UByte, font.code())
}

/// Fill rows `start_y` through `start_y + rows` with `color`.
pub fn fill_window(color: Color, start_y: i32, rows: i32) -> Result<CommandComponent> {
    Ok(base(draw::FILLWINDOW)
        .add_parameter(WireType::UByte, color.code())
        .add_parameter(WireType::Short, y(start_y, "y")?)
        .add_parameter(WireType::Short, extent(rows, "rows", SCREEN_HEIGHT)?))
}

/// Show or hide the status bar at the top of the screen.
pub fn top_line(enabled: bool) -> CommandComponent {
    base(draw::TOPLINE).add_parameter(WireType::Boolean, enabled)
}
