mod x11;

use anyhow::Result;

pub use x11::X11Sink;

/// Keyboard keys the bridge can synthesize.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Return,
    BackSpace,
    Escape,
    Minus,
    Equal,
    Space,
    Letter(char),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PointerButton {
    Left,
    Right,
}

/// Destination for synthetic input.
///
/// Calls may be buffered until `flush`.
pub trait InputSink {
    fn key(&mut self, key: Key, pressed: bool) -> Result<()>;
    fn button(&mut self, button: PointerButton, pressed: bool) -> Result<()>;
    /// Warps the pointer to absolute screen coordinates.
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    /// Screen width and height in pixels.
    fn screen_size(&self) -> (i32, i32);
}
