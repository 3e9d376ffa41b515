use crate::output::{InputSink, Key, PointerButton};
use anyhow::{Context, Result};
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use log::{info, trace};

/// Synthetic input for an X11 session, backed by the XTest extension.
///
/// A sink that failed to connect stays usable and drops every action.
pub struct X11Sink {
    enigo: Option<Enigo>,
    screen: (i32, i32),
}

impl X11Sink {
    /// Connects to `display`, or to `$DISPLAY` when none is given.
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let settings = Settings {
            x11_display: display.map(str::to_string),
            ..Settings::default()
        };
        let enigo = Enigo::new(&settings).context("Cannot open display")?;
        let screen = enigo
            .main_display()
            .context("Cannot query screen size")?;
        info!("Display ready: {}x{}", screen.0, screen.1);
        Ok(Self {
            enigo: Some(enigo),
            screen,
        })
    }

    pub fn disconnected() -> Self {
        Self {
            enigo: None,
            screen: (0, 0),
        }
    }

    fn enigo(&mut self) -> Option<&mut Enigo> {
        if self.enigo.is_none() {
            trace!("no display connection, dropping synthetic input");
        }
        self.enigo.as_mut()
    }
}

fn direction(pressed: bool) -> Direction {
    if pressed {
        Direction::Press
    } else {
        Direction::Release
    }
}

fn enigo_key(key: Key) -> enigo::Key {
    match key {
        Key::Left => enigo::Key::LeftArrow,
        Key::Right => enigo::Key::RightArrow,
        Key::Up => enigo::Key::UpArrow,
        Key::Down => enigo::Key::DownArrow,
        Key::Return => enigo::Key::Return,
        Key::BackSpace => enigo::Key::Backspace,
        Key::Escape => enigo::Key::Escape,
        Key::Minus => enigo::Key::Unicode('-'),
        Key::Equal => enigo::Key::Unicode('='),
        Key::Space => enigo::Key::Space,
        Key::Letter(c) => enigo::Key::Unicode(c),
    }
}

impl InputSink for X11Sink {
    fn key(&mut self, key: Key, pressed: bool) -> Result<()> {
        if let Some(enigo) = self.enigo() {
            enigo
                .key(enigo_key(key), direction(pressed))
                .with_context(|| format!("fake key event {key:?} failed"))?;
        }
        Ok(())
    }

    fn button(&mut self, button: PointerButton, pressed: bool) -> Result<()> {
        let button = match button {
            PointerButton::Left => Button::Left,
            PointerButton::Right => Button::Right,
        };
        if let Some(enigo) = self.enigo() {
            enigo
                .button(button, direction(pressed))
                .with_context(|| format!("fake button event {button:?} failed"))?;
        }
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        if let Some(enigo) = self.enigo() {
            enigo
                .move_mouse(x, y, Coordinate::Abs)
                .with_context(|| format!("fake motion event to ({x},{y}) failed"))?;
        }
        Ok(())
    }

    /// enigo flushes the X connection after each request, so there is
    /// nothing left to push here.
    fn flush(&mut self) -> Result<()> {
        trace!("flush");
        Ok(())
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_sink_drops_actions() {
        let mut sink = X11Sink::disconnected();
        assert_eq!(sink.screen_size(), (0, 0));
        assert!(sink.key(Key::Return, true).is_ok());
        assert!(sink.button(PointerButton::Left, false).is_ok());
        assert!(sink.move_to(10, 10).is_ok());
        assert!(sink.flush().is_ok());
    }

    #[test]
    fn keys_map_to_enigo_names() {
        assert_eq!(enigo_key(Key::BackSpace), enigo::Key::Backspace);
        assert_eq!(enigo_key(Key::Equal), enigo::Key::Unicode('='));
        assert_eq!(enigo_key(Key::Letter('p')), enigo::Key::Unicode('p'));
    }
}
