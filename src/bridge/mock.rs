use crate::output::{InputSink, Key, PointerButton};
use crate::wiimote::event::WiiEvent;
use crate::wiimote::{Controller, MpNormalization, LED_COUNT};
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

#[derive(Default)]
pub struct MockController {
    pub leds: [bool; LED_COUNT],
    pub fail_leds: bool,
    pub battery: Option<u8>,
    pub devtype: Option<String>,
    pub extension: Option<String>,
    pub rumble: Vec<bool>,
    pub mp: MpNormalization,
    pub opened: usize,
    pub fail_open: bool,
    pub events: VecDeque<io::Result<Option<WiiEvent>>>,
    /// Descriptor the dispatcher polls in place of the epoll set.
    pub wake: Option<OwnedFd>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl Controller for MockController {
    fn led(&self, n: usize) -> Result<bool> {
        if self.fail_leds {
            return Err(anyhow!("LED {n} unreadable"));
        }
        Ok(self.leds[n - 1])
    }

    fn set_led(&mut self, n: usize, on: bool) -> Result<()> {
        if self.fail_leds {
            return Err(anyhow!("LED {n} unwritable"));
        }
        self.leds[n - 1] = on;
        Ok(())
    }

    fn battery(&self) -> Result<u8> {
        self.calls.borrow_mut().push("battery");
        self.battery.ok_or_else(|| anyhow!("no battery"))
    }

    fn devtype(&self) -> Result<String> {
        self.devtype.clone().ok_or_else(|| anyhow!("no devtype"))
    }

    fn extension(&self) -> Result<String> {
        self.extension.clone().ok_or_else(|| anyhow!("no extension"))
    }

    fn rumble(&mut self, on: bool) -> Result<()> {
        self.rumble.push(on);
        Ok(())
    }

    fn mp_normalization(&self) -> MpNormalization {
        self.mp
    }

    fn set_mp_normalization(&mut self, norm: MpNormalization) {
        self.mp = norm;
    }

    fn open_available(&mut self) -> Result<()> {
        self.opened += 1;
        self.calls.borrow_mut().push("open");
        if self.fail_open {
            return Err(anyhow!("permission denied"));
        }
        Ok(())
    }

    fn watch(&mut self, _enable: bool) -> Result<()> {
        Ok(())
    }

    fn dispatch(&mut self) -> io::Result<Option<WiiEvent>> {
        self.events.pop_front().unwrap_or(Ok(None))
    }
}

impl AsFd for MockController {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.wake.as_ref().expect("mock has no wake descriptor").as_fd()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Key(Key, bool),
    Button(PointerButton, bool),
    Move(i32, i32),
    Flush,
}

pub struct RecordingSink {
    pub actions: Vec<Action>,
    pub screen: (i32, i32),
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            screen: (1920, 1080),
        }
    }
}

impl RecordingSink {
    pub fn take(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }
}

impl InputSink for RecordingSink {
    fn key(&mut self, key: Key, pressed: bool) -> Result<()> {
        self.actions.push(Action::Key(key, pressed));
        Ok(())
    }

    fn button(&mut self, button: PointerButton, pressed: bool) -> Result<()> {
        self.actions.push(Action::Button(button, pressed));
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.actions.push(Action::Move(x, y));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.actions.push(Action::Flush);
        Ok(())
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}
