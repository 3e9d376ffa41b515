//! Translation for the remote itself: buttons, IR pointer and Motion Plus.

use crate::bridge::Bridge;
use crate::config::Config;
use crate::output::{InputSink, Key, PointerButton};
use crate::state::mode::Mode;
use crate::wiimote::event::{Abs, KeyEvent, WiiKey, IR_POINTS};
use crate::wiimote::Controller;
use log::{debug, info, warn};

const MAX_IR_POINTS: usize = 2;
const MP_NORMALIZE_FACTOR: i32 = 50;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum KeyAction {
    Key(Key),
    Pointer(PointerButton),
    NextMode,
    Nothing,
    Unknown,
}

pub(crate) fn primary_action(mode: Mode, key: WiiKey) -> KeyAction {
    match key {
        WiiKey::Left => KeyAction::Key(Key::Left),
        WiiKey::Right => KeyAction::Key(Key::Right),
        WiiKey::Up => KeyAction::Key(Key::Up),
        WiiKey::Down => KeyAction::Key(Key::Down),
        WiiKey::A => match mode.get() {
            1 => KeyAction::Key(Key::Return),
            2 => KeyAction::Pointer(PointerButton::Left),
            _ => KeyAction::Nothing,
        },
        WiiKey::B => match mode.get() {
            1 => KeyAction::Key(Key::BackSpace),
            2 => KeyAction::Pointer(PointerButton::Right),
            _ => KeyAction::Nothing,
        },
        WiiKey::Home => KeyAction::Key(Key::Escape),
        WiiKey::Minus => KeyAction::Key(Key::Minus),
        WiiKey::Plus => KeyAction::Key(Key::Equal),
        WiiKey::One => KeyAction::Key(Key::Letter('p')),
        WiiKey::Two => KeyAction::NextMode,
        _ => KeyAction::Unknown,
    }
}

/// Accepts up to two tracked points in scan order.
pub(crate) fn select_ir_points(points: &[Abs; IR_POINTS]) -> Vec<Abs> {
    points
        .iter()
        .filter(|point| point.is_valid_ir() && point.x != 0 && point.y != 0)
        .take(MAX_IR_POINTS)
        .copied()
        .collect()
}

/// Maps a raw IR point onto the screen. The camera sees the scene mirrored,
/// so x is flipped.
pub(crate) fn project_ir(point: Abs, screen: (i32, i32), config: &Config) -> (i32, i32) {
    let width = f64::from(screen.0 + config.ir_edge_offset);
    let height = f64::from(screen.1);
    let x = width - f64::from(point.x) * (width / config.ir_range_x);
    let y = f64::from(point.y) * (height / config.ir_range_y);
    (x as i32, y as i32)
}

impl<C: Controller, S: InputSink> Bridge<C, S> {
    pub(crate) fn handle_key(&mut self, event: KeyEvent) {
        let KeyEvent { key, pressed } = event;
        match primary_action(self.state.mode, key) {
            KeyAction::Key(out) => {
                info!("[KeyEvent (Main): {out:?}:{}]", u8::from(pressed));
                self.send_key(out, pressed);
            }
            KeyAction::Pointer(button) => self.send_button(button, pressed),
            KeyAction::NextMode => {
                if pressed {
                    self.state.advance_mode(&mut self.device);
                }
                if let Err(err) = self.device.rumble(pressed) {
                    warn!("Cannot toggle rumble: {err:#}");
                }
            }
            KeyAction::Nothing => {}
            KeyAction::Unknown => info!("Unknown keycode! '{key:?}'"),
        }
        self.flush();
    }

    pub(crate) fn handle_ir(&mut self, points: &[Abs; IR_POINTS]) {
        let accepted = select_ir_points(points);
        let seen: Vec<String> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_valid_ir() && p.x != 0 && p.y != 0)
            .map(|(i, p)| format!("IR{}: ({},{})", i + 1, p.x, p.y))
            .collect();
        debug!("{}", seen.join(" "));

        let Some(first) = accepted.first() else {
            return;
        };
        if self.state.mode.get() != 2 {
            return;
        }
        let (x, y) = project_ir(*first, self.sink.screen_size(), &self.config);
        if let Err(err) = self.sink.move_to(x, y) {
            warn!("{err:#}");
        }
        self.flush();
    }

    pub(crate) fn handle_motion_plus(&mut self, sample: Abs) {
        if self.calibrating {
            let mut norm = self.device.mp_normalization();
            norm.x += sample.x;
            norm.y += sample.y;
            norm.z += sample.z;
            self.device.set_mp_normalization(norm);

            // The gyro reports huge values for a second or two after power-up.
            let limit = self.config.mp_threshold.unsigned_abs();
            if [sample.x, sample.y, sample.z]
                .iter()
                .all(|v| v.unsigned_abs() < limit)
            {
                self.calibrating = false;
                info!("Motion Plus calibrated: ({}:{}:{})", norm.x, norm.y, norm.z);
            }
        }

        debug!(
            "[MP: {:6}, {:6}, {:6}]",
            sample.x as i16, sample.y as i16, sample.z as i16
        );
    }

    pub(crate) fn toggle_mp_normalization(&mut self) {
        let mut norm = self.device.mp_normalization();
        if norm.factor == 0 {
            norm.factor = MP_NORMALIZE_FACTOR;
            info!("Enable MP Norm: ({}:{}:{})", norm.x, norm.y, norm.z);
        } else {
            norm.factor = 0;
            info!("Disable MP Norm: ({}:{}:{})", norm.x, norm.y, norm.z);
        }
        self.device.set_mp_normalization(norm);
    }
}
