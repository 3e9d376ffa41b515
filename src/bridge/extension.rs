//! Extension controllers. Most only report to the log; the classic and pro
//! pads drive keyboard keys.

use crate::bridge::Bridge;
use crate::output::{InputSink, Key};
use crate::wiimote::event::{Abs, DrumPad, DrumsState, KeyEvent, WiiKey};
use crate::wiimote::Controller;
use log::{debug, info};

pub(crate) fn pro_action(key: WiiKey) -> Option<Key> {
    match key {
        WiiKey::A => Some(Key::Right),
        WiiKey::B => Some(Key::Down),
        WiiKey::X => Some(Key::Up),
        WiiKey::Y => Some(Key::Left),
        WiiKey::Left => Some(Key::Letter('a')),
        WiiKey::Right => Some(Key::Letter('d')),
        WiiKey::Up => Some(Key::Letter('w')),
        WiiKey::Down => Some(Key::Letter('s')),
        WiiKey::Tl => Some(Key::Letter('q')),
        WiiKey::Tr => Some(Key::Letter('e')),
        WiiKey::Zl => Some(Key::Space),
        _ => None,
    }
}

fn scale(abs: Abs, factor: i32) -> Abs {
    Abs::new(abs.x.saturating_mul(factor), abs.y.saturating_mul(factor), abs.z)
}

impl<C: Controller, S: InputSink> Bridge<C, S> {
    pub(crate) fn handle_nunchuk_key(&mut self, event: KeyEvent) {
        match event.key {
            WiiKey::C => self.nunchuk.c = event.pressed,
            WiiKey::Z => self.nunchuk.z = event.pressed,
            _ => {}
        }
    }

    pub(crate) fn handle_nunchuk_move(&mut self, stick: Abs, accel: Abs) {
        debug!(
            "[Nunchuk: {:4},{:4}  {:4},{:4},{:4}, {}, {}]",
            stick.x,
            stick.y,
            accel.x,
            accel.y,
            accel.z,
            u8::from(self.nunchuk.c),
            u8::from(self.nunchuk.z)
        );
    }

    /// Shared by the pro controller and the classic controller.
    pub(crate) fn handle_pro_key(&mut self, event: KeyEvent) {
        let KeyEvent { key, pressed } = event;
        match pro_action(key) {
            Some(out) => {
                info!("[KeyEvent (Classic/Pro): {out:?}:{}]", u8::from(pressed));
                self.send_key(out, pressed);
            }
            None => match key {
                WiiKey::Plus
                | WiiKey::Minus
                | WiiKey::Home
                | WiiKey::Zr
                | WiiKey::ThumbL
                | WiiKey::ThumbR => info!("[Pro: {key:?}]"),
                _ => {}
            },
        }
        self.flush();
    }

    /// Classic sticks span a much smaller range than the pro controller's,
    /// so they are scaled up before sharing the pro path.
    pub(crate) fn handle_classic_move(&mut self, left: Abs, right: Abs, triggers: Abs) {
        let factor = self.config.classic_axis_scale;
        handle_pro_move(scale(left, factor), scale(right, factor));
        debug!("[Classic (LT&RT): {:3}, {:3}]", triggers.x, triggers.y);
    }
}

pub(crate) fn handle_pro_move(left: Abs, right: Abs) {
    debug!(
        "[Pro: ({:5}, {:5}) ({:5}, {:5})]",
        left.x, -left.y, right.x, -right.y
    );
}

pub(crate) fn handle_balance_board(weights: [i32; 4]) {
    let [w, x, y, z] = weights;
    debug!("[bboard: {w:4}, {x:4}, {y:4}, {z:4}]");
}

fn guitar_key_name(key: WiiKey) -> Option<&'static str> {
    match key {
        WiiKey::FretFarUp => Some("fret far up"),
        WiiKey::FretUp => Some("fret up"),
        WiiKey::FretMid => Some("fret mid"),
        WiiKey::FretLow => Some("fret low"),
        WiiKey::FretFarLow => Some("fret far low"),
        WiiKey::StrumBarUp => Some("strum bar up"),
        WiiKey::StrumBarDown => Some("strum bar down"),
        WiiKey::Home => Some("home"),
        WiiKey::Plus => Some("plus"),
        _ => None,
    }
}

pub(crate) fn handle_guitar_key(event: KeyEvent) {
    if !event.pressed {
        return;
    }
    if let Some(name) = guitar_key_name(event.key) {
        info!("Guitar key: '{name}'");
    }
}

pub(crate) fn handle_guitar_move(stick: Abs, whammy: i32, fret_bar: i32) {
    debug!(
        "[Guitar: {:4},{:4}   {:4}  {:4}]",
        stick.x, stick.y, whammy, fret_bar
    );
}

pub(crate) fn handle_drums_key(event: KeyEvent) {
    if !event.pressed {
        return;
    }
    match event.key {
        WiiKey::Minus => info!("Drums key: 'minus'"),
        WiiKey::Plus => info!("Drums key: 'plus'"),
        _ => {}
    }
}

pub(crate) fn handle_drums_move(state: &DrumsState) {
    debug!("Drums: pad = ({:3}, {:3})", state.pad.x, state.pad.y);
    for pad in DrumPad::ALL {
        let pressure = state.pressure(pad);
        match pad {
            DrumPad::Bass => debug!("Drums: Bass = {pressure:4}"),
            _ if pressure > 0 => info!("Drums: {} ({pressure})", pad.name()),
            _ => {}
        }
    }
}
