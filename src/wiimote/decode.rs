use crate::wiimote::event::{Abs, DrumsState, KeyEvent, WiiEvent, WiiKey};
use crate::wiimote::InterfaceKind;
use evdev::{AbsoluteAxisType, EventType, InputEvent, InputEventKind, Key};
use log::trace;

const SLOTS: usize = 8;
const SYN_REPORT: u16 = 0;

#[derive(Copy, Clone, Debug)]
enum Component {
    X,
    Y,
    Z,
}

/// Turns the evdev stream of one wiimote interface into `WiiEvent`s.
///
/// Keys are reported as soon as they arrive. Axis updates are collected
/// until the next `SYN_REPORT`. The kernel only reports axes that changed,
/// so the last value of every axis is kept between reports.
pub struct Decoder {
    kind: InterfaceKind,
    slots: [Abs; SLOTS],
    dirty: bool,
}

impl Decoder {
    pub fn new(kind: InterfaceKind) -> Self {
        let mut slots = [Abs::default(); SLOTS];
        if kind == InterfaceKind::Ir {
            slots[..4].fill(Abs::ir_invalid());
        }
        Self {
            kind,
            slots,
            dirty: false,
        }
    }

    pub fn decode(&mut self, event: InputEvent) -> Option<WiiEvent> {
        match event.kind() {
            InputEventKind::Key(key) => {
                let Some(key) = map_key(self.kind, key) else {
                    trace!("{:?}: ignoring key code {}", self.kind, event.code());
                    return None;
                };
                self.key_event(KeyEvent {
                    key,
                    pressed: event.value() != 0,
                })
            }
            InputEventKind::AbsAxis(axis) => {
                if let Some((slot, component)) = abs_slot(self.kind, axis) {
                    let abs = &mut self.slots[slot];
                    match component {
                        Component::X => abs.x = event.value(),
                        Component::Y => abs.y = event.value(),
                        Component::Z => abs.z = event.value(),
                    }
                    self.dirty = true;
                }
                None
            }
            _ if event.event_type() == EventType::SYNCHRONIZATION && event.code() == SYN_REPORT => {
                self.flush()
            }
            _ => None,
        }
    }

    fn key_event(&self, key: KeyEvent) -> Option<WiiEvent> {
        match self.kind {
            InterfaceKind::Core => Some(WiiEvent::Key(key)),
            InterfaceKind::Nunchuk => Some(WiiEvent::NunchukKey(key)),
            InterfaceKind::Classic => Some(WiiEvent::ClassicKey(key)),
            InterfaceKind::Pro => Some(WiiEvent::ProKey(key)),
            InterfaceKind::Guitar => Some(WiiEvent::GuitarKey(key)),
            InterfaceKind::Drums => Some(WiiEvent::DrumsKey(key)),
            _ => None,
        }
    }

    fn flush(&mut self) -> Option<WiiEvent> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }

        let s = &self.slots;
        let event = match self.kind {
            InterfaceKind::Core => return None,
            InterfaceKind::Accel => WiiEvent::Accel(s[0]),
            InterfaceKind::Ir => WiiEvent::Ir([s[0], s[1], s[2], s[3]]),
            InterfaceKind::MotionPlus => WiiEvent::MotionPlus(s[0]),
            InterfaceKind::Nunchuk => WiiEvent::NunchukMove {
                stick: s[0],
                accel: s[1],
            },
            InterfaceKind::Classic => WiiEvent::ClassicMove {
                left: s[0],
                right: s[1],
                triggers: s[2],
            },
            InterfaceKind::BalanceBoard => {
                WiiEvent::BalanceBoard([s[0].x, s[1].x, s[2].x, s[3].x])
            }
            InterfaceKind::Pro => WiiEvent::ProMove {
                left: s[0],
                right: s[1],
            },
            InterfaceKind::Guitar => WiiEvent::GuitarMove {
                stick: s[0],
                whammy: s[1].x,
                fret_bar: s[2].x,
            },
            InterfaceKind::Drums => {
                let mut state = DrumsState {
                    pad: s[0],
                    ..DrumsState::default()
                };
                for (pressure, slot) in state.pressure.iter_mut().zip(&s[1..]) {
                    *pressure = slot.x;
                }
                WiiEvent::DrumsMove(state)
            }
        };
        Some(event)
    }
}

fn map_key(kind: InterfaceKind, key: Key) -> Option<WiiKey> {
    match kind {
        InterfaceKind::Core => match key {
            Key::KEY_LEFT => Some(WiiKey::Left),
            Key::KEY_RIGHT => Some(WiiKey::Right),
            Key::KEY_UP => Some(WiiKey::Up),
            Key::KEY_DOWN => Some(WiiKey::Down),
            Key::KEY_NEXT => Some(WiiKey::Plus),
            Key::KEY_PREVIOUS => Some(WiiKey::Minus),
            Key::BTN_1 => Some(WiiKey::One),
            Key::BTN_2 => Some(WiiKey::Two),
            Key::BTN_SOUTH => Some(WiiKey::A),
            Key::BTN_EAST => Some(WiiKey::B),
            Key::BTN_MODE => Some(WiiKey::Home),
            _ => None,
        },
        InterfaceKind::Nunchuk => match key {
            Key::BTN_C => Some(WiiKey::C),
            Key::BTN_Z => Some(WiiKey::Z),
            _ => None,
        },
        InterfaceKind::Classic => match key {
            Key::BTN_SOUTH => Some(WiiKey::A),
            Key::BTN_EAST => Some(WiiKey::B),
            Key::BTN_NORTH => Some(WiiKey::X),
            Key::BTN_WEST => Some(WiiKey::Y),
            Key::BTN_TL => Some(WiiKey::Tl),
            Key::BTN_TR => Some(WiiKey::Tr),
            Key::BTN_TL2 => Some(WiiKey::Zl),
            Key::BTN_TR2 => Some(WiiKey::Zr),
            Key::KEY_NEXT => Some(WiiKey::Plus),
            Key::KEY_PREVIOUS => Some(WiiKey::Minus),
            Key::BTN_MODE => Some(WiiKey::Home),
            Key::KEY_LEFT => Some(WiiKey::Left),
            Key::KEY_RIGHT => Some(WiiKey::Right),
            Key::KEY_UP => Some(WiiKey::Up),
            Key::KEY_DOWN => Some(WiiKey::Down),
            _ => None,
        },
        // The pro controller uses positional gamepad codes, so A sits east.
        InterfaceKind::Pro => match key {
            Key::BTN_EAST => Some(WiiKey::A),
            Key::BTN_SOUTH => Some(WiiKey::B),
            Key::BTN_NORTH => Some(WiiKey::X),
            Key::BTN_WEST => Some(WiiKey::Y),
            Key::BTN_TL => Some(WiiKey::Tl),
            Key::BTN_TR => Some(WiiKey::Tr),
            Key::BTN_TL2 => Some(WiiKey::Zl),
            Key::BTN_TR2 => Some(WiiKey::Zr),
            Key::BTN_SELECT => Some(WiiKey::Minus),
            Key::BTN_START => Some(WiiKey::Plus),
            Key::BTN_MODE => Some(WiiKey::Home),
            Key::BTN_THUMBL => Some(WiiKey::ThumbL),
            Key::BTN_THUMBR => Some(WiiKey::ThumbR),
            Key::BTN_DPAD_UP => Some(WiiKey::Up),
            Key::BTN_DPAD_DOWN => Some(WiiKey::Down),
            Key::BTN_DPAD_LEFT => Some(WiiKey::Left),
            Key::BTN_DPAD_RIGHT => Some(WiiKey::Right),
            _ => None,
        },
        InterfaceKind::Guitar => match key {
            Key::BTN_1 => Some(WiiKey::FretFarUp),
            Key::BTN_2 => Some(WiiKey::FretUp),
            Key::BTN_3 => Some(WiiKey::FretMid),
            Key::BTN_4 => Some(WiiKey::FretLow),
            Key::BTN_5 => Some(WiiKey::FretFarLow),
            Key::BTN_DPAD_UP => Some(WiiKey::StrumBarUp),
            Key::BTN_DPAD_DOWN => Some(WiiKey::StrumBarDown),
            Key::BTN_START => Some(WiiKey::Plus),
            Key::BTN_MODE => Some(WiiKey::Home),
            _ => None,
        },
        InterfaceKind::Drums => match key {
            Key::BTN_START => Some(WiiKey::Plus),
            Key::BTN_SELECT => Some(WiiKey::Minus),
            _ => None,
        },
        _ => None,
    }
}

fn abs_slot(kind: InterfaceKind, axis: AbsoluteAxisType) -> Option<(usize, Component)> {
    use Component::{X, Y, Z};

    match kind {
        InterfaceKind::Accel | InterfaceKind::MotionPlus => match axis {
            AbsoluteAxisType::ABS_RX => Some((0, X)),
            AbsoluteAxisType::ABS_RY => Some((0, Y)),
            AbsoluteAxisType::ABS_RZ => Some((0, Z)),
            _ => None,
        },
        InterfaceKind::Ir => match axis {
            AbsoluteAxisType::ABS_HAT0X => Some((0, X)),
            AbsoluteAxisType::ABS_HAT0Y => Some((0, Y)),
            AbsoluteAxisType::ABS_HAT1X => Some((1, X)),
            AbsoluteAxisType::ABS_HAT1Y => Some((1, Y)),
            AbsoluteAxisType::ABS_HAT2X => Some((2, X)),
            AbsoluteAxisType::ABS_HAT2Y => Some((2, Y)),
            AbsoluteAxisType::ABS_HAT3X => Some((3, X)),
            AbsoluteAxisType::ABS_HAT3Y => Some((3, Y)),
            _ => None,
        },
        InterfaceKind::Nunchuk => match axis {
            AbsoluteAxisType::ABS_HAT0X => Some((0, X)),
            AbsoluteAxisType::ABS_HAT0Y => Some((0, Y)),
            AbsoluteAxisType::ABS_RX => Some((1, X)),
            AbsoluteAxisType::ABS_RY => Some((1, Y)),
            AbsoluteAxisType::ABS_RZ => Some((1, Z)),
            _ => None,
        },
        InterfaceKind::Classic => match axis {
            AbsoluteAxisType::ABS_HAT1X => Some((0, X)),
            AbsoluteAxisType::ABS_HAT1Y => Some((0, Y)),
            AbsoluteAxisType::ABS_HAT2X => Some((1, X)),
            AbsoluteAxisType::ABS_HAT2Y => Some((1, Y)),
            AbsoluteAxisType::ABS_HAT3X => Some((2, X)),
            AbsoluteAxisType::ABS_HAT3Y => Some((2, Y)),
            _ => None,
        },
        InterfaceKind::BalanceBoard => match axis {
            AbsoluteAxisType::ABS_HAT0X => Some((0, X)),
            AbsoluteAxisType::ABS_HAT0Y => Some((1, X)),
            AbsoluteAxisType::ABS_HAT1X => Some((2, X)),
            AbsoluteAxisType::ABS_HAT1Y => Some((3, X)),
            _ => None,
        },
        InterfaceKind::Pro => match axis {
            AbsoluteAxisType::ABS_X => Some((0, X)),
            AbsoluteAxisType::ABS_Y => Some((0, Y)),
            AbsoluteAxisType::ABS_RX => Some((1, X)),
            AbsoluteAxisType::ABS_RY => Some((1, Y)),
            _ => None,
        },
        InterfaceKind::Guitar => match axis {
            AbsoluteAxisType::ABS_X => Some((0, X)),
            AbsoluteAxisType::ABS_Y => Some((0, Y)),
            AbsoluteAxisType::ABS_HAT0X => Some((1, X)),
            AbsoluteAxisType::ABS_HAT1X => Some((2, X)),
            _ => None,
        },
        // Pads follow `DrumPad::ALL` order starting at slot 1.
        InterfaceKind::Drums => match axis {
            AbsoluteAxisType::ABS_X => Some((0, X)),
            AbsoluteAxisType::ABS_Y => Some((0, Y)),
            AbsoluteAxisType::ABS_HAT0X => Some((1, X)),
            AbsoluteAxisType::ABS_HAT0Y => Some((2, X)),
            AbsoluteAxisType::ABS_HAT1X => Some((3, X)),
            AbsoluteAxisType::ABS_HAT1Y => Some((4, X)),
            AbsoluteAxisType::ABS_HAT2X => Some((5, X)),
            AbsoluteAxisType::ABS_HAT3X => Some((6, X)),
            AbsoluteAxisType::ABS_HAT3Y => Some((7, X)),
            _ => None,
        },
        InterfaceKind::Core => None,
    }
}
