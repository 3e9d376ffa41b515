mod console;
mod dispatch;
mod extension;
#[cfg(test)]
pub(crate) mod mock;
mod translate;

use crate::config::Config;
use crate::output::{InputSink, Key, PointerButton};
use crate::state::mode::ControllerState;
use crate::wiimote::event::WiiEvent;
use crate::wiimote::{Controller, LED_COUNT};
use extension::{
    handle_balance_board, handle_drums_key, handle_drums_move, handle_guitar_key,
    handle_guitar_move, handle_pro_move,
};
use log::{error, info, trace, warn};

pub use dispatch::run;

const HELP: &str = "Commands: 1-4 toggle LED, n toggle MP normalization, m next mode, r refresh, h help";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct NunchukLatch {
    c: bool,
    z: bool,
}

/// Everything the translators share: device, output, mode and calibration.
pub struct Bridge<C, S> {
    device: C,
    sink: S,
    config: Config,
    state: ControllerState,
    /// Set after (re)connect until the Motion Plus reports settle.
    calibrating: bool,
    nunchuk: NunchukLatch,
    watch_events: u32,
}

impl<C: Controller, S: InputSink> Bridge<C, S> {
    pub fn new(device: C, sink: S, config: Config) -> Self {
        Self {
            device,
            sink,
            config,
            state: ControllerState::new(),
            calibrating: false,
            nunchuk: NunchukLatch::default(),
            watch_events: 0,
        }
    }

    /// Re-reads battery, LEDs and identity, then restarts gyro calibration.
    pub fn refresh_all(&mut self) {
        self.state.refresh_all(&self.device);
        self.calibrating = true;
    }

    /// Refreshes cached status, opens the interfaces and lights the mode LEDs.
    pub fn start(&mut self) {
        self.refresh_all();
        self.open_interfaces();
        self.state.show_mode(&mut self.device);
    }

    fn open_interfaces(&mut self) {
        if let Err(err) = self.device.open_available() {
            error!("Cannot open interface: {err:#}");
        }
    }

    pub fn handle_event(&mut self, event: WiiEvent) {
        match event {
            WiiEvent::Gone => info!("Device gone"),
            WiiEvent::Watch => self.handle_watch(),
            WiiEvent::Key(key) => self.handle_key(key),
            WiiEvent::Accel(abs) => trace!("[Accel: {:4},{:4},{:4}]", abs.x, abs.y, abs.z),
            WiiEvent::Ir(points) => self.handle_ir(&points),
            WiiEvent::MotionPlus(sample) => self.handle_motion_plus(sample),
            WiiEvent::NunchukKey(key) => self.handle_nunchuk_key(key),
            WiiEvent::NunchukMove { stick, accel } => self.handle_nunchuk_move(stick, accel),
            WiiEvent::ClassicKey(key) => self.handle_pro_key(key),
            WiiEvent::ClassicMove {
                left,
                right,
                triggers,
            } => self.handle_classic_move(left, right, triggers),
            WiiEvent::BalanceBoard(weights) => handle_balance_board(weights),
            WiiEvent::ProKey(key) => self.handle_pro_key(key),
            WiiEvent::ProMove { left, right } => handle_pro_move(left, right),
            WiiEvent::GuitarKey(key) => handle_guitar_key(key),
            WiiEvent::GuitarMove {
                stick,
                whammy,
                fret_bar,
            } => handle_guitar_move(stick, whammy, fret_bar),
            WiiEvent::DrumsKey(key) => handle_drums_key(key),
            WiiEvent::DrumsMove(state) => handle_drums_move(&state),
        }
    }

    fn handle_watch(&mut self) {
        self.watch_events += 1;
        info!("Watch Event #{}", self.watch_events);

        self.open_interfaces();
        self.refresh_all();
    }

    /// Runs one line typed on the console.
    pub fn console_command(&mut self, line: &str) {
        match line.trim() {
            "" => {}
            "n" => self.toggle_mp_normalization(),
            "m" => self.state.advance_mode(&mut self.device),
            "r" => self.refresh_all(),
            "h" | "help" => info!("{HELP}"),
            other => match other.parse::<usize>() {
                Ok(n) if (1..=LED_COUNT).contains(&n) => self.state.toggle_led(&mut self.device, n),
                _ => warn!("Unknown command '{other}'. {HELP}"),
            },
        }
    }

    fn send_key(&mut self, key: Key, pressed: bool) {
        if let Err(err) = self.sink.key(key, pressed) {
            warn!("{err:#}");
        }
    }

    fn send_button(&mut self, button: PointerButton, pressed: bool) {
        if let Err(err) = self.sink.button(button, pressed) {
            warn!("{err:#}");
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.sink.flush() {
            warn!("flush failed: {err:#}");
        }
    }
}
