use crate::wiimote::{Controller, LED_COUNT};
use log::{error, info};

/// Active translation profile for the remote's buttons.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mode(u8);

impl Mode {
    pub const COUNT: u8 = 3;

    pub fn new() -> Self {
        Mode(1)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        Mode(self.0 % Self::COUNT + 1)
    }

    /// Whether LED `n` (1-based) is lit while this mode is active.
    pub fn lit(self, n: usize) -> bool {
        n == usize::from(self.0)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::new()
    }
}

/// Cached device status, shown to the operator.
#[derive(Clone, Debug, Default)]
pub struct DeviceStatus {
    pub battery: Option<u8>,
    pub devtype: Option<String>,
    pub extension: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ControllerState {
    pub mode: Mode,
    /// Last commanded state of each LED, index 0 is LED 1.
    pub leds: [bool; LED_COUNT],
    pub status: DeviceStatus,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_mode(&mut self, device: &mut impl Controller) {
        self.mode = self.mode.next();
        info!("Mode {}", self.mode.get());
        self.show_mode(device);
    }

    /// Lights the LED matching the current mode and turns the others off.
    pub fn show_mode(&mut self, device: &mut impl Controller) {
        for n in 1..=LED_COUNT {
            let on = self.mode.lit(n);
            match device.set_led(n, on) {
                Ok(()) => self.leds[n - 1] = on,
                Err(err) => error!("Cannot set LED {n}: {err:#}"),
            }
        }
    }

    pub fn toggle_led(&mut self, device: &mut impl Controller, n: usize) {
        let index = n - 1;
        self.leds[index] = !self.leds[index];
        if let Err(err) = device.set_led(n, self.leds[index]) {
            error!("Cannot toggle LED {n}: {err:#}");
            self.leds[index] = !self.leds[index];
        }
    }

    pub fn refresh_led(&mut self, device: &impl Controller, n: usize) {
        match device.led(n) {
            Ok(on) => self.leds[n - 1] = on,
            Err(err) => error!("Cannot read LED state: {err:#}"),
        }
    }

    pub fn refresh_battery(&mut self, device: &impl Controller) {
        match device.battery() {
            Ok(capacity) => {
                info!("Battery: {capacity:3}%");
                self.status.battery = Some(capacity);
            }
            Err(err) => error!("Cannot read battery capacity: {err:#}"),
        }
    }

    pub fn refresh_devtype(&mut self, device: &impl Controller) {
        match device.devtype() {
            Ok(name) => {
                info!("Device type: {name}");
                self.status.devtype = Some(name);
            }
            Err(err) => error!("Cannot read device type: {err:#}"),
        }
    }

    pub fn refresh_extension(&mut self, device: &impl Controller) {
        match device.extension() {
            Ok(name) => {
                info!("Extension: {name}");
                self.status.extension = Some(name);
            }
            Err(err) => error!("Cannot read extension type: {err:#}"),
        }
    }

    pub fn refresh_all(&mut self, device: &impl Controller) {
        self.refresh_battery(device);
        for n in 1..=LED_COUNT {
            self.refresh_led(device, n);
        }
        self.refresh_devtype(device);
        self.refresh_extension(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::MockController;

    #[test]
    fn mode_cycles_through_three_states() {
        for start in 1..=3u8 {
            let next = Mode(start).next();
            assert_eq!(next.get(), start % 3 + 1);
        }
        assert_eq!(Mode::default().get(), 1);
    }

    #[test]
    fn advancing_lights_exactly_the_matching_led() {
        let mut device = MockController::default();
        let mut state = ControllerState::new();

        for expected in [2u8, 3, 1, 2] {
            state.advance_mode(&mut device);
            assert_eq!(state.mode.get(), expected);
            let lit: Vec<usize> = (1..=LED_COUNT).filter(|n| device.leds[n - 1]).collect();
            assert_eq!(lit, vec![usize::from(expected)]);
            assert_eq!(state.leds, device.leds);
        }
    }

    #[test]
    fn failed_toggle_reverts_cached_state() {
        let mut device = MockController {
            fail_leds: true,
            ..MockController::default()
        };
        let mut state = ControllerState::new();
        state.toggle_led(&mut device, 2);
        assert!(!state.leds[1]);

        device.fail_leds = false;
        state.toggle_led(&mut device, 2);
        assert!(state.leds[1]);
        assert!(device.leds[1]);
    }

    #[test]
    fn failed_refresh_keeps_previous_values() {
        let mut device = MockController {
            battery: Some(80),
            extension: Some("nunchuk".into()),
            ..MockController::default()
        };
        device.leds[2] = true;
        let mut state = ControllerState::new();
        state.refresh_all(&device);
        assert_eq!(state.status.battery, Some(80));
        assert_eq!(state.status.extension.as_deref(), Some("nunchuk"));
        assert_eq!(state.status.devtype, None);
        assert!(state.leds[2]);

        device.battery = None;
        device.extension = None;
        device.fail_leds = true;
        state.refresh_all(&device);
        assert_eq!(state.status.battery, Some(80));
        assert_eq!(state.status.extension.as_deref(), Some("nunchuk"));
        assert!(state.leds[2]);
    }
}
