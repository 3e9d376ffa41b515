mod decode;
mod discover;
pub mod event;
mod open;
mod watch;

use anyhow::{bail, Context, Result};
use decode::Decoder;
use event::{Abs, WiiEvent};
use evdev::{FFEffect, FFEffectData, FFEffectKind, FFReplay, FFTrigger};
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags};
use open::{find_child, open_interface, read_attr, write_attr};
use std::collections::VecDeque;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};
use watch::Watcher;

pub use discover::{device_by_number, discover_devices, interfaces, InterfaceNode};

pub const LED_COUNT: usize = 4;

const NAME_PREFIX: &str = "Nintendo Wii Remote";
const WATCH_TOKEN: u64 = u64::MAX;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum InterfaceKind {
    Core,
    Accel,
    Ir,
    MotionPlus,
    Nunchuk,
    Classic,
    BalanceBoard,
    Pro,
    Drums,
    Guitar,
}

impl InterfaceKind {
    /// Maps the input device name the kernel driver assigns to an interface.
    pub fn from_name(name: &str) -> Option<Self> {
        let suffix = name.strip_prefix(NAME_PREFIX)?.trim();
        match suffix {
            "" => Some(InterfaceKind::Core),
            "Accelerometer" => Some(InterfaceKind::Accel),
            "IR" => Some(InterfaceKind::Ir),
            "Motion Plus" => Some(InterfaceKind::MotionPlus),
            "Nunchuk" => Some(InterfaceKind::Nunchuk),
            "Classic Controller" => Some(InterfaceKind::Classic),
            "Balance Board" => Some(InterfaceKind::BalanceBoard),
            "Pro Controller" => Some(InterfaceKind::Pro),
            "Drums" => Some(InterfaceKind::Drums),
            "Guitar" => Some(InterfaceKind::Guitar),
            _ => None,
        }
    }
}

/// Gyroscope calibration applied to every Motion Plus sample.
///
/// Reported samples are `raw - offset`. With a non-zero `factor` the offset
/// keeps drifting toward the reported value by `reported / factor`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MpNormalization {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub factor: i32,
}

impl MpNormalization {
    pub fn apply(&mut self, raw: Abs) -> Abs {
        let out = Abs::new(raw.x - self.x, raw.y - self.y, raw.z - self.z);
        if self.factor > 0 {
            self.x += out.x / self.factor;
            self.y += out.y / self.factor;
            self.z += out.z / self.factor;
        }
        out
    }
}

/// Operations the bridge needs from an opened controller.
///
/// LED numbers are 1-based, matching the labels printed on the remote.
pub trait Controller {
    fn led(&self, n: usize) -> Result<bool>;
    fn set_led(&mut self, n: usize, on: bool) -> Result<()>;
    fn battery(&self) -> Result<u8>;
    fn devtype(&self) -> Result<String>;
    fn extension(&self) -> Result<String>;
    fn rumble(&mut self, on: bool) -> Result<()>;
    fn mp_normalization(&self) -> MpNormalization;
    fn set_mp_normalization(&mut self, norm: MpNormalization);
    /// Opens every interface currently exported by the device.
    fn open_available(&mut self) -> Result<()>;
    fn watch(&mut self, enable: bool) -> Result<()>;
    /// Returns the next decoded event, or `None` when nothing is pending.
    fn dispatch(&mut self) -> io::Result<Option<WiiEvent>>;
}

struct Interface {
    kind: InterfaceKind,
    node: PathBuf,
    device: evdev::Device,
    decoder: Decoder,
}

/// An opened Wii Remote, driven through the kernel's evdev and sysfs exports.
pub struct WiimoteSession {
    path: PathBuf,
    sysfs_root: PathBuf,
    epoll: Epoll,
    interfaces: Vec<Interface>,
    watcher: Option<Watcher>,
    rumble: Option<FFEffect>,
    pending: VecDeque<WiiEvent>,
    mp: MpNormalization,
}

impl WiimoteSession {
    pub fn new(path: &Path, sysfs_root: &Path) -> Result<Self> {
        let path = std::fs::canonicalize(path)
            .with_context(|| format!("cannot resolve device {}", path.display()))?;
        if !path.join("input").is_dir() {
            bail!("{} is not a wiimote device", path.display());
        }
        let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC).context("epoll_create failed")?;
        info!("Using device {}", path.display());

        Ok(Self {
            path,
            sysfs_root: sysfs_root.to_path_buf(),
            epoll,
            interfaces: Vec::new(),
            watcher: None,
            rumble: None,
            pending: VecDeque::new(),
            mp: MpNormalization::default(),
        })
    }

    /// Interfaces the device exports right now, opened or not.
    pub fn available(&self) -> Vec<InterfaceNode> {
        interfaces(&self.path)
    }

    fn led_path(&self, n: usize) -> Result<PathBuf> {
        if !(1..=LED_COUNT).contains(&n) {
            bail!("invalid LED {n}");
        }
        let suffix = format!(":blue:p{}", n - 1);
        let dir = find_child(&self.path.join("leds"), |name| name.ends_with(&suffix))?;
        Ok(dir.join("brightness"))
    }

    fn close_interface(&mut self, index: usize) {
        let iface = self.interfaces.remove(index);
        if iface.kind == InterfaceKind::Core {
            self.rumble = None;
        }
        if let Err(err) = self.epoll.delete(device_fd(&iface.device)) {
            debug!("epoll delete for {} failed: {err}", iface.node.display());
        }
        info!("Closed {:?} interface ({})", iface.kind, iface.node.display());
    }

    fn read_interfaces(&mut self) -> io::Result<()> {
        let mut decoded = Vec::new();
        let mut gone = Vec::new();

        for (index, iface) in self.interfaces.iter_mut().enumerate() {
            let Interface { device, decoder, .. } = iface;
            match device.fetch_events() {
                Ok(events) => decoded.extend(events.filter_map(|event| decoder.decode(event))),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
                Err(err) if err.raw_os_error() == Some(Errno::ENODEV as i32) => gone.push(index),
                Err(err) => return Err(err),
            }
        }

        for event in decoded {
            let event = match event {
                WiiEvent::MotionPlus(raw) => WiiEvent::MotionPlus(self.mp.apply(raw)),
                other => other,
            };
            self.pending.push_back(event);
        }

        for index in gone.into_iter().rev() {
            let core = self.interfaces[index].kind == InterfaceKind::Core;
            self.close_interface(index);
            if core {
                self.pending.push_back(WiiEvent::Gone);
            }
        }

        Ok(())
    }
}

impl Controller for WiimoteSession {
    fn led(&self, n: usize) -> Result<bool> {
        let raw = read_attr(&self.led_path(n)?)?;
        let value: u32 = raw
            .parse()
            .with_context(|| format!("invalid LED brightness '{raw}'"))?;
        Ok(value != 0)
    }

    fn set_led(&mut self, n: usize, on: bool) -> Result<()> {
        write_attr(&self.led_path(n)?, if on { "1" } else { "0" })
    }

    fn battery(&self) -> Result<u8> {
        let supply = find_child(&self.path.join("power_supply"), |name| {
            name.starts_with("wiimote_battery")
        })?;
        let raw = read_attr(&supply.join("capacity"))?;
        raw.parse()
            .with_context(|| format!("invalid battery capacity '{raw}'"))
    }

    fn devtype(&self) -> Result<String> {
        read_attr(&self.path.join("devtype"))
    }

    fn extension(&self) -> Result<String> {
        read_attr(&self.path.join("extension"))
    }

    fn rumble(&mut self, on: bool) -> Result<()> {
        let core = self
            .interfaces
            .iter_mut()
            .find(|iface| iface.kind == InterfaceKind::Core)
            .context("core interface is not open")?;

        if self.rumble.is_none() {
            let effect = core
                .device
                .upload_ff_effect(FFEffectData {
                    direction: 0,
                    trigger: FFTrigger {
                        button: 0,
                        interval: 0,
                    },
                    replay: FFReplay {
                        length: 0,
                        delay: 0,
                    },
                    kind: FFEffectKind::Rumble {
                        strong_magnitude: u16::MAX,
                        weak_magnitude: 0,
                    },
                })
                .context("failed to upload rumble effect")?;
            self.rumble = Some(effect);
        }

        if let Some(effect) = self.rumble.as_mut() {
            if on {
                effect.play(1).context("failed to start rumble")?;
            } else {
                effect.stop().context("failed to stop rumble")?;
            }
        }
        Ok(())
    }

    fn mp_normalization(&self) -> MpNormalization {
        self.mp
    }

    fn set_mp_normalization(&mut self, norm: MpNormalization) {
        self.mp = norm;
    }

    fn open_available(&mut self) -> Result<()> {
        let available = self.available();

        let mut index = 0;
        while index < self.interfaces.len() {
            let open = &self.interfaces[index];
            if available.iter().any(|node| node.kind == open.kind && node.node == open.node) {
                index += 1;
            } else {
                self.close_interface(index);
            }
        }

        let mut first_error = None;
        for node in available {
            if self.interfaces.iter().any(|iface| iface.kind == node.kind) {
                continue;
            }
            let device = match open_interface(&node.node) {
                Ok(device) => device,
                Err(err) => {
                    warn!("{:?} interface unavailable: {err:#}", node.kind);
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            self.epoll
                .add(device_fd(&device), EpollEvent::new(EpollFlags::EPOLLIN, node.kind as u64))
                .with_context(|| format!("epoll add failed for {}", node.node.display()))?;
            info!("Opened {:?} interface ({})", node.kind, node.node.display());
            self.interfaces.push(Interface {
                kind: node.kind,
                node: node.node,
                device,
                decoder: Decoder::new(node.kind),
            });
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn watch(&mut self, enable: bool) -> Result<()> {
        if let Some(watcher) = self.watcher.take() {
            self.epoll.delete(&watcher).context("epoll delete failed")?;
        }
        if enable {
            let watcher = Watcher::new(&self.path, &self.sysfs_root)?;
            self.epoll
                .add(&watcher, EpollEvent::new(EpollFlags::EPOLLIN, WATCH_TOKEN))
                .context("epoll add failed for hotplug watch")?;
            self.watcher = Some(watcher);
        }
        Ok(())
    }

    fn dispatch(&mut self) -> io::Result<Option<WiiEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        if let Some(watcher) = &self.watcher {
            if watcher.drain() {
                self.pending.push_back(WiiEvent::Watch);
            }
        }
        self.read_interfaces()?;

        Ok(self.pending.pop_front())
    }
}

fn device_fd(device: &evdev::Device) -> BorrowedFd<'_> {
    // SAFETY: the descriptor is owned by `device` and outlives the borrow.
    unsafe { BorrowedFd::borrow_raw(device.as_raw_fd()) }
}

/// The epoll descriptor covers every open interface and the hotplug socket.
impl AsFd for WiimoteSession {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.epoll.0.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_names_match_driver_exports() {
        assert_eq!(
            InterfaceKind::from_name("Nintendo Wii Remote"),
            Some(InterfaceKind::Core)
        );
        assert_eq!(
            InterfaceKind::from_name("Nintendo Wii Remote Motion Plus"),
            Some(InterfaceKind::MotionPlus)
        );
        assert_eq!(
            InterfaceKind::from_name("Nintendo Wii Remote Pro Controller"),
            Some(InterfaceKind::Pro)
        );
        assert_eq!(InterfaceKind::from_name("Nintendo Wii Remote Speaker"), None);
        assert_eq!(InterfaceKind::from_name("Logitech USB Receiver"), None);
    }

    #[test]
    fn normalization_subtracts_offset() {
        let mut norm = MpNormalization {
            x: 100,
            y: -50,
            z: 0,
            factor: 0,
        };
        assert_eq!(norm.apply(Abs::new(150, -50, 7)), Abs::new(50, 0, 7));
        assert_eq!(norm.x, 100);
    }

    #[test]
    fn normalization_factor_drifts_offset() {
        let mut norm = MpNormalization {
            factor: 50,
            ..MpNormalization::default()
        };
        assert_eq!(norm.apply(Abs::new(500, -100, 49)), Abs::new(500, -100, 49));
        assert_eq!((norm.x, norm.y, norm.z), (10, -2, 0));
    }
}
