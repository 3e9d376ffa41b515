use anyhow::{Context, Result};
use log::{trace, warn};
use nix::errno::Errno;
use nix::sys::socket::{
    bind, recv, socket, AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol, SockType,
};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::path::Path;

/// Kernel uevent multicast group.
const KERNEL_GROUP: u32 = 1;

/// Hotplug listener for a single device, fed from the kernel uevent socket.
pub struct Watcher {
    socket: OwnedFd,
    devpath: String,
}

impl Watcher {
    pub fn new(device: &Path, sysfs_root: &Path) -> Result<Self> {
        let relative = device.strip_prefix(sysfs_root).unwrap_or(device);
        let devpath = format!("/{}", relative.display()).replace("//", "/");

        let socket = socket(
            AddressFamily::Netlink,
            SockType::Datagram,
            SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC,
            SockProtocol::NetlinkKObjectUEvent,
        )
        .context("failed to create uevent socket")?;
        bind(socket.as_raw_fd(), &NetlinkAddr::new(0, KERNEL_GROUP))
            .context("failed to bind uevent socket")?;

        Ok(Self { socket, devpath })
    }

    /// Reads every queued uevent and reports whether any touched the device.
    ///
    /// A failed receive, typically ENOBUFS after an overflow, may have dropped
    /// a matching event, so it counts as a hit and the session rescans.
    pub fn drain(&self) -> bool {
        let mut buf = [0u8; 8192];
        let mut hit = false;
        loop {
            match recv(self.socket.as_raw_fd(), &mut buf, MsgFlags::empty()) {
                Ok(len) => hit |= uevent_matches(&buf[..len], &self.devpath),
                Err(Errno::EAGAIN) => return hit,
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    warn!("uevent receive failed: {errno}");
                    return true;
                }
            }
        }
    }
}

impl AsFd for Watcher {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

/// A uevent is `ACTION@DEVPATH` followed by NUL separated `KEY=VALUE` pairs.
fn uevent_matches(message: &[u8], devpath: &str) -> bool {
    let mut fields = message
        .split(|byte| *byte == 0)
        .filter_map(|field| std::str::from_utf8(field).ok());
    let Some(header) = fields.next() else {
        return false;
    };
    trace!("uevent {header}");

    let path = fields
        .find_map(|field| field.strip_prefix("DEVPATH="))
        .or_else(|| header.split_once('@').map(|(_, path)| path));
    path.map(|path| Path::new(path).starts_with(devpath)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV: &str = "/devices/pci0000:00/usb1/bluetooth/hci0/0005:057E:0306.0001";

    #[test]
    fn matches_child_of_device() {
        let msg = format!(
            "add@{DEV}/input/input30\0ACTION=add\0DEVPATH={DEV}/input/input30\0SUBSYSTEM=input\0"
        );
        assert!(uevent_matches(msg.as_bytes(), DEV));
    }

    #[test]
    fn ignores_other_devices() {
        let msg = "remove@/devices/virtual/net/tun0\0ACTION=remove\0DEVPATH=/devices/virtual/net/tun0\0";
        assert!(!uevent_matches(msg.as_bytes(), DEV));
        assert!(!uevent_matches(b"", DEV));
    }

    #[test]
    fn sibling_with_longer_name_is_not_a_child() {
        let msg = format!("add@{DEV}1/input/input31\0DEVPATH={DEV}1/input/input31\0");
        assert!(!uevent_matches(msg.as_bytes(), DEV));
    }

    #[test]
    fn receive_failure_forces_a_rescan() {
        let (read_end, _write_end) = nix::unistd::pipe().unwrap();
        let watcher = Watcher {
            socket: read_end,
            devpath: DEV.to_string(),
        };
        assert!(watcher.drain());
    }

    #[test]
    fn falls_back_to_header_path() {
        let msg = format!("change@{DEV}");
        assert!(uevent_matches(msg.as_bytes(), DEV));
    }
}
