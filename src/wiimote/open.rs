use anyhow::{Context, Result};
use evdev::Device;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::fs;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Opens an interface node read-write when permitted, read-only otherwise.
/// Reads never block; the session drains every node after each wakeup.
pub fn open_interface(path: &Path) -> Result<Device> {
    let device =
        Device::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    fcntl(device.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
        .with_context(|| format!("failed to set O_NONBLOCK on {}", path.display()))?;
    Ok(device)
}

pub fn read_attr(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(raw.trim().to_string())
}

pub fn write_attr(path: &Path, value: &str) -> Result<()> {
    fs::write(path, value).with_context(|| format!("failed to write {}", path.display()))
}

/// Finds the first child of `dir` whose name satisfies `pred`.
pub fn find_child(dir: &Path, pred: impl Fn(&str) -> bool) -> Result<PathBuf> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    entries
        .flatten()
        .find(|entry| entry.file_name().to_str().map(|name| pred(name)).unwrap_or(false))
        .map(|entry| entry.path())
        .with_context(|| format!("no matching entry in {}", dir.display()))
}
