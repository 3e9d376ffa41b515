use crate::wiimote::InterfaceKind;
use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const DRIVER: &str = "wiimote";

/// An evdev node exported by one wiimote interface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterfaceNode {
    pub kind: InterfaceKind,
    pub node: PathBuf,
}

/// Lists every HID device bound to the wiimote driver, in stable name order.
pub fn discover_devices(sysfs_root: &Path) -> Result<Vec<PathBuf>> {
    let hid_dir = sysfs_root.join("bus/hid/devices");
    let entries = match fs::read_dir(&hid_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("failed to read {}: {err}", hid_dir.display());
            return Ok(Vec::new());
        }
    };

    let mut names: Vec<_> = entries
        .flatten()
        .map(|entry| entry.file_name())
        .collect();
    names.sort();

    let mut devices = Vec::new();
    for name in names {
        let link = hid_dir.join(&name);
        if !is_wiimote(&link) {
            continue;
        }
        let path = fs::canonicalize(&link).unwrap_or(link);
        debug!("candidate device: {}", path.display());
        devices.push(path);
    }

    Ok(devices)
}

/// Resolves a 1-based ordinal in discovery order.
pub fn device_by_number(sysfs_root: &Path, number: usize) -> Result<Option<PathBuf>> {
    if number == 0 {
        return Ok(None);
    }
    Ok(discover_devices(sysfs_root)?.into_iter().nth(number - 1))
}

fn is_wiimote(device: &Path) -> bool {
    fs::read_link(device.join("driver"))
        .ok()
        .and_then(|target| {
            target
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name == DRIVER)
        })
        .unwrap_or(false)
}

/// Lists the interfaces the device currently exports, skipping unknown ones.
pub fn interfaces(device: &Path) -> Vec<InterfaceNode> {
    let entries = match fs::read_dir(device.join("input")) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut nodes = Vec::new();
    for entry in entries.flatten() {
        let input_dir = entry.path();
        let name = match fs::read_to_string(input_dir.join("name")) {
            Ok(name) => name,
            Err(_) => continue,
        };
        let Some(kind) = InterfaceKind::from_name(name.trim()) else {
            debug!("skip {} (unknown interface '{}')", input_dir.display(), name.trim());
            continue;
        };
        let Some(event) = event_node_name(&input_dir) else {
            continue;
        };
        nodes.push(InterfaceNode {
            kind,
            node: Path::new("/dev/input").join(event),
        });
    }

    nodes.sort_by_key(|node| node.kind);
    nodes
}

fn event_node_name(input_dir: &Path) -> Option<String> {
    fs::read_dir(input_dir)
        .ok()?
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .find(|name| name.starts_with("event"))
}
