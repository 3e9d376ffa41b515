use anyhow::{Context, Result};
use log::{error, info, warn};
use nix::errno::Errno;
use nix::unistd::geteuid;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod bridge;
mod cli;
mod config;
mod output;
mod state;
mod wiimote;

use bridge::Bridge;
use cli::{Command, DeviceArg};
use config::Config;
use output::X11Sink;
use wiimote::{device_by_number, discover_devices, WiimoteSession};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if !geteuid().is_root() {
        warn!("Please run as root! (sysfs+evdev access needed)");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match execute(cli::parse_args(&args), Config::from_env()) {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn execute(command: Command, config: Config) -> Result<u8> {
    match command {
        Command::Usage => {
            println!("{}", cli::USAGE);
            Ok(1)
        }
        Command::List => {
            list(&config.sysfs_root)?;
            Ok(0)
        }
        Command::Open { device, display } => {
            let path = resolve(&config.sysfs_root, device)?;
            open(&path, display.as_deref(), config)?;
            Ok(0)
        }
    }
}

fn list(sysfs_root: &Path) -> Result<()> {
    let devices = discover_devices(sysfs_root).context("Cannot enumerate devices")?;
    println!("Listing connected Wii Remote devices:");
    for (index, path) in devices.iter().enumerate() {
        println!("  Found device #{}: {}", index + 1, path.display());
    }
    println!("End of device list");
    Ok(())
}

fn resolve(sysfs_root: &Path, device: DeviceArg) -> Result<PathBuf> {
    match device {
        DeviceArg::Path(path) => Ok(path),
        DeviceArg::Number(number) => match device_by_number(sysfs_root, number)? {
            Some(path) => Ok(path),
            None => {
                println!("Cannot find device with number #{number}");
                Err(io::Error::from(Errno::ENOENT))
                    .with_context(|| format!("no device #{number}"))
            }
        },
    }
}

fn open(path: &Path, display: Option<&str>, config: Config) -> Result<()> {
    let session = WiimoteSession::new(path, &config.sysfs_root)
        .with_context(|| format!("Cannot create wiimote session for {}", path.display()))?;

    if let Some(name) = display {
        info!("Using display '{name}'");
    }
    let sink = X11Sink::connect(display).unwrap_or_else(|err| {
        error!("Cannot open display: {err:#}");
        X11Sink::disconnected()
    });

    let mut bridge = Bridge::new(session, sink, config);
    bridge.start();
    bridge::run(&mut bridge)
}

/// Absolute value of the innermost OS error in the chain, else 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.chain()
        .filter_map(|cause| {
            cause
                .downcast_ref::<io::Error>()
                .and_then(io::Error::raw_os_error)
                .or_else(|| cause.downcast_ref::<Errno>().map(|errno| *errno as i32))
        })
        .last()
        .and_then(|code| u8::try_from(code.unsigned_abs()).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn usage_exits_nonzero() {
        assert_eq!(execute(cli::parse_args(&[]), Config::default()).unwrap(), 1);
    }

    #[test]
    fn exit_status_uses_os_errors() {
        let err = Err::<(), _>(io::Error::from(Errno::ENOENT))
            .context("no device #3")
            .unwrap_err();
        assert_eq!(exit_status(&err), Errno::ENOENT as u8);

        let err = anyhow::Error::new(Errno::EIO).context("read failed");
        assert_eq!(exit_status(&err), Errno::EIO as u8);

        assert_eq!(exit_status(&anyhow!("plain failure")), 1);
    }

    #[test]
    fn missing_device_number_is_enoent() {
        let root = std::env::temp_dir().join(format!("wiictl-main-{}", std::process::id()));
        std::fs::create_dir_all(root.join("bus/hid/devices")).unwrap();

        let err = resolve(&root, DeviceArg::Number(1)).unwrap_err();
        assert_eq!(exit_status(&err), Errno::ENOENT as u8);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
