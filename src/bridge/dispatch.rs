use crate::bridge::console::Console;
use crate::bridge::Bridge;
use crate::output::InputSink;
use crate::wiimote::event::WiiEvent;
use crate::wiimote::Controller;
use anyhow::{Context, Result};
use log::{error, info};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::{self, Read};
use std::os::fd::{AsFd, BorrowedFd};

/// Pumps console commands and device events.
///
/// A transport error ends the loop. Otherwise it runs until both the console
/// and the device are closed.
pub fn run<C, S>(bridge: &mut Bridge<C, S>) -> Result<()>
where
    C: Controller + AsFd,
    S: InputSink,
{
    let console = Console::stdin().context("Cannot open console")?;
    serve(bridge, console, |fds: &mut [PollFd<'_>]| poll(fds, PollTimeout::NONE))
}

fn serve<C, S, R, P>(
    bridge: &mut Bridge<C, S>,
    mut console: Console<R>,
    mut poll_fds: P,
) -> Result<()>
where
    C: Controller + AsFd,
    S: InputSink,
    R: Read + AsFd,
    P: FnMut(&mut [PollFd<'_>]) -> nix::Result<i32>,
{
    if let Err(err) = bridge.device.watch(true) {
        error!("Cannot initialize hotplug watch descriptor: {err:#}");
    }

    let mut device_open = true;
    while console.is_open() || device_open {
        let console_ready = wait(
            console.is_open().then(|| console.as_fd()),
            device_open.then(|| bridge.device.as_fd()),
            &mut poll_fds,
        )?;

        if console_ready {
            for line in console.read_lines() {
                bridge.console_command(&line);
            }
        }

        if !pump(bridge)? {
            device_open = false;
        }
    }

    info!("Console and device closed");
    Ok(())
}

/// Blocks until one of the channels is ready. Returns whether the console is.
fn wait<P>(
    console: Option<BorrowedFd<'_>>,
    device: Option<BorrowedFd<'_>>,
    poll_fds: &mut P,
) -> Result<bool>
where
    P: FnMut(&mut [PollFd<'_>]) -> nix::Result<i32>,
{
    let mut fds: Vec<PollFd> = [console, device]
        .into_iter()
        .flatten()
        .map(|fd| PollFd::new(fd, PollFlags::POLLIN))
        .collect();

    loop {
        match poll_fds(fds.as_mut_slice()) {
            Ok(_) => break,
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                error!("Cannot poll fds: {}", -(errno as i32));
                return Err(io::Error::from(errno)).context("poll failed");
            }
        }
    }

    let ready = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
    Ok(console.is_some()
        && fds
            .first()
            .and_then(|fd| fd.revents())
            .map(|revents| revents.intersects(ready))
            .unwrap_or(false))
}

/// Routes every pending device event. Returns `false` once the device is gone.
fn pump<C, S>(bridge: &mut Bridge<C, S>) -> Result<bool>
where
    C: Controller,
    S: InputSink,
{
    let mut alive = true;
    loop {
        match bridge.device.dispatch() {
            Ok(None) => return Ok(alive),
            Ok(Some(event)) => {
                if event == WiiEvent::Gone {
                    alive = false;
                }
                bridge.handle_event(event);
            }
            Err(err) => {
                error!("Read failed with err:{}", -err.raw_os_error().unwrap_or(1));
                return Err(err).context("device dispatch failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::{Action, MockController, RecordingSink};
    use crate::config::Config;
    use crate::output::Key;
    use crate::wiimote::event::{KeyEvent, WiiKey};
    use nix::unistd::pipe;
    use std::fs::File;
    use std::io::Write;

    fn bridge_with(events: Vec<io::Result<Option<WiiEvent>>>) -> Bridge<MockController, RecordingSink> {
        let device = MockController {
            events: events.into(),
            ..MockController::default()
        };
        Bridge::new(device, RecordingSink::default(), Config::default())
    }

    fn key(key: WiiKey, pressed: bool) -> io::Result<Option<WiiEvent>> {
        Ok(Some(WiiEvent::Key(KeyEvent { key, pressed })))
    }

    #[test]
    fn drains_until_no_data() {
        let mut bridge = bridge_with(vec![
            key(WiiKey::Up, true),
            key(WiiKey::Up, false),
            Ok(None),
            key(WiiKey::Down, true),
        ]);

        assert!(pump(&mut bridge).unwrap());
        assert_eq!(
            bridge.sink.take(),
            vec![
                Action::Key(Key::Up, true),
                Action::Flush,
                Action::Key(Key::Up, false),
                Action::Flush,
            ]
        );

        assert!(pump(&mut bridge).unwrap());
        assert_eq!(
            bridge.sink.take(),
            vec![Action::Key(Key::Down, true), Action::Flush]
        );
    }

    #[test]
    fn gone_is_reported_but_not_fatal() {
        let mut bridge = bridge_with(vec![Ok(Some(WiiEvent::Gone)), key(WiiKey::Home, true)]);
        assert!(!pump(&mut bridge).unwrap());
        assert_eq!(
            bridge.sink.take(),
            vec![Action::Key(Key::Escape, true), Action::Flush]
        );
    }

    #[test]
    fn transport_errors_keep_their_errno() {
        let mut bridge = bridge_with(vec![
            key(WiiKey::Left, true),
            Err(io::Error::from_raw_os_error(Errno::EIO as i32)),
            key(WiiKey::Left, false),
        ]);

        let err = pump(&mut bridge).unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.raw_os_error(), Some(Errno::EIO as i32));
        assert_eq!(bridge.sink.take().len(), 2);
    }

    /// A bridge whose device descriptor always polls readable.
    fn live_bridge(events: Vec<io::Result<Option<WiiEvent>>>) -> Bridge<MockController, RecordingSink> {
        let (read_end, write_end) = pipe().unwrap();
        File::from(write_end).write_all(b"x").unwrap();
        let device = MockController {
            events: events.into(),
            wake: Some(read_end),
            ..MockController::default()
        };
        Bridge::new(device, RecordingSink::default(), Config::default())
    }

    /// Console fed with `input`, then closed.
    fn console_with(input: &[u8]) -> Console<File> {
        let (read_end, write_end) = pipe().unwrap();
        File::from(write_end).write_all(input).unwrap();
        Console::new(File::from(read_end))
    }

    fn blocking_poll(fds: &mut [PollFd<'_>]) -> nix::Result<i32> {
        poll(fds, PollTimeout::NONE)
    }

    #[test]
    fn lines_arriving_together_all_run() {
        let mut bridge = live_bridge(vec![Ok(Some(WiiEvent::Gone))]);
        serve(&mut bridge, console_with(b"1\n2\n"), blocking_poll).unwrap();
        assert_eq!(bridge.device.leds, [true, true, false, false]);
    }

    #[test]
    fn gone_device_leaves_only_the_console_polled() {
        let mut bridge = live_bridge(vec![Ok(Some(WiiEvent::Gone))]);
        let mut polled = Vec::new();

        serve(&mut bridge, console_with(b"m\n"), |fds: &mut [PollFd<'_>]| {
            polled.push(fds.len());
            blocking_poll(fds)
        })
        .unwrap();

        assert_eq!(polled, vec![2, 1]);
        assert_eq!(bridge.state.mode.get(), 2);
    }

    #[test]
    fn closed_console_keeps_serving_the_device() {
        let mut bridge = live_bridge(vec![
            Ok(None),
            key(WiiKey::Up, true),
            Err(io::Error::from_raw_os_error(Errno::EIO as i32)),
        ]);
        let mut polled = Vec::new();

        let err = serve(&mut bridge, console_with(b""), |fds: &mut [PollFd<'_>]| {
            polled.push(fds.len());
            blocking_poll(fds)
        })
        .unwrap_err();

        assert_eq!(polled, vec![2, 1]);
        assert_eq!(
            err.downcast_ref::<io::Error>().unwrap().raw_os_error(),
            Some(Errno::EIO as i32)
        );
        assert_eq!(
            bridge.sink.take(),
            vec![Action::Key(Key::Up, true), Action::Flush]
        );
    }

    #[test]
    fn interrupted_poll_is_retried() {
        let mut bridge = live_bridge(vec![Ok(Some(WiiEvent::Gone))]);
        let mut calls = 0;

        serve(&mut bridge, console_with(b""), |fds: &mut [PollFd<'_>]| {
            calls += 1;
            if calls == 1 {
                return Err(Errno::EINTR);
            }
            blocking_poll(fds)
        })
        .unwrap();

        assert_eq!(calls, 2);
    }

    #[test]
    fn poll_failure_ends_the_loop() {
        let mut bridge = live_bridge(Vec::new());
        let err = serve(&mut bridge, console_with(b""), |_: &mut [PollFd<'_>]| {
            Err(Errno::EBADF)
        })
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<io::Error>().unwrap().raw_os_error(),
            Some(Errno::EBADF as i32)
        );
    }
}
