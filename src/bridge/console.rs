use log::{info, warn};
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, BorrowedFd};

/// Line-oriented command input read straight from a descriptor.
///
/// Each `read_lines` call issues at most one `read`, so it never blocks once
/// `poll` has reported the descriptor readable.
pub struct Console<R> {
    source: R,
    pending: Vec<u8>,
    open: bool,
}

impl Console<File> {
    /// Unbuffered duplicate of stdin, so readiness and buffered data agree.
    pub fn stdin() -> io::Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(Self::new(File::from(fd)))
    }
}

impl<R: Read + AsFd> Console<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            pending: Vec::new(),
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Reads what is available and returns every completed line.
    ///
    /// On end of input a trailing unterminated line is returned as well.
    pub fn read_lines(&mut self) -> Vec<String> {
        let mut buf = [0u8; 4096];
        match self.source.read(&mut buf) {
            Ok(0) => {
                info!("Console closed");
                self.open = false;
                let rest = std::mem::take(&mut self.pending);
                return if rest.is_empty() {
                    Vec::new()
                } else {
                    vec![String::from_utf8_lossy(&rest).into_owned()]
                };
            }
            Ok(len) => self.pending.extend_from_slice(&buf[..len]),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => {
                warn!("Cannot read console: {err}");
                self.open = false;
            }
        }

        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

impl<R: AsFd> AsFd for Console<R> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.source.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::pipe;
    use std::io::Write;

    fn console() -> (Console<File>, File) {
        let (read_end, write_end) = pipe().unwrap();
        (Console::new(File::from(read_end)), File::from(write_end))
    }

    #[test]
    fn one_read_yields_every_complete_line() {
        let (mut console, mut input) = console();
        input.write_all(b"1\n2\n").unwrap();
        assert_eq!(console.read_lines(), vec!["1\n", "2\n"]);
        assert!(console.is_open());
    }

    #[test]
    fn partial_lines_wait_for_their_newline() {
        let (mut console, mut input) = console();
        input.write_all(b"4").unwrap();
        assert!(console.read_lines().is_empty());
        input.write_all(b"\nm").unwrap();
        assert_eq!(console.read_lines(), vec!["4\n"]);
    }

    #[test]
    fn end_of_input_flushes_the_tail_and_closes() {
        let (mut console, mut input) = console();
        input.write_all(b"r").unwrap();
        drop(input);
        assert!(console.read_lines().is_empty());
        assert_eq!(console.read_lines(), vec!["r"]);
        assert!(!console.is_open());
    }
}
