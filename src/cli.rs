use std::path::PathBuf;

pub const USAGE: &str = "\
Usage:
  xwiictl [-h]: Show help
  xwiictl list: List connected devices
  xwiictl <num> [<display>]: Open device with number #num
  xwiictl /sys/path/to/device [<display>]: Open device directly";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeviceArg {
    /// 1-based position in discovery order.
    Number(usize),
    Path(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Usage,
    List,
    Open {
        device: DeviceArg,
        display: Option<String>,
    },
}

/// Parses the arguments after the program name.
pub fn parse_args(args: &[String]) -> Command {
    let Some(first) = args.first() else {
        return Command::Usage;
    };

    match first.as_str() {
        "-h" => Command::Usage,
        "list" => Command::List,
        target => {
            let device = if target.starts_with('/') {
                DeviceArg::Path(PathBuf::from(target))
            } else {
                DeviceArg::Number(target.parse().unwrap_or(0))
            };
            Command::Open {
                device,
                display: args.get(1).cloned(),
            }
        }
    }
}
