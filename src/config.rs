use std::path::PathBuf;
use std::str::FromStr;

/// Runtime tunables, read from `WIICTL_*` environment variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub sysfs_root: PathBuf,
    /// Raw IR x value that maps to the full screen width.
    pub ir_range_x: f64,
    /// Raw IR y value that maps to the full screen height.
    pub ir_range_y: f64,
    /// Extra pixels added past the right edge so the pointer can reach it.
    pub ir_edge_offset: i32,
    pub mp_threshold: i32,
    pub classic_axis_scale: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys"),
            ir_range_x: 1000.0,
            ir_range_y: 750.0,
            ir_edge_offset: 5,
            mp_threshold: 5000,
            classic_axis_scale: 45,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            sysfs_root: lookup("WIICTL_SYSFS_ROOT")
                .filter(|value| !value.trim().is_empty())
                .map(|value| PathBuf::from(value.trim()))
                .unwrap_or(defaults.sysfs_root),
            ir_range_x: parse_positive(&lookup, "WIICTL_IR_RANGE_X").unwrap_or(defaults.ir_range_x),
            ir_range_y: parse_positive(&lookup, "WIICTL_IR_RANGE_Y").unwrap_or(defaults.ir_range_y),
            ir_edge_offset: parse(&lookup, "WIICTL_IR_EDGE_OFFSET")
                .unwrap_or(defaults.ir_edge_offset),
            mp_threshold: parse_positive(&lookup, "WIICTL_MP_THRESHOLD")
                .unwrap_or(defaults.mp_threshold),
            classic_axis_scale: parse_positive(&lookup, "WIICTL_CLASSIC_SCALE")
                .unwrap_or(defaults.classic_axis_scale),
        }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|raw| raw.trim().parse::<T>().ok())
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    parse::<T>(lookup, name).filter(|value| *value > T::default())
}
