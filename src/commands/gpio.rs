//! Output pins driven by the light commands.

use std::fs;
use std::io;
use std::path::PathBuf;

pub trait OutputPin: Send {
    fn number(&self) -> u32;

    fn set_level(&mut self, high: bool) -> io::Result<()>;
}

/// GPIO line through the legacy sysfs interface.
#[derive(Debug, Clone)]
pub struct SysfsPin {
    number: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    const ROOT: &'static str = "/sys/class/gpio";

    /// Export the line (if needed) and configure it as an output driven low.
    pub fn export(number: u32) -> io::Result<Self> {
        let dir = PathBuf::from(format!("{}/gpio{}", Self::ROOT, number));
        if !dir.exists() {
            fs::write(format!("{}/export", Self::ROOT), number.to_string())?;
        }
        fs::write(dir.join("direction"), "low")?;
        log::info!(target: "commands", "GPIO {} exported as output", number);
        Ok(Self {
            number,
            value_path: dir.join("value"),
        })
    }
}

impl OutputPin for SysfsPin {
    fn number(&self) -> u32 {
        self.number
    }

    fn set_level(&mut self, high: bool) -> io::Result<()> {
        fs::write(&self.value_path, if high { "1" } else { "0" })
    }
}
