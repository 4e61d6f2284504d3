//! Presence signal backed by a sysfs-style file, e.g. `/sys/class/gpio/gpio51/value`.

use std::path::PathBuf;

use tracing::debug;

use super::detector::PresenceMechanism;

#[derive(Debug, Clone)]
pub struct SysfsPresence {
    path: PathBuf,
    present_value: String,
}

impl SysfsPresence {
    pub fn new(path: impl Into<PathBuf>, present_value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            present_value: present_value.into(),
        }
    }
}

impl PresenceMechanism for SysfsPresence {
    fn sample(&self) -> bool {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw.trim() == self.present_value,
            Err(e) => {
                // Missing file means the device (or its GPIO export) is gone.
                debug!("Presence read failed for {:?}: {}", self.path, e);
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("{}=={}", self.path.display(), self.present_value)
    }
}
