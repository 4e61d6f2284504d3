//! Sensor reads from hwmon-style sysfs files such as
//! `/sys/class/hwmon/hwmon0/temp1_input`.

use std::io::ErrorKind;

use tracing::trace;

use super::access::{ReadOutcome, SensorAccess};
use crate::tree::Sensor;

/// Reads each sensor's configured source file. Sensors without a source are
/// not applicable; a missing file means the device is gone, any other I/O or
/// parse failure is retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct HwmonAccess;

impl SensorAccess for HwmonAccess {
    fn read(&self, path: &str, sensor: &Sensor) -> Result<f32, ReadOutcome> {
        let Some(source) = sensor.source() else {
            return Err(ReadOutcome::NotApplicable);
        };

        let raw = match std::fs::read_to_string(source) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ReadOutcome::NotApplicable),
            Err(e) => {
                trace!("Sensor {} read from {:?} failed: {}", path, source, e);
                return Err(ReadOutcome::Skip);
            }
        };

        match raw.trim().parse::<f64>() {
            Ok(value) => Ok((value * f64::from(sensor.scale())) as f32),
            Err(_) => {
                trace!("Sensor {} source {:?} holds {:?}", path, source, raw.trim());
                Err(ReadOutcome::Skip)
            }
        }
    }
}
