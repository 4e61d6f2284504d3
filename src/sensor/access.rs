//! Sensor access: the platform-specific reader the engine consults when
//! refreshing sensor values.
//!
//! Readers never panic and never return untyped errors. A read either yields a
//! value or one of the [`ReadOutcome`] variants; `Skip` means "try again" and is
//! retried up to a fixed budget before collapsing into `NotApplicable`.

use bitflags::bitflags;
use serde::Serialize;
use tracing::{debug, trace};

use crate::tree::Sensor;

/// Retry budget for transient (`Skip`) read results.
pub const MAX_READ_RETRY: u32 = 10;

bitflags! {
    /// Conditions that must hold for a sensor to be readable. A sensor with
    /// `ALWAYS` (no bits) can be read at any time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessCondition: u8 {
        const ALWAYS = 0;
        const POWER_ON = 0b0001;
        const POST_COMPLETE = 0b0010;
    }
}

impl AccessCondition {
    /// Parse a lowercase inventory-file condition name such as `power_on`.
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "always" => Some(Self::ALWAYS),
            "power_on" => Some(Self::POWER_ON),
            "post_complete" => Some(Self::POST_COMPLETE),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    Success,
    Skip,
    NotApplicable,
}

/// Last value read from a sensor. `value` is only set on success.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub value: Option<f32>,
    pub outcome: ReadOutcome,
}

impl SensorReading {
    pub fn success(value: f32) -> Self {
        Self {
            value: Some(value),
            outcome: ReadOutcome::Success,
        }
    }

    pub fn not_applicable() -> Self {
        Self {
            value: None,
            outcome: ReadOutcome::NotApplicable,
        }
    }
}

/// Platform reader for sensor values (I2C, PECI, hwmon ...).
pub trait SensorAccess: Send + Sync {
    /// Read one sample. `path` is the sensor's absolute tree path.
    fn read(&self, path: &str, sensor: &Sensor) -> Result<f32, ReadOutcome>;
}

/// Read `sensor` if `current` satisfies its access condition, retrying `Skip`
/// results up to `budget` attempts in total.
pub fn read_with_retry(
    access: &dyn SensorAccess,
    path: &str,
    sensor: &Sensor,
    current: AccessCondition,
    budget: u32,
) -> SensorReading {
    if !current.contains(sensor.access()) {
        trace!("Sensor {} not readable under {:?}", path, current);
        return SensorReading::not_applicable();
    }

    for attempt in 1..=budget.max(1) {
        match access.read(path, sensor) {
            Ok(value) => return SensorReading::success(value),
            Err(ReadOutcome::Skip) => {
                trace!("Sensor {} read skipped (attempt {}/{})", path, attempt, budget);
            }
            // A reader reporting "success" without a value is treated as not applicable.
            Err(ReadOutcome::NotApplicable) | Err(ReadOutcome::Success) => {
                return SensorReading::not_applicable();
            }
        }
    }

    debug!("Sensor {} exhausted {} read attempts", path, budget);
    SensorReading::not_applicable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Returns `Skip` for the first `skips` reads, then a fixed value.
    struct FlakyAccess {
        skips: u32,
        calls: AtomicU32,
    }

    impl SensorAccess for FlakyAccess {
        fn read(&self, _path: &str, _sensor: &Sensor) -> Result<f32, ReadOutcome> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.skips {
                Err(ReadOutcome::Skip)
            } else {
                Ok(42.0)
            }
        }
    }

    fn flaky(skips: u32) -> FlakyAccess {
        FlakyAccess {
            skips,
            calls: AtomicU32::new(0),
        }
    }

    #[test]
    fn test_skip_is_retried_within_budget() {
        let access = flaky(3);
        let sensor = Sensor::new("s");
        let reading = read_with_retry(&access, "/s", &sensor, AccessCondition::ALWAYS, MAX_READ_RETRY);
        assert_eq!(reading, SensorReading::success(42.0));
        assert_eq!(access.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_budget_exhaustion_is_not_applicable() {
        let access = flaky(100);
        let sensor = Sensor::new("s");
        let reading = read_with_retry(&access, "/s", &sensor, AccessCondition::ALWAYS, MAX_READ_RETRY);
        assert_eq!(reading, SensorReading::not_applicable());
        assert_eq!(access.calls.load(Ordering::SeqCst), MAX_READ_RETRY);
    }

    #[test]
    fn test_access_condition_gates_read() {
        let access = flaky(0);
        let sensor = Sensor::new("s").with_access(AccessCondition::POWER_ON);

        let off = read_with_retry(&access, "/s", &sensor, AccessCondition::ALWAYS, 1);
        assert_eq!(off.outcome, ReadOutcome::NotApplicable);
        assert_eq!(access.calls.load(Ordering::SeqCst), 0);

        let on = read_with_retry(
            &access,
            "/s",
            &sensor,
            AccessCondition::POWER_ON | AccessCondition::POST_COMPLETE,
            1,
        );
        assert_eq!(on.value, Some(42.0));
    }

    #[test]
    fn test_condition_names() {
        assert_eq!(AccessCondition::from_config_name("power_on"), Some(AccessCondition::POWER_ON));
        assert_eq!(AccessCondition::from_config_name("POST_COMPLETE"), Some(AccessCondition::POST_COMPLETE));
        assert_eq!(AccessCondition::from_config_name("always"), Some(AccessCondition::ALWAYS));
        assert_eq!(AccessCondition::from_config_name("bogus"), None);
    }
}
