//! Sensor read contract: access conditions, typed read outcomes and bounded retry.

pub mod access;
pub mod hwmon;

pub use access::{read_with_retry, AccessCondition, ReadOutcome, SensorAccess, SensorReading, MAX_READ_RETRY};
pub use hwmon::HwmonAccess;
