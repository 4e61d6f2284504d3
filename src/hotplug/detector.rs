//! Detector variants attached to a FRU.

use std::fmt;
use std::sync::Arc;

/// A locally sampled presence signal (GPIO, status register ...).
///
/// `sample` is a pure read of the current physical state. It never touches the
/// tree; the caller compares the result with the FRU's stored availability.
pub trait PresenceMechanism: Send + Sync {
    fn sample(&self) -> bool;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

#[derive(Clone, Default)]
pub enum HotplugDetector {
    /// Not hot-pluggable; always present.
    #[default]
    None,
    /// Presence is pushed in by an outside actor.
    External,
    /// Presence is sampled locally by the hot-plug monitor.
    Internal(Arc<dyn PresenceMechanism>),
}

impl HotplugDetector {
    pub fn internal(mechanism: impl PresenceMechanism + 'static) -> Self {
        HotplugDetector::Internal(Arc::new(mechanism))
    }

    pub fn is_hotplug(&self) -> bool {
        !matches!(self, HotplugDetector::None)
    }

    pub fn is_internally_detectable(&self) -> bool {
        matches!(self, HotplugDetector::Internal(_))
    }

    pub fn mechanism(&self) -> Option<Arc<dyn PresenceMechanism>> {
        match self {
            HotplugDetector::Internal(mechanism) => Some(Arc::clone(mechanism)),
            _ => None,
        }
    }
}

impl fmt::Debug for HotplugDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotplugDetector::None => write!(f, "None"),
            HotplugDetector::External => write!(f, "External"),
            HotplugDetector::Internal(mechanism) => write!(f, "Internal({})", mechanism.describe()),
        }
    }
}
