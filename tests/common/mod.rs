//! Shared fixtures for integration tests: a recording peer transport and
//! helpers to build engines over small trees.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use bmc_inventory::hotplug::PresenceMechanism;
use bmc_inventory::peer::{PeerConnector, PeerError, PeerKind, PeerRpc, ServiceLink};
use bmc_inventory::tree::{Descriptor, Tree};
use bmc_inventory::InventoryEngine;

// ============================================================================
// Recorded calls
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reset,
    AddFru { parent: String, descriptor: String },
    AddSensors { fru: String, descriptors: Vec<String> },
    RemoveFru { path: String },
}

fn text(descriptor: &Descriptor) -> String {
    String::from_utf8_lossy(descriptor.as_bytes()).into_owned()
}

/// Calls observed by both peers, in global order.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(PeerKind, Call)>>>,
}

impl CallLog {
    pub fn record(&self, peer: PeerKind, call: Call) {
        self.calls.lock().unwrap().push((peer, call));
    }

    pub fn all(&self) -> Vec<(PeerKind, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn for_peer(&self, peer: PeerKind) -> Vec<Call> {
        self.all()
            .into_iter()
            .filter(|(p, _)| *p == peer)
            .map(|(_, call)| call)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

// ============================================================================
// Recording transport
// ============================================================================

struct RecordingPeer {
    kind: PeerKind,
    log: CallLog,
    refuse_reset: Arc<AtomicBool>,
}

#[async_trait]
impl PeerRpc for RecordingPeer {
    async fn reset(&self) -> Result<bool, PeerError> {
        self.log.record(self.kind, Call::Reset);
        Ok(!self.refuse_reset.load(Ordering::SeqCst))
    }

    async fn add_fru(&self, parent_path: &str, descriptor: &Descriptor) -> Result<bool, PeerError> {
        self.log.record(
            self.kind,
            Call::AddFru {
                parent: parent_path.to_string(),
                descriptor: text(descriptor),
            },
        );
        Ok(true)
    }

    async fn add_sensors(&self, fru_path: &str, descriptors: &[Descriptor]) -> Result<bool, PeerError> {
        self.log.record(
            self.kind,
            Call::AddSensors {
                fru: fru_path.to_string(),
                descriptors: descriptors.iter().map(text).collect(),
            },
        );
        Ok(true)
    }

    async fn remove_fru(&self, path: &str) -> Result<bool, PeerError> {
        self.log.record(self.kind, Call::RemoveFru { path: path.to_string() });
        Ok(true)
    }
}

pub struct RecordingConnector {
    kind: PeerKind,
    log: CallLog,
    pub reachable: AtomicBool,
    pub connects: AtomicUsize,
    /// When set, `reset` is answered with a refusal.
    pub refuse_reset: Arc<AtomicBool>,
}

impl RecordingConnector {
    pub fn new(kind: PeerKind, log: CallLog) -> Self {
        Self {
            kind,
            log,
            reachable: AtomicBool::new(true),
            connects: AtomicUsize::new(0),
            refuse_reset: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl PeerConnector for RecordingConnector {
    async fn connect(&self) -> Result<Arc<dyn PeerRpc>, PeerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(PeerError::Connect("unreachable".to_string()));
        }
        Ok(Arc::new(RecordingPeer {
            kind: self.kind,
            log: self.log.clone(),
            refuse_reset: Arc::clone(&self.refuse_reset),
        }))
    }

    fn endpoint(&self) -> String {
        format!("recording:{}", self.kind)
    }
}

// ============================================================================
// Presence switch
// ============================================================================

/// Presence signal flipped by the test.
#[derive(Clone, Default)]
pub struct Switch {
    present: Arc<AtomicBool>,
    samples: Arc<AtomicUsize>,
}

impl Switch {
    pub fn set(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

impl PresenceMechanism for Switch {
    fn sample(&self) -> bool {
        self.samples.fetch_add(1, Ordering::SeqCst);
        self.present.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        "test switch".to_string()
    }
}

// ============================================================================
// Engine fixture
// ============================================================================

pub struct Fixture {
    pub engine: Arc<InventoryEngine>,
    pub log: CallLog,
    pub sensor: Arc<RecordingConnector>,
    pub fru: Arc<RecordingConnector>,
}

/// Engine over `tree` with the platform root at `/org`.
pub fn fixture(tree: Tree) -> Fixture {
    let log = CallLog::default();
    let sensor = Arc::new(RecordingConnector::new(PeerKind::Sensor, log.clone()));
    let fru = Arc::new(RecordingConnector::new(PeerKind::Fru, log.clone()));

    let link = |kind, connector: &Arc<RecordingConnector>| {
        let connector: Arc<dyn PeerConnector> = connector.clone();
        ServiceLink::new(kind, connector, Duration::from_secs(1))
    };

    let engine = InventoryEngine::new(
        tree,
        "/org",
        link(PeerKind::Sensor, &sensor),
        link(PeerKind::Fru, &fru),
    )
    .unwrap();

    Fixture {
        engine: Arc::new(engine),
        log,
        sensor,
        fru,
    }
}

pub fn add_fru(parent: &str, name: &str) -> Call {
    Call::AddFru {
        parent: parent.to_string(),
        descriptor: name.to_string(),
    }
}

pub fn add_sensors(fru: &str, names: &[&str]) -> Call {
    Call::AddSensors {
        fru: fru.to_string(),
        descriptors: names.iter().map(|n| n.to_string()).collect(),
    }
}

pub fn remove_fru(path: &str) -> Call {
    Call::RemoveFru { path: path.to_string() }
}
