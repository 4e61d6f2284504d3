//! Inventory engine: owns the tree and both peer links and keeps the peers in
//! step with FRU availability.
//!
//! # Locking
//!
//! The tree sits behind an `RwLock`; each peer link sits behind its own
//! `Mutex`. A peer mutex is taken right before the remote calls for one FRU and
//! released right after, never across a descent into children, and the two
//! peer mutexes are never held at the same time. The tree lock is only taken in
//! short synchronous sections and never held across a remote call, so the
//! acquisition order is always peer first, tree second.
//!
//! Remote operations on a `ServiceLink` take `&mut self`, and links only live
//! inside their mutex, so holding the guard is the proof that the lock is held.

mod inventory;
mod propagation;
mod scan;

pub use inventory::InventoryEngine;

/// Order in which peers are updated for a single FRU.
pub(crate) const PEER_ORDER: [crate::peer::PeerKind; 2] =
    [crate::peer::PeerKind::Sensor, crate::peer::PeerKind::Fru];
