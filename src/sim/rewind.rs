//! Snapshot/restore protocol and the registry that rewinds many entities at once
//!
//! Any component implementing [`Rewindable`] can be registered by name. A
//! [`RewindSnapshot`] holds one capsule per registered entity; capsules are
//! produced fresh by each entity and never mutated afterwards, so a snapshot
//! stays valid no matter what happens to the entities or the registry later.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Two-operation contract for state that can be captured and re-applied.
pub trait Rewindable {
    /// Entity-defined, self-contained copy of the entity's state
    type Capsule: Clone + Send + Sync + 'static;

    fn snapshot(&self) -> Self::Capsule;

    fn restore(&mut self, capsule: &Self::Capsule);
}

/// Type-erased, immutable capsule
#[derive(Clone)]
pub struct Capsule(Arc<dyn Any + Send + Sync>);

impl Capsule {
    fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Capsule(..)")
    }
}

/// Point-in-time capture of every registered entity
#[derive(Debug, Clone)]
pub struct RewindSnapshot {
    timestamp: f64,
    entries: BTreeMap<String, Capsule>,
}

impl RewindSnapshot {
    /// Host-supplied time of capture
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Captured ids in stable (sorted) order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Typed view of one captured capsule
    pub fn capsule<T: Any>(&self, id: &str) -> Option<&T> {
        self.entries.get(id).and_then(Capsule::downcast_ref::<T>)
    }
}

/// Why a registered entity was left out of a capture or restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    /// Entity is borrowed elsewhere right now
    Busy,
    /// Capsule was taken from an entity of a different type
    TypeMismatch,
}

trait RewindHandle {
    fn capture(&self) -> Result<Capsule, Skip>;
    fn apply(&self, capsule: &Capsule) -> Result<(), Skip>;
}

struct SharedEntity<T>(Rc<RefCell<T>>);

impl<T: Rewindable + 'static> RewindHandle for SharedEntity<T> {
    fn capture(&self) -> Result<Capsule, Skip> {
        let entity = self.0.try_borrow().map_err(|_| Skip::Busy)?;
        Ok(Capsule::new(entity.snapshot()))
    }

    fn apply(&self, capsule: &Capsule) -> Result<(), Skip> {
        let inner = capsule
            .downcast_ref::<T::Capsule>()
            .ok_or(Skip::TypeMismatch)?;
        let mut entity = self.0.try_borrow_mut().map_err(|_| Skip::Busy)?;
        entity.restore(inner);
        Ok(())
    }
}

/// Registry of named rewindable entities
#[derive(Default)]
pub struct RewindManager {
    entities: BTreeMap<String, Box<dyn RewindHandle>>,
}

impl fmt::Debug for RewindManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewindManager")
            .field("ids", &self.entities.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RewindManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` under `id`, replacing whatever was there before
    pub fn register<T: Rewindable + 'static>(
        &mut self,
        id: impl Into<String>,
        entity: Rc<RefCell<T>>,
    ) {
        let id = id.into();
        if self
            .entities
            .insert(id.clone(), Box::new(SharedEntity(entity)))
            .is_some()
        {
            log::debug!("Rewind entity '{}' replaced", id);
        }
    }

    /// Returns true if `id` was registered
    pub fn unregister(&mut self, id: &str) -> bool {
        self.entities.remove(id).is_some()
    }

    pub fn has(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Capture every registered entity
    pub fn snapshot(&self, timestamp: f64) -> RewindSnapshot {
        let mut entries = BTreeMap::new();
        for (id, handle) in &self.entities {
            match handle.capture() {
                Ok(capsule) => {
                    entries.insert(id.clone(), capsule);
                }
                Err(skip) => log::warn!("Rewind snapshot skipped '{}': {:?}", id, skip),
            }
        }
        log::debug!("Rewind snapshot at {} ({} entities)", timestamp, entries.len());
        RewindSnapshot { timestamp, entries }
    }

    /// Re-apply `snapshot` to the entities still registered.
    ///
    /// Ids no longer registered are skipped; registered entities that the
    /// snapshot does not mention are left alone. Returns the number restored.
    pub fn restore(&self, snapshot: &RewindSnapshot) -> usize {
        let mut restored = 0;
        for (id, capsule) in &snapshot.entries {
            let Some(handle) = self.entities.get(id) else {
                continue;
            };
            match handle.apply(capsule) {
                Ok(()) => restored += 1,
                Err(skip) => log::warn!("Rewind restore skipped '{}': {:?}", id, skip),
            }
        }
        log::info!(
            "Rewound to {} ({}/{} entities)",
            snapshot.timestamp,
            restored,
            snapshot.len()
        );
        restored
    }
}
