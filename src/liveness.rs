//! Liveness tokens for discarding superseded asynchronous results.
//!
//! Every resource class a viewer loads (its model, its skin, each decal slot)
//! owns a [`LoadSlot`]. Starting a load takes a [`LivenessToken`] from the
//! slot; starting another load, or invalidating the slot, makes every earlier
//! token stale. Completions check their token before touching any state, so
//! the most recently initiated load is the only one that can mutate.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// The independent classes of asynchronous work inside one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    Model,
    /// Color and metalness maps share one token.
    Skin,
    Decal(usize),
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceClass::Model => f.write_str("model"),
            ResourceClass::Skin => f.write_str("skin"),
            ResourceClass::Decal(slot) => write!(f, "decal slot {slot}"),
        }
    }
}

/// Generation counter for one resource class.
#[derive(Debug)]
pub struct LoadSlot {
    class: ResourceClass,
    generation: Rc<Cell<u64>>,
}

impl LoadSlot {
    pub fn new(class: ResourceClass) -> Self {
        Self {
            class,
            generation: Rc::new(Cell::new(0)),
        }
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// Start a new load. Every token issued before this one becomes stale.
    pub fn begin(&self) -> LivenessToken {
        let issued = self.generation.get() + 1;
        self.generation.set(issued);
        LivenessToken {
            class: self.class,
            issued,
            current: Rc::clone(&self.generation),
        }
    }

    /// Make all outstanding tokens stale without starting a new load.
    pub fn invalidate(&self) {
        self.generation.set(self.generation.get() + 1);
    }
}

/// Marker captured when a load starts and checked before it mutates anything.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    class: ResourceClass,
    issued: u64,
    current: Rc<Cell<u64>>,
}

impl LivenessToken {
    pub fn is_live(&self) -> bool {
        self.current.get() == self.issued
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }
}
