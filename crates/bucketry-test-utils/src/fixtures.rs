//! Element types that record their own lifecycle.
//!
//! - [`DropLedger`] hands out [`Tracked`] values and counts their drops, so
//!   tests can check that removal, clearing and solidifying drop every
//!   element exactly once.

use std::cell::Cell;
use std::rc::Rc;

/// Shared drop counter for a family of [`Tracked`] values.
#[derive(Clone, Default)]
pub struct DropLedger {
    created: Rc<Cell<usize>>,
    dropped: Rc<Cell<usize>>,
}

impl DropLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value registered with this ledger.
    pub fn track(&self, id: u64) -> Tracked {
        self.created.set(self.created.get() + 1);
        Tracked {
            id,
            dropped: Rc::clone(&self.dropped),
        }
    }

    /// Values created so far.
    pub fn created(&self) -> usize {
        self.created.get()
    }

    /// Values dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    /// Values created but not yet dropped.
    pub fn alive(&self) -> usize {
        self.created() - self.dropped()
    }
}

/// A value that reports its drop to the [`DropLedger`] that created it.
#[derive(Debug)]
pub struct Tracked {
    pub id: u64,
    dropped: Rc<Cell<usize>>,
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tracked {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.dropped.set(self.dropped.get() + 1);
    }
}
