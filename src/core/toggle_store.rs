use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::{Toggle, ToggleTable};

struct StoreState {
    epoch: u64,
    table: Arc<ToggleTable>,
}

/// The current toggle table.
///
/// Readers clone an `Arc` to the table under a short read lock, so a lookup
/// never waits on a fetch and always sees one complete table. Writers build
/// the new table off-lock and swap it in whole.
///
/// Every write is tagged with an epoch. Bumping the epoch (on poller stop)
/// turns all writes started under the old epoch into no-ops.
pub struct ToggleStore {
    state: RwLock<StoreState>,
}

impl Default for ToggleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ToggleStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                epoch: 0,
                table: Arc::new(ToggleTable::new()),
            }),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Toggle> {
        self.state.read().table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().table.contains_key(name)
    }

    /// The whole current table.
    pub fn snapshot(&self) -> Arc<ToggleTable> {
        Arc::clone(&self.state.read().table)
    }

    pub fn len(&self) -> usize {
        self.state.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().table.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.state.read().epoch
    }

    /// Invalidate every write tagged with the current epoch.
    pub fn advance_epoch(&self) -> u64 {
        let mut state = self.state.write();
        state.epoch += 1;
        state.epoch
    }

    /// Replace the table unconditionally. Returns whether the content changed.
    pub fn replace(&self, toggles: Vec<Toggle>) -> bool {
        let table = build_table(toggles);
        let mut state = self.state.write();
        Self::swap(&mut state, table)
    }

    /// Replace the table if `epoch` is still current.
    ///
    /// Returns `None` when the write was discarded, otherwise whether the
    /// content changed.
    pub fn replace_if_current(&self, epoch: u64, toggles: Vec<Toggle>) -> Option<bool> {
        let table = build_table(toggles);
        let mut state = self.state.write();
        if state.epoch != epoch {
            return None;
        }
        Some(Self::swap(&mut state, table))
    }

    fn swap(state: &mut StoreState, table: ToggleTable) -> bool {
        let changed = *state.table != table;
        if changed {
            state.table = Arc::new(table);
        }
        changed
    }
}

fn build_table(toggles: Vec<Toggle>) -> ToggleTable {
    toggles
        .into_iter()
        .map(|toggle| (toggle.name.clone(), toggle))
        .collect()
}
